//! Concrete visualization widgets

mod donut;
mod histogram;
mod quantity;
mod scurve;
mod spi;

pub use donut::{DonutChart, DonutColors, DonutConfig};
pub use histogram::{HistogramChart, HistogramConfig};
pub use quantity::{QuantityChart, QuantityConfig, QuantityGrouping};
pub use scurve::{SCurveChart, SCurveConfig};
pub use spi::{SpiChart, SpiConfig};

use std::sync::Arc;

use ev_data::VisualizationKind;

use crate::component::{mount_component, ComponentCore, VisualizationComponent};
use crate::surface::{Anchor, Color, SceneNode, SurfaceSize};

/// Instantiate the widget for `core`'s kind
pub fn build(core: ComponentCore) -> Arc<dyn VisualizationComponent> {
    match core.kind() {
        VisualizationKind::Donut => mount_component(DonutChart::new(core)),
        VisualizationKind::Histogram => mount_component(HistogramChart::new(core)),
        VisualizationKind::SCurve => mount_component(SCurveChart::new(core)),
        VisualizationKind::Quantity => mount_component(QuantityChart::new(core)),
        VisualizationKind::Spi => mount_component(SpiChart::new(core)),
    }
}

const TITLE_HEIGHT: f32 = 24.0;
const PADDING: f32 = 8.0;

/// Rectangle available for plotting, below the title
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlotArea {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PlotArea {
    /// Plot rectangle leaving `gutter` pixels on the left for axis labels
    pub fn below_title(size: SurfaceSize, gutter: f32) -> Self {
        let left = PADDING + gutter;
        let top = TITLE_HEIGHT + PADDING;
        Self {
            left,
            top,
            width: (size.width - left - PADDING).max(0.0),
            height: (size.height - top - PADDING * 3.0).max(0.0),
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Map fractions of the area (0..=1, y up) to surface pixels
    pub fn point(&self, fx: f32, fy: f32) -> [f32; 2] {
        [
            self.left + fx.clamp(0.0, 1.0) * self.width,
            self.bottom() - fy.clamp(0.0, 1.0) * self.height,
        ]
    }
}

pub(crate) fn title(text: &str, color: Color) -> SceneNode {
    SceneNode::Text {
        position: [PADDING, TITLE_HEIGHT / 2.0 + PADDING / 2.0],
        content: text.to_string(),
        size: 14.0,
        color,
        anchor: Anchor::Start,
    }
}

/// Centered hint shown when a series has nothing to plot
pub(crate) fn empty_hint(size: SurfaceSize, text: &str) -> SceneNode {
    SceneNode::text([size.width / 2.0, size.height / 2.0], text, 13.0, Color::MUTED)
}

pub(crate) fn legend(area: &PlotArea, entries: &[(&str, Color)]) -> Vec<SceneNode> {
    let y = area.bottom() + PADDING * 2.0;
    let slot = if entries.is_empty() { 0.0 } else { area.width / entries.len() as f32 };
    entries
        .iter()
        .enumerate()
        .flat_map(|(i, (label, color))| {
            let x = area.left + slot * i as f32;
            [
                SceneNode::Rect { min: [x, y - 4.0], size: [8.0, 8.0], color: *color },
                SceneNode::Text {
                    position: [x + 12.0, y],
                    content: label.to_string(),
                    size: 11.0,
                    color: Color::TEXT,
                    anchor: Anchor::Start,
                },
            ]
        })
        .collect()
}

/// Group thousands and drop a trailing `.0`: `1234.5 -> "1,234.5"`
pub(crate) fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let text = format!("{}", rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), Some(frac_part.to_string())),
        None => (text, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(&frac_part);
    }
    out
}

/// Upper bound for a value axis: `max` rounded up to a tidy step, at least `floor`
pub(crate) fn nice_ceiling(max: f64, floor: f64) -> f64 {
    let max = max.max(floor);
    if max <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(max.log10().floor());
    let step = magnitude / 2.0;
    (max / step).ceil() * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(146.0), "146");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(1_000_000.0), "1,000,000");
        assert_eq!(format_number(-2500.25), "-2,500.25");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(73.0, 0.0), 75.0);
        assert_eq!(nice_ceiling(0.0, 0.0), 1.0);
        assert_eq!(nice_ceiling(0.4, 1.5), 1.5);
        assert_eq!(nice_ceiling(100.0, 0.0), 100.0);
    }

    #[test]
    fn test_plot_area_maps_fractions() {
        let area = PlotArea::below_title(SurfaceSize::new(200.0, 200.0), 0.0);
        assert_eq!(area.point(0.0, 0.0), [area.left, area.bottom()]);
        assert_eq!(area.point(1.0, 1.0), [area.left + area.width, area.top]);
        assert_eq!(area.point(2.0, -1.0), area.point(1.0, 0.0));
    }
}
