//! Schedule performance index trend

use ev_data::{MetricPayload, SpiData};
use serde::Deserialize;

use super::{empty_hint, nice_ceiling, title, PlotArea};
use crate::component::{ComponentCore, VisualizationComponent};
use crate::surface::{Anchor, Color, SceneNode, SurfaceSize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpiConfig {
    pub line_color: Color,
    pub baseline_color: Color,
    /// Current SPI at or above this reads as on schedule
    pub on_track: f64,
    /// Current SPI below this reads as critical
    pub critical: f64,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            line_color: Color::rgb(0x21, 0x96, 0xF3),
            baseline_color: Color::rgb(0x9E, 0x9E, 0x9E),
            on_track: 1.0,
            critical: 0.9,
        }
    }
}

impl SpiConfig {
    fn status_color(&self, spi: f64) -> Color {
        if spi >= self.on_track {
            Color::rgb(0x4C, 0xAF, 0x50)
        } else if spi >= self.critical {
            Color::rgb(0xFF, 0x98, 0x00)
        } else {
            Color::ERROR
        }
    }
}

pub struct SpiChart {
    core: ComponentCore,
    config: SpiConfig,
}

impl SpiChart {
    pub fn new(core: ComponentCore) -> Self {
        let config = core.options().widget_config();
        Self { core, config }
    }
}

impl VisualizationComponent for SpiChart {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn draw(&self, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode> {
        match data.as_spi() {
            Some(spi) => draw_spi(&self.config, spi, size),
            None => Vec::new(),
        }
    }
}

fn draw_spi(config: &SpiConfig, data: &SpiData, size: SurfaceSize) -> Vec<SceneNode> {
    let mut scene = vec![
        title("Schedule Performance", Color::TEXT),
        SceneNode::Text {
            position: [size.width - 8.0, 16.0],
            content: format!("SPI {:.2}", data.current_spi),
            size: 16.0,
            color: config.status_color(data.current_spi),
            anchor: Anchor::End,
        },
    ];

    if data.spi_values.is_empty() {
        scene.push(empty_hint(size, "No SPI history"));
        return scene;
    }

    let area = PlotArea::below_title(size, 32.0);
    let peak = data.spi_values.iter().map(|point| point.spi).fold(0.0, f64::max);
    let ceiling = nice_ceiling(peak, 1.5);

    let baseline = (1.0 / ceiling) as f32;
    scene.push(SceneNode::Polyline {
        points: vec![area.point(0.0, baseline), area.point(1.0, baseline)],
        width: 1.0,
        color: config.baseline_color,
    });
    let [x, y] = area.point(0.0, baseline);
    scene.push(SceneNode::Text {
        position: [x - 4.0, y],
        content: "1.0".to_string(),
        size: 10.0,
        color: Color::MUTED,
        anchor: Anchor::End,
    });

    let steps = (data.spi_values.len() - 1).max(1) as f32;
    let points = data
        .spi_values
        .iter()
        .enumerate()
        .map(|(i, point)| area.point(i as f32 / steps, (point.spi.max(0.0) / ceiling) as f32))
        .collect();
    scene.push(SceneNode::Polyline { points, width: 2.0, color: config.line_color });

    scene
}
