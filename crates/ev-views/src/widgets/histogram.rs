//! Weekly progress histogram with a cumulative overlay

use ev_data::{HistogramData, MetricPayload, WeekPoint};
use serde::Deserialize;

use super::{empty_hint, legend, nice_ceiling, title, PlotArea};
use crate::component::{ComponentCore, VisualizationComponent};
use crate::surface::{Anchor, Color, SceneNode, SurfaceSize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub actual_color: Color,
    pub planned_color: Color,
    pub cumulative_color: Color,
    pub show_planned: bool,
    /// Overlay cumulative actual progress on a 0-100% scale
    pub show_cumulative: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            actual_color: Color::rgb(0x4C, 0xAF, 0x50),
            planned_color: Color::rgb(0x90, 0xCA, 0xF9),
            cumulative_color: Color::rgb(0xFF, 0x98, 0x00),
            show_planned: true,
            show_cumulative: true,
        }
    }
}

pub struct HistogramChart {
    core: ComponentCore,
    config: HistogramConfig,
}

impl HistogramChart {
    pub fn new(core: ComponentCore) -> Self {
        let config = core.options().widget_config();
        Self { core, config }
    }
}

impl VisualizationComponent for HistogramChart {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn draw(&self, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode> {
        match data.as_histogram() {
            Some(histogram) => draw_histogram(&self.config, histogram, size),
            None => Vec::new(),
        }
    }
}

fn draw_histogram(config: &HistogramConfig, data: &HistogramData, size: SurfaceSize) -> Vec<SceneNode> {
    let mut scene = vec![title("Weekly Progress", Color::TEXT)];

    let weeks = data.weekly.actual.len().max(data.weekly.planned.len());
    if weeks == 0 {
        scene.push(empty_hint(size, "No progress recorded"));
        return scene;
    }

    let area = PlotArea::below_title(size, 28.0);
    let peak = data
        .weekly
        .actual
        .iter()
        .chain(config.show_planned.then_some(&data.weekly.planned).into_iter().flatten())
        .map(|point| point.progress)
        .fold(0.0, f64::max);
    let ceiling = nice_ceiling(peak, 1.0);

    scene.push(SceneNode::Text {
        position: [area.left - 4.0, area.top],
        content: format!("{ceiling}%"),
        size: 10.0,
        color: Color::MUTED,
        anchor: Anchor::End,
    });

    let slot = area.width / weeks as f32;
    let mut series: Vec<(&[WeekPoint], Color)> =
        vec![(data.weekly.actual.as_slice(), config.actual_color)];
    if config.show_planned {
        series.push((data.weekly.planned.as_slice(), config.planned_color));
    }
    let bar_width = (slot * 0.8) / series.len() as f32;

    for (offset, (points, color)) in series.iter().enumerate() {
        for (week, point) in points.iter().enumerate() {
            let height = (point.progress.max(0.0) / ceiling) as f32 * area.height;
            let x = area.left + slot * week as f32 + slot * 0.1 + bar_width * offset as f32;
            scene.push(SceneNode::Rect {
                min: [x, area.bottom() - height],
                size: [bar_width, height],
                color: *color,
            });
        }
    }

    if config.show_cumulative && !data.cumulative.actual.is_empty() {
        let points = data
            .cumulative
            .actual
            .iter()
            .enumerate()
            .map(|(week, point)| {
                let fx = (week as f32 + 0.5) / weeks as f32;
                area.point(fx, (point.progress / 100.0) as f32)
            })
            .collect();
        scene.push(SceneNode::Polyline { points, width: 2.0, color: config.cumulative_color });
    }

    let mut entries = vec![("Actual", config.actual_color)];
    if config.show_planned {
        entries.push(("Planned", config.planned_color));
    }
    if config.show_cumulative {
        entries.push(("Cumulative", config.cumulative_color));
    }
    scene.extend(legend(&area, &entries));
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use ev_data::SeriesPair;

    fn week(label: &str, progress: f64) -> WeekPoint {
        WeekPoint { week: label.to_string(), progress }
    }

    fn sample() -> HistogramData {
        HistogramData {
            weekly: SeriesPair {
                actual: vec![week("W1", 10.0), week("W2", 20.0)],
                planned: vec![week("W1", 15.0), week("W2", 15.0)],
            },
            cumulative: SeriesPair {
                actual: vec![week("W1", 10.0), week("W2", 30.0)],
                planned: vec![week("W1", 15.0), week("W2", 30.0)],
            },
        }
    }

    fn bars(scene: &[SceneNode]) -> usize {
        scene
            .iter()
            .filter(|node| matches!(node, SceneNode::Rect { size, .. } if size[0] > 8.0))
            .count()
    }

    #[test]
    fn test_bars_per_series() {
        let size = SurfaceSize::new(400.0, 240.0);
        let scene = draw_histogram(&HistogramConfig::default(), &sample(), size);
        assert_eq!(bars(&scene), 4);
        assert!(scene.iter().any(|node| matches!(node, SceneNode::Polyline { points, .. } if points.len() == 2)));

        let config = HistogramConfig { show_planned: false, show_cumulative: false, ..Default::default() };
        let scene = draw_histogram(&config, &sample(), size);
        assert_eq!(bars(&scene), 2);
        assert!(!scene.iter().any(|node| matches!(node, SceneNode::Polyline { .. })));
    }

    #[test]
    fn test_tallest_bar_fits_area() {
        let size = SurfaceSize::new(400.0, 240.0);
        let area = PlotArea::below_title(size, 28.0);
        let scene = draw_histogram(&HistogramConfig::default(), &sample(), size);
        for node in &scene {
            if let SceneNode::Rect { min, size, .. } = node {
                if size[0] > 8.0 {
                    assert!(min[1] >= area.top - 0.01);
                    assert!(size[1] <= area.height + 0.01);
                }
            }
        }
    }

    #[test]
    fn test_empty_data_shows_hint() {
        let scene = draw_histogram(
            &HistogramConfig::default(),
            &HistogramData::default(),
            SurfaceSize::new(300.0, 200.0),
        );
        assert!(scene.iter().any(|node| node.as_text() == Some("No progress recorded")));
    }
}
