//! Cumulative progress S-curve: actual, planned and forecast

use chrono::NaiveDate;
use ev_data::{DatePoint, MetricPayload, SCurveData};
use serde::Deserialize;

use super::{empty_hint, legend, title, PlotArea};
use crate::component::{ComponentCore, VisualizationComponent};
use crate::surface::{Anchor, Color, SceneNode, SurfaceSize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SCurveConfig {
    pub actual_color: Color,
    pub planned_color: Color,
    pub forecast_color: Color,
    pub show_forecast: bool,
    pub line_width: f32,
}

impl Default for SCurveConfig {
    fn default() -> Self {
        Self {
            actual_color: Color::rgb(0x4C, 0xAF, 0x50),
            planned_color: Color::rgb(0x21, 0x96, 0xF3),
            forecast_color: Color::rgb(0xFF, 0x98, 0x00),
            show_forecast: true,
            line_width: 2.0,
        }
    }
}

pub struct SCurveChart {
    core: ComponentCore,
    config: SCurveConfig,
}

impl SCurveChart {
    pub fn new(core: ComponentCore) -> Self {
        let config = core.options().widget_config();
        Self { core, config }
    }
}

impl VisualizationComponent for SCurveChart {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn draw(&self, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode> {
        match data.as_scurve() {
            Some(curve) => draw_scurve(&self.config, curve, size),
            None => Vec::new(),
        }
    }
}

fn parse_series(points: &[DatePoint]) -> Vec<(NaiveDate, f64)> {
    points
        .iter()
        .filter_map(|point| {
            NaiveDate::parse_from_str(&point.date, "%Y-%m-%d")
                .ok()
                .map(|date| (date, point.percentage))
        })
        .collect()
}

fn draw_scurve(config: &SCurveConfig, data: &SCurveData, size: SurfaceSize) -> Vec<SceneNode> {
    let mut scene = vec![title("S-Curve", Color::TEXT)];

    let mut series = vec![
        (parse_series(&data.planned), config.planned_color, "Planned"),
        (parse_series(&data.actual), config.actual_color, "Actual"),
    ];
    if config.show_forecast {
        series.push((parse_series(&data.forecast), config.forecast_color, "Forecast"));
    }

    let dates = series.iter().flat_map(|(points, _, _)| points.iter().map(|(date, _)| *date));
    let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
        scene.push(empty_hint(size, "No schedule data"));
        return scene;
    };
    let span = (last - first).num_days().max(1) as f32;

    let area = PlotArea::below_title(size, 32.0);
    for (tick, label) in [(0.0, "0%"), (0.5, "50%"), (1.0, "100%")] {
        let [x, y] = area.point(0.0, tick);
        scene.push(SceneNode::Text {
            position: [x - 4.0, y],
            content: label.to_string(),
            size: 10.0,
            color: Color::MUTED,
            anchor: Anchor::End,
        });
    }
    for (fx, date) in [(0.0, first), (1.0, last)] {
        let [x, y] = area.point(fx, 0.0);
        scene.push(SceneNode::Text {
            position: [x, y + 10.0],
            content: date.format("%b %d").to_string(),
            size: 10.0,
            color: Color::MUTED,
            anchor: if fx == 0.0 { Anchor::Start } else { Anchor::End },
        });
    }

    for (points, color, _) in &series {
        if points.len() < 2 {
            continue;
        }
        let points = points
            .iter()
            .map(|(date, percentage)| {
                let fx = (*date - first).num_days() as f32 / span;
                area.point(fx, (*percentage / 100.0) as f32)
            })
            .collect();
        scene.push(SceneNode::Polyline { points, width: config.line_width, color: *color });
    }

    let entries: Vec<(&str, Color)> = series.iter().map(|(_, color, label)| (*label, *color)).collect();
    scene.extend(legend(&area, &entries));
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, percentage: f64) -> DatePoint {
        DatePoint { date: date.to_string(), percentage }
    }

    fn polylines(scene: &[SceneNode]) -> Vec<&Vec<[f32; 2]>> {
        scene
            .iter()
            .filter_map(|node| match node {
                SceneNode::Polyline { points, .. } => Some(points),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_series_share_the_date_axis() {
        let data = SCurveData {
            actual: vec![point("2024-01-01", 0.0), point("2024-01-11", 20.0)],
            planned: vec![
                point("2024-01-01", 0.0),
                point("2024-01-11", 40.0),
                point("2024-01-21", 100.0),
            ],
            forecast: vec![point("2024-01-21", 50.0)],
        };
        let size = SurfaceSize::new(400.0, 300.0);
        let area = PlotArea::below_title(size, 32.0);
        let scene = draw_scurve(&SCurveConfig::default(), &data, size);

        // Single-point forecast has nothing to connect
        let lines = polylines(&scene);
        assert_eq!(lines.len(), 2);

        let planned = lines[0];
        assert_eq!(planned[0], area.point(0.0, 0.0));
        assert_eq!(planned[2], area.point(1.0, 1.0));

        let actual = lines[1];
        assert_eq!(actual[1], area.point(0.5, 0.2));
    }

    #[test]
    fn test_unparseable_dates_are_skipped() {
        let data = SCurveData {
            actual: vec![point("soon", 10.0)],
            planned: Vec::new(),
            forecast: Vec::new(),
        };
        let scene = draw_scurve(&SCurveConfig::default(), &data, SurfaceSize::new(300.0, 200.0));
        assert!(scene.iter().any(|node| node.as_text() == Some("No schedule data")));
    }
}
