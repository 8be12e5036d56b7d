//! Earned vs budgeted quantities, one bar per discipline or unit

use ev_data::{MetricPayload, QuantityData, QuantityRow};
use serde::Deserialize;

use super::{empty_hint, format_number, title, PlotArea};
use crate::component::{ComponentCore, VisualizationComponent};
use crate::surface::{Anchor, Color, SceneNode, SurfaceSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityGrouping {
    Discipline,
    Unit,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuantityConfig {
    pub group_by: QuantityGrouping,
    pub budgeted_color: Color,
    pub earned_color: Color,
    /// Rows beyond this are dropped
    pub max_rows: usize,
}

impl Default for QuantityConfig {
    fn default() -> Self {
        Self {
            group_by: QuantityGrouping::Discipline,
            budgeted_color: Color::rgb(0xE0, 0xE0, 0xE0),
            earned_color: Color::rgb(0x4C, 0xAF, 0x50),
            max_rows: 8,
        }
    }
}

pub struct QuantityChart {
    core: ComponentCore,
    config: QuantityConfig,
}

impl QuantityChart {
    pub fn new(core: ComponentCore) -> Self {
        let config = core.options().widget_config();
        Self { core, config }
    }
}

impl VisualizationComponent for QuantityChart {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn draw(&self, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode> {
        match data.as_quantity() {
            Some(quantity) => draw_quantity(&self.config, quantity, size),
            None => Vec::new(),
        }
    }
}

fn draw_quantity(config: &QuantityConfig, data: &QuantityData, size: SurfaceSize) -> Vec<SceneNode> {
    let (heading, rows): (&str, &[QuantityRow]) = match config.group_by {
        QuantityGrouping::Discipline => ("Quantities by Discipline", data.by_discipline.as_slice()),
        QuantityGrouping::Unit => ("Quantities by Unit", data.by_unit.as_slice()),
    };
    let mut scene = vec![title(heading, Color::TEXT)];

    let rows = &rows[..rows.len().min(config.max_rows)];
    if rows.is_empty() {
        scene.push(empty_hint(size, "No quantities"));
        return scene;
    }

    let area = PlotArea::below_title(size, 96.0);
    let largest = rows.iter().map(|row| row.budgeted.max(row.earned)).fold(0.0, f64::max);
    let scale = if largest > 0.0 { area.width as f64 / largest } else { 0.0 };
    let band = area.height / rows.len() as f32;
    let bar_height = (band * 0.6).min(22.0);

    for (i, row) in rows.iter().enumerate() {
        let top = area.top + band * i as f32 + (band - bar_height) / 2.0;
        let middle = top + bar_height / 2.0;

        scene.push(SceneNode::Text {
            position: [area.left - 6.0, middle],
            content: row.label.clone(),
            size: 11.0,
            color: Color::TEXT,
            anchor: Anchor::End,
        });
        scene.push(SceneNode::Rect {
            min: [area.left, top],
            size: [(row.budgeted.max(0.0) * scale) as f32, bar_height],
            color: config.budgeted_color,
        });
        scene.push(SceneNode::Rect {
            min: [area.left, top],
            size: [(row.earned.max(0.0) * scale) as f32, bar_height],
            color: config.earned_color,
        });
        scene.push(SceneNode::Text {
            position: [area.left + area.width, middle],
            content: format!(
                "{} / {} ({:.0}%)",
                format_number(row.earned),
                format_number(row.budgeted),
                row.percentage
            ),
            size: 10.0,
            color: Color::MUTED,
            anchor: Anchor::End,
        });
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, budgeted: f64, earned: f64) -> QuantityRow {
        QuantityRow {
            label: label.to_string(),
            budgeted,
            earned,
            percentage: if budgeted > 0.0 { earned / budgeted * 100.0 } else { 0.0 },
        }
    }

    fn sample() -> QuantityData {
        QuantityData {
            by_discipline: vec![row("Civil", 400.0, 100.0), row("Piping", 200.0, 200.0)],
            by_unit: vec![row("LF", 50.0, 10.0)],
        }
    }

    #[test]
    fn test_bars_scale_to_largest_row() {
        let size = SurfaceSize::new(500.0, 200.0);
        let area = PlotArea::below_title(size, 96.0);
        let scene = draw_quantity(&QuantityConfig::default(), &sample(), size);

        let widths: Vec<f32> = scene
            .iter()
            .filter_map(|node| match node {
                SceneNode::Rect { size, .. } => Some(size[0]),
                _ => None,
            })
            .collect();
        assert_eq!(widths.len(), 4);
        assert!((widths[0] - area.width).abs() < 0.01);
        assert!((widths[1] - area.width / 4.0).abs() < 0.01);
        assert!(scene.iter().any(|node| node.as_text() == Some("200 / 200 (100%)")));
    }

    #[test]
    fn test_grouping_and_row_cap() {
        let size = SurfaceSize::new(500.0, 200.0);
        let config = QuantityConfig { group_by: QuantityGrouping::Unit, ..Default::default() };
        let scene = draw_quantity(&config, &sample(), size);
        assert!(scene.iter().any(|node| node.as_text() == Some("Quantities by Unit")));
        assert!(scene.iter().any(|node| node.as_text() == Some("LF")));

        let config = QuantityConfig { max_rows: 1, ..Default::default() };
        let scene = draw_quantity(&config, &sample(), size);
        assert!(!scene.iter().any(|node| node.as_text() == Some("Piping")));

        let parsed: QuantityConfig =
            serde_json::from_value(serde_json::json!({"group_by": "unit"})).unwrap();
        assert_eq!(parsed.group_by, QuantityGrouping::Unit);
    }
}
