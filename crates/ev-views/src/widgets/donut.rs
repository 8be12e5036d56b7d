//! Donut chart of overall earned-value progress

use ev_data::MetricPayload;
use serde::Deserialize;

use super::format_number;
use crate::component::{ComponentCore, VisualizationComponent};
use crate::surface::{Anchor, Color, SceneNode, SurfaceSize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DonutColors {
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
}

impl Default for DonutColors {
    fn default() -> Self {
        Self {
            primary: Color::rgb(0x4C, 0xAF, 0x50),
            secondary: Color::rgb(0xE0, 0xE0, 0xE0),
            text: Color::TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DonutConfig {
    /// Largest diameter; the ring shrinks to fit narrower surfaces
    pub size: f32,
    pub thickness: f32,
    pub colors: DonutColors,
    /// Show earned/budgeted hours under the ring
    pub show_details: bool,
}

impl Default for DonutConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            thickness: 30.0,
            colors: DonutColors::default(),
            show_details: true,
        }
    }
}

pub struct DonutChart {
    core: ComponentCore,
    config: DonutConfig,
}

impl DonutChart {
    pub fn new(core: ComponentCore) -> Self {
        let config = core.options().widget_config();
        Self { core, config }
    }

    pub fn config(&self) -> &DonutConfig {
        &self.config
    }
}

impl VisualizationComponent for DonutChart {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn draw(&self, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode> {
        draw_donut(&self.config, data, size)
    }
}

fn draw_donut(config: &DonutConfig, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode> {
    let Some(progress) = data.as_progress() else {
        return Vec::new();
    };

    let diameter = config.size.min(size.width).max(0.0);
    let scale = diameter / config.size.max(1.0);
    let thickness = config.thickness * scale;
    // Stroke runs along the middle of the ring
    let radius = (diameter - thickness) / 2.0;
    let center = [size.width / 2.0, diameter / 2.0];
    let sweep = (progress.percentage / 100.0).clamp(0.0, 1.0) as f32;

    let mut scene = vec![
        SceneNode::Ring {
            center,
            radius,
            thickness,
            color: config.colors.secondary,
        },
        SceneNode::Arc {
            center,
            radius,
            thickness,
            sweep,
            color: config.colors.primary,
        },
        SceneNode::text(
            [center[0], center[1] - 4.0 * scale],
            format!("{}%", progress.percentage.round() as i64),
            40.0 * scale,
            config.colors.text,
        ),
        SceneNode::text(
            [center[0], center[1] + 24.0 * scale],
            "Complete",
            14.0 * scale,
            config.colors.text,
        ),
    ];

    if config.show_details {
        let left = (size.width - diameter) / 2.0;
        let rows = [
            ("Earned Hours:", progress.earned),
            ("Budgeted Hours:", progress.budgeted),
        ];
        for (i, (label, value)) in rows.into_iter().enumerate() {
            let y = diameter + 18.0 + 18.0 * i as f32;
            scene.push(SceneNode::Text {
                position: [left, y],
                content: label.to_string(),
                size: 12.0,
                color: Color::MUTED,
                anchor: Anchor::Start,
            });
            scene.push(SceneNode::Text {
                position: [left + diameter, y],
                content: format_number(value),
                size: 12.0,
                color: config.colors.text,
                anchor: Anchor::End,
            });
        }
    }

    scene
}
