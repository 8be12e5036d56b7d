//! Paint widget surfaces with the egui painter

use std::f32::consts::TAU;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui};
use ev_views::{Anchor, Color, SceneNode, Surface, SurfaceSnapshot};

/// Line segments per full circle when approximating arcs
const ARC_SEGMENTS: usize = 96;

fn color32(color: Color) -> Color32 {
    let [r, g, b, a] = color.0;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn align(anchor: Anchor) -> Align2 {
    match anchor {
        Anchor::Start => Align2::LEFT_CENTER,
        Anchor::Middle => Align2::CENTER_CENTER,
        Anchor::End => Align2::RIGHT_CENTER,
    }
}

/// Points along a clockwise arc starting at 12 o'clock
fn arc_points(center: Pos2, radius: f32, sweep: f32) -> Vec<Pos2> {
    let sweep = sweep.clamp(0.0, 1.0);
    let segments = ((ARC_SEGMENTS as f32 * sweep).ceil() as usize).max(1);
    (0..=segments)
        .map(|i| {
            let angle = TAU * sweep * i as f32 / segments as f32 - TAU / 4.0;
            Pos2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

fn paint_node(painter: &egui::Painter, origin: Pos2, node: &SceneNode) {
    let at = |[x, y]: [f32; 2]| Pos2::new(origin.x + x, origin.y + y);

    match node {
        SceneNode::Ring { center, radius, thickness, color } => {
            painter.circle_stroke(at(*center), *radius, Stroke::new(*thickness, color32(*color)));
        }
        SceneNode::Arc { center, radius, thickness, sweep, color } => {
            if *sweep > 0.0 {
                let points = arc_points(at(*center), *radius, *sweep);
                painter.add(Shape::line(points, Stroke::new(*thickness, color32(*color))));
            }
        }
        SceneNode::Text { position, content, size, color, anchor } => {
            painter.text(
                at(*position),
                align(*anchor),
                content,
                FontId::proportional(size.max(1.0)),
                color32(*color),
            );
        }
        SceneNode::Rect { min, size, color } => {
            let rect = Rect::from_min_size(at(*min), egui::vec2(size[0], size[1]));
            painter.rect_filled(rect, 0.0, color32(*color));
        }
        SceneNode::Polyline { points, width, color } => {
            let points = points.iter().map(|p| at(*p)).collect();
            painter.add(Shape::line(points, Stroke::new(*width, color32(*color))));
        }
    }
}

fn paint_affordances(painter: &egui::Painter, rect: Rect, snapshot: &SurfaceSnapshot) {
    if snapshot.loading {
        painter.rect_filled(rect, 4.0, Color32::from_white_alpha(160));
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Loading...",
            FontId::proportional(14.0),
            Color32::DARK_GRAY,
        );
    }

    if let Some(message) = &snapshot.error {
        let banner = Rect::from_min_size(
            rect.left_bottom() - egui::vec2(0.0, 28.0),
            egui::vec2(rect.width(), 28.0),
        );
        painter.rect_filled(banner, 0.0, Color32::from_rgb(253, 236, 234));
        painter.text(
            banner.left_center() + egui::vec2(8.0, 0.0),
            Align2::LEFT_CENTER,
            message,
            FontId::proportional(12.0),
            color32(Color::ERROR),
        );
    }
}

/// Allocate space for `surface` and paint its current contents
pub fn surface(ui: &mut Ui, mount: &Surface) {
    let snapshot = mount.snapshot();
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(snapshot.size.width, snapshot.size.height),
        Sense::hover(),
    );
    if !ui.is_rect_visible(rect) {
        return;
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 4.0, Color32::WHITE);
    painter.rect_stroke(rect, 4.0, Stroke::new(1.0, Color32::from_gray(220)));

    for node in &snapshot.scene {
        paint_node(&painter, rect.min, node);
    }
    paint_affordances(&painter, rect, &snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_starts_at_top_and_runs_clockwise() {
        let points = arc_points(Pos2::new(0.0, 0.0), 10.0, 0.25);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!(first.x.abs() < 1e-4 && (first.y + 10.0).abs() < 1e-4);
        assert!((last.x - 10.0).abs() < 1e-4 && last.y.abs() < 1e-4);
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(color32(Color::rgb(0x4C, 0xAF, 0x50)), Color32::from_rgb(0x4C, 0xAF, 0x50));
    }
}
