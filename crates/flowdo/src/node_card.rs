use eframe::egui::{self, Align2, Color32, FontId, Stroke, StrokeKind};
use flowcanvas::hit::{node_control_rect, node_resize_rect};
use flowcanvas::route::{input_anchor, output_anchor};
use flowcanvas::{CardMetrics, Node, NodeKind, Point, Rect};

use crate::canvas_view::Camera;

/// Buttons on a card's action strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardControl {
    Attach,
    Ai,
    Complete,
}

/// Width of the attach and AI buttons, in world units.
const ICON_BUTTON: f64 = 32.0;
/// Width of the completion toggle at the right end of the strip.
const COMPLETE_BUTTON: f64 = 100.0;

const CARD_FILL: Color32 = Color32::from_rgb(28, 30, 36);
const TEXT: Color32 = Color32::from_rgb(220, 222, 228);
const MUTED: Color32 = Color32::from_rgb(140, 144, 152);
const DONE: Color32 = Color32::from_rgb(34, 197, 94);
const WRONG: Color32 = Color32::from_rgb(239, 68, 68);
const SELECTED: Color32 = Color32::from_rgb(250, 250, 250);

/// Button rectangles of the action strip, left to right.
pub fn control_rects(node: &Node, metrics: &CardMetrics) -> Vec<(CardControl, Rect)> {
    let Some(strip) = node_control_rect(node, metrics) else {
        return Vec::new();
    };
    let complete_w = COMPLETE_BUTTON.min(strip.width);
    let mut rects = vec![(
        CardControl::Complete,
        Rect::new(strip.right() - complete_w, strip.y, complete_w, strip.height),
    )];
    for (i, control) in [CardControl::Attach, CardControl::Ai].into_iter().enumerate() {
        let x = strip.x + i as f64 * ICON_BUTTON;
        if x + ICON_BUTTON <= strip.right() - complete_w {
            rects.push((control, Rect::new(x, strip.y, ICON_BUTTON, strip.height)));
        }
    }
    rects
}

/// Which button, if any, lies under `world`.
pub fn control_at(node: &Node, world: Point, metrics: &CardMetrics) -> Option<CardControl> {
    control_rects(node, metrics)
        .into_iter()
        .find(|(_, r)| r.contains(world))
        .map(|(c, _)| c)
}

pub fn kind_color(kind: NodeKind) -> Color32 {
    let c = kind.info().color;
    Color32::from_rgb((c >> 16) as u8, (c >> 8) as u8, c as u8)
}

//##########################################################
// Painting
//##########################################################

pub struct CardLook {
    pub selected: bool,
    pub locked: bool,
}

pub fn paint(
    painter: &egui::Painter,
    camera: &Camera,
    node: &Node,
    look: CardLook,
    metrics: &CardMetrics,
) {
    let rect = camera.rect(node.rect());
    let radius = camera.len(8.0);
    let accent = kind_color(node.kind);
    let alpha = if look.locked { 0.55 } else { 1.0 };

    painter.rect_filled(rect, radius, CARD_FILL.gamma_multiply(alpha));
    let border = if look.selected {
        Stroke::new(2.5, SELECTED)
    } else {
        Stroke::new(1.5, accent.gamma_multiply(alpha))
    };
    painter.rect_stroke(rect, radius, border, StrokeKind::Inside);

    let text_visible = camera.len(1.0) > 0.3;
    let painter = painter.with_clip_rect(rect.intersect(painter.clip_rect()));
    let pad = camera.len(12.0);
    let header_font = FontId::proportional(camera.len(15.0));
    let body_font = FontId::proportional(camera.len(13.0));

    if text_visible {
        let mut header = format!("{} {}", node.kind.info().icon, node.title);
        if look.locked {
            header.insert_str(0, "🔒 ");
        }
        if node.pinned {
            header.push_str(" 📌");
        }
        painter.text(
            rect.left_top() + egui::vec2(pad, pad),
            Align2::LEFT_TOP,
            header,
            header_font,
            if node.completed { DONE } else { TEXT },
        );

        let body_top = rect.top() + pad * 3.0;
        let wrap = (rect.width() - 2.0 * pad).max(1.0);
        let galley = painter.layout(body_text(node), body_font.clone(), MUTED, wrap);
        painter.galley(egui::pos2(rect.left() + pad, body_top), galley, MUTED);

        if !node.data.attachments.is_empty() {
            painter.text(
                rect.right_top() + egui::vec2(-pad, pad),
                Align2::RIGHT_TOP,
                format!("📎 {}", node.data.attachments.len()),
                body_font.clone(),
                MUTED,
            );
        }
        paint_controls(&painter, camera, node, &look, metrics, body_font);
    }

    let info = node.kind.info();
    let pin = camera.len(metrics.pin_radius) as f32;
    if info.has_input {
        painter.circle_filled(camera.to_screen(input_anchor(node)), pin, accent);
    }
    if info.has_output {
        painter.circle_filled(camera.to_screen(output_anchor(node)), pin, accent);
    }

    let handle = camera.rect(node_resize_rect(node, metrics));
    painter.add(egui::Shape::convex_polygon(
        vec![handle.right_top(), handle.right_bottom(), handle.left_bottom()],
        accent.gamma_multiply(0.6),
        Stroke::NONE,
    ));
}

fn body_text(node: &Node) -> String {
    let d = &node.data;
    let mut text = match node.kind {
        NodeKind::Flashcard => {
            let (side, content) = if d.is_flipped {
                ("Back", d.back.as_deref())
            } else {
                ("Front", d.front.as_deref())
            };
            format!("{side}: {}", content.unwrap_or_default())
        }
        _ => d.label.clone(),
    };
    if let Some(options) = &d.quiz_options {
        for option in options {
            let mark = if d.user_selected_answer.as_ref() == Some(option) {
                "●"
            } else {
                "○"
            };
            text.push_str(&format!("\n{mark} {option}"));
        }
    }
    if let Some(insight) = &d.ai_insight {
        text.push_str(&format!("\n\n✨ {}", insight.summary));
    }
    text
}

fn paint_controls(
    painter: &egui::Painter,
    camera: &Camera,
    node: &Node,
    look: &CardLook,
    metrics: &CardMetrics,
    font: FontId,
) {
    for (control, world) in control_rects(node, metrics) {
        let r = camera.rect(world);
        let (label, color) = match control {
            CardControl::Attach => ("📎".to_string(), MUTED),
            CardControl::Ai => ("✨".to_string(), MUTED),
            CardControl::Complete if look.locked => ("Locked".to_string(), MUTED),
            CardControl::Complete if node.completed => ("✔ Done".to_string(), DONE),
            CardControl::Complete => ("Complete".to_string(), TEXT),
        };
        painter.text(r.center(), Align2::CENTER_CENTER, label, font.clone(), color);
    }
    if let Some(answer) = node.data.user_selected_answer.as_ref()
        && let Some(correct) = node.data.correct_answer.as_ref()
        && let Some(strip) = node_control_rect(node, metrics)
    {
        let r = camera.rect(strip);
        let (label, color) = if answer == correct {
            ("Correct", DONE)
        } else {
            ("Try again", WRONG)
        };
        painter.text(
            egui::pos2(r.center().x, r.top()),
            Align2::CENTER_BOTTOM,
            label,
            font,
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcanvas::{NodeId, Size};
    use rstest::rstest;

    fn node(kind: NodeKind) -> Node {
        Node::new(
            NodeId::from("n"),
            kind,
            "Card",
            Point::new(100.0, 300.0),
            Size::new(260.0, 160.0),
        )
    }

    #[rstest]
    #[case(Point::new(110.0, 440.0), Some(CardControl::Attach))]
    #[case(Point::new(140.0, 440.0), Some(CardControl::Ai))]
    #[case(Point::new(200.0, 440.0), None)]
    #[case(Point::new(300.0, 440.0), Some(CardControl::Complete))]
    #[case(Point::new(300.0, 400.0), None)]
    fn test_strip_buttons(#[case] world: Point, #[case] expected: Option<CardControl>) {
        let n = node(NodeKind::Task);
        assert_eq!(control_at(&n, world, &CardMetrics::default()), expected);
    }

    #[test]
    fn test_notes_have_no_strip() {
        let n = node(NodeKind::Note);
        assert!(control_rects(&n, &CardMetrics::default()).is_empty());
    }

    #[test]
    fn test_flashcard_shows_current_side() {
        let mut n = node(NodeKind::Flashcard);
        n.data.front = Some("F=?".into());
        n.data.back = Some("ma".into());
        assert_eq!(body_text(&n), "Front: F=?");
        n.data.is_flipped = true;
        assert_eq!(body_text(&n), "Back: ma");
    }
}
