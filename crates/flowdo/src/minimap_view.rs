use eframe::egui::{self, Color32, Sense, Stroke, StrokeKind};
use flowcanvas::Point;

use crate::actions::Action;
use crate::node_card::kind_color;
use crate::state::State;

const MARGIN: f32 = 16.0;

/// Overview in the bottom-right corner of the canvas. Clicking or
/// dragging in it recenters the main view.
pub fn show(ui: &egui::Ui, canvas: egui::Rect, state: &mut State) {
    let Some(projection) = *state.cache.minimap.get(&state.store) else {
        return;
    };
    let size = projection.size();
    let extent = egui::vec2(size.width as f32, size.height as f32);
    let origin = canvas.right_bottom() - extent - egui::vec2(MARGIN, MARGIN);

    egui::Area::new(egui::Id::new("minimap"))
        .order(egui::Order::Foreground)
        .fixed_pos(origin)
        .show(ui.ctx(), |ui| {
            let (rect, response) = ui.allocate_exact_size(extent, Sense::click_and_drag());
            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 6.0, Color32::from_black_alpha(200));
            painter.rect_stroke(
                rect,
                6.0,
                Stroke::new(1.0, Color32::from_white_alpha(40)),
                StrokeKind::Inside,
            );

            let to_screen = |r: flowcanvas::Rect| {
                egui::Rect::from_min_size(
                    rect.min + egui::vec2(r.x as f32, r.y as f32),
                    egui::vec2(r.width as f32, r.height as f32),
                )
            };
            for node in state.store.graph.nodes() {
                let r = to_screen(projection.project_rect(node.rect()));
                painter.rect_filled(r, 1.0, kind_color(node.kind).gamma_multiply(0.8));
            }
            let view = projection.viewport_rect(state.store.viewport.get(), state.store.canvas_size);
            painter.rect_stroke(
                to_screen(view),
                0.0,
                Stroke::new(1.5, Color32::from_rgb(250, 204, 21)),
                StrokeKind::Middle,
            );

            if (response.clicked() || response.dragged())
                && let Some(pos) = response.interact_pointer_pos()
            {
                let local = pos - rect.min;
                state.dispatch(Action::MinimapClicked(Point::new(local.x as f64, local.y as f64)));
            }
        });
}
