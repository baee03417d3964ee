use eframe::egui::{self, Color32, Event, Pos2, Sense, Stroke, StrokeKind};
use flowcanvas::{
    ContextTarget, CubicPath, InputEvent, Point, PointerButton, PointerKind, Rect,
    Selection, Size, Viewport, WireStatus,
};
use std::collections::BTreeMap;

use crate::actions::Action;
use crate::minimap_view;
use crate::node_card::{self, CardLook};
use crate::state::State;

const GRID_SPACING: f64 = 20.0;
const GRID_DOT: Color32 = Color32::from_rgb(52, 54, 62);
const BACKGROUND: Color32 = Color32::from_rgb(18, 19, 23);
const WIRE_DEFAULT: Color32 = Color32::from_rgb(120, 124, 134);
const WIRE_ACTIVE: Color32 = Color32::from_rgb(34, 197, 94);
const WIRE_LOCKED: Color32 = Color32::from_rgb(82, 84, 92);
const WIRE_SELECTED: Color32 = Color32::from_rgb(250, 204, 21);
const PENDING_WIRE: Color32 = Color32::from_rgb(100, 100, 255);
/// Pixels per wheel "line" when the platform reports lines.
const LINE_HEIGHT: f32 = 40.0;

/// Maps world coordinates onto the painted canvas area.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub origin: Pos2,
    pub viewport: Viewport,
}

impl Camera {
    pub fn to_screen(&self, world: Point) -> Pos2 {
        let s = self.viewport.world_to_screen(world);
        self.origin + egui::vec2(s.x as f32, s.y as f32)
    }

    /// Canvas-relative pixels as used by the interaction engine.
    pub fn local(&self, pos: Pos2) -> Point {
        Point::new((pos.x - self.origin.x) as f64, (pos.y - self.origin.y) as f64)
    }

    pub fn rect(&self, world: Rect) -> egui::Rect {
        egui::Rect::from_two_pos(
            self.to_screen(world.origin()),
            self.to_screen(Point::new(world.right(), world.bottom())),
        )
    }

    pub fn len(&self, world: f64) -> f32 {
        (world * self.viewport.zoom) as f32
    }
}

/// The infinite canvas: paints the graph and feeds raw input to the
/// interaction engine.
#[derive(Default)]
pub struct CanvasView {
    touches: BTreeMap<u64, Point>,
}

impl CanvasView {
    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut State) {
        let (rect, _response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let size = Size::new(rect.width() as f64, rect.height() as f64);
        if size != state.store.canvas_size {
            state.dispatch(Action::CanvasResized(size));
        }

        let camera = Camera {
            origin: rect.min,
            viewport: *state.store.viewport.get(),
        };
        self.collect_input(ui, rect, &camera, state);
        state.flush_actions();

        // Input may have moved the view; paint with the current one.
        let camera = Camera {
            origin: rect.min,
            viewport: *state.store.viewport.get(),
        };
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        paint_grid(&painter, rect, &camera);
        paint_groups(&painter, &camera, state);
        paint_wires(&painter, &camera, state);
        paint_nodes(&painter, &camera, state);
        minimap_view::show(ui, rect, state);
    }

    fn collect_input(&mut self, ui: &egui::Ui, rect: egui::Rect, camera: &Camera, state: &mut State) {
        let ctx = ui.ctx().clone();
        let layer = ui.layer_id();
        let on_canvas = |pos: Pos2| rect.contains(pos) && ctx.layer_id_at(pos) == Some(layer);

        let (events, time, touching, escape, delete) = ui.input(|i| {
            (
                i.events.clone(),
                i.time,
                i.any_touches(),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::Delete),
            )
        });
        let time_ms = (time * 1000.0) as u64;
        let kind = if touching {
            PointerKind::Touch
        } else {
            PointerKind::Mouse
        };
        let hovered = ui.rect_contains_pointer(rect);

        for event in events {
            match event {
                Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    ..
                } => {
                    let button = match button {
                        egui::PointerButton::Primary => PointerButton::Primary,
                        egui::PointerButton::Secondary => PointerButton::Secondary,
                        _ => continue,
                    };
                    if pressed {
                        if on_canvas(pos) {
                            state.dispatch(Action::Input(InputEvent::PointerDown {
                                pos: camera.local(pos),
                                button,
                                kind,
                                time_ms,
                            }));
                        }
                    } else if button == PointerButton::Primary {
                        state.dispatch(Action::Input(InputEvent::PointerUp {
                            pos: camera.local(pos),
                        }));
                    }
                }
                Event::PointerMoved(pos) => {
                    state.dispatch(Action::Input(InputEvent::PointerMove {
                        pos: camera.local(pos),
                        time_ms,
                    }));
                }
                Event::MouseWheel {
                    unit,
                    delta,
                    modifiers,
                    ..
                } if hovered => {
                    let delta = match unit {
                        egui::MouseWheelUnit::Point => delta,
                        egui::MouseWheelUnit::Line => delta * LINE_HEIGHT,
                        egui::MouseWheelUnit::Page => delta * rect.height(),
                    };
                    // egui reports content motion; the engine expects scroll direction.
                    state.dispatch(Action::Input(InputEvent::Wheel {
                        delta: Point::new(-delta.x as f64, -delta.y as f64),
                        zoom_modifier: modifiers.ctrl || modifiers.command,
                    }));
                }
                Event::Zoom(factor) if hovered => {
                    state.dispatch(Action::ZoomBy {
                        factor: factor as f64,
                    });
                }
                Event::Touch { id, phase, pos, .. } => {
                    self.touch(id.0, phase, camera.local(pos), state);
                }
                _ => {}
            }
        }

        if escape {
            state.dispatch(Action::Input(InputEvent::Escape));
        }
        // Text fields keep the key while they have focus.
        if delete && ctx.memory(|m| m.focused().is_none()) {
            state.dispatch(Action::DeleteSelection);
        }
        state.dispatch(Action::Input(InputEvent::Tick { time_ms }));
        if state.store.interaction.has_pending_press() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
    }

    fn touch(&mut self, id: u64, phase: egui::TouchPhase, pos: Point, state: &mut State) {
        let before = self.touches.len();
        match phase {
            egui::TouchPhase::Start | egui::TouchPhase::Move => {
                self.touches.insert(id, pos);
            }
            egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                self.touches.remove(&id);
            }
        }
        let mut points = self.touches.values();
        if let (Some(&a), Some(&b)) = (points.next(), points.next()) {
            state.dispatch(Action::Input(InputEvent::Pinch { a, b }));
        } else if before >= 2 {
            state.dispatch(Action::Input(InputEvent::TouchEnd));
        }
    }
}

//##########################################################
// Painting
//##########################################################

fn paint_grid(painter: &egui::Painter, rect: egui::Rect, camera: &Camera) {
    let step = camera.len(GRID_SPACING);
    if step < 6.0 {
        return;
    }
    let offset = egui::vec2(
        (camera.viewport.x as f32).rem_euclid(step),
        (camera.viewport.y as f32).rem_euclid(step),
    );
    let mut y = rect.top() + offset.y;
    while y < rect.bottom() {
        let mut x = rect.left() + offset.x;
        while x < rect.right() {
            painter.circle_filled(egui::pos2(x, y), 1.0, GRID_DOT);
            x += step;
        }
        y += step;
    }
}

fn paint_groups(painter: &egui::Painter, camera: &Camera, state: &State) {
    let store = &state.store;
    let metrics = &store.config.canvas.card;
    let selected = store.interaction.selection();
    for group in store.graph.groups() {
        let r = camera.rect(group.rect());
        let is_selected = selected == Some(&Selection::Group(group.id.clone()));
        painter.rect_filled(r, camera.len(12.0), parse_color(&group.color));
        let stroke = if is_selected {
            Stroke::new(2.0, Color32::WHITE)
        } else {
            Stroke::new(1.0, Color32::from_white_alpha(60))
        };
        painter.rect_stroke(r, camera.len(12.0), stroke, StrokeKind::Inside);

        let header = camera.rect(flowcanvas::hit::group_header_rect(group, metrics));
        let title = if group.pinned {
            format!("{} 📌", group.title)
        } else {
            group.title.clone()
        };
        painter.text(
            header.left_center() + egui::vec2(camera.len(12.0), 0.0),
            egui::Align2::LEFT_CENTER,
            title,
            egui::FontId::proportional(camera.len(16.0)),
            Color32::from_white_alpha(200),
        );
        let handle = camera.rect(flowcanvas::hit::group_resize_rect(group, metrics));
        painter.rect_filled(handle, 2.0, Color32::from_white_alpha(40));
    }
}

fn paint_wires(painter: &egui::Painter, camera: &Camera, state: &mut State) {
    let selected = match state.store.interaction.selection() {
        Some(Selection::Edge(id)) => Some(id.clone()),
        _ => None,
    };
    let width = camera.len(2.0).max(1.0);
    for route in state.cache.routes.get(&state.store) {
        let color = if selected.as_ref() == Some(&route.edge) {
            WIRE_SELECTED
        } else {
            match route.status {
                WireStatus::Default => WIRE_DEFAULT,
                WireStatus::Active => WIRE_ACTIVE,
                WireStatus::Locked => WIRE_LOCKED,
            }
        };
        paint_curve(painter, camera, &route.path, Stroke::new(width, color));
    }
    if let Some(path) = state.store.interaction.pending_wire() {
        paint_curve(painter, camera, &path, Stroke::new(width, PENDING_WIRE));
    }
}

fn paint_curve(painter: &egui::Painter, camera: &Camera, path: &CubicPath, stroke: Stroke) {
    let [a, b, c, d] = path.points().map(|p| camera.to_screen(p));
    painter.add(egui::epaint::CubicBezierShape::from_points_stroke(
        [a, b, c, d],
        false,
        Color32::TRANSPARENT,
        stroke,
    ));
}

fn paint_nodes(painter: &egui::Painter, camera: &Camera, state: &mut State) {
    let visible = camera.viewport.visible_world_rect(state.store.canvas_size);
    let locked = state.cache.locked.get(&state.store).clone();
    let store = &state.store;
    let selected = store.interaction.selection();
    let menu_node = match store.interaction.context_menu().map(|m| &m.target) {
        Some(ContextTarget::Node(id)) => Some(id),
        _ => None,
    };
    for node in store.graph.nodes() {
        if !visible.intersects(&node.rect()) {
            continue;
        }
        let look = CardLook {
            selected: selected == Some(&Selection::Node(node.id.clone()))
                || menu_node == Some(&node.id),
            locked: locked.contains(&node.id),
        };
        node_card::paint(painter, camera, node, look, &store.config.canvas.card);
    }
}

/// `rgba(r, g, b, a)`, `rgb(r, g, b)` or `#rrggbb`. Anything else paints
/// as a faint white.
pub fn parse_color(css: &str) -> Color32 {
    let fallback = Color32::from_white_alpha(25);
    let css = css.trim();
    if let Some(hex) = css.strip_prefix('#') {
        return match u32::from_str_radix(hex, 16) {
            Ok(v) if hex.len() == 6 => {
                Color32::from_rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
            }
            _ => fallback,
        };
    }
    let Some(args) = css
        .strip_prefix("rgba(")
        .or_else(|| css.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return fallback;
    };
    let parts: Vec<f32> = args
        .split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect();
    match parts.as_slice() {
        [r, g, b] => Color32::from_rgb(*r as u8, *g as u8, *b as u8),
        [r, g, b, a] => Color32::from_rgba_unmultiplied(
            *r as u8,
            *g as u8,
            *b as u8,
            (a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ),
        _ => fallback,
    }
}
