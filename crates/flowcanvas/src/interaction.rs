//! Pointer-driven gesture state machine.
//!
//! Events carry screen positions relative to the canvas origin. A press
//! on the canvas or on a node body stays pending until the pointer moves
//! past a threshold, so plain clicks never enter a drag mode. Once a drag
//! runs, every move applies the delta since the previous move and then
//! resets the anchor.

use std::mem;
use tracing::debug;

use crate::config::CanvasConfig;
use crate::geometry::Point;
use crate::hit::{HitTarget, hit_test};
use crate::model::{EdgeId, GroupId, NodeId};
use crate::route::{self, CubicPath};
use crate::store::GraphStore;
use crate::viewport::Viewport;

//##########################################################
// Events and results
//##########################################################

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        pos: Point,
        button: PointerButton,
        kind: PointerKind,
        time_ms: u64,
    },
    PointerMove {
        pos: Point,
        time_ms: u64,
    },
    PointerUp {
        pos: Point,
    },
    /// Scroll delta in screen pixels. With the zoom modifier (ctrl/meta)
    /// the vertical component zooms instead of panning.
    Wheel {
        delta: Point,
        zoom_modifier: bool,
    },
    /// Current positions of two touch points. The first event of a
    /// gesture records the reference distance.
    Pinch {
        a: Point,
        b: Point,
    },
    TouchEnd,
    /// Clock for the long-press timer while the pointer rests.
    Tick {
        time_ms: u64,
    },
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragMode {
    Idle,
    PanningCanvas,
    DraggingNode {
        node: NodeId,
    },
    /// Members are captured when the drag starts and stay fixed for it.
    DraggingGroup {
        group: GroupId,
        captured: Vec<NodeId>,
    },
    ResizingNode {
        node: NodeId,
    },
    ResizingGroup {
        group: GroupId,
    },
    Connecting {
        source: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Node(NodeId),
    Group(GroupId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextTarget {
    Canvas,
    Node(NodeId),
    Group(GroupId),
    Edge(EdgeId),
}

impl From<HitTarget> for ContextTarget {
    fn from(hit: HitTarget) -> Self {
        match hit {
            HitTarget::OutputPin(id)
            | HitTarget::InputPin(id)
            | HitTarget::NodeResize(id)
            | HitTarget::NodeControl(id)
            | HitTarget::NodeBody(id) => ContextTarget::Node(id),
            HitTarget::Edge(id) => ContextTarget::Edge(id),
            HitTarget::GroupResize(id)
            | HitTarget::GroupHeader(id)
            | HitTarget::GroupBody(id) => ContextTarget::Group(id),
            HitTarget::Canvas => ContextTarget::Canvas,
        }
    }
}

/// An open context menu: where it appears and what it acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub screen: Point,
    pub world: Point,
    pub target: ContextTarget,
}

/// Things the embedding application reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    SelectionChanged(Option<Selection>),
    EdgeCreated(EdgeId),
    ContextMenuOpened(ContextMenu),
    MenusClosed,
    /// A press landed on a card's action strip.
    ControlPressed { node: NodeId, world: Point },
}

//##########################################################
// State
//##########################################################

#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Canvas,
    Node(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
struct PendingPress {
    what: Pending,
    origin: Point,
}

#[derive(Debug, Clone, PartialEq)]
struct LongPress {
    origin: Point,
    world: Point,
    started_ms: u64,
    target: ContextTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    start_distance: f64,
    start_zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Wire {
    from: Point,
    to: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    mode: DragMode,
    pending: Option<PendingPress>,
    last: Point,
    wire: Option<Wire>,
    selection: Option<Selection>,
    context_menu: Option<ContextMenu>,
    long_press: Option<LongPress>,
    pinch: Option<Pinch>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            mode: DragMode::Idle,
            pending: None,
            last: Point::ZERO,
            wire: None,
            selection: None,
            context_menu: None,
            long_press: None,
            pinch: None,
        }
    }

    pub fn mode(&self) -> &DragMode {
        &self.mode
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    /// True while a press is held but has not yet become a drag.
    pub fn has_pending_press(&self) -> bool {
        self.pending.is_some()
    }

    /// The wire following the pointer during a connect gesture.
    pub fn pending_wire(&self) -> Option<CubicPath> {
        self.wire.map(|w| route::pending_wire(w.from, w.to))
    }

    pub fn select(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    /// Drop references to elements that no longer exist in `store`.
    pub fn forget_missing(&mut self, store: &GraphStore) {
        let gone = match &self.selection {
            Some(Selection::Node(id)) => store.node(id).is_none(),
            Some(Selection::Group(id)) => store.group(id).is_none(),
            Some(Selection::Edge(id)) => store.edge(id).is_none(),
            None => false,
        };
        if gone {
            self.selection = None;
        }
        let menu_gone = match self.context_menu.as_ref().map(|m| &m.target) {
            Some(ContextTarget::Node(id)) => store.node(id).is_none(),
            Some(ContextTarget::Group(id)) => store.group(id).is_none(),
            Some(ContextTarget::Edge(id)) => store.edge(id).is_none(),
            _ => false,
        };
        if menu_gone {
            self.context_menu = None;
        }
    }

    /// Feed one input event. Store and viewport are mutated in place.
    pub fn handle(
        &mut self,
        event: InputEvent,
        store: &mut GraphStore,
        viewport: &mut Viewport,
        config: &CanvasConfig,
    ) -> Vec<Outcome> {
        let mut out = Vec::new();
        match event {
            InputEvent::PointerDown {
                pos,
                button: PointerButton::Primary,
                kind,
                time_ms,
            } => self.primary_down(pos, kind, time_ms, store, viewport, config, &mut out),
            InputEvent::PointerDown {
                pos,
                button: PointerButton::Secondary,
                ..
            } => {
                let world = viewport.screen_to_world(pos);
                let target = hit_test(store, world, &config.card, viewport.zoom);
                self.open_menu(pos, world, target.into(), &mut out);
            }
            InputEvent::PointerMove { pos, time_ms } => {
                self.check_long_press(Some(pos), time_ms, config, &mut out);
                self.pointer_move(pos, store, viewport, config);
            }
            InputEvent::PointerUp { pos } => self.pointer_up(pos, store, viewport, config, &mut out),
            InputEvent::Wheel {
                delta,
                zoom_modifier,
            } => {
                if zoom_modifier {
                    viewport.zoom_by(delta.y, config.wheel_sensitivity, &config.zoom);
                } else {
                    viewport.pan(-delta.x, -delta.y);
                }
            }
            InputEvent::Pinch { a, b } => {
                let distance = a.distance(b);
                match self.pinch {
                    None => {
                        self.reset_gesture();
                        self.pinch = Some(Pinch {
                            start_distance: distance,
                            start_zoom: viewport.zoom,
                        });
                    }
                    Some(p) if p.start_distance > 0.0 => {
                        viewport.set_zoom(p.start_zoom * distance / p.start_distance, &config.zoom);
                    }
                    Some(_) => {}
                }
            }
            InputEvent::TouchEnd => {
                self.reset_gesture();
                self.pinch = None;
            }
            InputEvent::Tick { time_ms } => self.check_long_press(None, time_ms, config, &mut out),
            InputEvent::Escape => {
                self.context_menu = None;
                out.push(Outcome::MenusClosed);
            }
        }
        out
    }

    fn reset_gesture(&mut self) {
        self.mode = DragMode::Idle;
        self.pending = None;
        self.wire = None;
        self.long_press = None;
    }

    fn set_selection(&mut self, selection: Option<Selection>, out: &mut Vec<Outcome>) {
        if self.selection != selection {
            self.selection = selection.clone();
            out.push(Outcome::SelectionChanged(selection));
        }
    }

    fn open_menu(
        &mut self,
        screen: Point,
        world: Point,
        target: ContextTarget,
        out: &mut Vec<Outcome>,
    ) {
        let menu = ContextMenu {
            screen,
            world,
            target,
        };
        debug!(target_kind = ?menu.target, "context menu opened");
        self.context_menu = Some(menu.clone());
        out.push(Outcome::ContextMenuOpened(menu));
    }

    #[allow(clippy::too_many_arguments)]
    fn primary_down(
        &mut self,
        pos: Point,
        kind: PointerKind,
        time_ms: u64,
        store: &GraphStore,
        viewport: &Viewport,
        config: &CanvasConfig,
        out: &mut Vec<Outcome>,
    ) {
        if self.context_menu.take().is_some() {
            out.push(Outcome::MenusClosed);
        }
        self.reset_gesture();
        self.last = pos;

        let world = viewport.screen_to_world(pos);
        let target = hit_test(store, world, &config.card, viewport.zoom);
        if kind == PointerKind::Touch {
            self.long_press = Some(LongPress {
                origin: pos,
                world,
                started_ms: time_ms,
                target: target.clone().into(),
            });
        }

        let node_pinned = |id: &NodeId| store.node(id).is_some_and(|n| n.pinned);
        let group_pinned = |id: &GroupId| store.group(id).is_some_and(|g| g.pinned);

        match target {
            HitTarget::Canvas | HitTarget::GroupBody(_) => {
                self.set_selection(None, out);
                self.pending = Some(PendingPress {
                    what: Pending::Canvas,
                    origin: pos,
                });
            }
            HitTarget::Edge(id) => {
                self.set_selection(Some(Selection::Edge(id)), out);
                self.pending = Some(PendingPress {
                    what: Pending::Canvas,
                    origin: pos,
                });
            }
            HitTarget::NodeBody(id) | HitTarget::InputPin(id) => {
                self.set_selection(Some(Selection::Node(id.clone())), out);
                if !node_pinned(&id) {
                    self.pending = Some(PendingPress {
                        what: Pending::Node(id),
                        origin: pos,
                    });
                }
            }
            HitTarget::NodeControl(id) => {
                self.set_selection(Some(Selection::Node(id.clone())), out);
                out.push(Outcome::ControlPressed { node: id, world });
            }
            HitTarget::NodeResize(id) => {
                self.set_selection(Some(Selection::Node(id.clone())), out);
                if !node_pinned(&id) {
                    debug!(node = %id, "resize node");
                    self.mode = DragMode::ResizingNode { node: id };
                }
            }
            HitTarget::OutputPin(id) => {
                if let Some(node) = store.node(&id) {
                    let from = route::output_anchor(node);
                    debug!(source = %id, "connect");
                    self.wire = Some(Wire { from, to: world });
                    self.mode = DragMode::Connecting { source: id };
                }
            }
            HitTarget::GroupHeader(id) => {
                self.set_selection(Some(Selection::Group(id.clone())), out);
                if !group_pinned(&id) {
                    let captured = store.nodes_in_group(&id);
                    debug!(group = %id, captured = captured.len(), "drag group");
                    self.mode = DragMode::DraggingGroup {
                        group: id,
                        captured,
                    };
                }
            }
            HitTarget::GroupResize(id) => {
                self.set_selection(Some(Selection::Group(id.clone())), out);
                if !group_pinned(&id) {
                    self.mode = DragMode::ResizingGroup { group: id };
                }
            }
        }
    }

    fn check_long_press(
        &mut self,
        pos: Option<Point>,
        time_ms: u64,
        config: &CanvasConfig,
        out: &mut Vec<Outcome>,
    ) {
        let Some(lp) = &self.long_press else {
            return;
        };
        if let Some(pos) = pos {
            let d = pos - lp.origin;
            if d.x.abs() > config.pan_threshold || d.y.abs() > config.pan_threshold {
                self.long_press = None;
                return;
            }
        }
        if time_ms.saturating_sub(lp.started_ms) >= config.long_press_ms {
            if let Some(lp) = self.long_press.take() {
                self.pending = None;
                self.open_menu(lp.origin, lp.world, lp.target, out);
            }
        }
    }

    fn pointer_move(
        &mut self,
        pos: Point,
        store: &mut GraphStore,
        viewport: &mut Viewport,
        config: &CanvasConfig,
    ) {
        if let Some(press) = &self.pending {
            let d = pos - press.origin;
            let threshold = match press.what {
                Pending::Canvas => config.pan_threshold,
                Pending::Node(_) => config.node_drag_threshold,
            };
            if d.x.abs() <= threshold && d.y.abs() <= threshold {
                return;
            }
            if let Some(press) = self.pending.take() {
                self.last = press.origin;
                self.mode = match press.what {
                    Pending::Canvas => DragMode::PanningCanvas,
                    Pending::Node(node) => DragMode::DraggingNode { node },
                };
                debug!(mode = ?self.mode, "drag started");
            }
        }

        let d = pos - self.last;
        self.last = pos;
        let world_d = d / viewport.zoom;
        let result = match &self.mode {
            DragMode::Idle => Ok(()),
            DragMode::PanningCanvas => {
                viewport.pan(d.x, d.y);
                Ok(())
            }
            DragMode::DraggingNode { node } => store.move_node(node, world_d),
            DragMode::DraggingGroup { group, captured } => {
                store.move_group(group, world_d, captured)
            }
            DragMode::ResizingNode { node } => store.resize_node(node, world_d),
            DragMode::ResizingGroup { group } => store.resize_group(group, world_d),
            DragMode::Connecting { .. } => {
                if let Some(wire) = &mut self.wire {
                    wire.to = viewport.screen_to_world(pos);
                }
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!(error = %e, "gesture target vanished");
        }
    }

    fn pointer_up(
        &mut self,
        pos: Point,
        store: &mut GraphStore,
        viewport: &Viewport,
        config: &CanvasConfig,
        out: &mut Vec<Outcome>,
    ) {
        let mode = mem::replace(&mut self.mode, DragMode::Idle);
        self.pending = None;
        self.wire = None;
        self.long_press = None;

        if let DragMode::Connecting { source } = mode {
            let world = viewport.screen_to_world(pos);
            match hit_test(store, world, &config.card, viewport.zoom) {
                HitTarget::InputPin(target) if target != source => {
                    match store.connect(&source, &target) {
                        Ok(edge) => out.push(Outcome::EdgeCreated(edge)),
                        Err(e) => debug!(error = %e, "connect rejected"),
                    }
                }
                _ => debug!(%source, "connect cancelled"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::model::{Node, NodeKind};

    fn setup() -> (GraphStore, Viewport, CanvasConfig) {
        let mut store = GraphStore::default();
        store
            .add_node(Node::new(
                NodeId::from("a"),
                NodeKind::Task,
                "A",
                Point::new(100.0, 100.0),
                Size::new(260.0, 180.0),
            ))
            .unwrap();
        (store, Viewport::default(), CanvasConfig::default())
    }

    fn down(pos: Point) -> InputEvent {
        InputEvent::PointerDown {
            pos,
            button: PointerButton::Primary,
            kind: PointerKind::Mouse,
            time_ms: 0,
        }
    }

    fn mv(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove {
            pos: Point::new(x, y),
            time_ms: 0,
        }
    }

    #[test]
    fn test_canvas_press_waits_for_threshold() {
        let (mut store, mut vp, cfg) = setup();
        let mut ix = Interaction::new();
        ix.handle(down(Point::new(600.0, 600.0)), &mut store, &mut vp, &cfg);
        ix.handle(mv(604.0, 603.0), &mut store, &mut vp, &cfg);
        assert_eq!(ix.mode(), &DragMode::Idle);
        assert_eq!(vp.x, 0.0);
        ix.handle(mv(610.0, 600.0), &mut store, &mut vp, &cfg);
        assert_eq!(ix.mode(), &DragMode::PanningCanvas);
        assert_eq!((vp.x, vp.y), (10.0, 0.0));
    }

    #[test]
    fn test_pinned_node_selects_but_never_drags() {
        let (mut store, mut vp, cfg) = setup();
        store.set_node_pinned(&NodeId::from("a"), true).unwrap();
        let mut ix = Interaction::new();
        ix.handle(down(Point::new(150.0, 150.0)), &mut store, &mut vp, &cfg);
        assert_eq!(ix.selection(), Some(&Selection::Node(NodeId::from("a"))));
        ix.handle(mv(400.0, 400.0), &mut store, &mut vp, &cfg);
        assert_eq!(ix.mode(), &DragMode::Idle);
        assert_eq!(store.node(&NodeId::from("a")).unwrap().position(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_wheel_pans_or_zooms() {
        let (mut store, mut vp, cfg) = setup();
        let mut ix = Interaction::new();
        ix.handle(
            InputEvent::Wheel {
                delta: Point::new(3.0, 40.0),
                zoom_modifier: false,
            },
            &mut store,
            &mut vp,
            &cfg,
        );
        assert_eq!((vp.x, vp.y, vp.zoom), (-3.0, -40.0, 1.0));
        ix.handle(
            InputEvent::Wheel {
                delta: Point::new(0.0, -500.0),
                zoom_modifier: true,
            },
            &mut store,
            &mut vp,
            &cfg,
        );
        assert!((vp.zoom - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_pinch_scales_from_start_zoom() {
        let (mut store, mut vp, cfg) = setup();
        let mut ix = Interaction::new();
        let pinch = |a: f64, b: f64| InputEvent::Pinch {
            a: Point::new(a, 0.0),
            b: Point::new(b, 0.0),
        };
        ix.handle(pinch(100.0, 200.0), &mut store, &mut vp, &cfg);
        ix.handle(pinch(50.0, 250.0), &mut store, &mut vp, &cfg);
        assert!((vp.zoom - 2.0).abs() < 1e-12);
        ix.handle(pinch(0.0, 1000.0), &mut store, &mut vp, &cfg);
        assert_eq!(vp.zoom, 3.0);
        ix.handle(InputEvent::TouchEnd, &mut store, &mut vp, &cfg);
        ix.handle(pinch(0.0, 100.0), &mut store, &mut vp, &cfg);
        assert_eq!(vp.zoom, 3.0);
    }

    #[test]
    fn test_long_press_opens_menu_unless_moved() {
        let (mut store, mut vp, cfg) = setup();
        let mut ix = Interaction::new();
        let touch = InputEvent::PointerDown {
            pos: Point::new(700.0, 700.0),
            button: PointerButton::Primary,
            kind: PointerKind::Touch,
            time_ms: 1_000,
        };
        ix.handle(touch.clone(), &mut store, &mut vp, &cfg);
        assert!(ix.handle(InputEvent::Tick { time_ms: 1_400 }, &mut store, &mut vp, &cfg).is_empty());
        let out = ix.handle(InputEvent::Tick { time_ms: 1_500 }, &mut store, &mut vp, &cfg);
        assert!(matches!(
            out.as_slice(),
            [Outcome::ContextMenuOpened(ContextMenu { target: ContextTarget::Canvas, .. })]
        ));
        assert!(!ix.has_pending_press());

        ix.handle(InputEvent::PointerUp { pos: Point::new(700.0, 700.0) }, &mut store, &mut vp, &cfg);
        ix.handle(touch, &mut store, &mut vp, &cfg);
        ix.handle(
            InputEvent::PointerMove { pos: Point::new(720.0, 700.0), time_ms: 1_100 },
            &mut store,
            &mut vp,
            &cfg,
        );
        let out = ix.handle(InputEvent::Tick { time_ms: 2_000 }, &mut store, &mut vp, &cfg);
        assert!(out.is_empty());
    }

    #[test]
    fn test_secondary_press_keeps_mode_and_carries_world_point() {
        let (mut store, mut vp, cfg) = setup();
        vp = Viewport::new(50.0, 0.0, 2.0);
        let mut ix = Interaction::new();
        let out = ix.handle(
            InputEvent::PointerDown {
                pos: Point::new(1050.0, 400.0),
                button: PointerButton::Secondary,
                kind: PointerKind::Mouse,
                time_ms: 0,
            },
            &mut store,
            &mut vp,
            &cfg,
        );
        assert_eq!(ix.mode(), &DragMode::Idle);
        let Some(Outcome::ContextMenuOpened(menu)) = out.first() else {
            panic!("expected a context menu, got {:?}", out);
        };
        assert_eq!(menu.world, Point::new(500.0, 200.0));
        assert_eq!(menu.target, ContextTarget::Canvas);
    }
}
