use crate::config::CardMetrics;
use crate::geometry::{Point, Rect};
use crate::model::{EdgeId, Group, GroupId, Node, NodeId};
use crate::route::{self, CubicPath};
use crate::store::GraphStore;

/// What lies under a world point, topmost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    OutputPin(NodeId),
    InputPin(NodeId),
    NodeResize(NodeId),
    /// The action strip of a card; presses there never start a drag.
    NodeControl(NodeId),
    NodeBody(NodeId),
    Edge(EdgeId),
    GroupResize(GroupId),
    GroupHeader(GroupId),
    GroupBody(GroupId),
    Canvas,
}

//##########################################################
// Card regions
//##########################################################

pub fn node_resize_rect(node: &Node, metrics: &CardMetrics) -> Rect {
    let s = metrics.resize_handle;
    Rect::new(node.x + node.width - s, node.y + node.height - s, s, s)
}

/// Bottom strip holding the card buttons. Cards whose kind cannot be
/// completed have none.
pub fn node_control_rect(node: &Node, metrics: &CardMetrics) -> Option<Rect> {
    if !node.kind.info().completable {
        return None;
    }
    let h = metrics.action_bar_height;
    Some(Rect::new(
        node.x,
        node.y + node.height - h,
        node.width - metrics.resize_handle,
        h,
    ))
}

pub fn group_header_rect(group: &Group, metrics: &CardMetrics) -> Rect {
    Rect::new(group.x, group.y, group.width, metrics.group_header_height)
}

pub fn group_resize_rect(group: &Group, metrics: &CardMetrics) -> Rect {
    let s = metrics.resize_handle;
    Rect::new(group.x + group.width - s, group.y + group.height - s, s, s)
}

//##########################################################
// Hit testing
//##########################################################

/// Resolve `world` against the same geometry the renderer draws. `zoom`
/// keeps the edge tolerance constant in screen pixels.
pub fn hit_test(store: &GraphStore, world: Point, metrics: &CardMetrics, zoom: f64) -> HitTarget {
    for node in store.nodes().iter().rev() {
        if let Some(target) = hit_node(node, world, metrics) {
            return target;
        }
    }

    let tolerance = metrics.edge_hit_tolerance / zoom.max(f64::EPSILON);
    for edge in store.edges().iter().rev() {
        let (Some(source), Some(target)) = (store.node(&edge.source), store.node(&edge.target))
        else {
            continue;
        };
        let path = CubicPath::between(route::output_anchor(source), route::input_anchor(target));
        if path.distance_to(world) <= tolerance {
            return HitTarget::Edge(edge.id.clone());
        }
    }

    for group in store.groups().iter().rev() {
        if group_resize_rect(group, metrics).contains(world) {
            return HitTarget::GroupResize(group.id.clone());
        }
        if group_header_rect(group, metrics).contains(world) {
            return HitTarget::GroupHeader(group.id.clone());
        }
        if group.rect().contains(world) {
            return HitTarget::GroupBody(group.id.clone());
        }
    }

    HitTarget::Canvas
}

fn hit_node(node: &Node, world: Point, metrics: &CardMetrics) -> Option<HitTarget> {
    let info = node.kind.info();
    if info.has_output && route::output_anchor(node).distance(world) <= metrics.pin_radius {
        return Some(HitTarget::OutputPin(node.id.clone()));
    }
    if info.has_input && route::input_anchor(node).distance(world) <= metrics.pin_radius {
        return Some(HitTarget::InputPin(node.id.clone()));
    }
    if !node.rect().contains(world) {
        return None;
    }
    if node_resize_rect(node, metrics).contains(world) {
        return Some(HitTarget::NodeResize(node.id.clone()));
    }
    if node_control_rect(node, metrics).is_some_and(|r| r.contains(world)) {
        return Some(HitTarget::NodeControl(node.id.clone()));
    }
    Some(HitTarget::NodeBody(node.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::model::NodeKind;

    fn store() -> GraphStore {
        let mut store = GraphStore::default();
        for (id, x, kind) in [("a", 0.0, NodeKind::Task), ("b", 600.0, NodeKind::Note)] {
            store
                .add_node(Node::new(
                    NodeId::from(id),
                    kind,
                    id,
                    Point::new(x, 0.0),
                    Size::new(260.0, 180.0),
                ))
                .unwrap();
        }
        store
            .add_group(Group::new(
                GroupId::from("g"),
                "G",
                Point::new(-100.0, 400.0),
                Size::new(400.0, 300.0),
            ))
            .unwrap();
        store.connect(&NodeId::from("a"), &NodeId::from("b")).unwrap();
        store
    }

    fn hit(store: &GraphStore, x: f64, y: f64) -> HitTarget {
        hit_test(store, Point::new(x, y), &CardMetrics::default(), 1.0)
    }

    #[test]
    fn test_regions_of_a_card() {
        let s = store();
        assert_eq!(hit(&s, 262.0, 90.0), HitTarget::OutputPin(NodeId::from("a")));
        assert_eq!(hit(&s, 0.0, 90.0), HitTarget::InputPin(NodeId::from("a")));
        assert_eq!(hit(&s, 255.0, 175.0), HitTarget::NodeResize(NodeId::from("a")));
        assert_eq!(hit(&s, 100.0, 170.0), HitTarget::NodeControl(NodeId::from("a")));
        assert_eq!(hit(&s, 100.0, 60.0), HitTarget::NodeBody(NodeId::from("a")));
    }

    #[test]
    fn test_note_has_no_controls_or_output() {
        let s = store();
        assert_eq!(hit(&s, 700.0, 170.0), HitTarget::NodeBody(NodeId::from("b")));
        assert_eq!(hit(&s, 862.0, 90.0), HitTarget::Canvas);
    }

    #[test]
    fn test_edges_and_groups() {
        let s = store();
        assert!(matches!(hit(&s, 430.0, 90.0), HitTarget::Edge(_)));
        assert_eq!(hit(&s, 0.0, 410.0), HitTarget::GroupHeader(GroupId::from("g")));
        assert_eq!(hit(&s, 0.0, 500.0), HitTarget::GroupBody(GroupId::from("g")));
        assert_eq!(hit(&s, 295.0, 695.0), HitTarget::GroupResize(GroupId::from("g")));
        assert_eq!(hit(&s, 2000.0, 2000.0), HitTarget::Canvas);
    }
}
