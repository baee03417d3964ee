//! Turning generator output into graph batches.

use flowcanvas::{
    Batch, CanvasConfig, Edge, EdgeId, Group, GroupId, GraphStore, Node, NodeId,
    NodeKind, Point, Size, Viewport,
};
use std::collections::{HashMap, HashSet};

use crate::ai::{FlowStep, Operation};

/// Horizontal gap between a node and the column of its generated children.
const CHILD_GAP: f64 = 100.0;
/// Vertical pitch of generated children.
const CHILD_PITCH: f64 = 200.0;
/// Pitch used when centering the child column on the source.
const CHILD_CENTERING_PITCH: f64 = 180.0;
const FLOW_PITCH: f64 = 240.0;
const FLOW_STAGGER: f64 = 50.0;
/// Offset of a generated flow from the top-left of the visible canvas.
const FLOW_ORIGIN: Point = Point::new(400.0, 200.0);

/// One node per item in a column right of `source`, each wired from it.
pub fn child_batch(
    store: &mut GraphStore,
    source: &Node,
    operation: Operation,
    items: &[String],
    config: &CanvasConfig,
) -> Batch {
    let n = items.len() as f64;
    let start = Point::new(
        source.x + source.width + CHILD_GAP,
        source.y - ((n - 1.0).max(0.0) * CHILD_CENTERING_PITCH) / 2.0,
    );
    let mut batch = Batch::default();
    for (i, item) in items.iter().enumerate() {
        let id = NodeId::new(store.next_id("ai"));
        batch.nodes.push(
            Node::new(
                id.clone(),
                operation.child_kind(),
                operation.child_title(),
                Point::new(start.x, start.y + i as f64 * CHILD_PITCH),
                config.default_node_size,
            )
            .with_label(item.clone()),
        );
        batch.edges.push(Edge {
            id: EdgeId::new(store.next_id("e")),
            source: source.id.clone(),
            target: id,
        });
    }
    batch
}

/// A staggered column of steps below the top-left of the visible canvas,
/// dependency edges between them, and a group titled `topic` around it.
///
/// Unknown step types become lectures; dependencies on missing steps,
/// self references and repeats are dropped.
pub fn flow_batch(
    store: &mut GraphStore,
    topic: &str,
    steps: &[FlowStep],
    viewport: &Viewport,
    config: &CanvasConfig,
) -> Batch {
    let origin = Point::new(-viewport.x, -viewport.y) + FLOW_ORIGIN;
    let ids: HashMap<u32, NodeId> = steps
        .iter()
        .map(|s| (s.id, NodeId::new(store.next_id("gen"))))
        .collect();

    let mut batch = Batch::default();
    let mut seen = HashSet::new();
    for (i, step) in steps.iter().enumerate() {
        let Some(id) = ids.get(&step.id) else {
            continue;
        };
        if batch.nodes.iter().any(|n| &n.id == id) {
            continue;
        }
        let stagger = if i % 2 == 0 { 0.0 } else { FLOW_STAGGER };
        let title = if step.title.trim().is_empty() {
            "Step"
        } else {
            step.title.as_str()
        };
        batch.nodes.push(
            Node::new(
                id.clone(),
                NodeKind::parse(&step.kind).unwrap_or(NodeKind::Lecture),
                title,
                Point::new(origin.x + stagger, origin.y + i as f64 * FLOW_PITCH),
                config.default_node_size,
            )
            .with_label(step.description.clone()),
        );
        for dep in &step.depends_on {
            let Some(source) = ids.get(dep) else {
                continue;
            };
            if source == id || !seen.insert((source.clone(), id.clone())) {
                continue;
            }
            batch.edges.push(Edge {
                id: EdgeId::new(store.next_id("e")),
                source: source.clone(),
                target: id.clone(),
            });
        }
    }

    batch.groups.push(Group::new(
        GroupId::new(store.next_id("g")),
        topic,
        origin - Point::new(50.0, 80.0),
        Size::new(
            config.default_node_size.width + 150.0,
            steps.len() as f64 * FLOW_PITCH + 100.0,
        ),
    ));
    batch
}
