use std::collections::HashMap;

use crate::geometry::Point;
use crate::lock;
use crate::model::{Edge, EdgeId, Node, NodeId};

/// Minimum horizontal offset of the control points, in world units.
const MIN_CONTROL_OFFSET: f64 = 50.0;

/// Where incoming wires attach: vertical midpoint of the left edge.
pub fn input_anchor(node: &Node) -> Point {
    Point::new(node.x, node.y + node.height / 2.0)
}

/// Where outgoing wires leave: vertical midpoint of the right edge.
pub fn output_anchor(node: &Node) -> Point {
    Point::new(node.x + node.width, node.y + node.height / 2.0)
}

//##########################################################
// Curve
//##########################################################

/// Cubic Bezier from an output anchor to an input anchor, with both
/// control points offset horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicPath {
    pub from: Point,
    pub c1: Point,
    pub c2: Point,
    pub to: Point,
}

impl CubicPath {
    pub fn between(from: Point, to: Point) -> Self {
        let offset = ((to.x - from.x).abs() * 0.5).max(MIN_CONTROL_OFFSET);
        Self {
            from,
            c1: Point::new(from.x + offset, from.y),
            c2: Point::new(to.x - offset, to.y),
            to,
        }
    }

    pub fn points(&self) -> [Point; 4] {
        [self.from, self.c1, self.c2, self.to]
    }

    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        self.from * (u * u * u)
            + self.c1 * (3.0 * u * u * t)
            + self.c2 * (3.0 * u * t * t)
            + self.to * (t * t * t)
    }

    /// `segments + 1` evenly spaced points in parameter space.
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }

    /// Approximate distance from `p` to the curve via a sampled polyline.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.sample(32)
            .windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

//##########################################################
// Routes
//##########################################################

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireStatus {
    Default,
    /// The source is completed.
    Active,
    /// The target is still locked.
    Locked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub edge: EdgeId,
    pub path: CubicPath,
    pub status: WireStatus,
}

/// Locked outranks Active.
pub fn wire_status(source: &Node, target_locked: bool) -> WireStatus {
    if target_locked {
        WireStatus::Locked
    } else if source.completed {
        WireStatus::Active
    } else {
        WireStatus::Default
    }
}

/// Paths and statuses for every edge whose endpoints exist.
pub fn route_edges(nodes: &[Node], edges: &[Edge]) -> Vec<Route> {
    let by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|n| (&n.id, n)).collect();
    let locked = lock::locked_nodes(nodes, edges);
    edges
        .iter()
        .filter_map(|e| {
            let source = by_id.get(&e.source)?;
            let target = by_id.get(&e.target)?;
            Some(Route {
                edge: e.id.clone(),
                path: CubicPath::between(output_anchor(source), input_anchor(target)),
                status: wire_status(source, locked.contains(&e.target)),
            })
        })
        .collect()
}

/// The in-progress wire of a connect gesture, open end at `pointer`.
pub fn pending_wire(from: Point, pointer: Point) -> CubicPath {
    CubicPath::between(from, pointer)
}
