//! Automatic arrangement of nodes.
//!
//! Connected nodes get a top-to-bottom layered layout:
//!   1. cycle breaking (DFS back edges are reversed)
//!   2. longest-path rank assignment
//!   3. barycenter sweeps to reduce crossings
//!   4. coordinates from each node's own size, ranks centered on one axis
//!
//! Nodes without edges are packed in a grid below the layered block, and a
//! graph without any edge becomes a plain grid. Pinned nodes never move.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsEvent, EdgeRef, depth_first_search};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, Size};
use crate::model::{Edge, Node, NodeId};
use crate::viewport::Viewport;

//##########################################################
// Entry points
//##########################################################

/// New positions for every node; sizes and all other fields are kept.
///
/// The result lists the layered nodes first, then the isolated ones, then
/// the pinned ones at their original positions.
pub fn layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Vec<Node> {
    let (movable, pinned): (Vec<&Node>, Vec<&Node>) = nodes.iter().partition(|n| !n.pinned);
    if movable.is_empty() {
        return nodes.to_vec();
    }

    let index: HashMap<&NodeId, usize> =
        movable.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();
    let valid: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|e| {
            let s = *index.get(&e.source)?;
            let t = *index.get(&e.target)?;
            (s != t).then_some((s, t))
        })
        .collect();

    let mut out = if valid.is_empty() {
        debug!(nodes = movable.len(), "no edges, using grid layout");
        let mut placed: Vec<Node> = movable.iter().map(|n| (*n).clone()).collect();
        pack_grid(
            &mut placed,
            Point::new(config.margin, config.margin),
            config.grid_spacing,
        );
        placed
    } else {
        let mut connected = vec![false; movable.len()];
        for &(s, t) in &valid {
            connected[s] = true;
            connected[t] = true;
        }
        let members: Vec<usize> = (0..movable.len()).filter(|&i| connected[i]).collect();
        let local: HashMap<usize, usize> =
            members.iter().enumerate().map(|(l, &g)| (g, l)).collect();
        let local_edges: Vec<(usize, usize)> =
            valid.iter().map(|(s, t)| (local[s], local[t])).collect();

        let mut layered: Vec<Node> = members.iter().map(|&i| movable[i].clone()).collect();
        place_layered(&mut layered, &local_edges, config);

        let mut isolated: Vec<Node> = (0..movable.len())
            .filter(|&i| !connected[i])
            .map(|i| movable[i].clone())
            .collect();
        if !isolated.is_empty() {
            let bottom = layered
                .iter()
                .map(|n| n.y + n.height)
                .fold(f64::NEG_INFINITY, f64::max);
            let left = layered.iter().map(|n| n.x).fold(f64::INFINITY, f64::min);
            pack_grid(
                &mut isolated,
                Point::new(left, bottom + config.isolated_gap),
                config.grid_spacing,
            );
        }
        debug!(
            layered = layered.len(),
            isolated = isolated.len(),
            "layered layout"
        );
        layered.extend(isolated);
        layered
    };

    out.extend(pinned.into_iter().cloned());
    out
}

/// Translate the unpinned nodes so their bounding box is centered on the
/// visible world center. Returns the applied offset.
pub fn center_in_view(nodes: &mut [Node], viewport: &Viewport, canvas: Size) -> Point {
    let Some(bounds) = Rect::bounding(nodes.iter().filter(|n| !n.pinned).map(Node::rect))
    else {
        return Point::ZERO;
    };
    let offset = viewport.visible_world_center(canvas) - bounds.center();
    for node in nodes.iter_mut().filter(|n| !n.pinned) {
        node.x += offset.x;
        node.y += offset.y;
    }
    offset
}

/// Columns used by the grid packers for `n` nodes.
pub fn grid_columns(n: usize) -> usize {
    (n as f64).sqrt().ceil().max(1.0) as usize
}

//##########################################################
// Grid
//##########################################################

/// Row-major grid. Column widths and row heights follow the largest node
/// in each, so cells never overlap.
fn pack_grid(nodes: &mut [Node], origin: Point, spacing: f64) {
    if nodes.is_empty() {
        return;
    }
    let cols = grid_columns(nodes.len());
    let rows = nodes.len().div_ceil(cols);
    let mut col_width = vec![0.0_f64; cols];
    let mut row_height = vec![0.0_f64; rows];
    for (i, n) in nodes.iter().enumerate() {
        col_width[i % cols] = col_width[i % cols].max(n.width);
        row_height[i / cols] = row_height[i / cols].max(n.height);
    }
    let col_x = offsets(&col_width, spacing);
    let row_y = offsets(&row_height, spacing);
    for (i, n) in nodes.iter_mut().enumerate() {
        n.x = origin.x + col_x[i % cols];
        n.y = origin.y + row_y[i / cols];
    }
}

fn offsets(extents: &[f64], spacing: f64) -> Vec<f64> {
    let mut acc = 0.0;
    extents
        .iter()
        .map(|e| {
            let at = acc;
            acc += e + spacing;
            at
        })
        .collect()
}

//##########################################################
// Layered
//##########################################################

fn place_layered(nodes: &mut [Node], edges: &[(usize, usize)], config: &LayoutConfig) {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let ix: Vec<NodeIndex> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();
    for &(s, t) in edges {
        graph.add_edge(ix[s], ix[t], ());
    }

    let dag_edges = break_cycles(&graph);
    let ranks = assign_ranks(nodes.len(), &dag_edges);
    let mut layers = build_layers(&ranks);
    reduce_crossings(&mut layers, &dag_edges, nodes.len(), config.sweeps);
    assign_coordinates(nodes, &layers, config);
}

/// Edges of `graph` with every DFS back edge reversed, which leaves an
/// acyclic edge set. Returned as plain index pairs.
fn break_cycles(graph: &DiGraph<usize, ()>) -> Vec<(usize, usize)> {
    let mut back: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    depth_first_search(graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back.insert((u, v));
        }
    });
    if !back.is_empty() {
        debug!(reversed = back.len(), "broke cycles for layout");
    }
    graph
        .edge_references()
        .map(|e| {
            let (s, t) = (e.source(), e.target());
            if back.contains(&(s, t)) {
                (graph[t], graph[s])
            } else {
                (graph[s], graph[t])
            }
        })
        .collect()
}

/// Longest path from the sources: every node sits one rank below its
/// deepest predecessor.
fn assign_ranks(n: usize, dag_edges: &[(usize, usize)]) -> Vec<usize> {
    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(n, dag_edges.len());
    let ix: Vec<NodeIndex> = (0..n).map(|_| dag.add_node(())).collect();
    for &(s, t) in dag_edges {
        dag.add_edge(ix[s], ix[t], ());
    }
    let order = match toposort(&dag, None) {
        Ok(order) => order,
        Err(cycle) => {
            warn!(at = cycle.node_id().index(), "cycle left after reversal");
            dag.node_indices().collect()
        }
    };
    let mut rank = vec![0usize; n];
    for u in order {
        for v in dag.neighbors(u) {
            rank[v.index()] = rank[v.index()].max(rank[u.index()] + 1);
        }
    }
    rank
}

fn build_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map_or(0, |m| m + 1);
    let mut layers = vec![Vec::new(); depth];
    for (i, &r) in ranks.iter().enumerate() {
        layers[r].push(i);
    }
    layers
}

/// Alternating down/up barycenter passes. Each node is ordered by the mean
/// relative position of its neighbors on the side being swept from; nodes
/// without such neighbors keep their current position as key.
fn reduce_crossings(
    layers: &mut [Vec<usize>],
    dag_edges: &[(usize, usize)],
    n: usize,
    sweeps: usize,
) {
    if layers.len() < 2 {
        return;
    }
    let mut preds = vec![Vec::new(); n];
    let mut succs = vec![Vec::new(); n];
    for &(s, t) in dag_edges {
        preds[t].push(s);
        succs[s].push(t);
    }

    let mut pos = vec![0.0_f64; n];
    for layer in layers.iter() {
        write_positions(layer, &mut pos);
    }

    for _ in 0..sweeps {
        for r in 1..layers.len() {
            reorder(&mut layers[r], &preds, &mut pos);
        }
        for r in (0..layers.len() - 1).rev() {
            reorder(&mut layers[r], &succs, &mut pos);
        }
    }
}

fn write_positions(layer: &[usize], pos: &mut [f64]) {
    let len = layer.len() as f64;
    for (i, &v) in layer.iter().enumerate() {
        pos[v] = (i as f64 + 0.5) / len;
    }
}

fn reorder(layer: &mut [usize], neighbors: &[Vec<usize>], pos: &mut [f64]) {
    let key: HashMap<usize, f64> = layer
        .iter()
        .map(|&v| {
            let ns = &neighbors[v];
            let k = if ns.is_empty() {
                pos[v]
            } else {
                ns.iter().map(|&u| pos[u]).sum::<f64>() / ns.len() as f64
            };
            (v, k)
        })
        .collect();
    layer.sort_by(|a, b| key[a].total_cmp(&key[b]));
    write_positions(layer, pos);
}

fn assign_coordinates(nodes: &mut [Node], layers: &[Vec<usize>], config: &LayoutConfig) {
    let heights: Vec<f64> = layers
        .iter()
        .map(|l| l.iter().map(|&i| nodes[i].height).fold(0.0, f64::max))
        .collect();
    let widths: Vec<f64> = layers
        .iter()
        .map(|l| {
            l.iter().map(|&i| nodes[i].width).sum::<f64>()
                + config.node_spacing * l.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = widths.iter().copied().fold(0.0, f64::max);

    let mut top = config.margin;
    for (r, layer) in layers.iter().enumerate() {
        let center_y = top + heights[r] / 2.0;
        let mut cursor = config.margin + (widest - widths[r]) / 2.0;
        for &i in layer {
            let node = &mut nodes[i];
            let center_x = cursor + node.width / 2.0;
            node.x = center_x - node.width / 2.0;
            node.y = center_y - node.height / 2.0;
            cursor += node.width + config.node_spacing;
        }
        top += heights[r] + config.rank_spacing;
    }
}

//##########################################################
// Tests
//##########################################################

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeId, NodeKind};

    fn node(id: &str, w: f64, h: f64) -> Node {
        Node::new(
            NodeId::from(id),
            NodeKind::Concept,
            id,
            Point::new(1000.0, -1000.0),
            Size::new(w, h),
        )
    }

    fn edge(s: &str, t: &str) -> Edge {
        Edge {
            id: EdgeId::new(format!("{s}>{t}")),
            source: NodeId::from(s),
            target: NodeId::from(t),
        }
    }

    fn find<'a>(nodes: &'a [Node], id: &str) -> &'a Node {
        nodes.iter().find(|n| n.id.as_str() == id).unwrap()
    }

    fn assert_no_overlap(nodes: &[Node]) {
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                assert!(!a.rect().intersects(&b.rect()), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    fn diamond() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            node("a", 260.0, 160.0),
            node("b", 260.0, 180.0),
            node("c", 300.0, 160.0),
            node("d", 280.0, 200.0),
            node("lonely", 200.0, 150.0),
        ];
        let edges = vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")];
        (nodes, edges)
    }

    #[test]
    fn test_empty_is_noop() {
        assert!(layout(&[], &[], &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let (nodes, edges) = diamond();
        let cfg = LayoutConfig::default();
        assert_eq!(layout(&nodes, &edges, &cfg), layout(&nodes, &edges, &cfg));
    }

    #[test]
    fn test_ranks_go_top_to_bottom_without_overlap() {
        let (nodes, edges) = diamond();
        let out = layout(&nodes, &edges, &LayoutConfig::default());
        assert_eq!(out.len(), nodes.len());
        assert_no_overlap(&out);
        let (a, b, c, d) = (find(&out, "a"), find(&out, "b"), find(&out, "c"), find(&out, "d"));
        assert!(a.y + a.height <= b.y.min(c.y));
        assert!(b.y + b.height <= d.y && c.y + c.height <= d.y);
        // sizes survive
        assert_eq!((c.width, c.height), (300.0, 160.0));
    }

    #[test]
    fn test_isolated_nodes_go_below() {
        let (nodes, edges) = diamond();
        let cfg = LayoutConfig::default();
        let out = layout(&nodes, &edges, &cfg);
        let lonely = find(&out, "lonely");
        let bottom = ["a", "b", "c", "d"]
            .iter()
            .map(|id| find(&out, id).rect().bottom())
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((lonely.y - (bottom + cfg.isolated_gap)).abs() < 1e-9);
        assert_eq!(out.last().unwrap().id.as_str(), "lonely");
    }

    #[test]
    fn test_grid_fallback_uses_sqrt_columns() {
        let nodes: Vec<Node> = (0..7).map(|i| node(&format!("n{i}"), 260.0, 180.0)).collect();
        let cfg = LayoutConfig::default();
        let out = layout(&nodes, &[edge("n0", "ghost")], &cfg);
        assert_eq!(grid_columns(7), 3);
        let mut xs: Vec<i64> = out.iter().map(|n| n.x as i64).collect();
        xs.sort();
        xs.dedup();
        assert_eq!(xs.len(), 3);
        assert_eq!(out[3].x, out[0].x);
        assert!(out[3].y > out[0].y);
        assert_no_overlap(&out);
    }

    #[test]
    fn test_cycles_still_produce_ranks() {
        let nodes = vec![node("a", 200.0, 150.0), node("b", 200.0, 150.0), node("c", 200.0, 150.0)];
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let out = layout(&nodes, &edges, &LayoutConfig::default());
        assert_no_overlap(&out);
        let mut ys: Vec<i64> = out.iter().map(|n| n.y as i64).collect();
        ys.dedup();
        assert_eq!(ys.len(), 3);
    }

    #[test]
    fn test_pinned_nodes_keep_position() {
        let (mut nodes, edges) = diamond();
        nodes[1].pinned = true;
        let out = layout(&nodes, &edges, &LayoutConfig::default());
        let b = find(&out, "b");
        assert_eq!(b.position(), Point::new(1000.0, -1000.0));
    }

    #[test]
    fn test_barycenter_untangles_crossing() {
        // a feeds y and b feeds x, listed so the first rank order crosses.
        let nodes = vec![
            node("a", 200.0, 150.0),
            node("b", 200.0, 150.0),
            node("x", 200.0, 150.0),
            node("y", 200.0, 150.0),
        ];
        let edges = vec![edge("a", "y"), edge("b", "x")];
        let out = layout(&nodes, &edges, &LayoutConfig::default());
        let (a, b, x, y) = (find(&out, "a"), find(&out, "b"), find(&out, "x"), find(&out, "y"));
        assert_eq!(a.x < b.x, y.x < x.x);
    }

    #[test]
    fn test_center_is_idempotent() {
        let (nodes, edges) = diamond();
        let mut out = layout(&nodes, &edges, &LayoutConfig::default());
        let vp = Viewport::new(-120.0, 40.0, 0.8);
        let canvas = Size::new(1280.0, 720.0);
        center_in_view(&mut out, &vp, canvas);
        let before = out.clone();
        let second = center_in_view(&mut out, &vp, canvas);
        assert!(second.length() <= 1.0);
        for (p, q) in before.iter().zip(&out) {
            assert!(p.position().distance(q.position()) <= 1.0);
        }
        let bounds = Rect::bounding(out.iter().map(Node::rect)).unwrap();
        assert!(bounds.center().distance(vp.visible_world_center(canvas)) < 1e-6);
    }
}
