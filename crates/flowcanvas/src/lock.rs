use std::collections::{HashMap, HashSet};

use crate::model::{Edge, Node, NodeId};

/// A node is locked when it has at least one incoming edge and not every
/// source of those edges is completed. Sources missing from `nodes` count
/// as incomplete.
pub fn is_locked(node: &NodeId, nodes: &[Node], edges: &[Edge]) -> bool {
    let mut incoming = edges.iter().filter(|e| &e.target == node).peekable();
    if incoming.peek().is_none() {
        return false;
    }
    incoming.any(|e| {
        !nodes
            .iter()
            .find(|n| n.id == e.source)
            .is_some_and(|n| n.completed)
    })
}

/// Every locked node in one pass over the edges.
pub fn locked_nodes(nodes: &[Node], edges: &[Edge]) -> HashSet<NodeId> {
    let completed: HashMap<&NodeId, bool> =
        nodes.iter().map(|n| (&n.id, n.completed)).collect();
    edges
        .iter()
        .filter(|e| !completed.get(&e.source).copied().unwrap_or(false))
        .map(|e| e.target.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::model::{EdgeId, NodeKind};

    fn node(id: &str, completed: bool) -> Node {
        let mut n = Node::new(
            NodeId::from(id),
            NodeKind::Task,
            id,
            Point::ZERO,
            Size::new(260.0, 180.0),
        );
        n.completed = completed;
        n
    }

    fn edge(s: &str, t: &str) -> Edge {
        Edge {
            id: EdgeId::new(format!("{s}-{t}")),
            source: NodeId::from(s),
            target: NodeId::from(t),
        }
    }

    #[test]
    fn test_no_incoming_is_unlocked() {
        let nodes = vec![node("a", false)];
        assert!(!is_locked(&NodeId::from("a"), &nodes, &[]));
    }

    #[test]
    fn test_completing_every_source_unlocks() {
        let mut nodes = vec![node("a", false), node("b", true), node("c", false)];
        let edges = vec![edge("a", "c"), edge("b", "c")];
        let c = NodeId::from("c");
        assert!(is_locked(&c, &nodes, &edges));
        nodes[0].completed = true;
        assert!(!is_locked(&c, &nodes, &edges));
    }

    #[test]
    fn test_locked_nodes_agrees_with_is_locked() {
        let nodes = vec![node("a", true), node("b", false), node("c", false), node("d", false)];
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("a", "d"), edge("c", "d")];
        let set = locked_nodes(&nodes, &edges);
        for n in &nodes {
            assert_eq!(set.contains(&n.id), is_locked(&n.id, &nodes, &edges), "{}", n.id);
        }
        assert!(!set.contains(&NodeId::from("b")));
        assert!(set.contains(&NodeId::from("d")));
    }
}
