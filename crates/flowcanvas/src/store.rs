use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

use crate::config::CanvasConfig;
use crate::error::GraphError;
use crate::geometry::{Point, Size};
use crate::lock;
use crate::model::{Edge, EdgeId, Group, GroupId, Node, NodeId};

//##########################################################
// Types
//##########################################################

/// Minimum sizes enforced on every resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub node: Size,
    pub group: Size,
}

impl From<&CanvasConfig> for SizeLimits {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            node: config.min_node_size,
            group: config.min_group_size,
        }
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self::from(&CanvasConfig::default())
    }
}

/// Which collection a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    NodesChanged,
    EdgesChanged,
    GroupsChanged,
    Replaced,
}

/// Nodes, edges and groups committed together by [`GraphStore::append_batch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub groups: Vec<Group>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.groups.is_empty()
    }
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Owner of the graph. Collections keep insertion order, which is also
/// paint order (later entries are drawn on top).
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    groups: Vec<Group>,
    limits: SizeLimits,
    revision: u64,
    seq: u64,
    listeners: Vec<Listener>,
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("groups", &self.groups.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(SizeLimits::default())
    }
}

//##########################################################
// Reads
//##########################################################

impl GraphStore {
    pub fn new(limits: SizeLimits) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
            limits,
            revision: 0,
            seq: 0,
            listeners: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn limits(&self) -> SizeLimits {
        self.limits
    }

    /// Bumped on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty()
    }

    pub fn is_locked(&self, id: &NodeId) -> bool {
        lock::is_locked(id, &self.nodes, &self.edges)
    }

    pub fn has_edge_between(&self, source: &NodeId, target: &NodeId) -> bool {
        self.edges
            .iter()
            .any(|e| &e.source == source && &e.target == target)
    }

    /// Nodes whose box lies fully inside the group's box.
    pub fn nodes_in_group(&self, id: &GroupId) -> Vec<NodeId> {
        match self.group(id) {
            Some(group) => self
                .nodes
                .iter()
                .filter(|n| group.contains(n))
                .map(|n| n.id.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id.as_str() == id)
            || self.edges.iter().any(|e| e.id.as_str() == id)
            || self.groups.iter().any(|g| g.id.as_str() == id)
    }

    /// A fresh id of the form `<prefix>-<n>` not used by any element.
    pub fn next_id(&mut self, prefix: &str) -> String {
        loop {
            self.seq += 1;
            let candidate = format!("{prefix}-{}", self.seq);
            if !self.id_in_use(&candidate) {
                return candidate;
            }
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: StoreEvent) {
        self.revision = self.revision.wrapping_add(1);
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn node_index(&self, id: &NodeId) -> Result<usize, GraphError> {
        self.nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    fn group_index(&self, id: &GroupId) -> Result<usize, GraphError> {
        self.groups
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| GraphError::UnknownGroup(id.clone()))
    }
}

//##########################################################
// Node operations
//##########################################################

impl GraphStore {
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        if self.id_in_use(node.id.as_str()) {
            return Err(GraphError::DuplicateId(node.id.0));
        }
        let size = node.size().max(self.limits.node);
        node.width = size.width;
        node.height = size.height;
        let id = node.id.clone();
        self.nodes.push(node);
        self.notify(StoreEvent::NodesChanged);
        Ok(id)
    }

    /// Edit a node in place. The id cannot change and the size is clamped
    /// to the minimum afterwards.
    pub fn update_node(
        &mut self,
        id: &NodeId,
        edit: impl FnOnce(&mut Node),
    ) -> Result<(), GraphError> {
        let ix = self.node_index(id)?;
        let min = self.limits.node;
        let node = &mut self.nodes[ix];
        edit(node);
        node.id = id.clone();
        node.width = node.width.max(min.width);
        node.height = node.height.max(min.height);
        self.notify(StoreEvent::NodesChanged);
        Ok(())
    }

    /// Remove a node and every edge that references it.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<Node, GraphError> {
        let ix = self.node_index(id)?;
        let node = self.nodes.remove(ix);
        let before = self.edges.len();
        self.edges.retain(|e| &e.source != id && &e.target != id);
        let dropped = before - self.edges.len();
        debug!(node = %id, dropped_edges = dropped, "deleted node");
        self.notify(StoreEvent::NodesChanged);
        if dropped > 0 {
            self.notify(StoreEvent::EdgesChanged);
        }
        Ok(node)
    }

    pub fn move_node(&mut self, id: &NodeId, delta: Point) -> Result<(), GraphError> {
        let ix = self.node_index(id)?;
        self.nodes[ix].x += delta.x;
        self.nodes[ix].y += delta.y;
        self.notify(StoreEvent::NodesChanged);
        Ok(())
    }

    /// Grow or shrink by `delta`, never below the minimum node size.
    pub fn resize_node(&mut self, id: &NodeId, delta: Point) -> Result<(), GraphError> {
        let ix = self.node_index(id)?;
        let min = self.limits.node;
        let node = &mut self.nodes[ix];
        node.width = (node.width + delta.x).max(min.width);
        node.height = (node.height + delta.y).max(min.height);
        self.notify(StoreEvent::NodesChanged);
        Ok(())
    }

    /// Write many positions at once; unknown ids are skipped. Returns how
    /// many nodes moved.
    pub fn set_positions(&mut self, positions: impl IntoIterator<Item = (NodeId, Point)>) -> usize {
        let mut moved = 0;
        for (id, at) in positions {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
                node.x = at.x;
                node.y = at.y;
                moved += 1;
            }
        }
        if moved > 0 {
            self.notify(StoreEvent::NodesChanged);
        }
        moved
    }

    /// Flip the completed flag. Locked nodes and kinds without an action
    /// bar are refused. Returns the new value.
    pub fn toggle_complete(&mut self, id: &NodeId) -> Result<bool, GraphError> {
        let ix = self.node_index(id)?;
        if !self.nodes[ix].kind.info().completable {
            return Err(GraphError::NotCompletable(id.clone()));
        }
        if self.is_locked(id) {
            return Err(GraphError::Locked(id.clone()));
        }
        let node = &mut self.nodes[ix];
        node.completed = !node.completed;
        let completed = node.completed;
        self.notify(StoreEvent::NodesChanged);
        Ok(completed)
    }

    pub fn set_node_pinned(&mut self, id: &NodeId, pinned: bool) -> Result<(), GraphError> {
        let ix = self.node_index(id)?;
        self.nodes[ix].pinned = pinned;
        self.notify(StoreEvent::NodesChanged);
        Ok(())
    }
}

//##########################################################
// Edge operations
//##########################################################

impl GraphStore {
    fn check_connectable(&self, source: &NodeId, target: &NodeId) -> Result<(), GraphError> {
        if source == target {
            return Err(GraphError::SelfLoop);
        }
        self.node_index(source)?;
        self.node_index(target)?;
        if self.has_edge_between(source, target) {
            return Err(GraphError::DuplicateEdge(source.clone(), target.clone()));
        }
        Ok(())
    }

    /// Create a directed edge with a fresh id. Self-loops, duplicates of
    /// the ordered pair and unknown endpoints are rejected.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId, GraphError> {
        self.check_connectable(source, target)?;
        let id = EdgeId::new(self.next_id("e"));
        self.edges.push(Edge {
            id: id.clone(),
            source: source.clone(),
            target: target.clone(),
        });
        debug!(edge = %id, %source, %target, "connected");
        self.notify(StoreEvent::EdgesChanged);
        Ok(id)
    }

    /// Insert an edge that already carries an id.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.id_in_use(edge.id.as_str()) {
            return Err(GraphError::DuplicateId(edge.id.0));
        }
        self.check_connectable(&edge.source, &edge.target)?;
        self.edges.push(edge);
        self.notify(StoreEvent::EdgesChanged);
        Ok(())
    }

    pub fn delete_edge(&mut self, id: &EdgeId) -> Result<Edge, GraphError> {
        let ix = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge(id.clone()))?;
        let edge = self.edges.remove(ix);
        self.notify(StoreEvent::EdgesChanged);
        Ok(edge)
    }
}

//##########################################################
// Group operations
//##########################################################

impl GraphStore {
    pub fn add_group(&mut self, mut group: Group) -> Result<GroupId, GraphError> {
        if self.id_in_use(group.id.as_str()) {
            return Err(GraphError::DuplicateId(group.id.0));
        }
        group.width = group.width.max(self.limits.group.width);
        group.height = group.height.max(self.limits.group.height);
        let id = group.id.clone();
        self.groups.push(group);
        self.notify(StoreEvent::GroupsChanged);
        Ok(id)
    }

    pub fn update_group(
        &mut self,
        id: &GroupId,
        edit: impl FnOnce(&mut Group),
    ) -> Result<(), GraphError> {
        let ix = self.group_index(id)?;
        let min = self.limits.group;
        let group = &mut self.groups[ix];
        edit(group);
        group.id = id.clone();
        group.width = group.width.max(min.width);
        group.height = group.height.max(min.height);
        self.notify(StoreEvent::GroupsChanged);
        Ok(())
    }

    /// Remove the group only; its member nodes stay where they are.
    pub fn delete_group(&mut self, id: &GroupId) -> Result<Group, GraphError> {
        let ix = self.group_index(id)?;
        let group = self.groups.remove(ix);
        self.notify(StoreEvent::GroupsChanged);
        Ok(group)
    }

    /// Translate the group and the given member nodes together. Members
    /// that no longer exist are skipped.
    pub fn move_group(
        &mut self,
        id: &GroupId,
        delta: Point,
        members: &[NodeId],
    ) -> Result<(), GraphError> {
        let ix = self.group_index(id)?;
        self.groups[ix].x += delta.x;
        self.groups[ix].y += delta.y;
        let mut moved_nodes = false;
        for node in self.nodes.iter_mut().filter(|n| members.contains(&n.id)) {
            node.x += delta.x;
            node.y += delta.y;
            moved_nodes = true;
        }
        self.notify(StoreEvent::GroupsChanged);
        if moved_nodes {
            self.notify(StoreEvent::NodesChanged);
        }
        Ok(())
    }

    pub fn resize_group(&mut self, id: &GroupId, delta: Point) -> Result<(), GraphError> {
        let ix = self.group_index(id)?;
        let min = self.limits.group;
        let group = &mut self.groups[ix];
        group.width = (group.width + delta.x).max(min.width);
        group.height = (group.height + delta.y).max(min.height);
        self.notify(StoreEvent::GroupsChanged);
        Ok(())
    }

    pub fn set_group_pinned(&mut self, id: &GroupId, pinned: bool) -> Result<(), GraphError> {
        let ix = self.group_index(id)?;
        self.groups[ix].pinned = pinned;
        self.notify(StoreEvent::GroupsChanged);
        Ok(())
    }
}

//##########################################################
// Bulk operations
//##########################################################

impl GraphStore {
    /// Validate the whole batch, then commit it. Nothing is applied when
    /// any element is rejected.
    pub fn append_batch(&mut self, batch: Batch) -> Result<(), GraphError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let ids = batch
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(batch.edges.iter().map(|e| e.id.as_str()))
            .chain(batch.groups.iter().map(|g| g.id.as_str()));
        for id in ids {
            if self.id_in_use(id) || !seen.insert(id) {
                return Err(GraphError::DuplicateId(id.to_string()));
            }
        }

        let exists = |id: &NodeId| {
            self.node(id).is_some() || batch.nodes.iter().any(|n| &n.id == id)
        };
        let mut pairs: HashSet<(&NodeId, &NodeId)> = HashSet::new();
        for edge in &batch.edges {
            if edge.source == edge.target {
                return Err(GraphError::SelfLoop);
            }
            for end in [&edge.source, &edge.target] {
                if !exists(end) {
                    return Err(GraphError::UnknownNode(end.clone()));
                }
            }
            if self.has_edge_between(&edge.source, &edge.target)
                || !pairs.insert((&edge.source, &edge.target))
            {
                return Err(GraphError::DuplicateEdge(
                    edge.source.clone(),
                    edge.target.clone(),
                ));
            }
        }

        let Batch {
            nodes,
            edges,
            groups,
        } = batch;
        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            groups = groups.len(),
            "committing batch"
        );
        let node_min = self.limits.node;
        let group_min = self.limits.group;
        self.nodes.extend(nodes.into_iter().map(|mut n| {
            n.width = n.width.max(node_min.width);
            n.height = n.height.max(node_min.height);
            n
        }));
        self.edges.extend(edges);
        self.groups.extend(groups.into_iter().map(|mut g| {
            g.width = g.width.max(group_min.width);
            g.height = g.height.max(group_min.height);
            g
        }));
        self.notify(StoreEvent::Replaced);
        Ok(())
    }

    /// Swap in new contents wholesale. Later nodes or groups reusing an
    /// earlier id are dropped, sizes are raised to the minimums, and edges
    /// that are dangling, self-loops or duplicates of an earlier pair are
    /// dropped.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>, groups: Vec<Group>) {
        let node_min = self.limits.node;
        let group_min = self.limits.group;

        let mut seen: HashSet<NodeId> = HashSet::new();
        let total = nodes.len();
        let nodes: Vec<Node> = nodes
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .map(|mut n| {
                n.width = n.width.max(node_min.width);
                n.height = n.height.max(node_min.height);
                n
            })
            .collect();
        if nodes.len() < total {
            warn!(dropped = total - nodes.len(), "dropped nodes with repeated ids on load");
        }

        let mut seen: HashSet<GroupId> = HashSet::new();
        let total = groups.len();
        let groups: Vec<Group> = groups
            .into_iter()
            .filter(|g| seen.insert(g.id.clone()))
            .map(|mut g| {
                g.width = g.width.max(group_min.width);
                g.height = g.height.max(group_min.height);
                g
            })
            .collect();
        if groups.len() < total {
            warn!(dropped = total - groups.len(), "dropped groups with repeated ids on load");
        }

        let known: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
        let mut pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
        let total = edges.len();
        let kept: Vec<Edge> = edges
            .into_iter()
            .filter(|e| {
                e.source != e.target
                    && known.contains(&e.source)
                    && known.contains(&e.target)
                    && pairs.insert((e.source.clone(), e.target.clone()))
            })
            .collect();
        if kept.len() < total {
            warn!(dropped = total - kept.len(), "dropped invalid edges on load");
        }
        self.nodes = nodes;
        self.edges = kept;
        self.groups = groups;
        self.notify(StoreEvent::Replaced);
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new(), Vec::new(), Vec::new());
    }
}

//##########################################################
// Tests
//##########################################################

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node::new(
            NodeId::from(id),
            NodeKind::Task,
            id,
            Point::new(x, y),
            Size::new(260.0, 180.0),
        )
    }

    fn store_with(ids: &[&str]) -> GraphStore {
        let mut store = GraphStore::default();
        for (i, id) in ids.iter().enumerate() {
            store.add_node(node(id, i as f64 * 300.0, 0.0)).unwrap();
        }
        store
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_connect_rejects_duplicates_but_allows_reverse() {
        let mut store = store_with(&["a", "b"]);
        store.connect(&id("a"), &id("b")).unwrap();
        assert_eq!(
            store.connect(&id("a"), &id("b")),
            Err(GraphError::DuplicateEdge(id("a"), id("b")))
        );
        store.connect(&id("b"), &id("a")).unwrap();
        assert_eq!(store.edges().len(), 2);
    }

    #[test]
    fn test_connect_rejects_self_loop_and_unknown() {
        let mut store = store_with(&["a"]);
        assert_eq!(store.connect(&id("a"), &id("a")), Err(GraphError::SelfLoop));
        assert_eq!(
            store.connect(&id("a"), &id("zz")),
            Err(GraphError::UnknownNode(id("zz")))
        );
        assert!(store.edges().is_empty());
    }

    #[test]
    fn test_delete_node_cascades() {
        let mut store = store_with(&["a", "b", "c"]);
        store.connect(&id("a"), &id("b")).unwrap();
        store.connect(&id("b"), &id("c")).unwrap();
        store.connect(&id("a"), &id("c")).unwrap();
        store.delete_node(&id("b")).unwrap();
        assert_eq!(store.edges().len(), 1);
        for e in store.edges() {
            assert!(store.node(&e.source).is_some() && store.node(&e.target).is_some());
        }
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut store = store_with(&["a"]);
        store.resize_node(&id("a"), Point::new(-1000.0, -1000.0)).unwrap();
        let n = store.node(&id("a")).unwrap();
        assert_eq!((n.width, n.height), (180.0, 120.0));
    }

    #[test]
    fn test_toggle_complete_respects_lock() {
        let mut store = store_with(&["a", "b"]);
        store.connect(&id("a"), &id("b")).unwrap();
        assert_eq!(store.toggle_complete(&id("b")), Err(GraphError::Locked(id("b"))));
        assert_eq!(store.toggle_complete(&id("a")), Ok(true));
        assert_eq!(store.toggle_complete(&id("b")), Ok(true));
    }

    #[test]
    fn test_note_cannot_complete() {
        let mut store = GraphStore::default();
        let mut n = node("n", 0.0, 0.0);
        n.kind = NodeKind::Note;
        store.add_node(n).unwrap();
        assert_eq!(
            store.toggle_complete(&id("n")),
            Err(GraphError::NotCompletable(id("n")))
        );
    }

    #[test]
    fn test_append_batch_is_all_or_nothing() {
        let mut store = store_with(&["a"]);
        let batch = Batch {
            nodes: vec![node("x", 0.0, 0.0)],
            edges: vec![
                Edge {
                    id: EdgeId::from("e-x"),
                    source: id("a"),
                    target: id("x"),
                },
                Edge {
                    id: EdgeId::from("e-y"),
                    source: id("a"),
                    target: id("missing"),
                },
            ],
            groups: vec![],
        };
        let before = store.revision();
        assert!(store.append_batch(batch).is_err());
        assert_eq!(store.nodes().len(), 1);
        assert!(store.edges().is_empty());
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_move_group_moves_only_given_members() {
        let mut store = store_with(&["in", "out"]);
        store
            .add_group(Group::new(
                GroupId::from("g"),
                "G",
                Point::new(-10.0, -10.0),
                Size::new(290.0, 220.0),
            ))
            .unwrap();
        let members = store.nodes_in_group(&GroupId::from("g"));
        assert_eq!(members, vec![id("in")]);
        store
            .move_group(&GroupId::from("g"), Point::new(5.0, 7.0), &members)
            .unwrap();
        assert_eq!(store.node(&id("in")).unwrap().position(), Point::new(5.0, 7.0));
        assert_eq!(store.node(&id("out")).unwrap().position(), Point::new(300.0, 0.0));
    }

    #[test]
    fn test_replace_drops_dangling_edges() {
        let mut store = GraphStore::default();
        store.replace(
            vec![node("a", 0.0, 0.0), node("b", 0.0, 0.0)],
            vec![
                Edge { id: EdgeId::from("1"), source: id("a"), target: id("b") },
                Edge { id: EdgeId::from("2"), source: id("a"), target: id("b") },
                Edge { id: EdgeId::from("3"), source: id("a"), target: id("c") },
            ],
            vec![],
        );
        assert_eq!(store.edges().len(), 1);
    }

    #[test]
    fn test_replace_keeps_first_of_repeated_ids_and_minimum_sizes() {
        let mut store = GraphStore::default();
        let mut tiny = node("a", 0.0, 0.0);
        tiny.width = 10.0;
        tiny.height = 10.0;
        let group = Group::new(GroupId::from("g"), "G", Point::ZERO, Size::new(5.0, 5.0));
        let again = Group::new(GroupId::from("g"), "Again", Point::ZERO, Size::new(400.0, 300.0));
        store.replace(
            vec![tiny, node("a", 500.0, 0.0)],
            vec![],
            vec![group, again],
        );

        assert_eq!(store.nodes().len(), 1);
        let a = store.node(&id("a")).unwrap();
        assert_eq!((a.x, a.width, a.height), (0.0, 180.0, 120.0));
        assert_eq!(store.groups().len(), 1);
        let g = store.group(&GroupId::from("g")).unwrap();
        assert_eq!((g.title.as_str(), g.width, g.height), ("G", 200.0, 150.0));
    }

    #[test]
    fn test_subscribers_see_every_mutation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut store = GraphStore::default();
        store.subscribe(move |e| sink.borrow_mut().push(*e));
        store.add_node(node("a", 0.0, 0.0)).unwrap();
        store.add_node(node("b", 0.0, 0.0)).unwrap();
        store.connect(&id("a"), &id("b")).unwrap();
        store.delete_node(&id("a")).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                StoreEvent::NodesChanged,
                StoreEvent::NodesChanged,
                StoreEvent::EdgesChanged,
                StoreEvent::NodesChanged,
                StoreEvent::EdgesChanged,
            ]
        );
    }

    #[test]
    fn test_next_id_skips_taken_ids() {
        let mut store = store_with(&["n-1"]);
        assert_eq!(store.next_id("n"), "n-2");
    }
}
