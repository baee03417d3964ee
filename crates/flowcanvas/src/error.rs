use crate::model::{EdgeId, GroupId, NodeId};

/// Rejections from [`GraphStore`](crate::store::GraphStore) operations.
///
/// Gesture-driven callers treat these as silent no-ops; explicit commands
/// (menus, batches, imports) surface them.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeId),
    #[error("group {0} does not exist")]
    UnknownGroup(GroupId),
    #[error("id {0} is already in use")]
    DuplicateId(String),
    #[error("a node cannot connect to itself")]
    SelfLoop,
    #[error("{0} is already connected to {1}")]
    DuplicateEdge(NodeId, NodeId),
    #[error("{0} is locked until its dependencies are complete")]
    Locked(NodeId),
    #[error("{0} cannot be marked complete")]
    NotCompletable(NodeId),
}
