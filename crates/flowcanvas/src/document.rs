use serde::{Deserialize, Serialize};

use crate::model::{Edge, Group, Node};
use crate::store::GraphStore;
use crate::viewport::Viewport;

/// Everything needed to restore a session. All four keys are required
/// when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub groups: Vec<Group>,
    pub viewport: Viewport,
}

impl GraphStore {
    pub fn snapshot(&self, viewport: Viewport) -> Document {
        Document {
            nodes: self.nodes().to_vec(),
            edges: self.edges().to_vec(),
            groups: self.groups().to_vec(),
            viewport,
        }
    }

    /// Replace the contents with the document's and hand back its viewport.
    pub fn restore(&mut self, document: Document) -> Viewport {
        let Document {
            nodes,
            edges,
            groups,
            viewport,
        } = document;
        self.replace(nodes, edges, groups);
        viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_rejected() {
        let json = r#"{ "nodes": [], "edges": [], "groups": [] }"#;
        assert!(serde_json::from_str::<Document>(json).is_err());
        let json = r#"{ "nodes": [], "edges": [], "groups": [], "viewport": { "x": 1, "y": 2, "zoom": 0.5 } }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.viewport, Viewport::new(1.0, 2.0, 0.5));
    }
}
