use flowcanvas::{
    Document, Edge, EdgeId, Group, GroupId, Node, NodeId, NodeKind, Point, Size,
    Viewport,
};

/// The sample course shown on first launch and after a reset.
pub fn initial_document() -> Document {
    let node = |id: &str, kind, title: &str, x, y, w, h, label: &str| {
        Node::new(
            NodeId::from(id),
            kind,
            title,
            Point::new(x, y),
            Size::new(w, h),
        )
        .with_label(label)
    };
    let edge = |id: &str, source: &str, target: &str| Edge {
        id: EdgeId::from(id),
        source: NodeId::from(source),
        target: NodeId::from(target),
    };

    Document {
        nodes: vec![
            node(
                "1",
                NodeKind::Lecture,
                "Physics 101: Mechanics",
                100.0,
                300.0,
                260.0,
                160.0,
                "Chapter 1: Newton's Laws\nProf. Smith",
            ),
            node(
                "2",
                NodeKind::Concept,
                "Newton's First Law",
                450.0,
                150.0,
                260.0,
                180.0,
                "An object remains at rest or in uniform motion unless acted upon by a force.",
            ),
            node(
                "3",
                NodeKind::Question,
                "Quiz Prep",
                450.0,
                450.0,
                260.0,
                160.0,
                "What is the difference between mass and weight?",
            ),
            node(
                "4",
                NodeKind::Summary,
                "Lecture Summary",
                800.0,
                300.0,
                280.0,
                200.0,
                "Key takeaways:\n1. Inertia matches mass\n2. F=ma is crucial\n3. Action = Reaction",
            ),
        ],
        edges: vec![
            edge("e1", "1", "2"),
            edge("e2", "1", "3"),
            edge("e3", "2", "4"),
            edge("e4", "3", "4"),
        ],
        groups: vec![Group::new(
            GroupId::from("g1"),
            "Week 1 Material",
            Point::new(50.0, 100.0),
            Size::new(1100.0, 600.0),
        )],
        viewport: Viewport::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcanvas::GraphStore;

    #[test]
    fn test_sample_is_consistent() {
        let doc = initial_document();
        let mut store = GraphStore::default();
        store.restore(doc.clone());
        assert_eq!(store.nodes().len(), 4);
        assert_eq!(store.edges().len(), 4);
        // Every node sits inside the week group.
        assert_eq!(store.nodes_in_group(&GroupId::from("g1")).len(), 4);
        assert!(!store.is_locked(&NodeId::from("1")));
        assert!(store.is_locked(&NodeId::from("4")));
    }
}
