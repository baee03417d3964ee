use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{Point, Rect, Size};

//##########################################################
// Ids
//##########################################################

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(NodeId);
string_id!(EdgeId);
string_id!(GroupId);

//##########################################################
// Node kinds
//##########################################################

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Lecture,
    Concept,
    Question,
    Summary,
    Task,
    Resource,
    Event,
    Goal,
    Note,
    Idea,
    Flashcard,
    Quiz,
    Condition,
}

/// Static presentation and capability data for one node kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindInfo {
    pub label: &'static str,
    pub icon: &'static str,
    /// Border/header color as 0xRRGGBB.
    pub color: u32,
    pub has_input: bool,
    pub has_output: bool,
    /// Whether the card shows an action bar with a completion toggle.
    pub completable: bool,
}

impl NodeKind {
    pub const ALL: [NodeKind; 13] = [
        NodeKind::Lecture,
        NodeKind::Concept,
        NodeKind::Question,
        NodeKind::Summary,
        NodeKind::Task,
        NodeKind::Resource,
        NodeKind::Event,
        NodeKind::Goal,
        NodeKind::Note,
        NodeKind::Idea,
        NodeKind::Flashcard,
        NodeKind::Quiz,
        NodeKind::Condition,
    ];

    pub fn info(self) -> KindInfo {
        const fn row(
            label: &'static str,
            icon: &'static str,
            color: u32,
            has_input: bool,
            has_output: bool,
            completable: bool,
        ) -> KindInfo {
            KindInfo {
                label,
                icon,
                color,
                has_input,
                has_output,
                completable,
            }
        }

        match self {
            NodeKind::Lecture => row("Lecture", "🎓", 0x7c3aed, true, true, true),
            NodeKind::Concept => row("Concept", "💡", 0x0891b2, true, true, true),
            NodeKind::Question => row("Question", "❓", 0xbe123c, true, true, true),
            NodeKind::Summary => row("Summary", "📝", 0xd97706, true, true, true),
            NodeKind::Task => row("Task", "☑", 0x2563eb, true, true, true),
            NodeKind::Resource => row("Resource", "📎", 0x4b5563, true, true, true),
            NodeKind::Event => row("Event", "📅", 0x059669, false, true, true),
            NodeKind::Goal => row("Goal", "🎯", 0x059669, true, false, true),
            NodeKind::Note => row("Note", "🗒", 0xeab308, true, false, false),
            NodeKind::Idea => row("Idea", "✨", 0x8b5cf6, true, true, true),
            NodeKind::Flashcard => row("Flashcard", "🃏", 0x059669, true, true, true),
            NodeKind::Quiz => row("Quiz", "✍", 0xf43f5e, true, true, true),
            NodeKind::Condition => row("Condition", "⑂", 0x4b5563, true, true, true),
        }
    }

    /// Parse a lowercase kind name, as produced by serialization.
    pub fn parse(name: &str) -> Option<NodeKind> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.info().label.eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().label)
    }
}

//##########################################################
// Node payload
//##########################################################

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
    Audio,
}

/// File content carried by a node; `data` is plain text or a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub data: String,
}

/// Structured AI commentary stored on a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_next_steps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    #[serde(default)]
    pub is_flipped: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_selected_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<Insight>,
}

//##########################################################
// Node / Edge / Group
//##########################################################

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
}

impl Node {
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        title: impl Into<String>,
        at: Point,
        size: Size,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            x: at.x,
            y: at.y,
            width: size.width,
            height: size.height,
            completed: false,
            data: NodeData::default(),
            pinned: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = label.into();
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Directed dependency from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
}

impl Group {
    pub const DEFAULT_COLOR: &'static str = "rgba(255, 255, 255, 0.1)";

    pub fn new(id: GroupId, title: impl Into<String>, at: Point, size: Size) -> Self {
        Self {
            id,
            title: title.into(),
            x: at.x,
            y: at.y,
            width: size.width,
            height: size.height,
            color: Self::DEFAULT_COLOR.to_string(),
            pinned: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Group membership is geometric: the node's box lies fully inside.
    pub fn contains(&self, node: &Node) -> bool {
        self.rect().contains_rect(&node.rect())
    }
}

//##########################################################
// Tests
//##########################################################

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodeKind::Event, false, true, true)]
    #[case(NodeKind::Goal, true, false, true)]
    #[case(NodeKind::Note, true, false, false)]
    #[case(NodeKind::Task, true, true, true)]
    #[case(NodeKind::Flashcard, true, true, true)]
    fn test_kind_capabilities(
        #[case] kind: NodeKind,
        #[case] has_input: bool,
        #[case] has_output: bool,
        #[case] completable: bool,
    ) {
        let info = kind.info();
        assert_eq!(info.has_input, has_input);
        assert_eq!(info.has_output, has_output);
        assert_eq!(info.completable, completable);
    }

    #[test]
    fn test_parse_round_trips_every_kind() {
        for kind in NodeKind::ALL {
            let name = serde_json::to_string(&kind).unwrap();
            assert_eq!(NodeKind::parse(name.trim_matches('"')), Some(kind));
        }
        assert_eq!(NodeKind::parse("unknown"), None);
    }

    #[test]
    fn test_node_serializes_with_type_key_and_camel_case_data() {
        let mut node = Node::new(
            NodeId::from("1"),
            NodeKind::Flashcard,
            "Card",
            Point::new(1.0, 2.0),
            Size::new(260.0, 220.0),
        );
        node.data.is_flipped = true;
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "flashcard");
        assert_eq!(json["data"]["isFlipped"], true);
        assert!(json.get("pinned").is_none());
    }

    #[test]
    fn test_group_contains_is_inclusive() {
        let group = Group::new(
            GroupId::from("g"),
            "G",
            Point::new(0.0, 0.0),
            Size::new(400.0, 300.0),
        );
        let inside = Node::new(
            NodeId::from("a"),
            NodeKind::Task,
            "A",
            Point::new(0.0, 0.0),
            Size::new(400.0, 300.0),
        );
        let outside = Node::new(
            NodeId::from("b"),
            NodeKind::Task,
            "B",
            Point::new(300.0, 0.0),
            Size::new(180.0, 120.0),
        );
        assert!(group.contains(&inside));
        assert!(!group.contains(&outside));
    }
}
