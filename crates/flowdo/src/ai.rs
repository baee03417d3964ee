//! Content generation for the AI menu, the flow planner and the chat panel.
//!
//! Generators block; callers run them on a worker thread.

use flowcanvas::{Attachment, AttachmentKind, Insight, Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::config::AiConfig;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("no AI service is available for the configured key; use \"demo\" or leave it empty")]
    Unavailable,
    #[error("AI service error: {0}")]
    Service(String),
}

//##########################################################
// Operations
//##########################################################

/// What the AI menu can do with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Explain,
    Enhance,
    Quiz,
    Decompose,
    Brainstorm,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Explain,
        Operation::Enhance,
        Operation::Quiz,
        Operation::Decompose,
        Operation::Brainstorm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Operation::Explain => "Explain",
            Operation::Enhance => "Enhance",
            Operation::Quiz => "Generate quiz",
            Operation::Decompose => "Break down",
            Operation::Brainstorm => "Brainstorm",
        }
    }

    /// Kind of the nodes created from a list result.
    pub fn child_kind(self) -> NodeKind {
        match self {
            Operation::Quiz => NodeKind::Question,
            Operation::Brainstorm => NodeKind::Idea,
            _ => NodeKind::Task,
        }
    }

    pub fn child_title(self) -> &'static str {
        match self {
            Operation::Quiz => "Question",
            _ => "Sub-item",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Insight(Insight),
    Items(Vec<String>),
}

/// One step of a generated study plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub id: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "dependsOn", default)]
    pub depends_on: Vec<u32>,
}

//##########################################################
// Generators
//##########################################################

pub trait ContentGenerator: Send + Sync {
    fn generate(
        &self,
        operation: Operation,
        prompt: &str,
        attachment: Option<&Attachment>,
    ) -> Result<Generated, GenerateError>;

    fn plan_flow(&self, topic: &str) -> Result<Vec<FlowStep>, GenerateError>;

    fn chat(&self, question: &str, context: &str) -> Result<String, GenerateError>;
}

pub const DEMO_CHAT_REPLY: &str = "Based on the visible nodes in your flow, I can see connections between different concepts. However, please set up your API key in Settings to get detailed responses about your specific content.";

/// Canned answers, returned after a short pause like a remote call.
#[derive(Debug, Clone)]
pub struct DemoGenerator {
    delay: Duration,
    chat_delay: Duration,
}

impl Default for DemoGenerator {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            chat_delay: Duration::from_millis(1500),
        }
    }
}

impl DemoGenerator {
    pub fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
            chat_delay: Duration::ZERO,
        }
    }

    fn pause(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ContentGenerator for DemoGenerator {
    fn generate(
        &self,
        operation: Operation,
        prompt: &str,
        attachment: Option<&Attachment>,
    ) -> Result<Generated, GenerateError> {
        debug!(?operation, prompt_len = prompt.len(), attached = attachment.is_some(), "demo generate");
        self.pause(self.delay);
        Ok(match operation {
            Operation::Explain => Generated::Insight(Insight {
                summary: "Inertia is the resistance of any physical object to any change in its velocity. This includes changes to the object's speed, or direction of motion. It's a fundamental concept in Newton's First Law of Motion.".into(),
                key_points: strings(&[
                    "Objects at rest tend to stay at rest",
                    "Objects in motion tend to stay in motion",
                    "Inertia is directly proportional to mass",
                    "No net force means no change in motion",
                ]),
                suggested_next_steps: Some(strings(&[
                    "Explore real-world examples of inertia",
                    "Study Newton's First Law in detail",
                    "Practice problems involving inertial frames",
                ])),
            }),
            Operation::Enhance => Generated::Insight(Insight {
                summary: "This concept requires a systematic approach focusing on system boundaries, force identification, and vector mathematics.".into(),
                key_points: strings(&[
                    "Define clear system boundaries before analysis",
                    "Identify all external forces acting on the system",
                    "Apply vector addition principles correctly",
                    "Consider both magnitude and direction of forces",
                ]),
                suggested_next_steps: Some(strings(&[
                    "Practice drawing free-body diagrams",
                    "Work through vector addition examples",
                    "Review coordinate system selection",
                ])),
            }),
            Operation::Quiz => Generated::Items(strings(&[
                "Q: What is the formula for Force? (A: F=ma)",
                "Q: If acceleration is zero, what is the net force? (A: Zero)",
                "Q: Does mass change on the moon? (A: No)",
            ])),
            Operation::Decompose => Generated::Items(strings(&[
                "Review textbook Ch.2",
                "Watch lab video",
                "Complete practice set",
                "Write summary",
            ])),
            Operation::Brainstorm => Generated::Items(strings(&[
                "Mind map connections",
                "Real-world examples",
                "Historical context",
                "Mathematical derivation",
            ])),
        })
    }

    fn plan_flow(&self, topic: &str) -> Result<Vec<FlowStep>, GenerateError> {
        debug!(topic, "demo flow plan");
        self.pause(self.delay);
        Ok(vec![
            FlowStep {
                id: 1,
                title: "Introduction".into(),
                kind: "lecture".into(),
                description: "Overview of the topic".into(),
                depends_on: vec![],
            },
            FlowStep {
                id: 2,
                title: "Core Concept".into(),
                kind: "concept".into(),
                description: "Main definition and theory".into(),
                depends_on: vec![1],
            },
        ])
    }

    fn chat(&self, _question: &str, _context: &str) -> Result<String, GenerateError> {
        self.pause(self.chat_delay);
        Ok(DEMO_CHAT_REPLY.to_string())
    }
}

/// Stands in for a remote service when a real key is configured; every
/// call fails so callers surface a notification.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGenerator;

impl ContentGenerator for UnavailableGenerator {
    fn generate(
        &self,
        _operation: Operation,
        _prompt: &str,
        _attachment: Option<&Attachment>,
    ) -> Result<Generated, GenerateError> {
        Err(GenerateError::Unavailable)
    }

    fn plan_flow(&self, _topic: &str) -> Result<Vec<FlowStep>, GenerateError> {
        Err(GenerateError::Unavailable)
    }

    fn chat(&self, _question: &str, _context: &str) -> Result<String, GenerateError> {
        Err(GenerateError::Unavailable)
    }
}

pub fn generator_for(config: &AiConfig) -> Arc<dyn ContentGenerator> {
    if config.uses_demo() {
        Arc::new(DemoGenerator::default())
    } else {
        Arc::new(UnavailableGenerator)
    }
}

//##########################################################
// Prompt material
//##########################################################

/// `title` or `title: label`.
pub fn prompt_for(node: &Node) -> String {
    if node.data.label.is_empty() {
        node.title.clone()
    } else {
        format!("{}: {}", node.title, node.data.label)
    }
}

/// First attachment a generator can read.
pub fn attachment_for(node: &Node) -> Option<&Attachment> {
    node.data
        .attachments
        .iter()
        .find(|a| matches!(a.kind, AttachmentKind::File | AttachmentKind::Image))
}

/// Text of the given nodes for the chat panel.
pub fn visible_context(nodes: &[&Node]) -> String {
    if nodes.is_empty() {
        return "No nodes are currently visible on the canvas.".to_string();
    }
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let mut block = format!("Node {}: \"{}\"\n", i + 1, node.title);
            if !node.data.label.is_empty() {
                block.push_str(&format!("Content: {}\n", node.data.label));
            }
            for a in &node.data.attachments {
                if a.kind == AttachmentKind::File {
                    block.push_str(&format!("Attachment ({}): {}\n", a.name, a.data));
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcanvas::{NodeId, Point, Size};
    use rstest::rstest;

    fn node(label: &str) -> Node {
        Node::new(
            NodeId::from("n"),
            NodeKind::Concept,
            "Inertia",
            Point::ZERO,
            Size::new(260.0, 180.0),
        )
        .with_label(label)
    }

    #[rstest]
    #[case(Operation::Quiz, NodeKind::Question, "Question")]
    #[case(Operation::Brainstorm, NodeKind::Idea, "Sub-item")]
    #[case(Operation::Decompose, NodeKind::Task, "Sub-item")]
    fn test_child_nodes(#[case] op: Operation, #[case] kind: NodeKind, #[case] title: &str) {
        assert_eq!(op.child_kind(), kind);
        assert_eq!(op.child_title(), title);
    }

    #[test]
    fn test_demo_answers() {
        let g = DemoGenerator::instant();
        let Ok(Generated::Insight(insight)) = g.generate(Operation::Explain, "x", None) else {
            panic!("explain should give an insight");
        };
        assert_eq!(insight.key_points.len(), 4);
        let Ok(Generated::Items(items)) = g.generate(Operation::Quiz, "x", None) else {
            panic!("quiz should give items");
        };
        assert_eq!(items.len(), 3);
        let steps = g.plan_flow("Optics").unwrap();
        assert_eq!(steps[1].depends_on, vec![1]);
        assert_eq!(g.chat("?", "").unwrap(), DEMO_CHAT_REPLY);
    }

    #[test]
    fn test_flow_steps_use_camel_case_dependencies() {
        let step: FlowStep = serde_json::from_str(
            r#"{ "id": 3, "title": "T", "type": "task", "dependsOn": [1, 2] }"#,
        )
        .unwrap();
        assert_eq!(step.depends_on, vec![1, 2]);
        assert_eq!(step.description, "");
    }

    #[test]
    fn test_configured_key_without_service_fails() {
        let g = generator_for(&AiConfig {
            api_key: "real-key".into(),
        });
        assert_eq!(g.plan_flow("x"), Err(GenerateError::Unavailable));
    }

    #[test]
    fn test_prompt_and_context() {
        assert_eq!(prompt_for(&node("")), "Inertia");
        let mut n = node("resists change");
        assert_eq!(prompt_for(&n), "Inertia: resists change");
        n.data.attachments.push(Attachment {
            id: "a1".into(),
            name: "notes.md".into(),
            kind: AttachmentKind::File,
            data: "mass".into(),
        });
        let ctx = visible_context(&[&n]);
        assert!(ctx.starts_with("Node 1: \"Inertia\"\nContent: resists change\n"));
        assert!(ctx.contains("Attachment (notes.md): mass"));
        assert_eq!(attachment_for(&n).map(|a| a.id.as_str()), Some("a1"));
        assert_eq!(
            visible_context(&[]),
            "No nodes are currently visible on the canvas."
        );
    }
}
