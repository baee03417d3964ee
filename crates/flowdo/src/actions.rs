use flowcanvas::layout::{center_in_view, layout};
use flowcanvas::{
    Attachment, Document, EdgeId, GraphError, Group, GroupId, InputEvent,
    MinimapProjection, Node, NodeId, NodeKind, Outcome, Point, Selection, Size,
    Viewport,
};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::ai::{self, FlowStep, GenerateError, Generated, Operation};
use crate::config::ConfigError;
use crate::defaults::initial_document;
use crate::effects::Effect;
use crate::expand;
use crate::importer::ImportError;
use crate::node_card::{CardControl, control_at};
use crate::persistence::{SaveStatus, StorageError};
use crate::serialization::DocumentError;
use crate::store::{ChatMessage, ChatRole, Modal, Store};

/// Actions that can be dispatched to modify the application state
#[derive(Debug)]
pub enum Action {
    // Canvas
    /// Pointer, wheel, touch and keyboard input in canvas coordinates
    Input(InputEvent),
    /// Multiply the zoom (trackpad pinch)
    ZoomBy { factor: f64 },
    ZoomIn,
    ZoomOut,
    SetZoom(f64),
    ResetView,
    FitToView,
    /// Auto-layout, then center the result in the visible area
    MagicOrganize,
    CanvasResized(Size),
    /// Click on the minimap overlay, in overlay pixels
    MinimapClicked(Point),

    // Graph editing
    AddNode { kind: NodeKind, at: Point },
    AddGroup { at: Point },
    DeleteNode(NodeId),
    DeleteEdge(EdgeId),
    DeleteGroup(GroupId),
    /// Delete whatever is selected
    DeleteSelection,
    ToggleComplete(NodeId),
    ToggleNodePinned(NodeId),
    ToggleGroupPinned(GroupId),
    SetNodeTitle { node: NodeId, title: String },
    SetNodeLabel { node: NodeId, label: String },
    SetFlashcard { node: NodeId, front: String, back: String },
    FlipCard(NodeId),
    SetQuiz {
        node: NodeId,
        options: Vec<String>,
        correct: Option<String>,
    },
    SelectQuizAnswer { node: NodeId, answer: String },
    SetGroupTitle { group: GroupId, title: String },
    Select(Option<Selection>),

    // Attachments
    PickAttachment(NodeId),
    AttachFile { node: NodeId, path: PathBuf },
    AttachmentImported {
        node: NodeId,
        result: Result<Attachment, ImportError>,
    },
    DeleteAttachment { node: NodeId, attachment: String },

    // Menus
    OpenAiMenu(NodeId),
    CloseMenus,

    // AI
    RunAi { node: NodeId, operation: Operation },
    AiFinished {
        node: NodeId,
        operation: Operation,
        result: Result<Generated, GenerateError>,
    },
    OpenTopicModal,
    SetTopicInput(String),
    GenerateFlow,
    FlowPlanned {
        topic: String,
        result: Result<Vec<FlowStep>, GenerateError>,
    },

    // Chat
    ToggleChat,
    SetChatInput(String),
    SendChat,
    ChatAnswered(Result<String, GenerateError>),

    // Settings
    OpenSettings,
    SetApiKeyDraft(String),
    SaveSettings,
    SettingsSaved(Result<(), ConfigError>),
    CloseModal,

    // File Operations
    ExportTo(PathBuf),
    Exported(Result<PathBuf, DocumentError>),
    ImportFrom(PathBuf),
    Imported(Result<Document, DocumentError>),

    // Persistence
    LoadPersisted,
    PersistedLoaded(Result<Option<Document>, StorageError>),
    /// Write the current document (sent by the save debouncer)
    SaveNow,
    Saved(Result<(), StorageError>),
    /// Forget the stored document and bring back the sample
    ResetAll,
    Cleared(Result<(), StorageError>),

    DismissNotification,
    ClearErrorMessage,
}

/// Apply a single action to modify the store state
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    match action {
        // Canvas
        Action::Input(event) => {
            let mut viewport = *store.viewport.get();
            let outcomes = store.interaction.handle(
                event,
                &mut store.graph,
                &mut viewport,
                &store.config.canvas,
            );
            store.viewport.replace_if_changed(viewport);
            outcomes
                .into_iter()
                .flat_map(|o| on_outcome(store, o))
                .collect()
        }
        Action::ZoomBy { factor } => {
            let bounds = store.config.canvas.zoom;
            let mut vp = *store.viewport.get();
            vp.set_zoom(vp.zoom * factor, &bounds);
            store.viewport.replace_if_changed(vp);
            vec![]
        }
        Action::ZoomIn | Action::ZoomOut => {
            let step = store.config.canvas.zoom_step;
            let step = if matches!(action, Action::ZoomIn) { step } else { -step };
            let bounds = store.config.canvas.zoom;
            let mut vp = *store.viewport.get();
            vp.zoom_step(step, &bounds);
            store.viewport.replace_if_changed(vp);
            vec![]
        }
        Action::SetZoom(zoom) => {
            let bounds = store.config.canvas.zoom;
            let mut vp = *store.viewport.get();
            vp.set_zoom(zoom, &bounds);
            store.viewport.replace_if_changed(vp);
            vec![]
        }
        Action::ResetView => {
            store.viewport.replace_if_changed(Viewport::default());
            vec![]
        }
        Action::FitToView => {
            let cfg = &store.config.canvas;
            let mut vp = *store.viewport.get();
            if vp.fit_nodes(
                store.graph.nodes(),
                store.canvas_size,
                cfg.fit_padding_ratio,
                &cfg.zoom,
            ) {
                store.viewport.replace_if_changed(vp);
            } else {
                store.notify("No nodes to fit");
            }
            vec![]
        }
        Action::MagicOrganize => {
            if store.graph.nodes().is_empty() {
                store.notify("No nodes to organize");
                return vec![];
            }
            let mut arranged = layout(
                store.graph.nodes(),
                store.graph.edges(),
                &store.config.canvas.layout,
            );
            center_in_view(&mut arranged, store.viewport.get(), store.canvas_size);
            let moved = store
                .graph
                .set_positions(arranged.into_iter().map(|n| {
                    let pos = n.position();
                    (n.id, pos)
                }));
            info!(moved, "organized nodes");
            vec![]
        }
        Action::CanvasResized(size) => {
            store.canvas_size = size;
            vec![]
        }
        Action::MinimapClicked(click) => {
            if let Some(projection) = MinimapProjection::new(
                store.graph.nodes(),
                &store.config.canvas.minimap,
            ) {
                let next =
                    projection.recenter(click, store.viewport.get(), store.canvas_size);
                store.viewport.replace_if_changed(next);
            }
            vec![]
        }

        // Graph editing
        Action::AddNode { kind, at } => {
            let cfg = &store.config.canvas;
            let mut size = cfg.default_node_size;
            if kind == NodeKind::Flashcard {
                size.height = cfg.flashcard_height;
            }
            let id = NodeId::new(store.graph.next_id("n"));
            let mut node = Node::new(id, kind, kind.info().label, at, size);
            match kind {
                NodeKind::Flashcard => {
                    node.data.front = Some(String::new());
                    node.data.back = Some(String::new());
                }
                NodeKind::Quiz => node.data.quiz_options = Some(Vec::new()),
                _ => {}
            }
            report(store.graph.add_node(node).map(|_| ()));
            store.interaction.close_context_menu();
            vec![]
        }
        Action::AddGroup { at } => {
            let id = GroupId::new(store.graph.next_id("g"));
            let group =
                Group::new(id, "New Group", at, store.config.canvas.default_group_size);
            report(store.graph.add_group(group).map(|_| ()));
            store.interaction.close_context_menu();
            vec![]
        }
        Action::DeleteNode(id) => {
            let result = store.graph.delete_node(&id).map(|_| ());
            report(result);
            after_delete(store);
            vec![]
        }
        Action::DeleteEdge(id) => {
            let result = store.graph.delete_edge(&id).map(|_| ());
            report(result);
            after_delete(store);
            vec![]
        }
        Action::DeleteGroup(id) => {
            let result = store.graph.delete_group(&id).map(|_| ());
            report(result);
            after_delete(store);
            vec![]
        }
        Action::DeleteSelection => match store.interaction.selection().cloned() {
            Some(Selection::Node(id)) => update(store, Action::DeleteNode(id)),
            Some(Selection::Edge(id)) => update(store, Action::DeleteEdge(id)),
            Some(Selection::Group(id)) => update(store, Action::DeleteGroup(id)),
            None => vec![],
        },
        Action::ToggleComplete(id) => {
            toggle_complete(store, &id);
            vec![]
        }
        Action::ToggleNodePinned(id) => {
            let pinned = store.graph.node(&id).is_some_and(|n| n.pinned);
            let result = store.graph.set_node_pinned(&id, !pinned);
            report(result);
            store.interaction.close_context_menu();
            vec![]
        }
        Action::ToggleGroupPinned(id) => {
            let pinned = store.graph.group(&id).is_some_and(|g| g.pinned);
            let result = store.graph.set_group_pinned(&id, !pinned);
            report(result);
            store.interaction.close_context_menu();
            vec![]
        }
        Action::SetNodeTitle { node, title } => {
            edit_node(store, &node, |n| n.title = title);
            vec![]
        }
        Action::SetNodeLabel { node, label } => {
            edit_node(store, &node, |n| n.data.label = label);
            vec![]
        }
        Action::SetFlashcard { node, front, back } => {
            edit_node(store, &node, |n| {
                n.data.front = Some(front);
                n.data.back = Some(back);
            });
            vec![]
        }
        Action::FlipCard(node) => {
            edit_node(store, &node, |n| n.data.is_flipped = !n.data.is_flipped);
            vec![]
        }
        Action::SetQuiz {
            node,
            options,
            correct,
        } => {
            edit_node(store, &node, |n| {
                if n
                    .data
                    .user_selected_answer
                    .as_ref()
                    .is_some_and(|a| !options.contains(a))
                {
                    n.data.user_selected_answer = None;
                }
                n.data.correct_answer = correct.filter(|c| options.contains(c));
                n.data.quiz_options = Some(options);
            });
            vec![]
        }
        Action::SelectQuizAnswer { node, answer } => {
            edit_node(store, &node, |n| n.data.user_selected_answer = Some(answer));
            vec![]
        }
        Action::SetGroupTitle { group, title } => {
            let result = store.graph.update_group(&group, |g| g.title = title);
            report(result);
            vec![]
        }
        Action::Select(selection) => {
            store.interaction.select(selection);
            vec![]
        }

        // Attachments
        Action::PickAttachment(node) => vec![Effect::PickAttachment { node }],
        Action::AttachFile { node, path } => {
            let id = store.graph.next_id("att");
            vec![Effect::ImportAttachment { node, path, id }]
        }
        Action::AttachmentImported { node, result } => {
            match result {
                Ok(attachment) => {
                    edit_node(store, &node, |n| n.data.attachments.push(attachment))
                }
                Err(e) => {
                    warn!(error = %e, "attachment rejected");
                    store.notify(e.to_string());
                }
            }
            vec![]
        }
        Action::DeleteAttachment { node, attachment } => {
            edit_node(store, &node, |n| {
                n.data.attachments.retain(|a| a.id != attachment)
            });
            vec![]
        }

        // Menus
        Action::OpenAiMenu(node) => {
            store.interaction.close_context_menu();
            store.ai_menu = store.graph.node(&node).map(|n| n.id.clone());
            vec![]
        }
        Action::CloseMenus => {
            store.interaction.close_context_menu();
            store.ai_menu = None;
            vec![]
        }

        // AI
        Action::RunAi { node, operation } => {
            store.ai_menu = None;
            let Some(source) = store.graph.node(&node) else {
                return vec![];
            };
            let prompt = ai::prompt_for(source);
            let attachment = ai::attachment_for(source).cloned();
            store.ai_busy += 1;
            info!(node = %node, ?operation, "ai request");
            vec![Effect::Generate {
                node,
                operation,
                prompt,
                attachment,
            }]
        }
        Action::AiFinished {
            node,
            operation,
            result,
        } => {
            store.ai_busy = store.ai_busy.saturating_sub(1);
            on_generated(store, &node, operation, result);
            vec![]
        }
        Action::OpenTopicModal => {
            store.modal = Some(Modal::Topic {
                input: String::new(),
            });
            vec![]
        }
        Action::SetTopicInput(text) => {
            if let Some(Modal::Topic { input }) = &mut store.modal {
                *input = text;
            }
            vec![]
        }
        Action::GenerateFlow => {
            let topic = match &store.modal {
                Some(Modal::Topic { input }) => input.trim().to_string(),
                _ => return vec![],
            };
            if topic.is_empty() {
                return vec![];
            }
            store.modal = None;
            store.ai_busy += 1;
            info!(%topic, "flow request");
            vec![Effect::PlanFlow { topic }]
        }
        Action::FlowPlanned { topic, result } => {
            store.ai_busy = store.ai_busy.saturating_sub(1);
            match result {
                Ok(steps) if steps.is_empty() => {
                    store.notify("AI could not generate a valid plan.")
                }
                Ok(steps) => {
                    let viewport = *store.viewport.get();
                    let batch = expand::flow_batch(
                        &mut store.graph,
                        &topic,
                        &steps,
                        &viewport,
                        &store.config.canvas,
                    );
                    if let Err(e) = store.graph.append_batch(batch) {
                        warn!(error = %e, "flow batch rejected");
                        store.notify(format!("AI Flow Failed: {e}"));
                    }
                }
                Err(e) => {
                    warn!(error = %e, "flow generation failed");
                    store.notify(format!("AI Flow Failed: {e}"));
                }
            }
            vec![]
        }

        // Chat
        Action::ToggleChat => {
            store.chat.open = !store.chat.open;
            vec![]
        }
        Action::SetChatInput(text) => {
            store.chat.input = text;
            vec![]
        }
        Action::SendChat => {
            let question = store.chat.input.trim().to_string();
            if question.is_empty() || store.chat.waiting {
                return vec![];
            }
            let context = ai::visible_context(&store.visible_nodes());
            store.chat.messages.push(ChatMessage {
                role: ChatRole::User,
                content: question.clone(),
            });
            store.chat.input.clear();
            store.chat.waiting = true;
            vec![Effect::Chat { question, context }]
        }
        Action::ChatAnswered(result) => {
            store.chat.waiting = false;
            let content = match result {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "chat failed");
                    format!("Sorry, I encountered an error: {e}")
                }
            };
            store.chat.messages.push(ChatMessage {
                role: ChatRole::Assistant,
                content,
            });
            vec![]
        }

        // Settings
        Action::OpenSettings => {
            store.modal = Some(Modal::Settings {
                api_key: store.config.ai.api_key.clone(),
            });
            vec![]
        }
        Action::SetApiKeyDraft(key) => {
            if let Some(Modal::Settings { api_key }) = &mut store.modal {
                *api_key = key;
            }
            vec![]
        }
        Action::SaveSettings => {
            let Some(Modal::Settings { api_key }) = store.modal.take() else {
                return vec![];
            };
            store.config.ai.api_key = api_key.trim().to_string();
            vec![Effect::SaveSettings(store.config.clone())]
        }
        Action::SettingsSaved(result) => {
            if let Err(e) = result {
                store.error_message = Some(e.to_string());
            }
            vec![]
        }
        Action::CloseModal => {
            store.modal = None;
            vec![]
        }

        // File Operations
        Action::ExportTo(path) => vec![Effect::Export {
            path,
            document: store.document(),
        }],
        Action::Exported(result) => {
            match result {
                Ok(path) => store.notify(format!("Exported to {}", path.display())),
                Err(e) => store.error_message = Some(e.to_string()),
            }
            vec![]
        }
        Action::ImportFrom(path) => vec![Effect::Import { path }],
        Action::Imported(result) => {
            match result {
                Ok(document) => {
                    info!(nodes = document.nodes.len(), "document imported");
                    store.restore(document);
                    store.notify("Flow imported");
                }
                Err(e) => store.error_message = Some(e.to_string()),
            }
            vec![]
        }

        // Persistence
        Action::LoadPersisted => {
            store.save_status = SaveStatus::Loading;
            vec![Effect::LoadPersisted]
        }
        Action::PersistedLoaded(result) => {
            match result {
                Ok(Some(document)) => {
                    info!(nodes = document.nodes.len(), "restored saved state");
                    store.restore(document);
                    store.save_status = SaveStatus::Saved;
                }
                Ok(None) => store.save_status = SaveStatus::Saved,
                Err(e) => {
                    warn!(error = %e, "could not load saved state");
                    store.save_status = SaveStatus::Error;
                }
            }
            store.persistence_ready = true;
            vec![]
        }
        Action::SaveNow => {
            if !store.persistence_ready {
                return vec![];
            }
            store.save_status = SaveStatus::Saving;
            vec![Effect::Persist(store.document())]
        }
        Action::Saved(result) => {
            store.save_status = match result {
                Ok(()) => SaveStatus::Saved,
                Err(e) => {
                    warn!(error = %e, "save failed");
                    SaveStatus::Error
                }
            };
            vec![]
        }
        Action::ResetAll => {
            store.restore(initial_document());
            store.interaction.select(None);
            store.ai_menu = None;
            store.modal = None;
            vec![Effect::ClearPersisted]
        }
        Action::Cleared(result) => {
            if let Err(e) = result {
                warn!(error = %e, "could not clear saved state");
                store.save_status = SaveStatus::Error;
            }
            vec![]
        }

        Action::DismissNotification => {
            store.notification = None;
            vec![]
        }
        Action::ClearErrorMessage => {
            store.error_message = None;
            vec![]
        }
    }
}

// ------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------

fn on_outcome(store: &mut Store, outcome: Outcome) -> Vec<Effect> {
    match outcome {
        Outcome::SelectionChanged(_) => {}
        Outcome::EdgeCreated(edge) => info!(%edge, "edge created"),
        Outcome::ContextMenuOpened(_) => store.ai_menu = None,
        Outcome::MenusClosed => {
            store.ai_menu = None;
            store.modal = None;
        }
        Outcome::ControlPressed { node, world } => {
            let control = store
                .graph
                .node(&node)
                .and_then(|n| control_at(n, world, &store.config.canvas.card));
            match control {
                Some(CardControl::Complete) => toggle_complete(store, &node),
                Some(CardControl::Ai) => {
                    return update(store, Action::OpenAiMenu(node));
                }
                Some(CardControl::Attach) => {
                    return vec![Effect::PickAttachment { node }];
                }
                None => {}
            }
        }
    }
    vec![]
}

fn toggle_complete(store: &mut Store, id: &NodeId) {
    match store.graph.toggle_complete(id) {
        Ok(done) => debug!(node = %id, done, "completion toggled"),
        Err(GraphError::Locked(_)) => {
            store.notify("Complete the prerequisites first")
        }
        Err(e) => debug!(error = %e, "toggle ignored"),
    }
}

fn on_generated(
    store: &mut Store,
    node: &NodeId,
    operation: Operation,
    result: Result<Generated, GenerateError>,
) {
    match result {
        Ok(Generated::Insight(insight)) => {
            edit_node(store, node, |n| n.data.ai_insight = Some(insight))
        }
        Ok(Generated::Items(items)) if items.is_empty() => {
            store.notify("AI returned no suggestions.")
        }
        Ok(Generated::Items(items)) => {
            let Some(source) = store.graph.node(node).cloned() else {
                debug!(%node, "source node gone before results arrived");
                return;
            };
            let batch = expand::child_batch(
                &mut store.graph,
                &source,
                operation,
                &items,
                &store.config.canvas,
            );
            match store.graph.append_batch(batch) {
                Ok(()) => info!(%node, count = items.len(), "ai nodes added"),
                Err(e) => {
                    warn!(error = %e, "ai batch rejected");
                    store.notify(format!("AI Failed: {e}"));
                }
            }
        }
        Err(e) => {
            warn!(error = %e, ?operation, "ai request failed");
            store.notify(format!("AI Failed: {e}"));
        }
    }
}

fn edit_node(store: &mut Store, id: &NodeId, f: impl FnOnce(&mut Node)) {
    let result = store.graph.update_node(id, f);
    report(result);
}

/// Graph errors from UI actions mean the target vanished in between; they
/// are logged and otherwise ignored.
fn report(result: Result<(), GraphError>) {
    if let Err(e) = result {
        debug!(error = %e, "graph edit ignored");
    }
}

fn after_delete(store: &mut Store) {
    store.interaction.forget_missing(&store.graph);
    store.interaction.close_context_menu();
    if store
        .ai_menu
        .as_ref()
        .is_some_and(|id| store.graph.node(id).is_none())
    {
        store.ai_menu = None;
    }
}
