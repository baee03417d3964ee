use flowcanvas::{
    Document, GraphStore, Interaction, Node, NodeId, Size, Viewport,
    viewport::visible_nodes,
};
use std::time::Duration;

use crate::config::AppConfig;
use crate::persistence::{Debouncer, SaveStatus};
use crate::versioned::Versioned;

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Settings { api_key: String },
    Topic { input: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub open: bool,
    pub input: String,
    pub messages: Vec<ChatMessage>,
    pub waiting: bool,
}

/// Everything the reducer reads and writes.
pub struct Store {
    pub config: AppConfig,
    pub graph: GraphStore,
    pub viewport: Versioned<Viewport>,
    pub interaction: Interaction,
    /// Size of the canvas area in screen pixels, reported by the view.
    pub canvas_size: Size,
    /// Node whose AI menu is open.
    pub ai_menu: Option<NodeId>,
    pub modal: Option<Modal>,
    pub chat: ChatState,
    /// Transient message shown in the toolbar.
    pub notification: Option<String>,
    pub error_message: Option<String>,
    pub save_status: SaveStatus,
    /// Saves are held back until the stored document has been loaded.
    pub persistence_ready: bool,
    pub save_debounce: Debouncer,
    /// Operations waiting on a worker.
    pub ai_busy: usize,
}

impl Store {
    pub fn new(config: AppConfig) -> Self {
        let debounce = Duration::from_millis(config.storage.debounce_ms);
        Self {
            graph: GraphStore::new((&config.canvas).into()),
            viewport: Versioned::new(Viewport::default()),
            interaction: Interaction::new(),
            canvas_size: Size::new(1280.0, 800.0),
            ai_menu: None,
            modal: None,
            chat: ChatState::default(),
            notification: None,
            error_message: None,
            save_status: SaveStatus::Loading,
            persistence_ready: false,
            save_debounce: Debouncer::new(debounce),
            ai_busy: 0,
            config,
        }
    }

    pub fn document(&self) -> Document {
        self.graph.snapshot(*self.viewport.get())
    }

    /// Replace graph and viewport, dropping references to vanished items.
    pub fn restore(&mut self, document: Document) {
        let mut viewport = self.graph.restore(document);
        if !(viewport.x.is_finite() && viewport.y.is_finite()) {
            viewport.x = 0.0;
            viewport.y = 0.0;
        }
        viewport.set_zoom(viewport.zoom, &self.config.canvas.zoom);
        self.viewport.set(viewport);
        self.interaction.forget_missing(&self.graph);
        if self
            .ai_menu
            .as_ref()
            .is_some_and(|id| self.graph.node(id).is_none())
        {
            self.ai_menu = None;
        }
    }

    /// Changes whenever anything that is persisted changes.
    pub fn persist_key(&self) -> (u64, u64) {
        (self.graph.revision(), self.viewport.version())
    }

    pub fn visible_nodes(&self) -> Vec<&Node> {
        visible_nodes(self.graph.nodes(), self.viewport.get(), self.canvas_size)
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(message.into());
    }
}
