use flowcanvas::{Attachment, Document, NodeId};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::ai::{self, ContentGenerator, Operation};
use crate::config::AppConfig;
use crate::importer;
use crate::persistence::PersistenceStore;
use crate::serialization;

/// Deferred effects that must run outside the main reducer (file IO,
/// dialogs, generator calls)
#[derive(Debug, Clone)]
pub enum Effect {
    LoadPersisted,
    Persist(Document),
    ClearPersisted,
    Export { path: PathBuf, document: Document },
    Import { path: PathBuf },
    Generate {
        node: NodeId,
        operation: Operation,
        prompt: String,
        attachment: Option<Attachment>,
    },
    PlanFlow { topic: String },
    Chat { question: String, context: String },
    /// Ask the user for a file to attach
    PickAttachment { node: NodeId },
    ImportAttachment {
        node: NodeId,
        path: PathBuf,
        id: String,
    },
    SaveSettings(AppConfig),
}

/// Called after a worker posts a result, so the UI can repaint.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Services the effects run against, and the channel results come back on.
pub struct Runtime {
    pub generator: Arc<dyn ContentGenerator>,
    pub persistence: Arc<dyn PersistenceStore>,
    pub config_path: PathBuf,
    inbox: Sender<Action>,
    waker: Waker,
    writer: Sender<Document>,
}

impl Runtime {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        persistence: Arc<dyn PersistenceStore>,
        config_path: PathBuf,
        inbox: Sender<Action>,
        waker: Waker,
    ) -> Self {
        let writer = spawn_writer(persistence.clone(), inbox.clone(), waker.clone());
        Self {
            generator,
            persistence,
            config_path,
            inbox,
            waker,
            writer,
        }
    }

    /// Run `job` on a worker thread and post its action back.
    fn spawn(&self, job: impl FnOnce(&dyn ContentGenerator) -> Action + Send + 'static) {
        let generator = self.generator.clone();
        let inbox = self.inbox.clone();
        let waker = self.waker.clone();
        thread::spawn(move || {
            let action = job(generator.as_ref());
            if inbox.send(action).is_ok() {
                waker();
            }
        });
    }
}

/// A single thread owns the storage writes. When several documents are
/// queued only the newest is written.
fn spawn_writer(
    persistence: Arc<dyn PersistenceStore>,
    inbox: Sender<Action>,
    waker: Waker,
) -> Sender<Document> {
    let (tx, rx): (Sender<Document>, Receiver<Document>) = mpsc::channel();
    thread::spawn(move || {
        while let Ok(mut document) = rx.recv() {
            let mut skipped = 0usize;
            while let Ok(newer) = rx.try_recv() {
                document = newer;
                skipped += 1;
            }
            let result = persistence.save(&document);
            debug!(skipped, ok = result.is_ok(), "persisted document");
            if inbox.send(Action::Saved(result)).is_err() {
                break;
            }
            waker();
        }
    });
    tx
}

/// Execute a single effect. Effects that finish on the spot hand back
/// their result; the rest post it to the runtime inbox later.
pub fn run(runtime: &mut Runtime, effect: Effect) -> Option<Action> {
    match effect {
        Effect::LoadPersisted => Some(Action::PersistedLoaded(runtime.persistence.load())),
        Effect::Persist(document) => {
            if runtime.writer.send(document).is_err() {
                warn!("storage writer has stopped");
            }
            None
        }
        Effect::ClearPersisted => Some(Action::Cleared(runtime.persistence.clear())),
        Effect::Export { path, document } => {
            let result = serialization::save_to_file(&document, &path).map(|()| path);
            Some(Action::Exported(result))
        }
        Effect::Import { path } => {
            info!(path = %path.display(), "importing document");
            Some(Action::Imported(serialization::load_from_file(&path)))
        }
        Effect::Generate {
            node,
            operation,
            prompt,
            attachment,
        } => {
            runtime.spawn(move |g| {
                let result = g.generate(operation, &prompt, attachment.as_ref());
                Action::AiFinished {
                    node,
                    operation,
                    result,
                }
            });
            None
        }
        Effect::PlanFlow { topic } => {
            runtime.spawn(move |g| {
                let result = g.plan_flow(&topic);
                Action::FlowPlanned { topic, result }
            });
            None
        }
        Effect::Chat { question, context } => {
            runtime.spawn(move |g| Action::ChatAnswered(g.chat(&question, &context)));
            None
        }
        Effect::PickAttachment { node } => rfd::FileDialog::new()
            .add_filter("Text", &["txt", "md", "markdown"])
            .add_filter("Image", &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"])
            .pick_file()
            .map(|path| Action::AttachFile { node, path }),
        Effect::ImportAttachment { node, path, id } => Some(Action::AttachmentImported {
            node,
            result: importer::import_file(&path, id),
        }),
        Effect::SaveSettings(config) => {
            runtime.generator = ai::generator_for(&config.ai);
            Some(Action::SettingsSaved(config.save(&runtime.config_path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{DemoGenerator, Generated};
    use crate::defaults::initial_document;
    use crate::persistence::MemoryStore;
    use std::time::Duration;

    fn runtime(memory: MemoryStore) -> (Runtime, Receiver<Action>) {
        let (tx, rx) = mpsc::channel();
        let runtime = Runtime::new(
            Arc::new(DemoGenerator::instant()),
            Arc::new(memory),
            std::env::temp_dir().join("flowdo_effects_config.json"),
            tx,
            Arc::new(|| {}),
        );
        (runtime, rx)
    }

    #[test]
    fn test_generation_posts_back() {
        let (mut runtime, rx) = runtime(MemoryStore::new());
        let none = run(
            &mut runtime,
            Effect::Generate {
                node: NodeId::from("1"),
                operation: Operation::Decompose,
                prompt: "x".into(),
                attachment: None,
            },
        );
        assert!(none.is_none());
        let action = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let Action::AiFinished {
            result: Ok(Generated::Items(items)),
            ..
        } = action
        else {
            panic!("expected generated items");
        };
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn test_persist_goes_through_writer() {
        let memory = MemoryStore::new();
        let (mut runtime, rx) = runtime(memory.clone());
        run(&mut runtime, Effect::Persist(initial_document()));
        let action = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(action, Action::Saved(Ok(()))));
        assert_eq!(memory.current(), Some(initial_document()));

        let loaded = run(&mut runtime, Effect::LoadPersisted);
        assert!(matches!(loaded, Some(Action::PersistedLoaded(Ok(Some(_))))));
        run(&mut runtime, Effect::ClearPersisted);
        assert_eq!(memory.current(), None);
    }

    #[test]
    fn test_export_then_import() {
        let (mut runtime, _rx) = runtime(MemoryStore::new());
        let path = std::env::temp_dir().join("flowdo_effects_export.json");
        let exported = run(
            &mut runtime,
            Effect::Export {
                path: path.clone(),
                document: initial_document(),
            },
        );
        assert!(matches!(exported, Some(Action::Exported(Ok(_)))));
        let Some(Action::Imported(Ok(doc))) = run(&mut runtime, Effect::Import { path: path.clone() })
        else {
            panic!("import failed");
        };
        assert_eq!(doc, initial_document());
        std::fs::remove_file(&path).ok();
    }
}
