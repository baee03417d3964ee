use flowcanvas::Document;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored state is unreadable: {0}")]
    Format(#[from] serde_json::Error),
}

/// Where the working document lives between sessions.
pub trait PersistenceStore: Send + Sync {
    /// `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<Document>, StorageError>;
    fn save(&self, document: &Document) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

// -------------------------------------------------------------------
// JSON file
// -------------------------------------------------------------------

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl PersistenceStore for JsonFileStore {
    fn load(&self) -> Result<Option<Document>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Written to a sibling file first so a failed write leaves the
    /// previous state intact.
    fn save(&self, document: &Document) -> Result<(), StorageError> {
        let text = serde_json::to_string(document)?;
        let scratch = self.scratch_path();
        std::fs::write(&scratch, text)?;
        std::fs::rename(&scratch, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// -------------------------------------------------------------------
// In memory
// -------------------------------------------------------------------

/// Shared in-process store; clones see the same slot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Document) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(document))),
        }
    }

    pub fn current(&self) -> Option<Document> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self) -> Result<Option<Document>, StorageError> {
        Ok(self.current())
    }

    fn save(&self, document: &Document) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(document.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

// -------------------------------------------------------------------
// Save scheduling
// -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Loading,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Loading => "Loading...",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Error => "Save error",
        }
    }
}

/// Fires once after `delay` has passed without a new `touch`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    due: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    pub fn touch(&mut self, now: Instant) {
        self.due = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }

    /// True exactly once per quiet period.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcanvas::Viewport;

    fn document() -> Document {
        crate::defaults::initial_document()
    }

    #[test]
    fn test_debouncer_waits_for_quiet() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut d = Debouncer::new(ms(200));
        assert!(!d.fire(t0));
        d.touch(t0);
        d.touch(t0 + ms(150));
        assert!(!d.fire(t0 + ms(300)));
        assert_eq!(d.time_left(t0 + ms(300)), Some(ms(50)));
        assert!(d.fire(t0 + ms(350)));
        assert!(!d.fire(t0 + ms(400)));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join("flowdo_persistence_test.json");
        let store = JsonFileStore::new(&path);
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        let mut doc = document();
        doc.viewport = Viewport::new(-40.0, 12.5, 0.75);
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), Some(doc));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_format_error() {
        let path = std::env::temp_dir().join("flowdo_persistence_corrupt_test.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Format(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.save(&document()).unwrap();
        assert!(b.load().unwrap().is_some());
        b.clear().unwrap();
        assert!(a.current().is_none());
    }
}
