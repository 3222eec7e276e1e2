// Persistence collaborator: load once at startup, save fire-and-forget.
//
// Load failures of any kind read as "no prior state". Save failures are
// logged here and never reach the layout engine; the state simply stays
// in memory until the next successful save.
//
// Saves go through one writer task, in the order they were requested, so
// the newest state is always the last one written.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::SavedState;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Where the shell's state lives between sessions.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the saved state. `None` means start fresh.
    async fn load_state(&self) -> Option<SavedState>;

    async fn save_state(&self, state: &SavedState) -> Result<(), PersistError>;
}

// ---------------------------------------------------------------------------
// Saver task
// ---------------------------------------------------------------------------

enum SaveRequest {
    Save(SavedState),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer. Requests are applied in order; saves
/// that queue up while a write is in flight collapse into the newest one.
pub struct StateSaver {
    tx: mpsc::UnboundedSender<SaveRequest>,
    handle: JoinHandle<()>,
}

impl StateSaver {
    pub fn spawn(store: Arc<dyn StateStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_saver(store, rx));
        StateSaver { tx, handle }
    }

    /// Queue a save without waiting for it. Failures are logged.
    pub fn save(&self, state: SavedState) {
        if self.tx.send(SaveRequest::Save(state)).is_err() {
            warn!("State saver is gone, dropping save");
        }
    }

    /// Wait until every save queued so far has been written (or failed).
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SaveRequest::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Write whatever is queued and stop the writer.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!("State saver task failed: {}", e);
        }
    }
}

async fn run_saver(store: Arc<dyn StateStore>, mut rx: mpsc::UnboundedReceiver<SaveRequest>) {
    while let Some(first) = rx.recv().await {
        let mut latest = None;
        let mut acks = Vec::new();
        let mut next = Some(first);
        while let Some(request) = next {
            match request {
                SaveRequest::Save(state) => latest = Some(state),
                SaveRequest::Flush(ack) => acks.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if let Some(state) = latest {
            match store.save_state(&state).await {
                Ok(()) => debug!("State saved"),
                Err(e) => warn!("Failed to save state: {}", e),
            }
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
    debug!("State saver stopped");
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// A single JSON file, replaced atomically on every save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    writes: AtomicU64,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            path: path.into(),
            writes: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Unique per write, so overlapping saves never share a temp file.
    fn temp_path(&self) -> PathBuf {
        let seq = self.writes.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{seq}.tmp"));
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_state(&self) -> Option<SavedState> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                info!("Loaded state from {}", self.path.display());
                Some(SavedState::from_json_str(&text))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No state file at {}, starting fresh", self.path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read state file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    async fn save_state(&self, state: &SavedState) -> Result<(), PersistError> {
        let json = state.to_json_string()?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.write_error(e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.write_error(e));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps state in memory. Counts saves and can be told to fail them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<SavedState>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new(initial: Option<SavedState>) -> Self {
        MemoryStore {
            state: Mutex::new(initial),
            saves: AtomicUsize::new(0),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail.
    pub fn failing() -> Self {
        MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn last_saved(&self) -> Option<SavedState> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<SavedState>> {
        self.state.lock().expect("state mutex poisoned")
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_state(&self) -> Option<SavedState> {
        self.lock().clone()
    }

    async fn save_state(&self, state: &SavedState) -> Result<(), PersistError> {
        if self.fail_saves {
            return Err(PersistError::Unavailable("memory store set to fail".into()));
        }
        *self.lock() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PanelSnapshot;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quill_persist_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_state() -> SavedState {
        let mut state = SavedState::default();
        state.record_setup(
            "writing",
            vec!["manuscript".into()],
            vec![PanelSnapshot {
                id: "manuscript".into(),
                title: "Manuscript".into(),
                x: 3,
                y: 1,
                width: 60,
                height: 20,
            }],
        );
        state
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = temp_dir("missing");
        let store = JsonFileStore::new(dir.join("state.json"));
        assert!(store.load_state().await.is_none());
    }

    #[tokio::test]
    async fn save_creates_directories_and_loads_back() {
        let dir = temp_dir("round_trip");
        let store = JsonFileStore::new(dir.join("nested").join("state.json"));
        let state = sample_state();

        store.save_state(&state).await.unwrap();
        let names: Vec<_> = fs::read_dir(dir.join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["state.json"]);
        assert_eq!(store.load_state().await, Some(state));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_fresh_state() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");
        fs::write(&path, "{{{{").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.load_state().await, Some(SavedState::default()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unreadable_path_loads_as_none() {
        // A directory where the file should be.
        let dir = temp_dir("is_dir");
        fs::create_dir_all(dir.join("state.json")).unwrap();
        let store = JsonFileStore::new(dir.join("state.json"));
        assert!(store.load_state().await.is_none());
        assert!(store.save_state(&sample_state()).await.is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    fn state_at(x: i32) -> SavedState {
        let mut state = sample_state();
        state.set_layout(
            "writing",
            vec![PanelSnapshot {
                id: "manuscript".into(),
                title: "Manuscript".into(),
                x,
                y: 0,
                width: 10,
                height: 5,
            }],
        );
        state
    }

    #[tokio::test]
    async fn saver_swallows_failures() {
        let store = Arc::new(MemoryStore::failing());
        let saver = StateSaver::spawn(store.clone());
        saver.save(sample_state());
        saver.flush().await;
        assert_eq!(store.save_count(), 0);
        assert!(store.last_saved().is_none());
    }

    #[tokio::test]
    async fn saver_writes_through() {
        let store = Arc::new(MemoryStore::new(None));
        let saver = StateSaver::spawn(store.clone());
        saver.save(sample_state());
        saver.flush().await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.last_saved(), Some(sample_state()));
    }

    #[tokio::test]
    async fn queued_saves_collapse_into_the_newest() {
        let store = Arc::new(MemoryStore::new(None));
        let saver = StateSaver::spawn(store.clone());
        for x in 0..30 {
            saver.save(state_at(x));
        }
        saver.close().await;

        assert!(store.save_count() >= 1 && store.save_count() <= 30);
        assert_eq!(store.last_saved(), Some(state_at(29)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn rapid_saves_leave_the_newest_state_on_disk() {
        let dir = temp_dir("rapid");
        let store = Arc::new(JsonFileStore::new(dir.join("state.json")));
        let saver = StateSaver::spawn(store.clone());
        for x in 0..30 {
            saver.save(state_at(x));
        }
        saver.flush().await;

        assert_eq!(store.load_state().await, Some(state_at(29)));
        saver.close().await;
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_direct_saves_all_succeed() {
        let dir = temp_dir("overlap");
        let store = Arc::new(JsonFileStore::new(dir.join("state.json")));
        let handles: Vec<_> = (0..10)
            .map(|x| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.save_state(&state_at(x)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let loaded = store.load_state().await.unwrap();
        assert_eq!(loaded.layout("writing").unwrap().len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
