//! Column layout persistence across sessions.
//!
//! The grid's [`ColumnRegistry`](gridline_widgets::columns::ColumnRegistry)
//! only knows the [`LayoutStore`] contract. This module supplies the
//! concrete store: a [`LayoutRegistry`] cache over a pluggable
//! [`StorageBackend`], adapted to the contract by [`PersistentLayoutStore`].
//!
//! ```text
//! ColumnRegistry ──LayoutStore──▶ PersistentLayoutStore
//!                                     │ save: set + optional flush
//!                                     ▼
//!                               LayoutRegistry   cache keyed "table::scope",
//!                                     │          dirty flag
//!                                     ▼
//!                               StorageBackend   MemoryStorage | FileStorage
//! ```
//!
//! Storage never panics. Backend and registry calls return
//! [`StorageResult`]; the [`LayoutStore`] adapter logs failures and the grid
//! carries on with its in-memory layout. [`FileStorage`] (behind the
//! `state-persistence` feature) writes a sibling temp file and renames it
//! into place, and skips individual entries it cannot decode or whose
//! version differs from [`LAYOUT_VERSION`]. Those grids fall back to the
//! schema's default layout. Every save carries the complete column list.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gridline_widgets::columns::ActiveColumnItem;
use gridline_widgets::stateful::{LayoutStore, StateKey};

/// Current layout entry version. Entries stored under another version are
/// ignored on load.
pub const LAYOUT_VERSION: u32 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Why a layout could not be read or written.
#[derive(Debug)]
pub enum StorageError {
    /// The filesystem refused a read, write or rename.
    Io(std::io::Error),
    /// The layout file is not valid JSON for this format.
    #[cfg(feature = "state-persistence")]
    Serialization(String),
    /// A lock was poisoned by a panicking writer.
    Corruption(String),
    /// The backend cannot be used right now.
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "layout storage I/O failed: {err}"),
            #[cfg(feature = "state-persistence")]
            Self::Serialization(msg) => write!(f, "layout file malformed: {msg}"),
            Self::Corruption(msg) => write!(f, "layout storage corrupted: {msg}"),
            Self::Unavailable(msg) => write!(f, "layout storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// One stored layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredLayout {
    /// Canonical key (`table::scope`).
    pub key: String,
    /// Entry version, [`LAYOUT_VERSION`] when written by this crate.
    pub version: u32,
    /// Complete column layout in display order.
    pub columns: Vec<ActiveColumnItem>,
}

impl StoredLayout {
    /// Entry at the current version.
    #[must_use]
    pub fn new(key: impl Into<String>, columns: Vec<ActiveColumnItem>) -> Self {
        Self {
            key: key.into(),
            version: LAYOUT_VERSION,
            columns,
        }
    }
}

/// Pluggable layout storage.
///
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Implementation Notes
///
/// - `load_all` should be resilient to partial corruption.
/// - `save_all` should be atomic (write-then-rename for files).
/// - `clear` should remove every stored layout.
pub trait StorageBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load every stored layout. Empty on first run.
    fn load_all(&self) -> StorageResult<HashMap<String, StoredLayout>>;

    /// Replace all stored layouts.
    fn save_all(&self, entries: &HashMap<String, StoredLayout>) -> StorageResult<()>;

    /// Remove all stored layouts.
    fn clear(&self) -> StorageResult<()>;

    /// Whether the backend can be written to.
    fn is_available(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory backend. Layouts are lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, StoredLayout>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory storage pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: HashMap<String, StoredLayout>) -> Self {
        Self {
            data: RwLock::new(entries),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load_all(&self) -> StorageResult<HashMap<String, StoredLayout>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Corruption("memory storage lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, entries: &HashMap<String, StoredLayout>) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("memory storage lock poisoned".into()))?;
        *guard = entries.clone();
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("memory storage lock poisoned".into()))?;
        guard.clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("entries", &count)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Storage (requires state-persistence feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "state-persistence")]
mod file_storage {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    #[derive(Serialize, Deserialize)]
    struct LayoutFile {
        /// Format version for future migrations.
        format_version: u32,
        /// Entries stay raw until each one is decoded on its own, so one bad
        /// entry cannot fail the whole file.
        entries: HashMap<String, serde_json::Value>,
    }

    #[derive(Serialize, Deserialize)]
    struct FileEntry {
        version: u32,
        columns: Vec<FileColumn>,
    }

    #[derive(Serialize, Deserialize)]
    struct FileColumn {
        id: String,
        name: String,
        shown: bool,
    }

    impl LayoutFile {
        const FORMAT_VERSION: u32 = 1;
    }

    impl From<&ActiveColumnItem> for FileColumn {
        fn from(item: &ActiveColumnItem) -> Self {
            Self {
                id: item.id.clone(),
                name: item.name.clone(),
                shown: item.shown,
            }
        }
    }

    impl From<FileColumn> for ActiveColumnItem {
        fn from(col: FileColumn) -> Self {
            ActiveColumnItem::new(col.id, col.name, col.shown)
        }
    }

    /// JSON file backend.
    ///
    /// # File Format
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "entries": {
    ///     "requests::org-1": {
    ///       "version": 1,
    ///       "columns": [
    ///         { "id": "latency", "name": "Latency", "shown": true },
    ///         { "id": "model", "name": "Model", "shown": false }
    ///       ]
    ///     }
    ///   }
    /// }
    /// ```
    ///
    /// # Atomic Writes
    ///
    /// 1. Write to `{path}.tmp`
    /// 2. Flush and sync
    /// 3. Rename `{path}.tmp` -> `{path}`
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        /// Storage at `path`. The file is created on first save.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// Storage at `$XDG_STATE_HOME/gridline/{app_name}/layouts.json`,
        /// falling back to `~/.local/state` and then the working directory.
        #[must_use]
        pub fn default_for_app(app_name: &str) -> Self {
            let path = state_dir()
                .join("gridline")
                .join(app_name)
                .join("layouts.json");
            Self { path }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }
    }

    fn state_dir() -> PathBuf {
        if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(state_home);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local").join("state");
        }
        PathBuf::from(".")
    }

    impl StorageBackend for FileStorage {
        fn name(&self) -> &str {
            "FileStorage"
        }

        fn load_all(&self) -> StorageResult<HashMap<String, StoredLayout>> {
            if !self.path.exists() {
                return Ok(HashMap::new());
            }

            let reader = BufReader::new(File::open(&self.path)?);
            let file: LayoutFile = serde_json::from_reader(reader).map_err(|e| {
                StorageError::Serialization(format!("failed to parse layout file: {e}"))
            })?;

            if file.format_version != LayoutFile::FORMAT_VERSION {
                tracing::warn!(
                    stored = file.format_version,
                    expected = LayoutFile::FORMAT_VERSION,
                    "layout file format version mismatch, ignoring stored layouts"
                );
                return Ok(HashMap::new());
            }

            let mut result = HashMap::with_capacity(file.entries.len());
            for (key, raw) in file.entries {
                let entry: FileEntry = match serde_json::from_value(raw) {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "failed to decode layout entry, skipping");
                        continue;
                    }
                };
                if entry.version != LAYOUT_VERSION {
                    tracing::warn!(
                        key = %key,
                        stored = entry.version,
                        expected = LAYOUT_VERSION,
                        "layout entry version mismatch, skipping"
                    );
                    continue;
                }
                let columns = entry.columns.into_iter().map(ActiveColumnItem::from).collect();
                result.insert(
                    key.clone(),
                    StoredLayout {
                        key,
                        version: entry.version,
                        columns,
                    },
                );
            }

            Ok(result)
        }

        fn save_all(&self, entries: &HashMap<String, StoredLayout>) -> StorageResult<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut file = LayoutFile {
                format_version: LayoutFile::FORMAT_VERSION,
                entries: HashMap::with_capacity(entries.len()),
            };
            for (key, layout) in entries {
                let entry = FileEntry {
                    version: layout.version,
                    columns: layout.columns.iter().map(FileColumn::from).collect(),
                };
                let value = serde_json::to_value(entry).map_err(|e| {
                    StorageError::Serialization(format!("failed to encode layout {key}: {e}"))
                })?;
                file.entries.insert(key.clone(), value);
            }

            let tmp_path = self.temp_path();
            {
                let mut writer = BufWriter::new(File::create(&tmp_path)?);
                serde_json::to_writer_pretty(&mut writer, &file).map_err(|e| {
                    StorageError::Serialization(format!("failed to serialize layouts: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;

            tracing::debug!(
                path = %self.path.display(),
                entries = entries.len(),
                "saved column layouts"
            );
            Ok(())
        }

        fn clear(&self) -> StorageResult<()> {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            Ok(())
        }

        fn is_available(&self) -> bool {
            let Some(parent) = self.path.parent() else {
                return false;
            };
            if !parent.exists() {
                return fs::create_dir_all(parent).is_ok();
            }
            let probe = parent.join(".gridline_test_write");
            if fs::write(&probe, b"test").is_ok() {
                let _ = fs::remove_file(&probe);
                return true;
            }
            false
        }
    }

    impl fmt::Debug for FileStorage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStorage")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "state-persistence")]
pub use file_storage::FileStorage;

// ─────────────────────────────────────────────────────────────────────────────
// Layout Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Cached layouts plus the unsaved-changes flag, guarded together so a
/// flush never sees one without the other.
#[derive(Default)]
struct Cache {
    layouts: HashMap<String, StoredLayout>,
    dirty: bool,
}

/// In-memory cache of layouts over a [`StorageBackend`].
///
/// Does not load on construction; call [`load`](Self::load) first. Reads
/// and writes go to the cache; only [`load`](Self::load),
/// [`flush`](Self::flush) and [`clear`](Self::clear) touch the backend.
pub struct LayoutRegistry {
    backend: Box<dyn StorageBackend>,
    cache: RwLock<Cache>,
}

impl LayoutRegistry {
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(Cache::default()),
        }
    }

    /// Registry over [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Registry over a [`FileStorage`] at `path`.
    #[cfg(feature = "state-persistence")]
    #[must_use]
    pub fn with_file(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Cache>> {
        self.cache
            .read()
            .map_err(|_| StorageError::Corruption("layout cache lock poisoned".into()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Cache>> {
        self.cache
            .write()
            .map_err(|_| StorageError::Corruption("layout cache lock poisoned".into()))
    }

    /// Replace the cache with the backend's contents, discarding unsaved
    /// changes. Returns the number of layouts loaded.
    pub fn load(&self) -> StorageResult<usize> {
        let layouts = self.backend.load_all()?;
        let count = layouts.len();
        *self.write()? = Cache {
            layouts,
            dirty: false,
        };
        tracing::debug!(backend = %self.backend.name(), count, "loaded column layouts");
        Ok(count)
    }

    /// Write the cache to the backend if it changed. Returns whether
    /// anything was written. The cache stays dirty when the write fails.
    pub fn flush(&self) -> StorageResult<bool> {
        let mut cache = self.write()?;
        if !cache.dirty {
            return Ok(false);
        }
        self.backend.save_all(&cache.layouts)?;
        cache.dirty = false;
        Ok(true)
    }

    /// Cached layout for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredLayout> {
        self.read().ok()?.layouts.get(key).cloned()
    }

    /// Replace the layout for `key` and mark the registry dirty.
    /// Returns `false`, and logs, when the cache lock is poisoned.
    pub fn set(&self, key: impl Into<String>, columns: Vec<ActiveColumnItem>) -> bool {
        let key = key.into();
        match self.write() {
            Ok(mut cache) => {
                cache.layouts.insert(key.clone(), StoredLayout::new(key, columns));
                cache.dirty = true;
                true
            }
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "dropping column layout update");
                false
            }
        }
    }

    /// Remove the layout for `key`, returning it.
    pub fn remove(&self, key: &str) -> Option<StoredLayout> {
        let mut cache = self.write().ok()?;
        let removed = cache.layouts.remove(key)?;
        cache.dirty = true;
        Some(removed)
    }

    /// Drop every layout from both the backend and the cache. The cache is
    /// left alone when the backend refuses.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.clear()?;
        *self.write()? = Cache::default();
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().map(|c| c.layouts.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether there are unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.read().map(|c| c.dirty).unwrap_or(false)
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Cached keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .read()
            .map(|c| c.layouts.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }

    /// Wrap in `Arc` for sharing between stores.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Snapshot of registry counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let Ok(cache) = self.read() else {
            return RegistryStats {
                backend: self.backend.name().to_string(),
                ..RegistryStats::default()
            };
        };
        RegistryStats {
            entry_count: cache.layouts.len(),
            column_count: cache.layouts.values().map(|e| e.columns.len()).sum(),
            dirty: cache.dirty,
            backend: self.backend.name().to_string(),
        }
    }
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("backend", &self.backend.name())
            .field("entries", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// Registry counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub entry_count: usize,
    /// Columns summed over every layout.
    pub column_count: usize,
    pub dirty: bool,
    pub backend: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// LayoutStore adapter
// ─────────────────────────────────────────────────────────────────────────────

/// [`LayoutStore`] backed by a shared [`LayoutRegistry`].
///
/// With autoflush on (the default) every save is written through to the
/// backend. Write failures are logged; the grid keeps its in-memory layout.
#[derive(Debug, Clone)]
pub struct PersistentLayoutStore {
    registry: Arc<LayoutRegistry>,
    autoflush: bool,
}

impl PersistentLayoutStore {
    #[must_use]
    pub fn new(registry: Arc<LayoutRegistry>) -> Self {
        Self {
            registry,
            autoflush: true,
        }
    }

    /// Defer writes until the host calls [`LayoutRegistry::flush`].
    #[must_use]
    pub fn with_autoflush(mut self, autoflush: bool) -> Self {
        self.autoflush = autoflush;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<LayoutRegistry> {
        &self.registry
    }
}

impl LayoutStore for PersistentLayoutStore {
    fn load(&self, key: &StateKey) -> Option<Vec<ActiveColumnItem>> {
        self.registry.get(&key.canonical()).map(|entry| entry.columns)
    }

    fn save(&self, key: &StateKey, columns: &[ActiveColumnItem]) {
        if !self.registry.set(key.canonical(), columns.to_vec()) || !self.autoflush {
            return;
        }
        if let Err(error) = self.registry.flush() {
            tracing::warn!(
                key = %key,
                backend = %self.registry.backend_name(),
                error = %error,
                "failed to persist column layout"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
