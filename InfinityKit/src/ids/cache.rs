//! Process-wide IDS table cache

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use walkdir::WalkDir;

use super::SymbolSource;
use super::parser::{IdsTable, normalize_name};
use crate::error::Result;

#[derive(Debug, Default)]
struct CacheState {
    initialized: bool,
    tables: HashMap<String, Arc<IdsTable>>,
}

/// Cache of parsed IDS tables keyed by normalized name
///
/// Population happens at most once per lifecycle: after the first successful
/// `initialize_*` call further calls are no-ops until [`IdsCache::reset`].
#[derive(Debug, Default)]
pub struct IdsCache {
    state: Mutex<CacheState>,
}

impl IdsCache {
    /// A private, empty cache (tests and isolated tools)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared cache used by the format plugins
    pub fn global() -> &'static IdsCache {
        static CACHE: OnceLock<IdsCache> = OnceLock::new();
        CACHE.get_or_init(IdsCache::new)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Populate the cache from `(file name, file bytes)` pairs
    ///
    /// Returns `true` if this call populated the cache, `false` if it was
    /// already initialized.
    pub fn initialize_with_ids_files<I, N, B>(&self, files: I) -> bool
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let mut state = self.lock();
        if state.initialized {
            return false;
        }
        for (name, bytes) in files {
            let table = IdsTable::from_bytes(name.as_ref(), bytes.as_ref());
            tracing::debug!("Loaded IDS table {} ({} entries)", table.name(), table.len());
            state
                .tables
                .entry(table.name().to_string())
                .or_insert_with(|| Arc::new(table));
        }
        state.initialized = true;
        true
    }

    /// Populate the cache from every `*.IDS` file below `dir`
    pub fn initialize_from_dir(&self, dir: &Path) -> Result<bool> {
        if self.is_initialized() {
            return Ok(false);
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry?;
            let path = entry.path();
            let is_ids = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ids"));
            if entry.file_type().is_file() && is_ids {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
                files.push((name, std::fs::read(path)?));
            }
        }
        tracing::info!("Found {} IDS files in {}", files.len(), dir.display());
        Ok(self.initialize_with_ids_files(files))
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Forget every table and allow a new initialization
    pub fn reset(&self) {
        let mut state = self.lock();
        state.tables.clear();
        state.initialized = false;
    }

    /// Names of the loaded tables, sorted
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Table by name (`"ea"`, `"EA.IDS"` and `"EA"` are the same table)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<IdsTable>> {
        self.lock().tables.get(&normalize_name(name)).cloned()
    }
}

impl SymbolSource for IdsCache {
    fn table(&self, name: &str) -> Option<Arc<IdsTable>> {
        self.get(name)
    }
}
