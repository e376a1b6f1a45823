use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{Local, SubsecRound};
use parking_lot::Mutex;

use crate::{
    code::CodeGenerator,
    error::{Result, StoreError},
    models::{Link, Record},
    table::LinkTable,
};

/// File-backed short code store.
///
/// The whole table is held in memory and rewritten to `path` after every
/// mutation. A single lock covers each read-modify-persist sequence, so one
/// store can be shared by concurrent request handlers.
#[derive(Debug)]
pub struct LinkStore {
    path: PathBuf,
    generator: CodeGenerator,
    table: Mutex<LinkTable>,
}

impl LinkStore {
    /// Open the store at `path`, loading whatever table is already there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_generator(path, CodeGenerator::default())
    }

    pub fn with_generator(path: impl Into<PathBuf>, generator: CodeGenerator) -> Self {
        let path = path.into();
        let table = load_table(&path);
        Self {
            path,
            generator,
            table: Mutex::new(table),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Return the short code for `long_url`, creating a mapping if needed.
    ///
    /// A URL that is already stored keeps its existing code and nothing is
    /// written. Otherwise `custom_code` is used verbatim when given (an empty
    /// string counts as absent), or a fresh random code is generated.
    pub fn shorten(&self, long_url: &str, custom_code: Option<&str>) -> Result<String> {
        let mut table = self.table.lock();

        if let Some(existing) = table.code_for_url(long_url) {
            return Ok(existing.to_owned());
        }

        let short_code = match custom_code.filter(|code| !code.is_empty()) {
            Some(code) if table.contains(code) => {
                return Err(StoreError::DuplicateCode(code.to_owned()));
            }
            Some(code) => code.to_owned(),
            None => self.generator.unused_code(|code| table.contains(code)),
        };

        table.insert(
            short_code.clone(),
            Record {
                long_url: long_url.to_owned(),
                created_at: Local::now().naive_local().trunc_subsecs(6),
                clicks: 0,
            },
        );
        self.persist(&table)?;

        tracing::info!("Shortened {} -> {}", long_url, short_code);
        Ok(short_code)
    }

    /// Look up a code and count the click. `None` leaves the store untouched.
    pub fn resolve(&self, short_code: &str) -> Result<Option<String>> {
        let mut table = self.table.lock();

        let Some(record) = table.get_mut(short_code) else {
            return Ok(None);
        };
        record.clicks += 1;
        let long_url = record.long_url.clone();

        self.persist(&table)?;
        Ok(Some(long_url))
    }

    pub fn info(&self, short_code: &str) -> Option<Record> {
        self.table.lock().get(short_code).cloned()
    }

    /// All links in insertion order.
    pub fn list(&self) -> Vec<Link> {
        self.table.lock().to_vec()
    }

    pub fn delete(&self, short_code: &str) -> Result<bool> {
        let mut table = self.table.lock();

        if table.remove(short_code).is_none() {
            return Ok(false);
        }
        self.persist(&table)?;

        tracing::info!("Deleted short code {}", short_code);
        Ok(true)
    }

    // Truncates and rewrites the file in place; a crash mid-write leaves it
    // corrupt, and the next load then starts from an empty table.
    fn persist(&self, table: &LinkTable) -> Result<()> {
        let json = serde_json::to_string_pretty(table)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Read the persisted table. Missing or malformed files yield an empty table.
fn load_table(path: &Path) -> LinkTable {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("No link table found at {}, starting empty", path.display());
            return LinkTable::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read link table {}: {e}", path.display());
            return LinkTable::default();
        }
    };

    match serde_json::from_str::<LinkTable>(&data) {
        Ok(table) => {
            tracing::info!("Loaded {} link(s) from {}", table.len(), path.display());
            table
        }
        Err(e) => {
            tracing::warn!("Failed to parse link table {}: {e}", path.display());
            LinkTable::default()
        }
    }
}
