//! Content-addressed disk cache of per-category tables.
//!
//! Entries live at `{cache_dir}/pdf_{sha256}.json` and hold only the mass and
//! weight columns. They are never invalidated; deleting the file is the only
//! eviction.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use prec_core::{
    from_json_slice, stable_hash_string, to_canonical_json_bytes, ErrorInfo, PrecError,
    SchemaVersion,
};
use prec_frame::{Column, Table};
use serde::{Deserialize, Serialize};

/// Schema written into every entry.
pub const CACHE_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

fn cache_error(code: &str, message: impl Into<String>, path: &Path) -> PrecError {
    PrecError::Cache(ErrorInfo::new(code, message).with_context("path", path.display().to_string()))
}

/// Hex SHA-256 of the canonical JSON form of the key inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes `inputs`; map keys are sorted so field order does not matter.
    pub fn compute<T: Serialize>(inputs: &T) -> Result<Self, PrecError> {
        Ok(Self(stable_hash_string(inputs)?))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `pdf_<digest>.json`.
    pub fn file_name(&self) -> String {
        format!("pdf_{}.json", self.0)
    }
}

/// Serialized form of one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Schema of the payload.
    pub schema_version: SchemaVersion,
    /// Digest the entry was written under.
    pub key: String,
    /// Rows per column.
    pub n_rows: usize,
    /// Mass and weight columns.
    pub columns: IndexMap<String, Vec<f64>>,
}

impl CacheEntry {
    fn from_table(key: &CacheKey, table: &Table, columns: &[&str]) -> Result<Self, PrecError> {
        let mut out = IndexMap::with_capacity(columns.len());
        for name in columns {
            let values = table.float(name)?;
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(PrecError::Cache(
                    ErrorInfo::new("cache-write", format!("non-finite value {bad} in column {name}"))
                        .with_context("key", key.as_str()),
                ));
            }
            out.insert(name.to_string(), values.to_vec());
        }
        Ok(Self {
            schema_version: CACHE_SCHEMA,
            key: key.as_str().to_string(),
            n_rows: table.n_rows(),
            columns: out,
        })
    }

    fn into_table(mut self, key: &CacheKey, columns: &[&str], path: &Path) -> Result<Table, PrecError> {
        if !CACHE_SCHEMA.is_compatible(&self.schema_version) {
            return Err(cache_error(
                "cache-schema",
                format!(
                    "unsupported cache schema {}.{}.{}",
                    self.schema_version.major, self.schema_version.minor, self.schema_version.patch
                ),
                path,
            ));
        }
        if self.key != key.as_str() {
            return Err(cache_error("cache-schema", "entry was written under another key", path));
        }
        let mut table = Table::new();
        for name in columns {
            let values = self.columns.shift_remove(*name).ok_or_else(|| {
                cache_error("cache-schema", format!("entry lacks column {name}"), path)
            })?;
            if values.len() != self.n_rows {
                return Err(cache_error(
                    "cache-schema",
                    format!("column {name} has {} rows, expected {}", values.len(), self.n_rows),
                    path,
                ));
            }
            table.insert(*name, Column::Float(values))?;
        }
        Ok(table)
    }
}

/// Result of [`ContentCache::get_or_build`].
#[derive(Debug, Clone)]
pub struct CacheLookup {
    /// Cached table on a hit, freshly built table on a miss.
    pub table: Table,
    /// Whether the entry already existed.
    pub hit: bool,
    /// Entry path.
    pub path: PathBuf,
}

/// Directory of cache entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    /// Cache rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Reads the entry for `key`, keeping `columns` in that order.
    ///
    /// A missing file is `Ok(None)`; an unreadable or malformed one is an error.
    pub fn read(&self, key: &CacheKey, columns: &[&str]) -> Result<Option<Table>, PrecError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|err| cache_error("cache-read", err.to_string(), &path))?;
        let entry: CacheEntry = from_json_slice(&bytes).map_err(|err| {
            cache_error("cache-parse", err.info().message.clone(), &path)
        })?;
        entry.into_table(key, columns, &path).map(Some)
    }

    /// Writes `columns` of `table` under `key`.
    ///
    /// The payload goes to a sibling temporary file that is then renamed over
    /// the entry. Concurrent writers of one key race; the last rename wins.
    pub fn write(&self, key: &CacheKey, table: &Table, columns: &[&str]) -> Result<PathBuf, PrecError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir)
            .map_err(|err| cache_error("cache-write", err.to_string(), &self.dir))?;
        let entry = CacheEntry::from_table(key, table, columns)?;
        let bytes = to_canonical_json_bytes(&entry)?;
        let tmp = self
            .dir
            .join(format!("{}.tmp-{}", key.file_name(), std::process::id()));
        fs::write(&tmp, bytes).map_err(|err| cache_error("cache-write", err.to_string(), &tmp))?;
        fs::rename(&tmp, &path).map_err(|err| cache_error("cache-write", err.to_string(), &path))?;
        Ok(path)
    }

    /// Returns the cached table for `key`, or runs `build` and caches its
    /// `columns`.
    pub fn get_or_build<F>(&self, key: &CacheKey, columns: &[&str], build: F) -> Result<CacheLookup, PrecError>
    where
        F: FnOnce() -> Result<Table, PrecError>,
    {
        let path = self.path_for(key);
        if let Some(table) = self.read(key, columns)? {
            info!("Cache hit: {}", path.display());
            return Ok(CacheLookup {
                table,
                hit: true,
                path,
            });
        }
        info!("Cache miss, building: {}", path.display());
        let table = build()?;
        self.write(key, &table, columns)?;
        Ok(CacheLookup {
            table,
            hit: false,
            path,
        })
    }
}
