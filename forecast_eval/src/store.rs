//! Tabular data sources
//!
//! A [`Store`] is anything that can list tables, describe their columns,
//! read a projection of a table and write/drop whole tables. Identifiers
//! handed to a store are always validated first; stores never build paths
//! or queries from unchecked caller input.

use crate::error::{ForecastError, Result};
use parking_lot::RwLock;
use polars::prelude::{CsvReader, CsvWriter, DataFrame, SerReader, SerWriter};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Relational read plus scoped table writes
pub trait Store: Send + Sync {
    /// Names of all queryable tables, sorted
    fn table_names(&self) -> Result<Vec<String>>;

    /// Column names of `table`, in table order
    fn column_names(&self, table: &str) -> Result<Vec<String>>;

    /// Read the named columns of `table`, in the given order
    fn read_table(&self, table: &str, columns: &[String]) -> Result<DataFrame>;

    /// Create or replace `table` with the contents of `df`
    fn write_table(&self, table: &str, df: &mut DataFrame) -> Result<()>;

    /// Remove `table`; removing a missing table is not an error
    fn drop_table(&self, table: &str) -> Result<()>;
}

/// Reject anything but ASCII letters, digits and underscores
pub fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ForecastError::DataAccess(format!(
            "'{}' is not a valid identifier",
            name
        )))
    }
}

/// Canonical name of `table`, matched case-insensitively against the store's tables
pub fn resolve_table(store: &dyn Store, table: &str) -> Result<String> {
    validate_identifier(table)?;

    let tables = store.table_names()?;
    tables
        .iter()
        .find(|t| t.as_str() == table)
        .or_else(|| tables.iter().find(|t| t.eq_ignore_ascii_case(table)))
        .cloned()
        .ok_or_else(|| ForecastError::DataAccess(format!("Table '{}' does not exist", table)))
}

/// Canonical names of `columns` within `table`; exact matches take precedence
pub fn resolve_columns(store: &dyn Store, table: &str, columns: &[String]) -> Result<Vec<String>> {
    let available = store.column_names(table)?;

    columns
        .iter()
        .map(|column| {
            available
                .iter()
                .find(|c| *c == column)
                .or_else(|| available.iter().find(|c| c.eq_ignore_ascii_case(column)))
                .cloned()
                .ok_or_else(|| {
                    ForecastError::DataAccess(format!(
                        "Column '{}' does not exist in table '{}'",
                        column, table
                    ))
                })
        })
        .collect()
}

/// A directory of `<table>.csv` files
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    /// Open a store rooted at `root`; the directory must exist
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ForecastError::DataAccess(format!(
                "Data directory '{}' does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, table: &str) -> Result<PathBuf> {
        validate_identifier(table)?;
        Ok(self.root.join(format!("{}.csv", table)))
    }

    fn existing_table_path(&self, table: &str) -> Result<PathBuf> {
        let path = self.table_path(table)?;
        if !path.is_file() {
            return Err(ForecastError::DataAccess(format!(
                "Table '{}' does not exist",
                table
            )));
        }
        Ok(path)
    }
}

impl Store for CsvStore {
    fn table_names(&self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_identifier(stem).is_ok() {
                    tables.push(stem.to_string());
                }
            }
        }
        tables.sort();
        Ok(tables)
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let path = self.existing_table_path(table)?;
        let mut reader = csv::Reader::from_path(path)?;
        Ok(reader.headers()?.iter().map(|h| h.trim().to_string()).collect())
    }

    fn read_table(&self, table: &str, columns: &[String]) -> Result<DataFrame> {
        let path = self.existing_table_path(table)?;
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(Some(1000))
            .has_header(true)
            .finish()?;

        Ok(df.select(columns.iter().map(|c| c.as_str()))?)
    }

    fn write_table(&self, table: &str, df: &mut DataFrame) -> Result<()> {
        let path = self.table_path(table)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).has_header(true).finish(df)?;
        Ok(())
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        let path = self.table_path(table)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store keyed by table name
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, DataFrame>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a table
    pub fn insert(&self, table: &str, df: DataFrame) -> Result<()> {
        validate_identifier(table)?;
        self.tables.write().insert(table.to_string(), df);
        Ok(())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.read().contains_key(table)
    }
}

impl Store for MemoryStore {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.read().keys().cloned().collect())
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let tables = self.tables.read();
        let df = tables
            .get(table)
            .ok_or_else(|| ForecastError::DataAccess(format!("Table '{}' does not exist", table)))?;
        Ok(df.get_column_names().into_iter().map(str::to_string).collect())
    }

    fn read_table(&self, table: &str, columns: &[String]) -> Result<DataFrame> {
        let tables = self.tables.read();
        let df = tables
            .get(table)
            .ok_or_else(|| ForecastError::DataAccess(format!("Table '{}' does not exist", table)))?;
        Ok(df.select(columns.iter().map(|c| c.as_str()))?)
    }

    fn write_table(&self, table: &str, df: &mut DataFrame) -> Result<()> {
        self.insert(table, df.clone())
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        self.tables.write().remove(table);
        Ok(())
    }
}

/// Name prefix of every table created by [`StagingTable`]
pub const STAGING_PREFIX: &str = "staging_";

/// True for tables created by [`StagingTable`], in flight or left behind
pub fn is_staging_table(name: &str) -> bool {
    name.len() > STAGING_PREFIX.len()
        && name
            .get(..STAGING_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(STAGING_PREFIX))
}

/// A uniquely named table that is dropped when the guard goes out of scope
pub struct StagingTable {
    store: Arc<dyn Store>,
    name: String,
}

impl StagingTable {
    /// Write `df` to a fresh `staging_<uuid>` table
    pub fn create(store: Arc<dyn Store>, df: &mut DataFrame) -> Result<Self> {
        let name = format!("{}{}", STAGING_PREFIX, Uuid::new_v4().simple());
        store.write_table(&name, df)?;
        tracing::debug!(table = %name, rows = df.height(), "created staging table");

        Ok(Self { store, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

impl Drop for StagingTable {
    fn drop(&mut self) {
        match self.store.drop_table(&self.name) {
            Ok(()) => tracing::debug!(table = %self.name, "dropped staging table"),
            Err(err) => tracing::warn!(table = %self.name, error = %err, "failed to drop staging table"),
        }
    }
}
