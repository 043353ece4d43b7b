//! Loading series from a store

use crate::data::{SeriesSpec, TimeSeries};
use crate::error::Result;
use crate::store::{resolve_columns, resolve_table, validate_identifier, Store};

/// Reads one series per call from a [`Store`]; nothing is cached
#[derive(Clone, Copy)]
pub struct SeriesLoader<'a> {
    store: &'a dyn Store,
}

impl<'a> SeriesLoader<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Load the series described by `spec`.
    ///
    /// Table and column names are checked against the store's schema before
    /// anything is read. Fails with `DataAccess` when they do not exist.
    pub fn load(&self, spec: &SeriesSpec) -> Result<TimeSeries> {
        for column in spec.columns() {
            validate_identifier(&column)?;
        }

        let table = resolve_table(self.store, &spec.table)?;
        let columns = resolve_columns(self.store, &table, &spec.columns())?;
        let df = self.store.read_table(&table, &columns)?;

        let resolved = SeriesSpec {
            table,
            ds_column: columns[0].clone(),
            y_column: columns[1].clone(),
            regressors: columns[2..].to_vec(),
        };
        let series = TimeSeries::from_dataframe(&df, &resolved)?;

        tracing::debug!(
            table = %resolved.table,
            rows = df.height(),
            kept = series.len(),
            "loaded series"
        );
        Ok(series)
    }
}
