//! Memoized ownership of the raw records and the fact table built from them.
//!
//! The repository loads from its data source on first use and keeps both
//! the record set and the fact table until [`FactRepository::invalidate`].
//! Consumers get `Arc` handles and never see a partially built table.

use crate::analytics::fact_table::FactTable;
use crate::sales_record::{DataSourceError, SalesDataSource, SalesRecord};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

pub struct FactRepository {
    source: Box<dyn SalesDataSource>,
    records: OnceLock<Arc<Vec<SalesRecord>>>,
    table: OnceLock<Arc<FactTable>>,
}

impl FactRepository {
    pub fn new(source: Box<dyn SalesDataSource>) -> Self {
        FactRepository {
            source,
            records: OnceLock::new(),
            table: OnceLock::new(),
        }
    }

    pub fn from_source<S: SalesDataSource + 'static>(source: S) -> Self {
        Self::new(Box::new(source))
    }

    /// Raw record set, loaded on first call.
    ///
    /// A missing source is treated as an empty data set.
    pub fn records(&self) -> Result<Arc<Vec<SalesRecord>>, DataSourceError> {
        if let Some(records) = self.records.get() {
            return Ok(Arc::clone(records));
        }

        let records = match self.source.load_records() {
            Ok(records) => records,
            Err(DataSourceError::NotFound(location)) => {
                warn!(%location, "sales data not found; continuing with no records");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        info!(records = records.len(), "loaded sales records");

        Ok(Arc::clone(self.records.get_or_init(|| Arc::new(records))))
    }

    /// The fact table, built in full on first call and reused afterwards.
    pub fn build(&self) -> Result<Arc<FactTable>, DataSourceError> {
        if let Some(table) = self.table.get() {
            debug!("reusing cached fact table");
            return Ok(Arc::clone(table));
        }

        let records = self.records()?;
        let table = Arc::new(FactTable::build(&records));
        Ok(Arc::clone(self.table.get_or_init(|| table)))
    }

    /// Drops both caches; the next [`build`](Self::build) reloads and
    /// recomputes everything.
    pub fn invalidate(&mut self) {
        let had_table = self.table.take().is_some();
        self.records.take();
        debug!(had_table, "invalidated fact repository");
    }

    pub fn is_built(&self) -> bool {
        self.table.get().is_some()
    }
}

impl std::fmt::Debug for FactRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactRepository")
            .field("records_loaded", &self.records.get().map(|r| r.len()))
            .field("is_built", &self.is_built())
            .finish()
    }
}
