use crate::config::RecordScope;
use crate::entity_key::EntityKey;
use crate::sales_record::{DataSourceError, SalesDataSource, SalesRecord};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed record store.
///
/// Keeps the weekly observations in a single `sales_records` table and
/// serves scope-filtered loads. Automatically creates the schema on first use.
#[derive(Debug)]
pub struct SqliteDataSource {
    // rusqlite connections are Send but not Sync
    conn: Mutex<Connection>,
    scope: RecordScope,
}

impl SqliteDataSource {
    /// Opens (or creates) a file-based database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub fn new<P: AsRef<Path>>(db_path: P, scope: RecordScope) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, scope)
    }

    /// Creates a new in-memory database. Useful for testing.
    pub fn new_in_memory(scope: RecordScope) -> SqliteResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, scope)
    }

    fn with_connection(conn: Connection, scope: RecordScope) -> SqliteResult<Self> {
        ensure_schema(&conn)?;
        Ok(SqliteDataSource {
            conn: Mutex::new(conn),
            scope,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DataSourceError> {
        self.conn.lock().map_err(|_| {
            DataSourceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "sqlite connection lock poisoned",
            ))
        })
    }

    /// Inserts records in a single transaction. Returns the number inserted.
    pub fn insert_records_batch(&self, records: &[SalesRecord]) -> Result<usize, DataSourceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sales_records (
                    retailer_id, week_ending, brand_owner, brand, category, supercategory,
                    retail_sales, units_sold, in_stock_rate, weeks_on_hand, buy_box_rate,
                    total_traffic, paid_ad_spend, retail_price, organic_traffic
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.retailer_id,
                    record.week_ending,
                    record.key.brand_owner,
                    record.key.brand,
                    record.key.category,
                    record.key.supercategory,
                    nullable(record.retail_sales),
                    nullable(record.units_sold),
                    nullable(record.in_stock_rate),
                    nullable(record.weeks_on_hand),
                    nullable(record.buy_box_rate),
                    nullable(record.total_traffic),
                    nullable(record.paid_ad_spend),
                    nullable(record.retail_price),
                    nullable(record.organic_traffic),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Number of stored rows, regardless of scope.
    pub fn record_count(&self) -> Result<usize, DataSourceError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sales_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn ensure_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sales_records (
            retailer_id INTEGER NOT NULL,
            week_ending TEXT NOT NULL,
            brand_owner TEXT NOT NULL,
            brand TEXT NOT NULL,
            category TEXT NOT NULL,
            supercategory TEXT NOT NULL,
            retail_sales REAL,
            units_sold REAL,
            in_stock_rate REAL,
            weeks_on_hand REAL,
            buy_box_rate REAL,
            total_traffic REAL,
            paid_ad_spend REAL,
            retail_price REAL,
            organic_traffic REAL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_records_week ON sales_records(week_ending)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_records_scope ON sales_records(retailer_id, supercategory)",
        [],
    )?;
    Ok(())
}

// NaN cells are stored as NULL.
fn nullable(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

impl SalesDataSource for SqliteDataSource {
    fn load_records(&self) -> Result<Vec<SalesRecord>, DataSourceError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT retailer_id, week_ending, brand_owner, brand, category, supercategory,
                    retail_sales, units_sold, in_stock_rate, weeks_on_hand, buy_box_rate,
                    total_traffic, paid_ad_spend, retail_price, organic_traffic
             FROM sales_records
             WHERE retailer_id = ?1 AND organic_traffic IS NOT NULL
             ORDER BY week_ending",
        )?;

        let rows = stmt.query_map([self.scope.retailer_id], |row| {
            let cell = |idx: usize| -> SqliteResult<f64> {
                Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(f64::NAN))
            };
            let week_ending: NaiveDate = row.get(1)?;
            Ok((
                row.get::<_, u32>(0)?,
                week_ending,
                [
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ],
                [
                    cell(6)?,
                    cell(7)?,
                    cell(8)?,
                    cell(9)?,
                    cell(10)?,
                    cell(11)?,
                    cell(12)?,
                    cell(13)?,
                    cell(14)?,
                ],
            ))
        })?;

        let mut records = Vec::new();
        for (line, row_result) in rows.enumerate() {
            let (retailer_id, week_ending, [owner, brand, category, supercategory], m) = row_result?;
            if !self.scope.admits(retailer_id, &supercategory) {
                continue;
            }
            let key = EntityKey::new(owner, brand, category, supercategory).map_err(|e| {
                DataSourceError::InvalidRecord {
                    line: line + 1,
                    message: e.to_string(),
                }
            })?;
            records.push(SalesRecord {
                retailer_id,
                week_ending,
                key,
                retail_sales: m[0],
                units_sold: m[1],
                in_stock_rate: m[2],
                weeks_on_hand: m[3],
                buy_box_rate: m[4],
                total_traffic: m[5],
                paid_ad_spend: m[6],
                retail_price: m[7],
                organic_traffic: m[8],
            });
        }

        info!(records = records.len(), "loaded sales records from SQLite");
        Ok(records)
    }
}
