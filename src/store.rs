use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::db::{get_connection, init_db};
use crate::error::{Result, SalesError};
use crate::models::{Client, ImportLogEntry, ProductEntry, SaleRecord, StoredSale};
use crate::period::Period;

/// Equality filter on the sales table. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SaleFilter {
    pub client_id: Option<i64>,
    pub year: Option<i32>,
    pub period: Option<Period>,
}

impl SaleFilter {
    pub fn for_year(client_id: i64, year: i32) -> Self {
        Self {
            client_id: Some(client_id),
            year: Some(year),
            period: None,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.client_id.is_none() && self.year.is_none() && self.period.is_none()
    }

    fn where_clause(&self, prefix: &str) -> (String, Vec<Value>) {
        let mut parts = Vec::new();
        let mut params = Vec::new();
        if let Some(id) = self.client_id {
            params.push(Value::Integer(id));
            parts.push(format!("{prefix}client_id = ?{}", params.len()));
        }
        if let Some(year) = self.year {
            params.push(Value::Integer(year.into()));
            parts.push(format!("{prefix}year = ?{}", params.len()));
        }
        if let Some(period) = self.period {
            params.push(Value::Text(period.to_string()));
            parts.push(format!("{prefix}period = ?{}", params.len()));
        }
        if parts.is_empty() {
            ("1 = 1".to_string(), params)
        } else {
            (parts.join(" AND "), params)
        }
    }
}

/// Persistence seam for imported sales.
pub trait RecordStore {
    fn insert_sales(&mut self, rows: &[StoredSale]) -> Result<()>;
    fn delete_sales(&mut self, filter: &SaleFilter) -> Result<usize>;
    fn query_sales(&self, filter: &SaleFilter) -> Result<Vec<StoredSale>>;
    /// Create the (client, year) container; an existing one is not an error.
    fn ensure_year(&mut self, client_id: i64, year: i32) -> Result<()>;
    fn log_import(&mut self, entry: &ImportLogEntry) -> Result<()>;

    /// Run `f` as one unit of work. The default runs it directly, so a failure
    /// part-way through leaves the earlier writes in place.
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        f(self)
    }
}

/// Product catalog lookups used to auto-register codes seen in imports.
pub trait ProductCatalog {
    fn lookup_existing(&self, codes: &[String]) -> Result<Vec<String>>;
    fn insert_new(&mut self, entries: &[ProductEntry]) -> Result<()>;
}

pub struct StoreCounts {
    pub clients: i64,
    pub products: i64,
    pub sales: i64,
    pub imports: i64,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = get_connection(path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // -- clients -----------------------------------------------------------

    pub fn add_client(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO clients (name) VALUES (?1)", [name.trim()])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM clients ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Client {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn find_client(&self, name: &str) -> Result<Client> {
        self.conn
            .query_row(
                "SELECT id, name FROM clients WHERE name = ?1 COLLATE NOCASE",
                [name.trim()],
                |row| {
                    Ok(Client {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => SalesError::UnknownClient(name.to_string()),
                other => SalesError::Db(other),
            })
    }

    /// Removes the client with its sales, years, favorites and audit rows.
    /// Returns the number of sales removed.
    pub fn delete_client(&mut self, client_id: i64) -> Result<usize> {
        self.atomically(|s| {
            let sales = s
                .conn
                .execute("DELETE FROM sales WHERE client_id = ?1", [client_id])?;
            for table in ["favorites", "sale_years", "imports"] {
                s.conn
                    .execute(&format!("DELETE FROM {table} WHERE client_id = ?1"), [client_id])?;
            }
            if s.conn.execute("DELETE FROM clients WHERE id = ?1", [client_id])? == 0 {
                return Err(SalesError::UnknownClient(client_id.to_string()));
            }
            Ok(sales)
        })
    }

    // -- years -------------------------------------------------------------

    /// Creates an empty year container. Existing years are left alone.
    pub fn add_year(&mut self, client_id: i64, year: i32) -> Result<()> {
        self.ensure_year(client_id, year)
    }

    /// Years with a container or with stored sales, newest first.
    pub fn years(&self, client_id: i64) -> Result<Vec<i32>> {
        let mut stmt = self.conn.prepare(
            "SELECT year FROM sale_years WHERE client_id = ?1 \
             UNION SELECT year FROM sales WHERE client_id = ?1 \
             ORDER BY year DESC",
        )?;
        let rows = stmt.query_map([client_id], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn delete_month(&mut self, client_id: i64, year: i32, period: Period) -> Result<usize> {
        self.delete_sales(&SaleFilter::for_year(client_id, year).with_period(period))
    }

    pub fn delete_year(&mut self, client_id: i64, year: i32) -> Result<usize> {
        self.delete_sales(&SaleFilter::for_year(client_id, year))
    }

    // -- favorites ---------------------------------------------------------

    pub fn favorites(&self, client_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_code FROM favorites WHERE client_id = ?1 ORDER BY product_code",
        )?;
        let rows = stmt.query_map([client_id], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn add_favorite(&self, client_id: i64, product_code: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO favorites (client_id, product_code) VALUES (?1, ?2)",
            rusqlite::params![client_id, product_code],
        )?;
        Ok(changed > 0)
    }

    pub fn remove_favorite(&self, client_id: i64, product_code: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM favorites WHERE client_id = ?1 AND product_code = ?2",
            rusqlite::params![client_id, product_code],
        )?;
        Ok(changed > 0)
    }

    /// Returns whether the product is a favorite after the toggle.
    pub fn toggle_favorite(&self, client_id: i64, product_code: &str) -> Result<bool> {
        if self.remove_favorite(client_id, product_code)? {
            Ok(false)
        } else {
            self.add_favorite(client_id, product_code)?;
            Ok(true)
        }
    }

    // -- audit -------------------------------------------------------------

    pub fn import_log(&self, client_id: i64) -> Result<Vec<ImportLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT client_id, year, filename, period, record_count, checksum, import_date \
             FROM imports WHERE client_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([client_id], |row| {
            Ok(ImportLogEntry {
                client_id: row.get(0)?,
                year: row.get(1)?,
                filename: row.get(2)?,
                period: row.get(3)?,
                record_count: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                checksum: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                imported_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        let count = |table: &str| -> Result<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };
        Ok(StoreCounts {
            clients: count("clients")?,
            products: count("products")?,
            sales: count("sales")?,
            imports: count("imports")?,
        })
    }
}

impl RecordStore for SqliteStore {
    fn insert_sales(&mut self, rows: &[StoredSale]) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO sales (client_id, year, period, product_code, product_name, quantity, value, source_file) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for sale in rows {
            stmt.execute(rusqlite::params![
                sale.client_id,
                sale.year,
                sale.record.period,
                sale.record.product_code,
                sale.record.product_name,
                sale.record.quantity,
                sale.record.value,
                sale.source_file,
            ])?;
        }
        Ok(())
    }

    fn delete_sales(&mut self, filter: &SaleFilter) -> Result<usize> {
        if filter.is_empty() {
            return Err(SalesError::Other(
                "refusing to delete sales without a filter".to_string(),
            ));
        }
        let (clause, params) = filter.where_clause("");
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM sales WHERE {clause}"), params_from_iter(params))?;
        Ok(deleted)
    }

    fn query_sales(&self, filter: &SaleFilter) -> Result<Vec<StoredSale>> {
        let (clause, params) = filter.where_clause("s.");
        let sql = format!(
            "SELECT s.client_id, s.year, s.source_file, s.product_code, \
             COALESCE(p.name, s.product_name, s.product_code), s.quantity, s.value, s.period \
             FROM sales s LEFT JOIN products p ON p.code = s.product_code \
             WHERE {clause} ORDER BY s.year, s.period, s.product_code, s.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok(StoredSale {
                client_id: row.get(0)?,
                year: row.get(1)?,
                source_file: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                record: SaleRecord {
                    product_code: row.get(3)?,
                    product_name: row.get(4)?,
                    quantity: row.get(5)?,
                    value: row.get(6)?,
                    period: row.get(7)?,
                },
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn ensure_year(&mut self, client_id: i64, year: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO sale_years (client_id, year, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![client_id, year, format!("Sales {year}")],
        )?;
        Ok(())
    }

    fn log_import(&mut self, entry: &ImportLogEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO imports (client_id, year, filename, period, record_count, checksum) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.client_id,
                entry.year,
                entry.filename,
                entry.period,
                entry.record_count,
                entry.checksum,
            ],
        )?;
        Ok(())
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let outcome = f(self).and_then(|value| {
            self.conn.execute_batch("COMMIT")?;
            Ok(value)
        });
        if outcome.is_err() && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback failed");
            }
        }
        outcome
    }
}

impl ProductCatalog for SqliteStore {
    fn lookup_existing(&self, codes: &[String]) -> Result<Vec<String>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; codes.len()].join(", ");
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT code FROM products WHERE code IN ({placeholders})"))?;
        let rows = stmt.query_map(params_from_iter(codes.iter()), |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn insert_new(&mut self, entries: &[ProductEntry]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO products (code, name, description) VALUES (?1, ?2, ?3)",
            )?;
            for entry in entries {
                stmt.execute(rusqlite::params![entry.code, entry.name, entry.description])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
