use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::Result;
use crate::settings::get_data_dir;

pub const DB_FILE: &str = "sales.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sale_years (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL,
    year INTEGER NOT NULL,
    description TEXT,
    UNIQUE (client_id, year),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE TABLE IF NOT EXISTS sales (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL,
    year INTEGER NOT NULL,
    period TEXT NOT NULL,
    product_code TEXT NOT NULL,
    product_name TEXT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    value REAL NOT NULL DEFAULT 0,
    source_file TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE INDEX IF NOT EXISTS idx_sales_client_year_period ON sales (client_id, year, period);

CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL,
    product_code TEXT NOT NULL,
    UNIQUE (client_id, product_code),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL,
    year INTEGER NOT NULL,
    filename TEXT NOT NULL,
    period TEXT NOT NULL,
    record_count INTEGER,
    checksum TEXT,
    import_date TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);
";

pub fn db_path() -> PathBuf {
    get_data_dir().join(DB_FILE)
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["clients", "products", "sale_years", "sales", "favorites", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_sales_reject_non_positive_quantity() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO clients (name) VALUES ('Loja Centro')", []).unwrap();
        let result = conn.execute(
            "INSERT INTO sales (client_id, year, period, product_code, quantity) VALUES (1, 2024, 'Month 01', 'A', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
