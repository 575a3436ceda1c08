use crate::period::Period;

/// One line-item of a monthly sales file, as produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub value: f64,
    pub period: Period,
}

/// A sale row as persisted for one client and year.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSale {
    pub client_id: i64,
    pub year: i32,
    pub source_file: String,
    pub record: SaleRecord,
}

#[derive(Debug, Clone)]
pub struct Client {
    pub id: i64,
    pub name: String,
}

/// Catalog entry registered for product codes first seen in an import.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntry {
    pub code: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ImportLogEntry {
    pub client_id: i64,
    pub year: i32,
    pub filename: String,
    pub period: Period,
    pub record_count: i64,
    pub checksum: String,
    /// Set by the store; `None` on entries that have not been written yet.
    pub imported_at: Option<String>,
}
