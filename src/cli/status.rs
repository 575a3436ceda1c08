use crate::db::DB_FILE;
use crate::error::Result;
use crate::fmt::{format_bytes, thousands};
use crate::settings::load_settings;
use crate::store::SqliteStore;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);
    let default_client = if settings.default_client.is_empty() {
        "(not set)"
    } else {
        &settings.default_client
    };

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Client:     {default_client}");

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let counts = SqliteStore::open(&db_path)?.counts()?;
        println!();
        println!("Clients:    {}", thousands(counts.clients));
        println!("Products:   {}", thousands(counts.products));
        println!("Sales:      {}", thousands(counts.sales));
        println!("Imports:    {}", thousands(counts.imports));
    } else {
        println!();
        println!("Database not found. Run `salesmatrix init` to set up.");
    }

    Ok(())
}
