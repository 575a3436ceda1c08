use comfy_table::{Cell, Table};

use crate::cli::{open_store, resolve_client};
use crate::error::Result;

pub fn run(client: Option<String>) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    let log = store.import_log(client.id)?;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Year", "Period", "File", "Records", "Checksum"]);
    for entry in log {
        let short: String = entry.checksum.chars().take(12).collect();
        table.add_row(vec![
            Cell::new(entry.imported_at.unwrap_or_default()),
            Cell::new(entry.year),
            Cell::new(entry.period),
            Cell::new(entry.filename),
            Cell::new(entry.record_count),
            Cell::new(short),
        ]);
    }
    println!("Imports for {}\n{table}", client.name);
    Ok(())
}
