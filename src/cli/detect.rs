use std::path::Path;

use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::period::resolve_period;

pub fn run(files: &[String]) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["File", "Period"]);
    for file in files {
        let name = Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file.as_str());
        table.add_row(vec![Cell::new(name), Cell::new(resolve_period(name))]);
    }
    println!("{table}");
    Ok(())
}
