use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::cli::years::confirmed;
use crate::error::Result;

pub fn add(name: &str) -> Result<()> {
    let store = open_store()?;
    let id = store.add_client(name)?;
    println!("Added client: {} (id {id})", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let store = open_store()?;
    let clients = store.list_clients()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Years"]);
    for client in clients {
        let years: Vec<String> = store
            .years(client.id)?
            .iter()
            .map(|y| y.to_string())
            .collect();
        table.add_row(vec![
            Cell::new(client.id),
            Cell::new(client.name),
            Cell::new(years.join(", ")),
        ]);
    }
    println!("Clients\n{table}");
    Ok(())
}

pub fn delete(name: &str, yes: bool) -> Result<()> {
    let mut store = open_store()?;
    let client = store.find_client(name)?;
    let prompt = format!(
        "Delete client {}? All of its sales history, years and favorites will be lost",
        client.name
    );
    if !confirmed(yes, prompt) {
        println!("Nothing deleted.");
        return Ok(());
    }
    let removed = store.delete_client(client.id)?;
    tracing::info!(client = %client.name, removed, "client deleted");
    println!("Deleted client {} ({removed} sales removed)", client.name);
    Ok(())
}
