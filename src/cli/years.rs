use dialoguer::Confirm;

use crate::cli::{open_store, resolve_client};
use crate::error::Result;
use crate::period::Period;

pub fn list(client: Option<String>) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    let years = store.years(client.id)?;
    if years.is_empty() {
        println!("No years recorded for {}.", client.name);
    }
    for year in years {
        println!("{year}");
    }
    Ok(())
}

pub fn add(client: Option<String>, year: i32) -> Result<()> {
    let mut store = open_store()?;
    let client = resolve_client(&store, client)?;
    store.add_year(client.id, year)?;
    println!("Created year {year} for {}", client.name);
    Ok(())
}

pub(crate) fn confirmed(yes: bool, prompt: String) -> bool {
    yes || Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

pub fn delete_month(client: Option<String>, year: i32, period: &str, yes: bool) -> Result<()> {
    let period: Period = period.parse()?;
    let mut store = open_store()?;
    let client = resolve_client(&store, client)?;
    if !confirmed(yes, format!("Delete {period} {year} of {}?", client.name)) {
        println!("Nothing deleted.");
        return Ok(());
    }
    let removed = store.delete_month(client.id, year, period)?;
    println!("Deleted {removed} sales from {period} {year}");
    Ok(())
}

pub fn delete_year(client: Option<String>, year: i32, yes: bool) -> Result<()> {
    let mut store = open_store()?;
    let client = resolve_client(&store, client)?;
    if !confirmed(yes, format!("Delete all of {year} for {}?", client.name)) {
        println!("Nothing deleted.");
        return Ok(());
    }
    let removed = store.delete_year(client.id, year)?;
    println!("Deleted {removed} sales from {year}");
    Ok(())
}
