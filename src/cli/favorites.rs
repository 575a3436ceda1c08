use crate::cli::{open_store, resolve_client};
use crate::error::Result;

pub fn add(client: Option<String>, code: &str) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    if store.add_favorite(client.id, code)? {
        println!("Added {code} to favorites of {}", client.name);
    } else {
        println!("{code} is already a favorite");
    }
    Ok(())
}

pub fn remove(client: Option<String>, code: &str) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    if store.remove_favorite(client.id, code)? {
        println!("Removed {code} from favorites of {}", client.name);
    } else {
        println!("{code} is not a favorite");
    }
    Ok(())
}

pub fn toggle(client: Option<String>, code: &str) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    let state = if store.toggle_favorite(client.id, code)? {
        "now a favorite"
    } else {
        "no longer a favorite"
    };
    println!("{code} is {state}");
    Ok(())
}

pub fn list(client: Option<String>) -> Result<()> {
    let store = open_store()?;
    let client = resolve_client(&store, client)?;
    for code in store.favorites(client.id)? {
        println!("{code}");
    }
    Ok(())
}
