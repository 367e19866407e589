//! List registered products.

use crate::cli::output;
use crate::config::Config;
use crate::temporal::store::{ProductStore, SqliteStore};
use anyhow::Result;

pub async fn run(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db_path)?;
    let products = store.list_products()?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "products": products }));
    } else if products.is_empty() {
        println!("  No products registered. Add one with `pricewatch add <url> --threshold <price>`.");
    } else {
        for p in &products {
            println!(
                "  #{:<4} {:<40} threshold {}{}",
                p.id,
                p.name.as_deref().unwrap_or("(unnamed)"),
                config.currency,
                p.threshold
            );
            println!("        {}", p.url);
        }
    }
    Ok(())
}
