//! Print the price history of every product.

use crate::cli::output;
use crate::config::Config;
use crate::report;
use crate::temporal::store::SqliteStore;
use anyhow::Result;

pub async fn run(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db_path)?;
    let histories = report::build(&store)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "products": histories }));
        return Ok(());
    }

    let text = report::render_text(&histories, &config.currency);
    if text.is_empty() {
        println!("  No price history yet. Run `pricewatch check` first.");
    } else {
        print!("{text}");
    }
    Ok(())
}
