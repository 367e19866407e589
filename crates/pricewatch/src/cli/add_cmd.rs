//! Register a product for monitoring.

use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::extraction::{ExtractError, StrategyTable};
use crate::temporal::store::{AddOutcome, ProductStore, SqliteStore};
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;

pub async fn run(config: &Config, url: &str, threshold: Decimal, name: Option<&str>) -> Result<()> {
    if threshold.is_sign_negative() {
        bail!("threshold must not be negative: {threshold}");
    }
    url::Url::parse(url).with_context(|| format!("invalid product URL: {url}"))?;

    let s = Styled::new();
    let strategies = match &config.sites_file {
        Some(path) => StrategyTable::with_overrides(path)?,
        None => StrategyTable::builtin(),
    };
    let unsupported = match strategies.resolve(url) {
        Err(e @ ExtractError::SiteUnsupported { .. }) => Some(e.to_string()),
        _ => None,
    };

    let store = SqliteStore::open(&config.db_path)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let outcome = store.add_product(url, threshold, name)?;

    if output::is_json() {
        let (status, id) = match outcome {
            AddOutcome::Added(id) => ("added", Some(id)),
            AddOutcome::AlreadyExists => ("already_exists", None),
        };
        output::print_json(&serde_json::json!({
            "status": status,
            "id": id,
            "url": url,
            "unsupported": unsupported,
        }));
        return Ok(());
    }

    if output::is_quiet() {
        return Ok(());
    }

    match outcome {
        AddOutcome::Added(_) => {
            println!("  {} Product added: {}", s.ok_sym(), name.unwrap_or(url))
        }
        AddOutcome::AlreadyExists => println!(
            "  {} Product with this URL already exists in the database.",
            s.warn_sym()
        ),
    }
    if let Some(reason) = unsupported {
        println!("  {} {reason}; it will be skipped until a site strategy exists.", s.warn_sym());
    }
    Ok(())
}
