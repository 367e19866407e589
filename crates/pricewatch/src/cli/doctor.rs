//! Environment readiness check.

use crate::cli::output;
use crate::config::Config;
use crate::extraction::StrategyTable;
use crate::renderer::chromium::find_chromium;
use crate::temporal::store::{ProductStore, SqliteStore};
use anyhow::Result;

/// Check browser availability, the database, strategy overrides and alert channels.
pub async fn run(config: &Config) -> Result<()> {
    let chromium = config
        .chromium_path
        .clone()
        .filter(|p| p.exists())
        .or_else(find_chromium);

    let db = SqliteStore::open(&config.db_path).and_then(|store| store.list_products());

    let sites = match &config.sites_file {
        Some(path) => Some(StrategyTable::with_overrides(path).map(|t| t.entries().len())),
        None => None,
    };

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "render_enabled": config.render_enabled,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "database": config.db_path.display().to_string(),
            "database_ok": db.is_ok(),
            "products": db.as_ref().map(|p| p.len()).ok(),
            "sites_file_ok": sites.as_ref().map(|r| r.is_ok()),
            "email": config.smtp.is_some(),
            "webhook": config.webhook_url.is_some(),
        }));
        return Ok(());
    }

    println!("Pricewatch Doctor");
    println!("=================");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match (&chromium, config.render_enabled) {
        (_, false) => println!("[--] Browser rendering disabled (PRICEWATCH_RENDER)"),
        (Some(path), true) => println!("[OK] Chromium found: {}", path.display()),
        (None, true) => println!(
            "[!!] Chromium NOT found. Install Chrome or set PRICEWATCH_CHROMIUM_PATH; \
             pages that need rendering will fail."
        ),
    }

    match &db {
        Ok(products) => println!(
            "[OK] Database {} ({} product(s))",
            config.db_path.display(),
            products.len()
        ),
        Err(e) => println!("[!!] Database {} unusable: {e}", config.db_path.display()),
    }

    match sites {
        Some(Ok(n)) => println!("[OK] Site strategies: {n} (with overrides)"),
        Some(Err(e)) => println!("[!!] Site overrides unreadable: {e:#}"),
        None => println!(
            "[OK] Site strategies: {} built-in",
            StrategyTable::builtin().entries().len()
        ),
    }

    match &config.smtp {
        Some(smtp) => println!(
            "[OK] Email alerts via {}:{} to {}",
            smtp.server, smtp.port, smtp.recipient
        ),
        None if config.smtp_incomplete => println!(
            "[!!] Email credentials incomplete (need EMAIL_USER, EMAIL_PASSWORD, NOTIFICATION_EMAIL)"
        ),
        None => println!("[--] Email alerts not configured"),
    }
    match &config.webhook_url {
        Some(url) => println!("[OK] Webhook alerts to {url}"),
        None => println!("[--] Webhook alerts not configured"),
    }

    println!();
    let ready = db.is_ok() && (chromium.is_some() || !config.render_enabled);
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}
