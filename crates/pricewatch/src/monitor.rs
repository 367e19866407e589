//! One full check cycle over every registered product.
//!
//! For each product: resolve a strategy, extract a price, record it, compare
//! it with the previous observation and dispatch an alert when warranted.
//! Every failure is contained to the product it happened on.

use crate::config::Config;
use crate::extraction::{ExtractError, Extraction, PriceExtractor, StrategyTable};
use crate::notify::{AlertDispatcher, DeliveryOutcome, PriceAlert};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, Renderer, UnavailableRenderer};
use crate::temporal::store::{PriceHistory, ProductStore, SqliteStore, StoreError};
use crate::temporal::watch::{self, Decision};
use crate::types::Product;
use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to one product during a cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProductOutcome {
    /// Price recorded and evaluated.
    Checked {
        price: Decimal,
        previous: Option<Decimal>,
        decision: Decision,
        /// Set only when an alert was dispatched.
        delivery: Option<DeliveryOutcome>,
    },
    /// No strategy for this site, or the URL did not parse.
    Unsupported { reason: String },
    /// Both tiers ran without finding a price.
    ExtractionFailed,
    /// The browser could not be started.
    EnvironmentFailure { reason: String },
    /// The observation could not be stored or read back.
    PersistenceFailure { reason: String },
}

/// Per-product result line.
#[derive(Debug, Clone, Serialize)]
pub struct ProductReport {
    pub product: Product,
    #[serde(flatten)]
    pub outcome: ProductOutcome,
}

/// Summary of a full check cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub products: Vec<ProductReport>,
}

impl CycleReport {
    fn count(&self, f: impl Fn(&ProductOutcome) -> bool) -> usize {
        self.products.iter().filter(|p| f(&p.outcome)).count()
    }

    pub fn checked(&self) -> usize {
        self.count(|o| matches!(o, ProductOutcome::Checked { .. }))
    }

    pub fn alerts(&self) -> usize {
        self.count(|o| matches!(o, ProductOutcome::Checked { decision, .. } if decision.alert))
    }

    pub fn skipped(&self) -> usize {
        self.products.len() - self.checked()
    }

    pub fn environment_failures(&self) -> usize {
        self.count(|o| matches!(o, ProductOutcome::EnvironmentFailure { .. }))
    }
}

/// Anything that is both a product registry and a price history.
pub trait Store: ProductStore + PriceHistory {}

impl<T: ProductStore + PriceHistory> Store for T {}

/// Runs check cycles. Holds only immutable collaborators, so a cycle can be
/// run repeatedly and concurrently-checked products share nothing mutable
/// except the store.
pub struct Monitor {
    strategies: StrategyTable,
    extractor: PriceExtractor,
    store: Arc<dyn Store>,
    notifier: Arc<dyn AlertDispatcher>,
    concurrency: usize,
}

impl Monitor {
    pub fn new(
        strategies: StrategyTable,
        extractor: PriceExtractor,
        store: Arc<dyn Store>,
        notifier: Arc<dyn AlertDispatcher>,
    ) -> Self {
        Self {
            strategies,
            extractor,
            store,
            notifier,
            concurrency: 1,
        }
    }

    /// Allow up to `n` products in flight at once (minimum 1).
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Assemble a monitor from configuration: open the store, load the
    /// strategy table, pick a renderer and alert channels.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)
            .with_context(|| format!("failed to open database {}", config.db_path.display()))?;

        let strategies = match &config.sites_file {
            Some(path) => StrategyTable::with_overrides(path)?,
            None => StrategyTable::builtin(),
        };

        let renderer = build_renderer(config);
        let extractor = PriceExtractor::from_config(config, renderer);
        let notifier: Arc<dyn AlertDispatcher> = Arc::from(crate::notify::from_config(config));

        Ok(Self::new(strategies, extractor, Arc::new(store), notifier)
            .with_concurrency(config.concurrency))
    }

    /// Check every registered product once.
    ///
    /// Only a failure to list products fails the cycle; everything after that
    /// is recorded per product in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        let products = self.store.list_products()?;
        info!("checking {} product(s)", products.len());

        let products = stream::iter(products)
            .map(|product| async move {
                let outcome = self.check_product(&product).await;
                ProductReport { product, outcome }
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let report = CycleReport { products };
        info!(
            "cycle complete: {} checked, {} skipped, {} alert(s)",
            report.checked(),
            report.skipped(),
            report.alerts()
        );
        Ok(report)
    }

    /// Run the full pipeline for one product.
    pub async fn check_product(&self, product: &Product) -> ProductOutcome {
        info!("checking price for {} ({})", product.label(), product.url);

        let strategy = match self.strategies.resolve(&product.url) {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!("{e}; skipping {}", product.url);
                return ProductOutcome::Unsupported {
                    reason: e.to_string(),
                };
            }
        };

        let extraction = match self.extractor.extract(&product.url, strategy).await {
            Ok(extraction) => extraction,
            Err(ExtractError::Environment(reason)) => {
                error!("cannot render {}: {reason}", product.url);
                return ProductOutcome::EnvironmentFailure { reason };
            }
            Err(e) => {
                warn!("could not retrieve price for {}: {e}", product.label());
                return ProductOutcome::ExtractionFailed;
            }
        };

        self.backfill_name(product, &extraction);

        match self.record_and_compare(product, extraction.price) {
            Ok((previous, decision)) => {
                let delivery = match previous {
                    Some(prev) if decision.alert => {
                        Some(self.dispatch(product, extraction.price, prev, decision).await)
                    }
                    _ => None,
                };
                ProductOutcome::Checked {
                    price: extraction.price,
                    previous,
                    decision,
                    delivery,
                }
            }
            Err(e) => {
                error!("failed to store price for {}: {e}", product.label());
                ProductOutcome::PersistenceFailure {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Append the observation, then read back the previous one.
    fn record_and_compare(
        &self,
        product: &Product,
        price: Decimal,
    ) -> Result<(Option<Decimal>, Decision), StoreError> {
        let recorded = self.store.record(product.id, price, Utc::now())?;
        let previous = self
            .store
            .last_two(product.id)?
            .into_iter()
            .find(|o| o.id != recorded.id)
            .map(|o| o.price);

        let decision = watch::evaluate(price, product.threshold, previous);
        match previous {
            None => info!("first price recorded for {}: {price}", product.label()),
            Some(prev) if decision.dropped => {
                info!("PRICE DROP for {}: {prev} -> {price}", product.label())
            }
            Some(prev) => info!(
                "no drop for {}: current {price}, previous {prev}",
                product.label()
            ),
        }
        Ok((previous, decision))
    }

    async fn dispatch(
        &self,
        product: &Product,
        price: Decimal,
        previous: Decimal,
        decision: Decision,
    ) -> DeliveryOutcome {
        info!(
            "{} is at or below threshold {}; sending alert",
            product.label(),
            product.threshold
        );
        let alert = PriceAlert {
            product: product.clone(),
            current_price: price,
            previous_price: previous,
            dropped: decision.dropped,
            observed_at: Utc::now(),
        };
        let outcome = self.notifier.notify(&alert).await;
        match &outcome {
            DeliveryOutcome::Delivered => {}
            DeliveryOutcome::Skipped(reason) => info!("alert skipped: {reason}"),
            DeliveryOutcome::Failed(reason) => warn!("alert delivery failed: {reason}"),
        }
        outcome
    }

    fn backfill_name(&self, product: &Product, extraction: &Extraction) {
        if product.name.is_some() {
            return;
        }
        let Some(title) = extraction.title.as_deref() else {
            return;
        };
        match self.store.backfill_name(product.id, title) {
            Ok(true) => info!("named product {} as {title:?}", product.id),
            Ok(false) => {}
            Err(e) => warn!("could not store name for {}: {e}", product.url),
        }
    }
}

/// Chromium when rendering is enabled and a browser can be found. With
/// rendering disabled, tier 2 is skipped; with no browser, every rendered
/// fetch reports an environment failure.
pub fn build_renderer(config: &Config) -> Arc<dyn Renderer> {
    if !config.render_enabled {
        info!("browser rendering disabled; static fetch only");
        return Arc::new(NoopRenderer);
    }
    match ChromiumRenderer::new(config.chromium_path.clone(), &config.user_agent) {
        Ok(renderer) => {
            info!("Chromium renderer at {}", renderer.chrome_path().display());
            Arc::new(renderer)
        }
        Err(e) => {
            error!("{e}; rendered fallback unavailable");
            Arc::new(UnavailableRenderer::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderError;

    #[tokio::test]
    async fn test_disabled_rendering_is_not_an_environment_failure() {
        let config = Config {
            render_enabled: false,
            ..Config::default()
        };
        let err = build_renderer(&config).open().await.err().expect("must not open");
        assert!(matches!(err, RenderError::Disabled));
    }

    #[tokio::test]
    async fn test_missing_browser_is_an_environment_failure() {
        let config = Config {
            chromium_path: Some("/nonexistent/chrome".into()),
            ..Config::default()
        };
        // Only meaningful on machines without a discoverable browser.
        if crate::renderer::chromium::find_chromium().is_none() {
            let err = build_renderer(&config).open().await.err().expect("must not open");
            assert!(matches!(err, RenderError::Environment(_)));
        }
    }
}
