//! Shared fakes for integration tests: a scripted renderer and a recording
//! alert dispatcher.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricewatch::acquisition::http_client::HttpClient;
use pricewatch::extraction::{PriceExtractor, SiteStrategy, StrategyTable};
use pricewatch::notify::{AlertDispatcher, DeliveryOutcome, PriceAlert};
use pricewatch::renderer::{RenderError, RenderSession, Renderer};
use pricewatch::temporal::store::{
    AddOutcome, PriceHistory, ProductStore, SqliteStore, StoreError, StoreResult,
};
use pricewatch::types::{PriceObservation, Product, ProductId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the scripted browser behaves.
#[derive(Debug, Clone, Default)]
pub enum Script {
    /// Selectors render the given text; anything else never appears.
    #[default]
    Empty,
    Page(HashMap<String, String>),
    /// `open` fails as if no browser were installed.
    NoBrowser,
    /// Navigation times out.
    NavigationFails,
}

/// A [`Renderer`] that replays a [`Script`] and counts session lifecycles.
#[derive(Default)]
pub struct ScriptedRenderer {
    script: Script,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    /// Selectors waited for, in order, across all sessions.
    pub waited: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRenderer {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn page(entries: &[(&str, &str)]) -> Self {
        Self::new(Script::Page(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    pub fn opens(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn waited(&self) -> Vec<String> {
        self.waited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        if matches!(self.script, Script::NoBrowser) {
            return Err(RenderError::Environment("no browser in test".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            closed: Arc::clone(&self.closed),
            waited: Arc::clone(&self.waited),
        }))
    }
}

struct ScriptedSession {
    script: Script,
    closed: Arc<AtomicUsize>,
    waited: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), RenderError> {
        match self.script {
            Script::NavigationFails => Err(RenderError::Navigation(format!("timed out: {url}"))),
            _ => Ok(()),
        }
    }

    async fn wait_for_text(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, RenderError> {
        self.waited.lock().unwrap().push(selector.to_string());
        match &self.script {
            Script::Page(texts) => Ok(texts.get(selector).cloned()),
            _ => Ok(None),
        }
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every alert and reports it delivered.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub alerts: Mutex<Vec<PriceAlert>>,
}

impl RecordingDispatcher {
    pub fn alerts(&self) -> Vec<PriceAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn notify(&self, alert: &PriceAlert) -> DeliveryOutcome {
        self.alerts.lock().unwrap().push(alert.clone());
        DeliveryOutcome::Delivered
    }
}

/// Counts alerts and reports every delivery as failed.
#[derive(Default)]
pub struct FailingDispatcher {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl AlertDispatcher for FailingDispatcher {
    async fn notify(&self, _alert: &PriceAlert) -> DeliveryOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        DeliveryOutcome::Failed("smtp relay refused connection".to_string())
    }
}

/// SQLite store whose writes fail for one product.
pub struct BrokenHistory {
    pub inner: SqliteStore,
    pub broken: ProductId,
}

impl ProductStore for BrokenHistory {
    fn add_product(
        &self,
        url: &str,
        threshold: Decimal,
        name: Option<&str>,
    ) -> StoreResult<AddOutcome> {
        self.inner.add_product(url, threshold, name)
    }

    fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.inner.list_products()
    }

    fn backfill_name(&self, id: ProductId, name: &str) -> StoreResult<bool> {
        self.inner.backfill_name(id, name)
    }
}

impl PriceHistory for BrokenHistory {
    fn record(
        &self,
        product_id: ProductId,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> StoreResult<PriceObservation> {
        if product_id == self.broken {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.record(product_id, price, observed_at)
    }

    fn last_two(&self, product_id: ProductId) -> StoreResult<Vec<PriceObservation>> {
        self.inner.last_two(product_id)
    }

    fn all_observations(&self, product_id: ProductId) -> StoreResult<Vec<PriceObservation>> {
        self.inner.all_observations(product_id)
    }
}

/// Strategy for pages served by a local mock server.
pub fn local_strategy(selectors: &[&str]) -> SiteStrategy {
    SiteStrategy {
        site: "local".to_string(),
        domains: vec!["127.0.0.1".to_string()],
        selectors: selectors.iter().map(|s| s.to_string()).collect(),
        title_selectors: Vec::new(),
    }
}

/// Built-in table plus the local strategy.
pub fn local_table(selectors: &[&str]) -> StrategyTable {
    let mut table = StrategyTable::builtin();
    table.push(local_strategy(selectors));
    table
}

pub fn extractor(renderer: Arc<ScriptedRenderer>) -> PriceExtractor {
    PriceExtractor::new(
        HttpClient::new("pricewatch-test/1.0", Duration::from_secs(5)),
        renderer,
        Duration::from_secs(1),
        Duration::from_millis(100),
    )
}

pub fn html_page(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
}
