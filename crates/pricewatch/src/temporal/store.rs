//! Product registry and price history backed by SQLite.

use crate::types::{PriceObservation, Product, ProductId};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// Persistence failures.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of registering a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(ProductId),
    AlreadyExists,
}

/// Registration side of the store.
pub trait ProductStore: Send + Sync {
    /// Register a product. A URL that is already registered is left untouched.
    fn add_product(
        &self,
        url: &str,
        threshold: Decimal,
        name: Option<&str>,
    ) -> StoreResult<AddOutcome>;

    /// All products, in registration order.
    fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Set the display name of an unnamed product. Returns whether a name was set.
    fn backfill_name(&self, id: ProductId, name: &str) -> StoreResult<bool>;
}

/// Observation side of the store.
pub trait PriceHistory: Send + Sync {
    /// Append an observation.
    fn record(
        &self,
        product_id: ProductId,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> StoreResult<PriceObservation>;

    /// The two most recent observations, newest first.
    fn last_two(&self, product_id: ProductId) -> StoreResult<Vec<PriceObservation>>;

    /// Every observation, oldest first.
    fn all_observations(&self, product_id: ProductId) -> StoreResult<Vec<PriceObservation>>;
}

/// SQLite-backed store for products and their price history.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> StoreResult<Self> {
        db.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                name TEXT,
                threshold TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY,
                product_id INTEGER NOT NULL REFERENCES products(id),
                price TEXT NOT NULL,
                observed_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_price_history_product
                ON price_history (product_id, observed_at);",
        )?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Look a product up by URL.
    pub fn find_by_url(&self, url: &str) -> StoreResult<Option<Product>> {
        let db = self.conn()?;
        let product = db
            .query_row(
                "SELECT id, url, name, threshold FROM products WHERE url = ?1",
                params![url],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }
}

impl ProductStore for SqliteStore {
    fn add_product(
        &self,
        url: &str,
        threshold: Decimal,
        name: Option<&str>,
    ) -> StoreResult<AddOutcome> {
        let db = self.conn()?;
        let rows = db.execute(
            "INSERT INTO products (url, name, threshold) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO NOTHING",
            params![url, name, threshold.to_string()],
        )?;
        if rows == 0 {
            Ok(AddOutcome::AlreadyExists)
        } else {
            Ok(AddOutcome::Added(db.last_insert_rowid()))
        }
    }

    fn list_products(&self) -> StoreResult<Vec<Product>> {
        let db = self.conn()?;
        let mut stmt = db.prepare("SELECT id, url, name, threshold FROM products ORDER BY id")?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    fn backfill_name(&self, id: ProductId, name: &str) -> StoreResult<bool> {
        let db = self.conn()?;
        let rows = db.execute(
            "UPDATE products SET name = ?1 WHERE id = ?2 AND (name IS NULL OR name = '')",
            params![name, id],
        )?;
        Ok(rows > 0)
    }
}

impl PriceHistory for SqliteStore {
    fn record(
        &self,
        product_id: ProductId,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> StoreResult<PriceObservation> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO price_history (product_id, price, observed_at) VALUES (?1, ?2, ?3)",
            params![product_id, price.to_string(), timestamp_text(observed_at)],
        )?;
        Ok(PriceObservation {
            id: db.last_insert_rowid(),
            product_id,
            price,
            observed_at,
        })
    }

    fn last_two(&self, product_id: ProductId) -> StoreResult<Vec<PriceObservation>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT id, product_id, price, observed_at FROM price_history
             WHERE product_id = ?1
             ORDER BY observed_at DESC, id DESC
             LIMIT 2",
        )?;
        let rows = stmt
            .query_map(params![product_id], observation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn all_observations(&self, product_id: ProductId) -> StoreResult<Vec<PriceObservation>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT id, product_id, price, observed_at FROM price_history
             WHERE product_id = ?1
             ORDER BY observed_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![product_id], observation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Fixed-width RFC 3339 so that text order equals time order.
fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        threshold: decimal_column(row, 3)?,
    })
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<PriceObservation> {
    Ok(PriceObservation {
        id: row.get(0)?,
        product_id: row.get(1)?,
        price: decimal_column(row, 2)?,
        observed_at: timestamp_column(row, 3)?,
    })
}
