//! Persistence seam.
//!
//! Each method is one atomic unit of work: it either commits completely or
//! leaves the store untouched. Business rules come from `mercado_common` and
//! are evaluated inside the unit of work, so the rule sees the same rows the
//! write acts on.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use mercado_common::category::{Category, CategoryId};
use mercado_common::error::MarketError;
use mercado_common::listing::Listing;
use mercado_common::phone::Phone;
use mercado_common::producer::{NewProducer, Producer};
use mercado_common::product::{Product, ProductDetails, ProductId};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Rule(#[from] MarketError),

    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("could not build connection pool: {0}")]
    PoolBuild(#[from] deadpool_postgres::BuildError),

    #[error("corrupt row: {0}")]
    Decode(String),
}

/// A product together with the producer that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedProduct {
    pub product: Product,
    pub owner: Producer,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and `/health`.
    fn backend(&self) -> &'static str;

    /// Create the tables if they do not exist yet.
    async fn migrate(&self) -> Result<(), StoreError>;

    /// Insert any category names that are missing. Returns how many were added.
    async fn seed_categories(&self, names: &[&str]) -> Result<usize, StoreError>;

    /// Insert `producer` only when no producer exists at all.
    async fn seed_producer(&self, producer: NewProducer) -> Result<bool, StoreError>;

    async fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Available products, optionally in a single category, premium first
    /// then newest first.
    async fn list_available(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Listing>, StoreError>;

    async fn producer_by_phone(&self, phone: &Phone) -> Result<Option<Producer>, StoreError>;

    /// Every product of the producer with `phone`, any status, newest first.
    async fn products_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<(Producer, Vec<Product>), StoreError>;

    async fn product(&self, id: ProductId) -> Result<Option<OwnedProduct>, StoreError>;

    /// Find or create the producer by phone, apply the free-plan cap, and
    /// create the product as available.
    async fn submit_product(
        &self,
        producer: NewProducer,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError>;

    /// Flip a product to sold. Returns `false` if no such product exists.
    async fn mark_sold(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Replace a product's editable fields, if `phone` owns it.
    async fn update_product(
        &self,
        id: ProductId,
        phone: &Phone,
        details: ProductDetails,
    ) -> Result<Product, StoreError>;

    /// Mark a product sold, if `phone` owns it.
    async fn withdraw_product(&self, id: ProductId, phone: &Phone) -> Result<Product, StoreError>;

    async fn activate_premium(
        &self,
        phone: &Phone,
        months: u32,
        now: DateTime<Utc>,
    ) -> Result<Producer, StoreError>;

    /// Clear premium on every lapsed subscription. Returns the producers that
    /// were deactivated.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Producer>, StoreError>;
}
