use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use mercado_common::category::{Category, CategoryId};
use mercado_common::error::MarketError;
use mercado_common::listing::{active_count, ensure_capacity, listing_order, Listing};
use mercado_common::phone::Phone;
use mercado_common::producer::{NewProducer, Producer, ProducerId};
use mercado_common::product::{Product, ProductDetails, ProductId, ProductStatus};
use mercado_common::subscription;

use super::{OwnedProduct, Store, StoreError};

/// Process-local store. One lock over all tables; every method checks
/// before it mutates, so a failed call leaves the tables as they were.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    producers: BTreeMap<ProducerId, Producer>,
    products: BTreeMap<ProductId, Product>,
    next_category: i64,
    next_producer: i64,
    next_product: i64,
}

impl Tables {
    fn producer_by_phone(&self, phone: &Phone) -> Option<&Producer> {
        self.producers.values().find(|p| p.phone == *phone)
    }

    fn products_of(&self, producer: ProducerId) -> impl Iterator<Item = &Product> {
        self.products
            .values()
            .filter(move |p| p.producer_id == producer)
    }

    fn ensure_category(&self, id: CategoryId) -> Result<(), MarketError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(MarketError::UnknownCategory(id.0))
        }
    }

    /// Look a product up and check `phone` against its owner.
    fn owned_product_mut(
        &mut self,
        id: ProductId,
        phone: &Phone,
    ) -> Result<&mut Product, MarketError> {
        let product = self
            .products
            .get(&id)
            .ok_or(MarketError::ProductNotFound(id))?;
        let owner = self
            .producers
            .get(&product.producer_id)
            .ok_or(MarketError::ProductNotFound(id))?;
        owner.authorize(phone)?;
        self.products
            .get_mut(&id)
            .ok_or(MarketError::ProductNotFound(id))
    }

    fn listing(&self, product: &Product) -> Option<Listing> {
        let producer = self.producers.get(&product.producer_id)?;
        let category = self.categories.get(&product.category_id)?;
        Some(Listing {
            product: product.clone(),
            producer_name: producer.name.clone(),
            farm: producer.farm.clone(),
            phone: producer.phone.clone(),
            premium: producer.premium,
            category: category.clone(),
        })
    }

    fn next_producer_id(&mut self) -> ProducerId {
        self.next_producer += 1;
        ProducerId(self.next_producer)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn seed_categories(&self, names: &[&str]) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut added = 0;
        for name in names {
            if tables.categories.values().any(|c| c.name == *name) {
                continue;
            }
            tables.next_category += 1;
            let id = CategoryId(tables.next_category);
            tables.categories.insert(
                id,
                Category {
                    id,
                    name: (*name).to_string(),
                },
            );
            added += 1;
        }
        Ok(added)
    }

    async fn seed_producer(&self, producer: NewProducer) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.producers.is_empty() {
            return Ok(false);
        }
        let id = tables.next_producer_id();
        tables.producers.insert(id, producer.into_producer(id));
        Ok(true)
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn list_available(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Listing>, StoreError> {
        let tables = self.tables.lock().await;
        let mut listings: Vec<Listing> = tables
            .products
            .values()
            .filter(|p| p.is_available())
            .filter(|p| category.is_none() || category == Some(p.category_id))
            .filter_map(|p| tables.listing(p))
            .collect();
        listings.sort_by(listing_order);
        Ok(listings)
    }

    async fn producer_by_phone(&self, phone: &Phone) -> Result<Option<Producer>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.producer_by_phone(phone).cloned())
    }

    async fn products_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<(Producer, Vec<Product>), StoreError> {
        let tables = self.tables.lock().await;
        let producer = tables
            .producer_by_phone(phone)
            .cloned()
            .ok_or(MarketError::ProducerNotFound)?;
        let mut products: Vec<Product> = tables.products_of(producer.id).cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok((producer, products))
    }

    async fn product(&self, id: ProductId) -> Result<Option<OwnedProduct>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.products.get(&id).and_then(|product| {
            tables.producers.get(&product.producer_id).map(|owner| OwnedProduct {
                product: product.clone(),
                owner: owner.clone(),
            })
        }))
    }

    async fn submit_product(
        &self,
        producer: NewProducer,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.ensure_category(details.category_id)?;

        // A new producer only lands in the table once the product does.
        let existing = tables.producer_by_phone(&producer.phone).cloned();
        let owner = match existing {
            Some(owner) => {
                let active = active_count(tables.products_of(owner.id));
                ensure_capacity(&owner, active)?;
                owner
            }
            None => {
                let id = tables.next_producer_id();
                let owner = producer.into_producer(id);
                tables.producers.insert(id, owner.clone());
                owner
            }
        };

        tables.next_product += 1;
        let product = details.into_product(ProductId(tables.next_product), owner.id, now);
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn mark_sold(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.products.get_mut(&id) {
            Some(product) => {
                product.status = ProductStatus::Sold;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_product(
        &self,
        id: ProductId,
        phone: &Phone,
        details: ProductDetails,
    ) -> Result<Product, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.ensure_category(details.category_id)?;
        let product = tables.owned_product_mut(id, phone)?;
        product.apply(details);
        Ok(product.clone())
    }

    async fn withdraw_product(&self, id: ProductId, phone: &Phone) -> Result<Product, StoreError> {
        let mut tables = self.tables.lock().await;
        let product = tables.owned_product_mut(id, phone)?;
        product.status = ProductStatus::Sold;
        Ok(product.clone())
    }

    async fn activate_premium(
        &self,
        phone: &Phone,
        months: u32,
        now: DateTime<Utc>,
    ) -> Result<Producer, StoreError> {
        let months = subscription::validate_months(months)?;
        let mut tables = self.tables.lock().await;
        let producer = tables
            .producers
            .values_mut()
            .find(|p| p.phone == *phone)
            .ok_or(MarketError::ProducerNotFound)?;
        producer.activate_premium(months, now);
        Ok(producer.clone())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Producer>, StoreError> {
        let mut tables = self.tables.lock().await;
        let ids = subscription::sweep(tables.producers.values_mut(), now);
        Ok(ids
            .iter()
            .filter_map(|id| tables.producers.get(id).cloned())
            .collect())
    }
}
