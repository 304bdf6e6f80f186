use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::MarketError;
use crate::phone::Phone;
use crate::producer::Producer;
use crate::product::Product;

/// How many simultaneously available products a free-plan producer may hold.
pub const FREE_PLAN_ACTIVE_LIMIT: u64 = 1;

/// An available product joined with what the public page shows about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub product: Product,
    pub producer_name: String,
    pub farm: Option<String>,
    pub phone: Phone,
    pub premium: bool,
    pub category: Category,
}

/// Gate a new listing: premium producers are unlimited, everyone else gets
/// [`FREE_PLAN_ACTIVE_LIMIT`] available products.
pub fn ensure_capacity(producer: &Producer, active: u64) -> Result<(), MarketError> {
    if producer.premium || active < FREE_PLAN_ACTIVE_LIMIT {
        Ok(())
    } else {
        Err(MarketError::CapacityExceeded {
            active,
            limit: FREE_PLAN_ACTIVE_LIMIT,
        })
    }
}

/// Public listing order: premium producers first, then newest first.
pub fn listing_order(a: &Listing, b: &Listing) -> Ordering {
    b.premium
        .cmp(&a.premium)
        .then_with(|| b.product.created_at.cmp(&a.product.created_at))
        .then_with(|| b.product.id.cmp(&a.product.id))
}

/// Count of `products` that are still available.
pub fn active_count<'a>(products: impl IntoIterator<Item = &'a Product>) -> u64 {
    products.into_iter().filter(|p| p.is_available()).count() as u64
}
