use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::error::MarketError;
use crate::producer::ProducerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listing status. Products are never deleted; selling or withdrawing flips
/// them to `Sold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Sold,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Sold => "sold",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductStatus::Available => "Disponible",
            ProductStatus::Sold => "Vendido",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "sold" => Ok(ProductStatus::Sold),
            other => Err(format!("unknown product status '{other}'")),
        }
    }
}

/// A product listing owned by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub price: f64,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub producer_id: ProducerId,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }

    /// Overwrite the editable fields. Status, owner and creation time stay.
    pub fn apply(&mut self, details: ProductDetails) {
        self.name = details.name;
        self.quantity = details.quantity;
        self.unit = details.unit;
        self.price = details.price;
        self.description = details.description;
        self.category_id = details.category_id;
    }
}

/// The user-editable part of a product, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub price: f64,
    pub description: Option<String>,
    pub category_id: CategoryId,
}

impl ProductDetails {
    pub fn new(
        name: &str,
        quantity: f64,
        unit: &str,
        price: f64,
        description: &str,
        category_id: CategoryId,
    ) -> Result<Self, MarketError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::invalid("name", "must not be empty"));
        }
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(MarketError::invalid("unit", "must not be empty"));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(MarketError::invalid("quantity", "must be greater than zero"));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(MarketError::invalid("price", "must not be negative"));
        }
        let description = description.trim();
        Ok(Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            price,
            description: (!description.is_empty()).then(|| description.to_string()),
            category_id,
        })
    }

    /// A fresh `Available` product owned by `producer_id`.
    pub fn into_product(
        self,
        id: ProductId,
        producer_id: ProducerId,
        created_at: DateTime<Utc>,
    ) -> Product {
        Product {
            id,
            name: self.name,
            quantity: self.quantity,
            unit: self.unit,
            price: self.price,
            description: self.description,
            status: ProductStatus::Available,
            producer_id,
            category_id: self.category_id,
            created_at,
        }
    }
}
