use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::phone::Phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub i64);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A seller, identified by phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub id: ProducerId,
    pub name: String,
    pub farm: Option<String>,
    pub phone: Phone,
    pub premium: bool,
    /// When the current premium period was activated.
    pub subscription_started_at: Option<DateTime<Utc>>,
    /// Number of 30-day periods paid at activation.
    pub paid_months: u32,
}

impl Producer {
    /// Equality check of a presented phone against the owner's.
    pub fn authorize(&self, presented: &Phone) -> Result<(), MarketError> {
        if self.phone == *presented {
            Ok(())
        } else {
            Err(MarketError::Unauthorized)
        }
    }
}

/// Identity fields supplied on first product submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProducer {
    pub name: String,
    pub farm: Option<String>,
    pub phone: Phone,
}

impl NewProducer {
    pub fn new(name: &str, farm: &str, phone: Phone) -> Result<Self, MarketError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::invalid("producer name", "must not be empty"));
        }
        let farm = farm.trim();
        Ok(Self {
            name: name.to_string(),
            farm: (!farm.is_empty()).then(|| farm.to_string()),
            phone,
        })
    }

    /// Materialize a fresh, non-premium producer row.
    pub fn into_producer(self, id: ProducerId) -> Producer {
        Producer {
            id,
            name: self.name,
            farm: self.farm,
            phone: self.phone,
            premium: false,
            subscription_started_at: None,
            paid_months: 0,
        }
    }
}

/// The producer every fresh database gets when demo seeding is enabled.
pub fn demo_producer() -> NewProducer {
    NewProducer {
        name: "Productor Ejemplo".to_string(),
        farm: Some("Finca Demo".to_string()),
        phone: Phone::parse("3000000000").expect("demo phone is valid"),
    }
}
