use thiserror::Error;

use crate::product::ProductId;

/// Business-rule violations. Everything here maps to a user-facing message;
/// none of it is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    #[error("free plan allows {limit} active product(s); producer already has {active}")]
    CapacityExceeded { active: u64, limit: u64 },

    #[error("phone does not match the product owner")]
    Unauthorized,

    #[error("no producer registered with that phone")]
    ProducerNotFound,

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("category {0} does not exist")]
    UnknownCategory(i64),

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("invalid phone number")]
    InvalidPhone,

    #[error("months must be between 1 and 1200")]
    InvalidMonths,
}

impl MarketError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        MarketError::InvalidField { field, reason }
    }

    /// True for errors caused by what the caller typed, as opposed to state.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            MarketError::UnknownCategory(_)
                | MarketError::InvalidField { .. }
                | MarketError::InvalidPhone
                | MarketError::InvalidMonths
        )
    }
}
