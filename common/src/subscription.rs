//! Premium subscription lifecycle.
//!
//! Premium is activated by hand once payment is confirmed out of band. A paid
//! "month" is a flat 30 days from the activation timestamp. Nothing runs on a
//! timer: lapsed subscriptions stay premium until [`sweep`] is invoked.

use chrono::{DateTime, Duration, Utc};

use crate::error::MarketError;
use crate::producer::{Producer, ProducerId};

pub const DAYS_PER_PAID_MONTH: i64 = 30;

/// Longest single activation: one hundred years.
pub const MAX_PAID_MONTHS: u32 = 1200;

/// End of a premium period that started at `started_at` and covers `months`.
/// `None` if the end falls outside the representable date range.
pub fn expires_at(started_at: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let days = DAYS_PER_PAID_MONTH.checked_mul(i64::from(months))?;
    started_at.checked_add_signed(Duration::try_days(days)?)
}

/// Accept 1 to [`MAX_PAID_MONTHS`] months.
pub fn validate_months(months: u32) -> Result<u32, MarketError> {
    if (1..=MAX_PAID_MONTHS).contains(&months) {
        Ok(months)
    } else {
        Err(MarketError::InvalidMonths)
    }
}

impl Producer {
    /// `None` when there is no dated, non-empty subscription on record, or
    /// when its end is past the last representable date.
    pub fn subscription_expires_at(&self) -> Option<DateTime<Utc>> {
        match (self.subscription_started_at, self.paid_months) {
            (Some(started), months) if months > 0 => expires_at(started, months),
            _ => None,
        }
    }

    /// True for a premium producer whose paid period ended strictly before `now`.
    pub fn subscription_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.premium
            && self
                .subscription_expires_at()
                .is_some_and(|expiry| now > expiry)
    }

    /// Start a new premium period. Replaces any previous one.
    pub fn activate_premium(&mut self, months: u32, now: DateTime<Utc>) {
        self.premium = true;
        self.subscription_started_at = Some(now);
        self.paid_months = months;
    }
}

/// Clear the premium flag on every lapsed producer.
/// Returns the ids that were deactivated, in iteration order.
pub fn sweep<'a>(
    producers: impl IntoIterator<Item = &'a mut Producer>,
    now: DateTime<Utc>,
) -> Vec<ProducerId> {
    let mut deactivated = Vec::new();
    for producer in producers {
        if producer.subscription_lapsed(now) {
            producer.premium = false;
            deactivated.push(producer.id);
        }
    }
    deactivated
}
