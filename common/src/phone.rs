use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// A producer's phone number, normalized.
///
/// The phone doubles as the producer's identity and as the shared secret that
/// gates editing and withdrawing their products, so every comparison goes
/// through the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    /// Normalize user input: strip whitespace and the usual separators
    /// (`-`, `.`, `(`, `)`), then require 7–15 digits with an optional
    /// leading `+`.
    pub fn parse(raw: &str) -> Result<Self, MarketError> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')'))
            .collect();

        let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        if digits.len() < MIN_DIGITS
            || digits.len() > MAX_DIGITS
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MarketError::InvalidPhone);
        }
        Ok(Phone(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits only, for `wa.me` links.
    pub fn whatsapp_digits(&self) -> &str {
        self.0.strip_prefix('+').unwrap_or(&self.0)
    }
}

impl FromStr for Phone {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phone::parse(s)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
