//! Delivery-fee share policy

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::orders::money::{MAX_CHARGE, round_money};

/// How much of an order's delivery fee the partner earns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeeSharePolicy {
    /// Flat amount per delivery
    Fixed(Decimal),
    /// Percentage (0-100) of the delivery fee
    Percentage(Decimal),
}

impl FeeSharePolicy {
    /// Partner's share of `delivery_fee`; `None` if it does not fit a `Decimal`
    pub fn share(&self, delivery_fee: Decimal) -> Option<Decimal> {
        match self {
            FeeSharePolicy::Fixed(amount) => Some(*amount),
            FeeSharePolicy::Percentage(pct) => delivery_fee
                .checked_mul(*pct)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .map(round_money),
        }
    }
}

/// Malformed `FEE_SHARE_POLICY` value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyParseError {
    #[error("invalid fee share policy '{0}', expected fixed:<amount> or percent:<pct>")]
    Format(String),

    #[error("invalid fee share amount '{value}': {reason}")]
    Amount { value: String, reason: String },

    #[error("fee share must be between 0 and {max}, got {value}")]
    OutOfRange { value: Decimal, max: Decimal },

    #[error("unknown fee share policy kind '{0}'")]
    UnknownKind(String),
}

impl FromStr for FeeSharePolicy {
    type Err = PolicyParseError;

    /// `fixed:<amount>` or `percent:<pct>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw) = s
            .split_once(':')
            .ok_or_else(|| PolicyParseError::Format(s.to_string()))?;
        let value = Decimal::from_str(raw.trim()).map_err(|e| PolicyParseError::Amount {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        let (policy, max) = match kind.trim().to_ascii_lowercase().as_str() {
            "fixed" => (FeeSharePolicy::Fixed(value), MAX_CHARGE),
            "percent" | "percentage" => (FeeSharePolicy::Percentage(value), Decimal::ONE_HUNDRED),
            other => return Err(PolicyParseError::UnknownKind(other.to_string())),
        };
        if (value.is_sign_negative() && !value.is_zero()) || value > max {
            return Err(PolicyParseError::OutOfRange { value, max });
        }
        Ok(policy)
    }
}

impl std::fmt::Display for FeeSharePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeSharePolicy::Fixed(amount) => write!(f, "fixed:{}", amount),
            FeeSharePolicy::Percentage(pct) => write!(f, "percent:{}", pct),
        }
    }
}
