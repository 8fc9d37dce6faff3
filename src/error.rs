//! Error types for the pricing engine
//!
//! Infeasible prices are not errors: they come back as non-viable results.
//! These variants cover bad arguments and bad reference data only.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PricingError>;

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    #[error("Unknown tier strategy: {0} (expected \"escalate\" or \"exact_only\")")]
    UnknownTierStrategy(String),

    #[error("Unknown category cap mode: {0} (expected \"transfer_overage\" or \"disabled\")")]
    UnknownCapMode(String),

    #[error("Invalid rate tier {weight_kg}kg: {reason}")]
    InvalidRateRow {
        weight_kg: Decimal,
        reason: String,
    },

    #[error("Invalid shipping limit for category {category_id}: {reason}")]
    InvalidCategoryLimit {
        category_id: String,
        reason: String,
    },
}
