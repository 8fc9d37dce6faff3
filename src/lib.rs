//! Landed Cost Library
//!
//! DDP shipping & duty pricing for cross-border marketplace listings

pub mod config;
pub mod error;
pub mod persistence;
pub mod rate_table;
pub mod shipping;
pub mod types;

pub use error::{PricingError, Result};
pub use rate_table::{CategoryLimitTable, InMemoryCategoryLimits, InMemoryRateTable, RateTable};
pub use shipping::{advise_multi_unit_policy, calculate_shipping, ShippingCalculator};
pub use types::{RateTierRow, ReasonCode, ShippingCalculationResult, ShippingRequest};
