//! Configuration sections

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Destination sales tax as a fraction, applied to every destination
    pub sales_tax_rate: Decimal,
    /// Flat DDP service fee per shipment
    pub service_fee: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    /// "escalate" or "exact_only"
    pub strategy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCapConfig {
    /// "transfer_overage" or "disabled"
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiUnitConfig {
    /// Profit gap above which flat-repeat shipping is preferred
    pub profit_delta_threshold: Decimal,
    /// Item cost as a share of item price
    pub item_cost_ratio: Decimal,
    /// Marketplace final value fee as a fraction of revenue
    pub marketplace_fee_rate: Decimal,
    /// Handling charged per unit
    pub handling_fee: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// CSV with weight_kg,capacity_amount[,base_charge]
    pub rate_table_path: String,
    /// CSV (category_id,max_shipping) or YAML map
    pub category_limits_path: String,
}
