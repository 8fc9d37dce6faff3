//! Core types used throughout the pricing engine
//!
//! Rate card rows, reason codes, request/result shapes and the
//! presentation rounding helper.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency amounts are carried at full precision and rounded only for display.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Round a currency amount for presentation (2 dp, half away from zero).
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// One row of a carrier's pre-negotiated rate card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTierRow {
    /// Tier key: upper bound of a discrete weight band
    pub weight_kg: Decimal,
    /// Carrier charge of the band, also the most total outbound cost it can carry
    pub capacity_amount: Decimal,
    /// Carrier base rate for the band (0 when the card only lists capacities)
    #[serde(default)]
    pub base_charge: Decimal,
}

impl RateTierRow {
    pub fn new(weight_kg: Decimal, capacity_amount: Decimal) -> Self {
        Self {
            weight_kg,
            capacity_amount,
            base_charge: Decimal::ZERO,
        }
    }

    pub fn with_base_charge(mut self, base_charge: Decimal) -> Self {
        self.base_charge = base_charge;
        self
    }

    /// Whether this band can absorb `required_cost`
    pub fn covers(&self, required_cost: Decimal) -> bool {
        required_cost <= self.capacity_amount
    }
}

/// Why a shipping calculation ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// The parcel's own band covers the total cost
    WithinBaseTier,
    /// A heavier band was bought to absorb the total cost
    EscalatedTier,
    /// The actual weight is not a key of the rate card
    NoTierForWeight,
    /// No band, heavier ones included, can absorb the total cost
    NoQualifyingTier,
}

impl ReasonCode {
    pub fn is_viable(&self) -> bool {
        matches!(self, ReasonCode::WithinBaseTier | ReasonCode::EscalatedTier)
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::WithinBaseTier => write!(f, "WITHIN_BASE_TIER"),
            ReasonCode::EscalatedTier => write!(f, "ESCALATED_TIER"),
            ReasonCode::NoTierForWeight => write!(f, "NO_TIER_FOR_WEIGHT"),
            ReasonCode::NoQualifyingTier => write!(f, "NO_QUALIFYING_TIER"),
        }
    }
}

/// Inputs for pricing one unit of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRequest {
    /// Must match a rate card key exactly
    pub actual_weight_kg: Decimal,
    /// Declared item value
    pub item_price: Decimal,
    pub tariff_rate: Decimal,
    pub sales_tax_rate: Decimal,
    pub service_fee: Decimal,
    pub category_id: String,
}

/// Split of the DDP fee into its three components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyFeeBreakdown {
    pub import_duty: Decimal,
    pub sales_tax: Decimal,
    pub service_fee: Decimal,
}

impl DutyFeeBreakdown {
    pub fn total(&self) -> Decimal {
        self.import_duty + self.sales_tax + self.service_fee
    }
}

/// Output of the single-unit shipping pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingCalculationResult {
    pub actual_weight_kg: Decimal,
    /// Capacity of the band keyed by the actual weight (None if the key is missing)
    pub base_tier_capacity: Option<Decimal>,
    /// Carrier base charge of the actual-weight band
    pub base_charge: Decimal,
    pub duty_fee: Decimal,
    pub duty_breakdown: DutyFeeBreakdown,
    /// base_charge + duty_fee
    pub total_cost_needed: Decimal,
    pub selected_tier_weight_kg: Option<Decimal>,
    pub selected_tier_capacity: Option<Decimal>,
    pub used_escalated_tier: bool,
    pub displayed_shipping_amount: Decimal,
    /// Always >= 0
    pub item_price_adjustment: Decimal,
    pub is_viable: bool,
    pub reason_code: ReasonCode,
    pub warnings: Vec<String>,
}

impl ShippingCalculationResult {
    /// Amount the buyer pays on top of the already-collected item price
    pub fn buyer_total(&self) -> Decimal {
        self.displayed_shipping_amount + self.item_price_adjustment
    }

    /// Copy with every currency figure rounded for display
    pub fn rounded(&self) -> Self {
        let mut out = self.clone();
        out.base_tier_capacity = out.base_tier_capacity.map(round_currency);
        out.base_charge = round_currency(out.base_charge);
        out.duty_fee = round_currency(out.duty_fee);
        out.duty_breakdown = DutyFeeBreakdown {
            import_duty: round_currency(out.duty_breakdown.import_duty),
            sales_tax: round_currency(out.duty_breakdown.sales_tax),
            service_fee: round_currency(out.duty_breakdown.service_fee),
        };
        out.total_cost_needed = round_currency(out.total_cost_needed);
        out.selected_tier_capacity = out.selected_tier_capacity.map(round_currency);
        out.displayed_shipping_amount = round_currency(out.displayed_shipping_amount);
        out.item_price_adjustment = round_currency(out.item_price_adjustment);
        out
    }
}
