//! Landed-cost shipping and duty pricing.

pub mod category_cap;
pub mod duty_fee;
pub mod multi_unit;
pub mod pipeline;
pub mod weight_band;
pub mod weight_tier;

pub use category_cap::{CapMode, CapOutcome, CategoryShippingCapEnforcer};
pub use duty_fee::{compute_ddp_fee, DutyFeeInputs};
pub use multi_unit::{
    simulate, AdvisorDecision, CostBreakdown, DecisionReason, MultiUnitInputs,
    MultiUnitPolicyAdvisor, MultiUnitShippingResult, RevenueBreakdown, ShippingPolicy,
};
pub use pipeline::{calculate_shipping, BatchItem, BatchOutcome, ShippingCalculator};
pub use weight_band::{
    chargeable_weight_kg, BandSegment, ChargeableWeightRule, ParcelDimensions,
    WeightBandConvention,
};
pub use weight_tier::{
    EscalateToHeavierTier, ExactTierOnly, TierResolution, TierSelectionStrategy,
    TierStrategyKind, WeightTierResolver,
};

use crate::error::Result;

/// Default advisor entry point
pub fn advise_multi_unit_policy(
    quantity: u32,
    inputs: &MultiUnitInputs,
) -> Result<AdvisorDecision> {
    MultiUnitPolicyAdvisor::default().advise(quantity, inputs)
}
