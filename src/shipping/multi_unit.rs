//! Combined-shipping policy for multi-unit orders
//!
//! Simulates two ways of charging shipping for `quantity` units and picks
//! the one that keeps the sale profitable:
//!
//! - **Flat-repeat**: every unit shows the first unit's shipping charge,
//!   while the carrier actually bills the discounted incremental schedule.
//! - **Cost-based**: the buyer pays the incremental schedule itself.
//!
//! Flat-repeat wins when it is materially more profitable or when cost-based
//! would be a loss; otherwise the buyer-friendly cost-based policy wins.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{PricingError, Result};
use crate::shipping::duty_fee::compute_ddp_fee;

/// Profit gap (currency units) above which flat-repeat is preferred
pub const DEFAULT_PROFIT_DELTA_THRESHOLD: Decimal = dec!(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShippingPolicy {
    FlatRepeat,
    CostBased,
}

impl fmt::Display for ShippingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShippingPolicy::FlatRepeat => write!(f, "flat-repeat"),
            ShippingPolicy::CostBased => write!(f, "cost-based"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Flat-repeat earns more than the threshold over cost-based
    MateriallyMoreProfitable,
    /// Cost-based would sell at a loss
    CostBasedWouldLose,
    /// Cost-based is affordable, so the buyer gets the real schedule
    CostBasedAffordable,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::MateriallyMoreProfitable => {
                write!(f, "flat-repeat is materially more profitable")
            }
            DecisionReason::CostBasedWouldLose => write!(f, "cost-based shipping would be a loss"),
            DecisionReason::CostBasedAffordable => {
                write!(f, "cost-based shipping keeps the sale profitable")
            }
        }
    }
}

/// Per-unit figures for one multi-unit simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiUnitInputs {
    /// Carrier charge for the first unit
    pub base_shipping_unit: Decimal,
    /// Carrier charge for each additional unit
    pub incremental_shipping_unit: Decimal,
    pub handling_fee_unit: Decimal,
    pub item_price_unit: Decimal,
    pub tariff_rate: Decimal,
    pub marketplace_fee_rate: Decimal,
    /// Item cost as a share of item price
    pub item_cost_ratio: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub item: Decimal,
    pub shipping: Decimal,
    pub handling: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub item: Decimal,
    pub shipping: Decimal,
    pub duty: Decimal,
    pub marketplace_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiUnitShippingResult {
    pub policy: ShippingPolicy,
    pub quantity: u32,
    pub displayed_shipping_total: Decimal,
    pub actual_shipping_cost: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// profit / revenue, 0 when there is no revenue
    pub profit_margin: Decimal,
    pub revenue_breakdown: RevenueBreakdown,
    pub cost_breakdown: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorDecision {
    pub chosen_policy: ShippingPolicy,
    pub reason: DecisionReason,
    /// flat-repeat profit minus cost-based profit
    pub profit_delta: Decimal,
    pub flat_repeat: MultiUnitShippingResult,
    pub cost_based: MultiUnitShippingResult,
}

impl AdvisorDecision {
    pub fn chosen(&self) -> &MultiUnitShippingResult {
        match self.chosen_policy {
            ShippingPolicy::FlatRepeat => &self.flat_repeat,
            ShippingPolicy::CostBased => &self.cost_based,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MultiUnitPolicyAdvisor {
    profit_delta_threshold: Decimal,
}

impl Default for MultiUnitPolicyAdvisor {
    fn default() -> Self {
        Self::new(DEFAULT_PROFIT_DELTA_THRESHOLD)
    }
}

impl MultiUnitPolicyAdvisor {
    pub fn new(profit_delta_threshold: Decimal) -> Self {
        Self {
            profit_delta_threshold,
        }
    }

    pub fn profit_delta_threshold(&self) -> Decimal {
        self.profit_delta_threshold
    }

    pub fn advise(&self, quantity: u32, inputs: &MultiUnitInputs) -> Result<AdvisorDecision> {
        let flat_repeat = simulate(ShippingPolicy::FlatRepeat, quantity, inputs)?;
        let cost_based = simulate(ShippingPolicy::CostBased, quantity, inputs)?;
        let profit_delta = flat_repeat.profit - cost_based.profit;

        let (chosen_policy, reason) = if profit_delta > self.profit_delta_threshold {
            (ShippingPolicy::FlatRepeat, DecisionReason::MateriallyMoreProfitable)
        } else if cost_based.profit < Decimal::ZERO {
            (ShippingPolicy::FlatRepeat, DecisionReason::CostBasedWouldLose)
        } else {
            (ShippingPolicy::CostBased, DecisionReason::CostBasedAffordable)
        };

        debug!(
            quantity,
            flat_profit = %flat_repeat.profit,
            cost_based_profit = %cost_based.profit,
            delta = %profit_delta,
            chosen = %chosen_policy,
            "Multi-unit policy decision"
        );

        Ok(AdvisorDecision {
            chosen_policy,
            reason,
            profit_delta,
            flat_repeat,
            cost_based,
        })
    }

    /// One decision per candidate quantity, in input order
    pub fn advise_quantities<I>(
        &self,
        quantities: I,
        inputs: &MultiUnitInputs,
    ) -> Result<Vec<AdvisorDecision>>
    where
        I: IntoIterator<Item = u32>,
    {
        quantities
            .into_iter()
            .map(|q| self.advise(q, inputs))
            .collect()
    }
}

/// Carrier cost of `quantity` units on the incremental schedule
pub fn incremental_shipping_cost(quantity: u32, base: Decimal, incremental: Decimal) -> Decimal {
    if quantity == 0 {
        return Decimal::ZERO;
    }
    base + incremental * Decimal::from(quantity - 1)
}

/// Profit simulation for one policy
pub fn simulate(
    policy: ShippingPolicy,
    quantity: u32,
    inputs: &MultiUnitInputs,
) -> Result<MultiUnitShippingResult> {
    if quantity == 0 {
        return Err(PricingError::InvalidQuantity(quantity));
    }
    let q = Decimal::from(quantity);

    let actual_shipping_cost = incremental_shipping_cost(
        quantity,
        inputs.base_shipping_unit,
        inputs.incremental_shipping_unit,
    );
    let displayed_shipping_total = match policy {
        ShippingPolicy::FlatRepeat => inputs.base_shipping_unit * q,
        ShippingPolicy::CostBased => actual_shipping_cost,
    };

    let revenue_breakdown = RevenueBreakdown {
        item: inputs.item_price_unit * q,
        shipping: displayed_shipping_total,
        handling: inputs.handling_fee_unit * q,
    };
    let revenue = revenue_breakdown.item + revenue_breakdown.shipping + revenue_breakdown.handling;

    // Duty on the CIF-equivalent basis: goods plus the freight actually paid
    let cif_value = revenue_breakdown.item + actual_shipping_cost;
    let cost_breakdown = CostBreakdown {
        item: revenue_breakdown.item * inputs.item_cost_ratio,
        shipping: actual_shipping_cost,
        duty: compute_ddp_fee(cif_value, inputs.tariff_rate, Decimal::ZERO, Decimal::ZERO),
        marketplace_fee: revenue * inputs.marketplace_fee_rate,
    };
    let cost = cost_breakdown.item
        + cost_breakdown.shipping
        + cost_breakdown.duty
        + cost_breakdown.marketplace_fee;

    let profit = revenue - cost;
    let profit_margin = if revenue.is_zero() {
        Decimal::ZERO
    } else {
        profit / revenue
    };

    Ok(MultiUnitShippingResult {
        policy,
        quantity,
        displayed_shipping_total,
        actual_shipping_cost,
        revenue,
        cost,
        profit,
        profit_margin,
        revenue_breakdown,
        cost_breakdown,
    })
}
