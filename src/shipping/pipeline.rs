//! Single-unit shipping pipeline
//!
//! duty fee -> weight tier -> category cap. Every call is a pure function of
//! the request and the table snapshots it is given.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::rate_table::{CategoryLimitTable, RateTable};
use crate::shipping::category_cap::{CapMode, CategoryShippingCapEnforcer};
use crate::shipping::duty_fee::DutyFeeInputs;
use crate::shipping::weight_tier::{TierStrategyKind, WeightTierResolver};
use crate::types::{ReasonCode, ShippingCalculationResult, ShippingRequest};

#[derive(Debug, Default)]
pub struct ShippingCalculator {
    resolver: WeightTierResolver,
    cap_enforcer: CategoryShippingCapEnforcer,
}

impl ShippingCalculator {
    pub fn new(resolver: WeightTierResolver, cap_enforcer: CategoryShippingCapEnforcer) -> Self {
        Self {
            resolver,
            cap_enforcer,
        }
    }

    pub fn from_settings(tier_strategy: TierStrategyKind, cap_mode: CapMode) -> Self {
        Self::new(
            WeightTierResolver::from_kind(tier_strategy),
            CategoryShippingCapEnforcer::new(cap_mode),
        )
    }

    pub fn calculate(
        &self,
        request: &ShippingRequest,
        rates: &dyn RateTable,
        limits: &dyn CategoryLimitTable,
    ) -> ShippingCalculationResult {
        let duty_inputs = DutyFeeInputs {
            item_price: request.item_price,
            tariff_rate: request.tariff_rate,
            sales_tax_rate: request.sales_tax_rate,
            service_fee: request.service_fee,
        };
        let duty_fee = duty_inputs.compute();
        let duty_breakdown = duty_inputs.breakdown();

        let mut result = ShippingCalculationResult {
            actual_weight_kg: request.actual_weight_kg,
            base_tier_capacity: None,
            base_charge: Decimal::ZERO,
            duty_fee,
            duty_breakdown,
            total_cost_needed: duty_fee,
            selected_tier_weight_kg: None,
            selected_tier_capacity: None,
            used_escalated_tier: false,
            displayed_shipping_amount: duty_fee,
            item_price_adjustment: Decimal::ZERO,
            is_viable: false,
            reason_code: ReasonCode::NoTierForWeight,
            warnings: Vec::new(),
        };

        let base = match rates.lookup_by_weight(request.actual_weight_kg) {
            Some(row) => row,
            None => {
                error!(
                    weight_kg = %request.actual_weight_kg,
                    category_id = %request.category_id,
                    "No rate tier keyed by this weight; table incomplete or weight not snapped"
                );
                return result;
            }
        };

        let total_cost_needed = base.base_charge + duty_fee;
        result.base_tier_capacity = Some(base.capacity_amount);
        result.base_charge = base.base_charge;
        result.total_cost_needed = total_cost_needed;
        result.displayed_shipping_amount = total_cost_needed;

        let resolution = self.resolver.resolve_from_base(
            request.actual_weight_kg,
            base,
            total_cost_needed,
            rates,
        );
        result.reason_code = resolution.reason_code;
        result.is_viable = resolution.is_viable;
        result.used_escalated_tier = resolution.used_escalated_tier;
        result.selected_tier_weight_kg = resolution.selected_tier.map(|t| t.weight_kg);
        result.selected_tier_capacity = resolution.selected_tier.map(|t| t.capacity_amount);
        if let Some(warning) = resolution.warning {
            result.warnings.push(warning);
        }

        // Not viable: keep the unattainable total on display for diagnostics
        if !result.is_viable {
            return result;
        }

        let cap = self
            .cap_enforcer
            .enforce(total_cost_needed, &request.category_id, limits);
        result.displayed_shipping_amount = cap.displayed_shipping_amount;
        result.item_price_adjustment = cap.item_price_adjustment;
        if let Some(warning) = cap.warning {
            result.warnings.push(warning);
        }

        debug_assert_eq!(
            result.displayed_shipping_amount + result.item_price_adjustment,
            result.total_cost_needed
        );
        debug!(
            weight_kg = %result.actual_weight_kg,
            tier_kg = ?result.selected_tier_weight_kg,
            total = %result.total_cost_needed,
            displayed = %result.displayed_shipping_amount,
            adjustment = %result.item_price_adjustment,
            reason = %result.reason_code,
            strategy = self.resolver.strategy_name(),
            cap_mode = ?self.cap_enforcer.mode(),
            "Shipping calculated"
        );

        result
    }

    /// Price many items against one snapshot, keeping input order
    pub fn calculate_batch(
        &self,
        items: &[BatchItem],
        rates: &dyn RateTable,
        limits: &dyn CategoryLimitTable,
    ) -> Vec<BatchOutcome> {
        let outcomes: Vec<BatchOutcome> = items
            .iter()
            .map(|item| BatchOutcome {
                id: item.id.clone(),
                result: self.calculate(&item.request, rates, limits),
            })
            .collect();

        let viable = outcomes.iter().filter(|o| o.result.is_viable).count();
        let escalated = outcomes
            .iter()
            .filter(|o| o.result.used_escalated_tier)
            .count();
        info!(
            total = outcomes.len(),
            viable,
            not_viable = outcomes.len() - viable,
            escalated,
            "Batch shipping calculation complete"
        );

        outcomes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    #[serde(flatten)]
    pub request: ShippingRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub id: String,
    pub result: ShippingCalculationResult,
}

/// Default pipeline: escalating tiers, category caps transfer overage
pub fn calculate_shipping(
    request: &ShippingRequest,
    rates: &dyn RateTable,
    limits: &dyn CategoryLimitTable,
) -> ShippingCalculationResult {
    ShippingCalculator::default().calculate(request, rates, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_table::{InMemoryCategoryLimits, InMemoryRateTable};
    use crate::types::RateTierRow;
    use rust_decimal_macros::dec;

    fn request(weight: Decimal, category: &str) -> ShippingRequest {
        ShippingRequest {
            actual_weight_kg: weight,
            item_price: dec!(50),
            tariff_rate: dec!(0.05),
            sales_tax_rate: dec!(0.08),
            service_fee: dec!(15),
            category_id: category.to_string(),
        }
    }

    fn limits() -> InMemoryCategoryLimits {
        InMemoryCategoryLimits::from_pairs(vec![("267", dec!(20))]).unwrap()
    }

    #[test]
    fn base_charge_counts_toward_required_cost() {
        let rates = InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(2.0), dec!(30)).with_base_charge(dec!(5.90)),
            RateTierRow::new(dec!(2.5), dec!(35)),
        ])
        .unwrap();
        let r = calculate_shipping(&request(dec!(2.0), "1"), &rates, &limits());
        assert_eq!(r.total_cost_needed, dec!(27.40));
        assert_eq!(r.displayed_shipping_amount, dec!(27.40));
        assert!(!r.used_escalated_tier);
    }

    #[test]
    fn escalation_then_cap_keeps_warnings_in_order() {
        let rates = InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(2.0), dec!(18)),
            RateTierRow::new(dec!(3.0), dec!(40)),
        ])
        .unwrap();
        let r = calculate_shipping(&request(dec!(2.0), "267"), &rates, &limits());
        assert!(r.is_viable);
        assert_eq!(r.reason_code, ReasonCode::EscalatedTier);
        assert_eq!(r.displayed_shipping_amount, dec!(20));
        assert_eq!(r.item_price_adjustment, dec!(1.50));
        assert_eq!(r.warnings.len(), 2);
        assert!(r.warnings[0].contains("escalated"));
        assert!(r.warnings[1].contains("267"));
    }

    #[test]
    fn disabled_cap_mode_keeps_full_shipping() {
        let rates = InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(2.0), dec!(18)),
            RateTierRow::new(dec!(3.0), dec!(40)),
        ])
        .unwrap();
        let calc = ShippingCalculator::from_settings(TierStrategyKind::Escalate, CapMode::Disabled);
        let r = calc.calculate(&request(dec!(2.0), "267"), &rates, &limits());
        assert!(r.is_viable);
        assert_eq!(r.displayed_shipping_amount, dec!(21.50));
        assert_eq!(r.item_price_adjustment, Decimal::ZERO);
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("escalated"));
    }

    #[test]
    fn rounded_copy_leaves_core_figures_exact() {
        let rates =
            InMemoryRateTable::from_rows(vec![RateTierRow::new(dec!(2.0), dec!(30))]).unwrap();
        let req = ShippingRequest {
            tariff_rate: dec!(0.0537),
            ..request(dec!(2.0), "1")
        };
        let r = calculate_shipping(&req, &rates, &limits());
        assert_eq!(r.total_cost_needed, dec!(21.685));
        assert_eq!(r.buyer_total(), dec!(21.685));

        let shown = r.rounded();
        assert_eq!(shown.total_cost_needed, dec!(21.69));
        assert_eq!(shown.displayed_shipping_amount, dec!(21.69));
        assert_eq!(shown.duty_breakdown.import_duty, dec!(2.69));
        assert_eq!(shown.duty_breakdown.sales_tax, dec!(4.00));
        assert_eq!(shown.warnings, r.warnings);
    }

    #[test]
    fn missing_tier_reports_duty_fee_only() {
        let rates = InMemoryRateTable::new();
        let r = calculate_shipping(&request(dec!(2.0), "267"), &rates, &limits());
        assert!(!r.is_viable);
        assert_eq!(r.reason_code, ReasonCode::NoTierForWeight);
        assert_eq!(r.total_cost_needed, dec!(21.50));
        assert_eq!(r.item_price_adjustment, Decimal::ZERO);
        assert!(r.base_tier_capacity.is_none());
    }

    #[test]
    fn batch_keeps_order_and_ids() {
        let rates =
            InMemoryRateTable::from_rows(vec![RateTierRow::new(dec!(2.0), dec!(30))]).unwrap();
        let items = vec![
            BatchItem {
                id: "a".into(),
                request: request(dec!(2.0), "1"),
            },
            BatchItem {
                id: "b".into(),
                request: request(dec!(9.0), "1"),
            },
        ];
        let out = ShippingCalculator::default().calculate_batch(&items, &rates, &limits());
        assert_eq!(out[0].id, "a");
        assert!(out[0].result.is_viable);
        assert_eq!(out[1].id, "b");
        assert_eq!(out[1].result.reason_code, ReasonCode::NoTierForWeight);
    }
}
