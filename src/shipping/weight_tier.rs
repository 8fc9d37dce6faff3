//! Weight tier resolution
//!
//! Picks the rate band that bills the parcel. The parcel's own band is used
//! whenever its capacity covers the required cost; what happens otherwise is
//! a commercial policy, so it lives behind [`TierSelectionStrategy`].

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::PricingError;
use crate::rate_table::RateTable;
use crate::types::{RateTierRow, ReasonCode};

/// What to do when the parcel's own band is too small for the required cost
pub trait TierSelectionStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Replacement band for `base`, or `None` if the request cannot be served
    fn select_when_short(
        &self,
        base: &RateTierRow,
        required_cost: Decimal,
        table: &dyn RateTable,
    ) -> Option<RateTierRow>;
}

/// Buy the lightest heavier band whose capacity covers the cost
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalateToHeavierTier;

impl TierSelectionStrategy for EscalateToHeavierTier {
    fn name(&self) -> &'static str {
        "escalate"
    }

    fn select_when_short(
        &self,
        base: &RateTierRow,
        required_cost: Decimal,
        table: &dyn RateTable,
    ) -> Option<RateTierRow> {
        table.find_heavier_with_capacity(base.weight_kg, required_cost)
    }
}

/// Never bill above the parcel's own band
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTierOnly;

impl TierSelectionStrategy for ExactTierOnly {
    fn name(&self) -> &'static str {
        "exact_only"
    }

    fn select_when_short(
        &self,
        _base: &RateTierRow,
        _required_cost: Decimal,
        _table: &dyn RateTable,
    ) -> Option<RateTierRow> {
        None
    }
}

/// Config-level name of a tier strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierStrategyKind {
    #[default]
    Escalate,
    ExactOnly,
}

impl TierStrategyKind {
    pub fn build(self) -> Box<dyn TierSelectionStrategy> {
        match self {
            TierStrategyKind::Escalate => Box::new(EscalateToHeavierTier),
            TierStrategyKind::ExactOnly => Box::new(ExactTierOnly),
        }
    }
}

impl FromStr for TierStrategyKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "escalate" | "escalate_to_heavier_tier" => Ok(TierStrategyKind::Escalate),
            "exact_only" | "exact" => Ok(TierStrategyKind::ExactOnly),
            other => Err(PricingError::UnknownTierStrategy(other.to_string())),
        }
    }
}

/// Outcome of resolving one weight against the rate card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierResolution {
    /// Band keyed by the actual weight
    pub base_tier: Option<RateTierRow>,
    /// Band that bills the shipment
    pub selected_tier: Option<RateTierRow>,
    pub used_escalated_tier: bool,
    pub is_viable: bool,
    pub reason_code: ReasonCode,
    pub warning: Option<String>,
}

#[derive(Debug)]
pub struct WeightTierResolver {
    strategy: Box<dyn TierSelectionStrategy>,
}

impl Default for WeightTierResolver {
    fn default() -> Self {
        Self::new(Box::new(EscalateToHeavierTier))
    }
}

impl WeightTierResolver {
    pub fn new(strategy: Box<dyn TierSelectionStrategy>) -> Self {
        Self { strategy }
    }

    pub fn from_kind(kind: TierStrategyKind) -> Self {
        Self::new(kind.build())
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn resolve(
        &self,
        actual_weight_kg: Decimal,
        required_cost: Decimal,
        table: &dyn RateTable,
    ) -> TierResolution {
        match table.lookup_by_weight(actual_weight_kg) {
            Some(base) => self.resolve_from_base(actual_weight_kg, base, required_cost, table),
            None => TierResolution {
                base_tier: None,
                selected_tier: None,
                used_escalated_tier: false,
                is_viable: false,
                reason_code: ReasonCode::NoTierForWeight,
                warning: None,
            },
        }
    }

    /// Resolution once the actual-weight band is known
    pub fn resolve_from_base(
        &self,
        actual_weight_kg: Decimal,
        base: RateTierRow,
        required_cost: Decimal,
        table: &dyn RateTable,
    ) -> TierResolution {
        if base.covers(required_cost) {
            debug!(
                weight_kg = %actual_weight_kg,
                capacity = %base.capacity_amount,
                required = %required_cost,
                "Base tier covers required cost"
            );
            return TierResolution {
                base_tier: Some(base),
                selected_tier: Some(base),
                used_escalated_tier: false,
                is_viable: true,
                reason_code: ReasonCode::WithinBaseTier,
                warning: None,
            };
        }

        match self.strategy.select_when_short(&base, required_cost, table) {
            Some(chosen) => {
                let message = format!(
                    "Tier escalated from {}kg to {}kg: total cost {} exceeds {}kg capacity {} (billed band is heavier than the parcel)",
                    actual_weight_kg,
                    chosen.weight_kg,
                    required_cost,
                    actual_weight_kg,
                    base.capacity_amount
                );
                warn!(
                    strategy = self.strategy.name(),
                    from_kg = %actual_weight_kg,
                    to_kg = %chosen.weight_kg,
                    required = %required_cost,
                    "Tier escalation"
                );
                TierResolution {
                    base_tier: Some(base),
                    selected_tier: Some(chosen),
                    used_escalated_tier: true,
                    is_viable: true,
                    reason_code: ReasonCode::EscalatedTier,
                    warning: Some(message),
                }
            }
            None => {
                warn!(
                    strategy = self.strategy.name(),
                    weight_kg = %actual_weight_kg,
                    required = %required_cost,
                    "No tier can absorb the required cost"
                );
                TierResolution {
                    base_tier: Some(base),
                    selected_tier: None,
                    used_escalated_tier: false,
                    is_viable: false,
                    reason_code: ReasonCode::NoQualifyingTier,
                    warning: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_table::InMemoryRateTable;
    use rust_decimal_macros::dec;

    fn table() -> InMemoryRateTable {
        InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(2.0), dec!(18)),
            RateTierRow::new(dec!(2.5), dec!(20)),
            RateTierRow::new(dec!(3.0), dec!(40)),
            RateTierRow::new(dec!(3.5), dec!(45)),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_base_tier_when_it_covers() {
        let r = WeightTierResolver::default().resolve(dec!(3.0), dec!(21.50), &table());
        assert!(r.is_viable);
        assert!(!r.used_escalated_tier);
        assert_eq!(r.selected_tier.unwrap().weight_kg, dec!(3.0));
        assert_eq!(r.reason_code, ReasonCode::WithinBaseTier);
        assert!(r.warning.is_none());
    }

    #[test]
    fn escalates_to_lightest_sufficient_tier() {
        let r = WeightTierResolver::default().resolve(dec!(2.0), dec!(21.50), &table());
        assert!(r.is_viable);
        assert!(r.used_escalated_tier);
        assert_eq!(r.selected_tier.unwrap().weight_kg, dec!(3.0));
        let warning = r.warning.unwrap();
        assert!(warning.contains("2.0kg"));
        assert!(warning.contains("3.0kg"));
    }

    #[test]
    fn exact_only_rejects_instead_of_escalating() {
        let resolver = WeightTierResolver::from_kind(TierStrategyKind::ExactOnly);
        let r = resolver.resolve(dec!(2.0), dec!(21.50), &table());
        assert!(!r.is_viable);
        assert_eq!(r.reason_code, ReasonCode::NoQualifyingTier);
        assert_eq!(r.base_tier.unwrap().capacity_amount, dec!(18));
    }

    #[test]
    fn missing_weight_key() {
        let r = WeightTierResolver::default().resolve(dec!(2.2), dec!(1), &table());
        assert!(!r.is_viable);
        assert_eq!(r.reason_code, ReasonCode::NoTierForWeight);
        assert!(r.base_tier.is_none());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!(
            "escalate".parse::<TierStrategyKind>().unwrap(),
            TierStrategyKind::Escalate
        );
        assert_eq!(
            " EXACT_ONLY ".parse::<TierStrategyKind>().unwrap(),
            TierStrategyKind::ExactOnly
        );
        assert!(matches!(
            "cheapest".parse::<TierStrategyKind>(),
            Err(PricingError::UnknownTierStrategy(_))
        ));
    }
}
