//! Marketplace shipping caps per category
//!
//! Some marketplaces limit the shipping line item for certain categories.
//! Anything above the cap moves into the item price so the buyer's total is
//! unchanged: `displayed + adjustment == total_cost_needed`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::error::PricingError;
use crate::rate_table::CategoryLimitTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapMode {
    /// Clip shipping to the category limit and move the rest into the price
    #[default]
    TransferOverage,
    /// Ignore category limits
    Disabled,
}

impl FromStr for CapMode {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transfer_overage" | "transfer" => Ok(CapMode::TransferOverage),
            "disabled" | "off" | "none" => Ok(CapMode::Disabled),
            other => Err(PricingError::UnknownCapMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapOutcome {
    pub displayed_shipping_amount: Decimal,
    pub item_price_adjustment: Decimal,
    /// Limit that was applied, if the cap triggered
    pub applied_limit: Option<Decimal>,
    pub warning: Option<String>,
}

impl CapOutcome {
    fn uncapped(total_cost_needed: Decimal) -> Self {
        Self {
            displayed_shipping_amount: total_cost_needed,
            item_price_adjustment: Decimal::ZERO,
            applied_limit: None,
            warning: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryShippingCapEnforcer {
    mode: CapMode,
}

impl CategoryShippingCapEnforcer {
    pub fn new(mode: CapMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CapMode {
        self.mode
    }

    pub fn enforce(
        &self,
        total_cost_needed: Decimal,
        category_id: &str,
        limits: &dyn CategoryLimitTable,
    ) -> CapOutcome {
        if self.mode == CapMode::Disabled {
            return CapOutcome::uncapped(total_cost_needed);
        }

        // Tables not built through InMemoryCategoryLimits may carry negatives
        let limit = match limits.limit_for(category_id) {
            Some(limit) => limit.max(Decimal::ZERO),
            None => return CapOutcome::uncapped(total_cost_needed),
        };

        if total_cost_needed <= limit {
            return CapOutcome::uncapped(total_cost_needed);
        }

        let overage = total_cost_needed - limit;
        warn!(
            category_id,
            limit = %limit,
            total = %total_cost_needed,
            transferred = %overage,
            "Category shipping cap applied"
        );

        CapOutcome {
            displayed_shipping_amount: limit,
            item_price_adjustment: overage,
            applied_limit: Some(limit),
            warning: Some(format!(
                "Category {} caps displayed shipping at {}; transferred {} of shipping cost into the item price",
                category_id, limit, overage
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_table::InMemoryCategoryLimits;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn limits() -> InMemoryCategoryLimits {
        InMemoryCategoryLimits::from_pairs(vec![("267", dec!(20.00)), ("free", dec!(0))]).unwrap()
    }

    #[test]
    fn overage_moves_into_item_price() {
        let out = CategoryShippingCapEnforcer::default().enforce(dec!(27.40), "267", &limits());
        assert_eq!(out.displayed_shipping_amount, dec!(20.00));
        assert_eq!(out.item_price_adjustment, dec!(7.40));
        assert_eq!(
            out.displayed_shipping_amount + out.item_price_adjustment,
            dec!(27.40)
        );
        assert!(out.warning.unwrap().contains("267"));
    }

    #[test]
    fn at_or_below_limit_is_untouched() {
        let e = CategoryShippingCapEnforcer::default();
        let at = e.enforce(dec!(20.00), "267", &limits());
        assert_eq!(at.displayed_shipping_amount, dec!(20.00));
        assert_eq!(at.item_price_adjustment, Decimal::ZERO);
        assert!(at.warning.is_none());

        let uncapped = e.enforce(dec!(99), "other", &limits());
        assert_eq!(uncapped.displayed_shipping_amount, dec!(99));
        assert!(uncapped.applied_limit.is_none());
    }

    #[test]
    fn zero_limit_moves_everything() {
        let out = CategoryShippingCapEnforcer::default().enforce(dec!(12.5), "free", &limits());
        assert_eq!(out.displayed_shipping_amount, dec!(0));
        assert_eq!(out.item_price_adjustment, dec!(12.5));
    }

    #[test]
    fn disabled_mode_ignores_limits() {
        let out = CategoryShippingCapEnforcer::new(CapMode::Disabled).enforce(
            dec!(27.40),
            "267",
            &limits(),
        );
        assert_eq!(out.displayed_shipping_amount, dec!(27.40));
        assert_eq!(out.item_price_adjustment, Decimal::ZERO);
    }

    #[test]
    fn negative_limit_from_raw_map_clamps_to_zero() {
        let mut raw: HashMap<String, Decimal> = HashMap::new();
        raw.insert("267".to_string(), dec!(-5));
        let out = CategoryShippingCapEnforcer::default().enforce(dec!(27.40), "267", &raw);
        assert_eq!(out.displayed_shipping_amount, Decimal::ZERO);
        assert_eq!(out.item_price_adjustment, dec!(27.40));
        assert_eq!(out.applied_limit, Some(Decimal::ZERO));
    }

    #[test]
    fn parses_modes() {
        assert_eq!(
            "transfer_overage".parse::<CapMode>().unwrap(),
            CapMode::TransferOverage
        );
        assert_eq!("Disabled".parse::<CapMode>().unwrap(), CapMode::Disabled);
        assert!("clip".parse::<CapMode>().is_err());
    }
}
