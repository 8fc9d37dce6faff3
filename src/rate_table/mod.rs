//! Read-only reference tables consumed by the pricing engine
//!
//! The engine never fetches data itself; callers hand it a snapshot through
//! these traits. Both in-memory implementations are immutable once built.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use tracing::warn;

use crate::error::{PricingError, Result};
use crate::types::RateTierRow;

/// Carrier rate card lookup
pub trait RateTable: Send + Sync {
    /// Row keyed exactly by `weight_kg`
    fn lookup_by_weight(&self, weight_kg: Decimal) -> Option<RateTierRow>;

    /// Lightest row with `weight_kg > min_weight_kg` and
    /// `capacity_amount >= min_capacity`
    fn find_heavier_with_capacity(
        &self,
        min_weight_kg: Decimal,
        min_capacity: Decimal,
    ) -> Option<RateTierRow>;
}

/// Marketplace shipping ceilings per category
pub trait CategoryLimitTable: Send + Sync {
    /// Max displayable shipping for the category, `None` = uncapped
    fn limit_for(&self, category_id: &str) -> Option<Decimal>;
}

/// Rate card held in weight order
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateTable {
    rows: BTreeMap<Decimal, RateTierRow>,
}

impl InMemoryRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows, rejecting duplicate weight keys and negative amounts
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = RateTierRow>,
    {
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        table.warn_if_not_monotonic();
        Ok(table)
    }

    pub fn insert(&mut self, row: RateTierRow) -> Result<()> {
        if row.weight_kg <= Decimal::ZERO {
            return Err(PricingError::InvalidRateRow {
                weight_kg: row.weight_kg,
                reason: "weight must be positive".to_string(),
            });
        }
        if row.capacity_amount.is_sign_negative() || row.base_charge.is_sign_negative() {
            return Err(PricingError::InvalidRateRow {
                weight_kg: row.weight_kg,
                reason: "capacity and base charge must not be negative".to_string(),
            });
        }
        if self.rows.contains_key(&row.weight_kg) {
            return Err(PricingError::InvalidRateRow {
                weight_kg: row.weight_kg,
                reason: "duplicate weight key".to_string(),
            });
        }
        self.rows.insert(row.weight_kg, row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending weight order
    pub fn rows(&self) -> impl Iterator<Item = &RateTierRow> {
        self.rows.values()
    }

    /// True when capacity never drops as weight grows
    pub fn is_monotonic(&self) -> bool {
        self.rows()
            .zip(self.rows().skip(1))
            .all(|(lighter, heavier)| heavier.capacity_amount >= lighter.capacity_amount)
    }

    fn warn_if_not_monotonic(&self) {
        if !self.is_monotonic() {
            warn!(
                tiers = self.rows.len(),
                "Rate table capacity drops as weight grows; escalation may skip the cheapest tier"
            );
        }
    }
}

impl RateTable for InMemoryRateTable {
    fn lookup_by_weight(&self, weight_kg: Decimal) -> Option<RateTierRow> {
        self.rows.get(&weight_kg).copied()
    }

    fn find_heavier_with_capacity(
        &self,
        min_weight_kg: Decimal,
        min_capacity: Decimal,
    ) -> Option<RateTierRow> {
        // Ascending weight order, so the first hit is the lightest qualifying band.
        self.rows
            .range((Bound::Excluded(min_weight_kg), Bound::Unbounded))
            .map(|(_, row)| *row)
            .find(|row| row.capacity_amount >= min_capacity)
    }
}

/// Sparse category -> shipping ceiling map
#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryLimits {
    limits: HashMap<String, Decimal>,
}

impl InMemoryCategoryLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category_id: impl Into<String>, max_shipping: Decimal) -> Result<()> {
        let category_id = category_id.into();
        if max_shipping.is_sign_negative() {
            return Err(PricingError::InvalidCategoryLimit {
                category_id,
                reason: format!("limit {} is negative", max_shipping),
            });
        }
        self.limits.insert(category_id, max_shipping);
        Ok(())
    }

    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<String>,
    {
        let mut table = Self::new();
        for (category_id, max_shipping) in pairs {
            table.insert(category_id, max_shipping)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

impl CategoryLimitTable for InMemoryCategoryLimits {
    fn limit_for(&self, category_id: &str) -> Option<Decimal> {
        self.limits.get(category_id).copied()
    }
}

impl CategoryLimitTable for HashMap<String, Decimal> {
    fn limit_for(&self, category_id: &str) -> Option<Decimal> {
        self.get(category_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> InMemoryRateTable {
        InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(1.0), dec!(12)),
            RateTierRow::new(dec!(2.0), dec!(18)),
            RateTierRow::new(dec!(2.5), dec!(20)),
            RateTierRow::new(dec!(3.0), dec!(40)),
            RateTierRow::new(dec!(4.0), dec!(55)),
        ])
        .unwrap()
    }

    #[test]
    fn lookup_matches_numerically_equal_keys() {
        let t = table();
        assert_eq!(t.lookup_by_weight(dec!(2)).unwrap().capacity_amount, dec!(18));
        assert_eq!(t.lookup_by_weight(dec!(2.00)).unwrap().capacity_amount, dec!(18));
        assert!(t.lookup_by_weight(dec!(2.1)).is_none());
    }

    #[test]
    fn heavier_search_skips_insufficient_and_equal_weight() {
        let t = table();
        let row = t.find_heavier_with_capacity(dec!(2.0), dec!(21.5)).unwrap();
        assert_eq!(row.weight_kg, dec!(3.0));

        // Strictly heavier: the 2.0kg row itself never qualifies
        let row = t.find_heavier_with_capacity(dec!(2.0), dec!(10)).unwrap();
        assert_eq!(row.weight_kg, dec!(2.5));

        assert!(t.find_heavier_with_capacity(dec!(2.0), dec!(100)).is_none());
    }

    #[test]
    fn rejects_duplicates_and_negative_capacity() {
        let dup = InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(1.0), dec!(12)),
            RateTierRow::new(dec!(1.00), dec!(13)),
        ]);
        assert!(matches!(dup, Err(PricingError::InvalidRateRow { .. })));

        let neg = InMemoryRateTable::from_rows(vec![RateTierRow::new(dec!(1.0), dec!(-1))]);
        assert!(neg.is_err());
    }

    #[test]
    fn monotonic_check() {
        assert!(table().is_monotonic());
        let bumpy = InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(1.0), dec!(20)),
            RateTierRow::new(dec!(2.0), dec!(15)),
        ])
        .unwrap();
        assert!(!bumpy.is_monotonic());
    }

    #[test]
    fn non_monotonic_table_still_loads() {
        let t = InMemoryRateTable::from_rows(vec![
            RateTierRow::new(dec!(1.0), dec!(20)),
            RateTierRow::new(dec!(2.0), dec!(15)),
            RateTierRow::new(dec!(3.0), dec!(50)),
        ])
        .unwrap();
        assert!(!t.is_monotonic());
        assert_eq!(t.len(), 3);
        let weights: Vec<Decimal> = t.rows().map(|r| r.weight_kg).collect();
        assert_eq!(weights, vec![dec!(1.0), dec!(2.0), dec!(3.0)]);
        // The dip at 2.0kg is skipped, not treated as the end of the card
        let row = t.find_heavier_with_capacity(dec!(1.0), dec!(18)).unwrap();
        assert_eq!(row.weight_kg, dec!(3.0));
    }

    #[test]
    fn category_limits_absent_means_uncapped() {
        let limits = InMemoryCategoryLimits::from_pairs(vec![("267", dec!(20))]).unwrap();
        assert_eq!(limits.limit_for("267"), Some(dec!(20)));
        assert_eq!(limits.limit_for("999"), None);
        assert!(InMemoryCategoryLimits::new().insert("1", dec!(-5)).is_err());
    }
}
