//! Rate card and category limit loading
//!
//! Tables are read once into immutable in-memory snapshots:
//! - rate card CSV: `weight_kg,capacity_amount[,base_charge]`
//! - category limits CSV: `category_id,max_shipping`, or a YAML map of the same

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::rate_table::{InMemoryCategoryLimits, InMemoryRateTable};
use crate::types::RateTierRow;

/// Rate card CSV record. Amounts are parsed from their text so no binary
/// float ever touches them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTierRecord {
    #[serde(with = "rust_decimal::serde::str")]
    pub weight_kg: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub capacity_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub base_charge: Option<Decimal>,
}

impl From<RateTierRecord> for RateTierRow {
    fn from(record: RateTierRecord) -> Self {
        RateTierRow::new(record.weight_kg, record.capacity_amount)
            .with_base_charge(record.base_charge.unwrap_or_default())
    }
}

/// Category limit CSV record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLimitRecord {
    pub category_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_shipping: Decimal,
}

/// Load a carrier rate card from CSV
pub fn load_rate_table(path: impl AsRef<Path>) -> Result<InMemoryRateTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open rate table {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let record: RateTierRecord = result.context("Failed to deserialize rate tier record")?;
        rows.push(RateTierRow::from(record));
    }

    let table = InMemoryRateTable::from_rows(rows)
        .with_context(|| format!("Invalid rate table {}", path.display()))?;
    info!(path = %path.display(), tiers = table.len(), "Rate table loaded");
    Ok(table)
}

/// Load category shipping limits from CSV or YAML (by extension)
pub fn load_category_limits(path: impl AsRef<Path>) -> Result<InMemoryCategoryLimits> {
    let path = path.as_ref();
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let parsed = if is_yaml {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read category limits {}", path.display()))?;
        let map: BTreeMap<String, Decimal> =
            serde_yaml::from_str(&text).context("Failed to parse category limits YAML")?;
        InMemoryCategoryLimits::from_pairs(map)
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open category limits {}", path.display()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut pairs = Vec::new();
        for result in reader.deserialize() {
            let record: CategoryLimitRecord =
                result.context("Failed to deserialize category limit record")?;
            pairs.push((record.category_id, record.max_shipping));
        }
        InMemoryCategoryLimits::from_pairs(pairs)
    };
    let limits =
        parsed.with_context(|| format!("Invalid category limits {}", path.display()))?;

    info!(path = %path.display(), categories = limits.len(), "Category limits loaded");
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_table::{CategoryLimitTable, RateTable};
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_rate_table_with_optional_base_charge() {
        let f = write_temp(
            ".csv",
            "weight_kg,capacity_amount,base_charge\n0.25,12.50,4.10\n0.5,14,\n",
        );
        let table = load_rate_table(f.path()).unwrap();
        assert_eq!(table.len(), 2);
        let row = table.lookup_by_weight(dec!(0.25)).unwrap();
        assert_eq!(row.capacity_amount, dec!(12.50));
        assert_eq!(row.base_charge, dec!(4.10));
    }

    #[test]
    fn rate_table_without_base_column() {
        let f = write_temp(".csv", "weight_kg,capacity_amount\n2.0,30\n");
        let table = load_rate_table(f.path()).unwrap();
        assert_eq!(table.lookup_by_weight(dec!(2)).unwrap().base_charge, Decimal::ZERO);
    }

    #[test]
    fn duplicate_rate_rows_fail() {
        let f = write_temp(".csv", "weight_kg,capacity_amount\n2.0,30\n2,31\n");
        assert!(load_rate_table(f.path()).is_err());
    }

    #[test]
    fn loads_limits_from_csv_and_yaml() {
        let csv = write_temp(".csv", "category_id,max_shipping\n267,20.00\n617,15\n");
        let limits = load_category_limits(csv.path()).unwrap();
        assert_eq!(limits.limit_for("267"), Some(dec!(20.00)));
        assert_eq!(limits.limit_for("617"), Some(dec!(15)));

        let yaml = write_temp(".yaml", "\"267\": \"20.00\"\n\"1249\": \"30\"\n");
        let limits = load_category_limits(yaml.path()).unwrap();
        assert_eq!(limits.limit_for("1249"), Some(dec!(30)));
        assert_eq!(limits.len(), 2);
    }
}
