//! Configuration management
//!
//! Loads from YAML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::shipping::{
    CapMode, MultiUnitInputs, MultiUnitPolicyAdvisor, ShippingCalculator, TierStrategyKind,
};

/// Main pricing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub policy: PolicyConfig,
    pub tiers: TierConfig,
    pub category_cap: CategoryCapConfig,
    pub multi_unit: MultiUnitConfig,
    pub data: DataConfig,
}

impl PricingConfig {
    /// Builder pre-populated with every default. Decimals are given as
    /// strings so they deserialize exactly.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Policy defaults
            .set_default("policy.sales_tax_rate", "0.08")?
            .set_default("policy.service_fee", "15")?
            // Tier defaults
            .set_default("tiers.strategy", "escalate")?
            // Category cap defaults
            .set_default("category_cap.mode", "transfer_overage")?
            // Multi-unit defaults
            .set_default("multi_unit.profit_delta_threshold", "5")?
            .set_default("multi_unit.item_cost_ratio", "0.5")?
            .set_default("multi_unit.marketplace_fee_rate", "0.13")?
            .set_default("multi_unit.handling_fee", "0")?
            // Data defaults
            .set_default("data.rate_table_path", "./data/rate_table.csv")?
            .set_default("data.category_limits_path", "./data/category_limits.csv")?;
        Ok(builder)
    }

    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (LANDED_COST__*)
            .add_source(Environment::with_prefix("LANDED_COST").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let pricing_config: PricingConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        pricing_config.validate()?;

        Ok(pricing_config)
    }

    /// Reject rates outside [0, 1] and unknown strategy names
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("policy.sales_tax_rate", self.policy.sales_tax_rate),
            ("multi_unit.marketplace_fee_rate", self.multi_unit.marketplace_fee_rate),
        ];
        for (key, value) in fractions {
            if value < Decimal::ZERO || value > Decimal::ONE {
                bail!("{} must be between 0 and 1, got {}", key, value);
            }
        }
        if self.policy.service_fee.is_sign_negative() {
            bail!("policy.service_fee must not be negative");
        }
        if self.multi_unit.item_cost_ratio.is_sign_negative() {
            bail!("multi_unit.item_cost_ratio must not be negative");
        }
        self.tier_strategy()?;
        self.cap_mode()?;
        Ok(())
    }

    pub fn tier_strategy(&self) -> Result<TierStrategyKind> {
        Ok(self.tiers.strategy.parse::<TierStrategyKind>()?)
    }

    pub fn cap_mode(&self) -> Result<CapMode> {
        Ok(self.category_cap.mode.parse::<CapMode>()?)
    }

    /// Pipeline wired with the configured strategies
    pub fn shipping_calculator(&self) -> Result<ShippingCalculator> {
        Ok(ShippingCalculator::from_settings(
            self.tier_strategy()?,
            self.cap_mode()?,
        ))
    }

    pub fn advisor(&self) -> MultiUnitPolicyAdvisor {
        MultiUnitPolicyAdvisor::new(self.multi_unit.profit_delta_threshold)
    }

    /// Advisor inputs with the configured fee, handling and cost ratio filled in
    pub fn multi_unit_inputs(
        &self,
        base_shipping_unit: Decimal,
        incremental_shipping_unit: Decimal,
        item_price_unit: Decimal,
        tariff_rate: Decimal,
    ) -> MultiUnitInputs {
        MultiUnitInputs {
            base_shipping_unit,
            incremental_shipping_unit,
            handling_fee_unit: self.multi_unit.handling_fee,
            item_price_unit,
            tariff_rate,
            marketplace_fee_rate: self.multi_unit.marketplace_fee_rate,
            item_cost_ratio: self.multi_unit.item_cost_ratio,
        }
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "sales_tax={} service_fee={} tiers={} cap={} delta_threshold={} item_cost_ratio={}",
            self.policy.sales_tax_rate,
            self.policy.service_fee,
            self.tiers.strategy,
            self.category_cap.mode,
            self.multi_unit.profit_delta_threshold,
            self.multi_unit.item_cost_ratio
        )
    }
}

impl std::fmt::Display for PricingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
