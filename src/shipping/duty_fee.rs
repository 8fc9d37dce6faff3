use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::DutyFeeBreakdown;

/// Per-unit financial facts for the DDP fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyFeeInputs {
    pub item_price: Decimal,
    /// Import duty as a fraction (0.05 = 5%)
    pub tariff_rate: Decimal,
    /// Destination sales tax as a fraction
    pub sales_tax_rate: Decimal,
    /// Flat per-shipment fee
    pub service_fee: Decimal,
}

impl DutyFeeInputs {
    pub fn compute(&self) -> Decimal {
        compute_ddp_fee(
            self.item_price,
            self.tariff_rate,
            self.sales_tax_rate,
            self.service_fee,
        )
    }

    pub fn breakdown(&self) -> DutyFeeBreakdown {
        DutyFeeBreakdown {
            import_duty: self.item_price * self.tariff_rate,
            sales_tax: self.item_price * self.sales_tax_rate,
            service_fee: self.service_fee,
        }
    }
}

/// DDP fee for one unit: duty and sales tax on the declared value only,
/// plus the flat service fee. Not rounded.
pub fn compute_ddp_fee(
    item_price: Decimal,
    tariff_rate: Decimal,
    sales_tax_rate: Decimal,
    service_fee: Decimal,
) -> Decimal {
    item_price * (tariff_rate + sales_tax_rate) + service_fee
}
