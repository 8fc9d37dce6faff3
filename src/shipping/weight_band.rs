//! Weight band convention and chargeable weight
//!
//! Rate cards are keyed by discrete band limits, not by arbitrary weights.
//! These helpers turn a physical parcel into a tier key before pricing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// cm³ per kg for volumetric weight
pub const VOLUMETRIC_DIVISOR_CM: Decimal = dec!(5000);

/// One stretch of the band convention: keys every `step_kg` up to `up_to_kg`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSegment {
    pub up_to_kg: Decimal,
    pub step_kg: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightBandConvention {
    /// Segments in ascending `up_to_kg` order
    segments: Vec<BandSegment>,
}

impl Default for WeightBandConvention {
    /// 0.25 kg bands to 10 kg, then 0.5 kg bands to 20 kg
    fn default() -> Self {
        Self {
            segments: vec![
                BandSegment {
                    up_to_kg: dec!(10),
                    step_kg: dec!(0.25),
                },
                BandSegment {
                    up_to_kg: dec!(20),
                    step_kg: dec!(0.5),
                },
            ],
        }
    }
}

impl WeightBandConvention {
    /// Segments with a non-positive step or out of order are dropped
    pub fn new(segments: Vec<BandSegment>) -> Self {
        let mut kept: Vec<BandSegment> = Vec::with_capacity(segments.len());
        for seg in segments {
            let floor = kept.last().map(|s| s.up_to_kg).unwrap_or(Decimal::ZERO);
            if seg.step_kg > Decimal::ZERO && seg.up_to_kg > floor {
                kept.push(seg);
            }
        }
        Self { segments: kept }
    }

    pub fn max_weight_kg(&self) -> Option<Decimal> {
        self.segments.last().map(|s| s.up_to_kg)
    }

    /// Every tier key in ascending order. A segment always ends on its
    /// `up_to_kg` key, even when the step does not divide it evenly.
    pub fn tier_keys(&self) -> Vec<Decimal> {
        let mut keys = Vec::new();
        let mut floor = Decimal::ZERO;
        for seg in &self.segments {
            let mut key = floor + seg.step_kg;
            while key < seg.up_to_kg {
                keys.push(key);
                key += seg.step_kg;
            }
            keys.push(seg.up_to_kg);
            floor = seg.up_to_kg;
        }
        keys
    }

    /// Smallest tier key >= `weight_kg`; `None` for non-positive weights or
    /// weights beyond the last band
    pub fn snap_to_tier_key(&self, weight_kg: Decimal) -> Option<Decimal> {
        if weight_kg <= Decimal::ZERO {
            return None;
        }
        let mut floor = Decimal::ZERO;
        for seg in &self.segments {
            if weight_kg <= seg.up_to_kg {
                let steps = ((weight_kg - floor) / seg.step_kg).ceil();
                let key = floor + steps * seg.step_kg;
                // Uneven steps close on the segment limit, as in tier_keys
                return Some(key.min(seg.up_to_kg));
            }
            floor = seg.up_to_kg;
        }
        None
    }
}

/// How a carrier combines actual and volumetric weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeableWeightRule {
    /// Courier convention: the larger of the two
    #[default]
    GreaterOfBoth,
    /// Postal convention: volumetric only once it exceeds twice the actual weight
    VolumetricAboveDouble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelDimensions {
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
}

impl ParcelDimensions {
    pub fn volumetric_weight_kg(&self) -> Decimal {
        self.length_cm * self.width_cm * self.height_cm / VOLUMETRIC_DIVISOR_CM
    }
}

pub fn chargeable_weight_kg(
    actual_weight_kg: Decimal,
    dimensions: Option<&ParcelDimensions>,
    rule: ChargeableWeightRule,
) -> Decimal {
    let volumetric = match dimensions {
        Some(d) => d.volumetric_weight_kg(),
        None => return actual_weight_kg,
    };
    match rule {
        ChargeableWeightRule::GreaterOfBoth => actual_weight_kg.max(volumetric),
        ChargeableWeightRule::VolumetricAboveDouble => {
            if volumetric > actual_weight_kg * dec!(2) {
                volumetric
            } else {
                actual_weight_kg
            }
        }
    }
}
