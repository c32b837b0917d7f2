use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Health facts about a settlement vendor, refreshed outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorHealth {
    pub vendor_id: String,
    /// 0.0 to 100.0, higher is better.
    pub uptime_score: f64,
    /// Lower is better.
    pub error_rate: f64,
    #[serde(default)]
    pub down: bool,
}

/// A fee schedule for one vendor over an inclusive amount bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingModel {
    pub vendor_id: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub fee_percent: Decimal,
    pub fixed_fee: Decimal,
}

impl PricingModel {
    pub fn applies_to(&self, amount: Decimal) -> bool {
        self.min_amount <= amount && amount <= self.max_amount
    }

    /// `None` when the fee does not fit a `Decimal`; callers rank that vendor
    /// as unpriced.
    pub fn fee(&self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.fee_percent)?
            .checked_div(Decimal::ONE_HUNDRED)?
            .checked_add(self.fixed_fee)
    }
}
