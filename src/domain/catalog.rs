use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A globally available payment method such as `CREDIT_CARD` or `UPI`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub method_id: String,
    pub method_name: String,
    #[serde(default)]
    pub supported_networks: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstrumentStatus {
    #[default]
    Active,
    Blocked,
}

/// A saved instrument (card, VPA, ...) belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_id: Uuid,
    pub user_id: Uuid,
    pub method_id: String,
    /// Display form, e.g. `**** 1234`.
    pub masked_details: String,
    pub network: Option<String>,
    pub issuer: Option<String>,
    #[serde(default)]
    pub status: InstrumentStatus,
}

/// Per-merchant settings for one payment method.
///
/// A missing config for a `(merchant, method)` pair means the method is
/// disabled for that merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantPaymentConfig {
    pub merchant_id: Uuid,
    pub method_id: String,
    /// Empty means the merchant accepts any network.
    #[serde(default)]
    pub supported_networks: BTreeSet<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    #[serde(default = "default_active")]
    pub enabled: bool,
}

impl MerchantPaymentConfig {
    pub fn accepts_network(&self, network: Option<&str>) -> bool {
        if self.supported_networks.is_empty() {
            return true;
        }
        network.is_some_and(|n| self.supported_networks.contains(n))
    }
}
