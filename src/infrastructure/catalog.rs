use crate::domain::catalog::{Instrument, MerchantPaymentConfig, PaymentMethod};
use crate::domain::money::Amount;
use crate::domain::ports::{
    DowntimeSignal, InstrumentDirectory, MerchantConfigSource, PaymentMethodCatalog,
    PricingSource, VendorDirectory,
};
use crate::domain::vendor::{PricingModel, VendorHealth};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use uuid::Uuid;

/// An issuer whose instruments of one method are currently failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeEntry {
    pub method_id: String,
    pub issuer: String,
}

/// Read-only reference data for methods, instruments, merchant configs,
/// vendor health and pricing, typically loaded from a JSON fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub methods: Vec<PaymentMethod>,
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub merchant_configs: Vec<MerchantPaymentConfig>,
    #[serde(default)]
    pub vendors: Vec<VendorHealth>,
    #[serde(default)]
    pub pricing: Vec<PricingModel>,
    #[serde(default)]
    pub downtime: Vec<DowntimeEntry>,
}

impl StaticCatalog {
    /// Reads a catalog from any JSON source.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    pub fn instrument(&self, instrument_id: Uuid) -> Option<&Instrument> {
        self.instruments
            .iter()
            .find(|i| i.instrument_id == instrument_id)
    }
}

#[async_trait]
impl PaymentMethodCatalog for StaticCatalog {
    async fn active_methods(&self) -> Result<Vec<PaymentMethod>> {
        Ok(self.methods.iter().filter(|m| m.active).cloned().collect())
    }
}

#[async_trait]
impl InstrumentDirectory for StaticCatalog {
    async fn instruments_for_user(&self, user_id: Uuid) -> Result<Vec<Instrument>> {
        Ok(self
            .instruments
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MerchantConfigSource for StaticCatalog {
    async fn config(
        &self,
        merchant_id: Uuid,
        method_id: &str,
    ) -> Result<Option<MerchantPaymentConfig>> {
        Ok(self
            .merchant_configs
            .iter()
            .find(|c| c.merchant_id == merchant_id && c.method_id == method_id)
            .cloned())
    }
}

#[async_trait]
impl DowntimeSignal for StaticCatalog {
    async fn is_instrument_down(&self, method_id: &str, issuer: Option<&str>) -> Result<bool> {
        let Some(issuer) = issuer else {
            return Ok(false);
        };
        Ok(self.downtime.iter().any(|d| {
            d.method_id.eq_ignore_ascii_case(method_id) && d.issuer.eq_ignore_ascii_case(issuer)
        }))
    }
}

#[async_trait]
impl VendorDirectory for StaticCatalog {
    async fn available_vendors(&self) -> Result<Vec<VendorHealth>> {
        Ok(self.vendors.iter().filter(|v| !v.down).cloned().collect())
    }
}

#[async_trait]
impl PricingSource for StaticCatalog {
    async fn fee(&self, vendor_id: &str, amount: Amount) -> Result<Option<Decimal>> {
        let amount = amount.value();
        Ok(self
            .pricing
            .iter()
            .find(|m| m.vendor_id == vendor_id && m.applies_to(amount))
            .and_then(|m| m.fee(amount)))
    }
}
