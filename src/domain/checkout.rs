use super::money::Amount;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for payment ids derived from checkout idempotency keys.
///
/// Changing this value changes every derived payment id.
pub const PAYMENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6a0f_3c52_9d1e_4b7a_8c2f_51e4_d3a9_b710);

/// Derives the payment id that links a checkout session to its payments.
///
/// Name-based (version 5) so the same idempotency key yields the same id in
/// every process, on every run.
pub fn derive_payment_id(idempotency_key: Uuid) -> Uuid {
    Uuid::new_v5(&PAYMENT_ID_NAMESPACE, idempotency_key.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub checkout_id: Uuid,
    pub idempotency_key: Uuid,
    pub merchant_id: Uuid,
    pub user_id: Uuid,
    pub amount: Amount,
    pub mcc: Option<String>,
    /// Set when the client is re-running checkout after a failed payment.
    pub retry_payment_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentDetails {
    pub instrument_id: Uuid,
    pub method_id: String,
    pub masked_details: String,
    pub network: Option<String>,
    pub issuer: Option<String>,
    pub r#type: String,
    pub eligible: bool,
    pub ineligibility_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodOption {
    pub method_id: String,
    pub method_name: String,
    pub supported_networks: Vec<String>,
    pub enabled: bool,
    pub reason_if_disabled: Option<String>,
    pub allow_add_new: bool,
    pub user_instruments: Vec<InstrumentDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub payment_id: Uuid,
    pub payment_methods: Vec<PaymentMethodOption>,
}

impl CheckoutResponse {
    pub fn eligible_instruments(&self) -> impl Iterator<Item = &InstrumentDetails> {
        self.payment_methods
            .iter()
            .flat_map(|m| m.user_instruments.iter())
            .filter(|i| i.eligible)
    }
}
