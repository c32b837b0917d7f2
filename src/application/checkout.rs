use super::cache::CheckoutCache;
use super::ledger::RetryLedger;
use crate::domain::catalog::{Instrument, MerchantPaymentConfig, PaymentMethod};
use crate::domain::checkout::{
    CheckoutRequest, CheckoutResponse, InstrumentDetails, PaymentMethodOption, derive_payment_id,
};
use crate::domain::ports::{
    DowntimeSignalRef, InstrumentDirectoryRef, MerchantConfigSourceRef, PaymentMethodCatalogRef,
};
use crate::domain::rules::{self, Ineligibility};
use crate::error::Result;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Builds the menu of payment options a user may choose from at checkout.
///
/// The first response computed for an idempotency key is the only one that
/// key ever returns.
pub struct CheckoutEngine {
    methods: PaymentMethodCatalogRef,
    instruments: InstrumentDirectoryRef,
    merchant_configs: MerchantConfigSourceRef,
    downtime: DowntimeSignalRef,
    ledger: RetryLedger,
    cache: CheckoutCache,
}

impl CheckoutEngine {
    pub fn new(
        methods: PaymentMethodCatalogRef,
        instruments: InstrumentDirectoryRef,
        merchant_configs: MerchantConfigSourceRef,
        downtime: DowntimeSignalRef,
        ledger: RetryLedger,
        cache: CheckoutCache,
    ) -> Self {
        Self {
            methods,
            instruments,
            merchant_configs,
            downtime,
            ledger,
            cache,
        }
    }

    pub async fn options(&self, request: &CheckoutRequest) -> Result<CheckoutResponse> {
        debug!(
            checkout_id = %request.checkout_id,
            idempotency_key = %request.idempotency_key,
            merchant_id = %request.merchant_id,
            user_id = %request.user_id,
            "Getting checkout options"
        );

        match self.cache.get(request.idempotency_key).await {
            Ok(Some(cached)) => {
                info!(
                    checkout_id = %request.checkout_id,
                    payment_id = %cached.payment_id,
                    "Returning cached checkout"
                );
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Checkout cache read failed, recomputing"),
        }

        let declined = match request.retry_payment_id {
            Some(payment_id) => {
                let declined = self.ledger.declined_instruments(payment_id).await?;
                debug!(%payment_id, declined = declined.len(), "Retry checkout");
                declined
            }
            None => BTreeSet::new(),
        };

        let payment_id = derive_payment_id(request.idempotency_key);
        let methods = self.methods.active_methods().await?;
        let instruments = self.instruments.instruments_for_user(request.user_id).await?;

        let mut payment_methods = Vec::with_capacity(methods.len());
        for method in &methods {
            payment_methods.push(
                self.method_option(request, method, &instruments, &declined)
                    .await?,
            );
        }

        let response = CheckoutResponse {
            payment_id,
            payment_methods,
        };

        let response = match self
            .cache
            .insert_once(request.idempotency_key, response.clone())
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Checkout cache write failed");
                response
            }
        };

        info!(
            checkout_id = %request.checkout_id,
            payment_id = %response.payment_id,
            methods = response.payment_methods.len(),
            "Checkout session created"
        );
        Ok(response)
    }

    async fn method_option(
        &self,
        request: &CheckoutRequest,
        method: &PaymentMethod,
        instruments: &[Instrument],
        declined: &BTreeSet<Uuid>,
    ) -> Result<PaymentMethodOption> {
        let amount = request.amount.value();
        let mcc = request.mcc.as_deref();
        let config = self
            .merchant_configs
            .config(request.merchant_id, &method.method_id)
            .await?;

        let method_reason = rules::evaluate(method, None, config.as_ref(), mcc, amount);

        let mut user_instruments = Vec::new();
        for instrument in instruments.iter().filter(|i| i.method_id == method.method_id) {
            let reason = match &method_reason {
                Some(reason) => Some(reason.clone()),
                None => self
                    .instrument_reason(request, method, instrument, config.as_ref(), declined)
                    .await?,
            };

            user_instruments.push(InstrumentDetails {
                instrument_id: instrument.instrument_id,
                method_id: method.method_id.clone(),
                masked_details: instrument.masked_details.clone(),
                network: instrument.network.clone(),
                issuer: instrument.issuer.clone(),
                r#type: method.method_id.clone(),
                eligible: reason.is_none(),
                ineligibility_reason: reason.map(|r| r.to_string()),
            });
        }

        let enabled = method_reason.is_none();
        Ok(PaymentMethodOption {
            method_id: method.method_id.clone(),
            method_name: method.method_name.clone(),
            supported_networks: method.supported_networks.clone(),
            enabled,
            reason_if_disabled: method_reason.map(|r| r.to_string()),
            allow_add_new: enabled,
            user_instruments,
        })
    }

    /// Instrument-level checks for an instrument whose method is eligible.
    async fn instrument_reason(
        &self,
        request: &CheckoutRequest,
        method: &PaymentMethod,
        instrument: &Instrument,
        config: Option<&MerchantPaymentConfig>,
        declined: &BTreeSet<Uuid>,
    ) -> Result<Option<Ineligibility>> {
        let amount = request.amount.value();
        if let Some(reason) =
            rules::evaluate(method, Some(instrument), config, request.mcc.as_deref(), amount)
        {
            return Ok(Some(reason));
        }
        if self
            .downtime
            .is_instrument_down(&method.method_id, instrument.issuer.as_deref())
            .await?
        {
            return Ok(Some(Ineligibility::InstrumentDown));
        }
        if declined.contains(&instrument.instrument_id) {
            return Ok(Some(Ineligibility::PreviouslyDeclined));
        }
        Ok(None)
    }
}
