use super::cache::{CheckoutCache, PaymentCache};
use super::checkout::CheckoutEngine;
use super::ledger::RetryLedger;
use super::orchestrator::PaymentOrchestrator;
use crate::config::GatewayConfig;
use crate::domain::checkout::{CheckoutRequest, CheckoutResponse};
use crate::domain::ports::{
    DowntimeSignalRef, InstrumentDirectoryRef, KeyValueStoreRef, MerchantConfigSourceRef,
    PaymentMethodCatalogRef, PricingSourceRef, TransactionStoreRef, VendorDirectoryRef,
    VendorGatewayRef,
};
use crate::domain::transaction::{PaymentRequest, PaymentResponse, PaymentStatusResponse};
use crate::error::Result;
use crate::infrastructure::catalog::StaticCatalog;
use std::sync::Arc;
use uuid::Uuid;

/// Everything the gateway talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub methods: PaymentMethodCatalogRef,
    pub instruments: InstrumentDirectoryRef,
    pub merchant_configs: MerchantConfigSourceRef,
    pub downtime: DowntimeSignalRef,
    pub vendors: VendorDirectoryRef,
    pub pricing: PricingSourceRef,
    pub vendor_gateway: VendorGatewayRef,
    pub transactions: TransactionStoreRef,
    pub kv: KeyValueStoreRef,
}

impl Collaborators {
    /// Serves every catalog-style port from one static catalog.
    pub fn from_catalog(
        catalog: Arc<StaticCatalog>,
        vendor_gateway: VendorGatewayRef,
        transactions: TransactionStoreRef,
        kv: KeyValueStoreRef,
    ) -> Self {
        Self {
            methods: catalog.clone(),
            instruments: catalog.clone(),
            merchant_configs: catalog.clone(),
            downtime: catalog.clone(),
            vendors: catalog.clone(),
            pricing: catalog,
            vendor_gateway,
            transactions,
            kv,
        }
    }
}

/// Entry point for checkout, payment and status requests.
pub struct PaymentGateway {
    checkout: CheckoutEngine,
    orchestrator: PaymentOrchestrator,
}

impl PaymentGateway {
    pub fn new(collaborators: Collaborators, config: &GatewayConfig) -> Self {
        let ledger = RetryLedger::new(collaborators.kv.clone(), config.ledger.clone());
        let checkout = CheckoutEngine::new(
            collaborators.methods,
            collaborators.instruments,
            collaborators.merchant_configs,
            collaborators.downtime,
            ledger.clone(),
            CheckoutCache::new(collaborators.kv.clone(), config.ledger.idempotency_ttl()),
        );
        let orchestrator = PaymentOrchestrator::new(
            collaborators.transactions,
            collaborators.vendors,
            collaborators.pricing,
            collaborators.vendor_gateway,
            ledger,
            PaymentCache::new(collaborators.kv, config.ledger.clone()),
            config.retry.max_attempts,
        );
        Self {
            checkout,
            orchestrator,
        }
    }

    pub async fn checkout_options(&self, request: &CheckoutRequest) -> Result<CheckoutResponse> {
        self.checkout.options(request).await
    }

    pub async fn process_payment(
        &self,
        request: &PaymentRequest,
        user_id: Uuid,
    ) -> Result<PaymentResponse> {
        self.orchestrator.process(request, user_id).await
    }

    pub async fn payment_status(&self, payment_id: Uuid) -> Result<PaymentStatusResponse> {
        self.orchestrator.status(payment_id).await
    }
}
