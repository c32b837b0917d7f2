use super::cache::PaymentCache;
use super::ledger::RetryLedger;
use super::locks::KeyedLocks;
use crate::domain::ports::{PricingSourceRef, TransactionStoreRef, VendorDirectoryRef, VendorGatewayRef};
use crate::domain::routing;
use crate::domain::transaction::{
    FailureType, PaymentRequest, PaymentResponse, PaymentStatusResponse, Transaction,
    TransactionStatus, VendorOutcome,
};
use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const NO_VENDOR_AVAILABLE: &str = "No payment vendors available (all vendors exhausted)";

/// Executes payments idempotently per payment id.
///
/// Calls for the same payment id are serialized. A payment that succeeded,
/// is pending, or failed for good is replayed from its stored attempt; only a
/// retryable failure leads to a new attempt, routed away from every vendor
/// that already failed it.
pub struct PaymentOrchestrator {
    transactions: TransactionStoreRef,
    vendors: VendorDirectoryRef,
    pricing: PricingSourceRef,
    gateway: VendorGatewayRef,
    ledger: RetryLedger,
    cache: PaymentCache,
    locks: KeyedLocks<Uuid>,
    max_attempts: u32,
}

impl PaymentOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transactions: TransactionStoreRef,
        vendors: VendorDirectoryRef,
        pricing: PricingSourceRef,
        gateway: VendorGatewayRef,
        ledger: RetryLedger,
        cache: PaymentCache,
        max_attempts: u32,
    ) -> Self {
        Self {
            transactions,
            vendors,
            pricing,
            gateway,
            ledger,
            cache,
            locks: KeyedLocks::new(),
            max_attempts,
        }
    }

    pub async fn process(&self, request: &PaymentRequest, user_id: Uuid) -> Result<PaymentResponse> {
        let payment_id = request.payment_id;
        let _guard = self.locks.lock(payment_id).await;

        let attempts = match self.ledger.record_attempt(payment_id).await {
            Ok(attempts) => Some(attempts),
            Err(e) => {
                warn!(%payment_id, error = %e, "Retry counter unavailable, retry cap not enforced");
                None
            }
        };
        debug!(%payment_id, ?attempts, "Processing payment");

        if let Some(current) = self.current_transaction(payment_id).await? {
            match current.status {
                TransactionStatus::Success | TransactionStatus::Pending | TransactionStatus::Initiated => {
                    info!(%payment_id, status = %current.status, "Replaying existing payment");
                    return Ok(PaymentResponse::from_transaction(&current));
                }
                TransactionStatus::Failed if !current.is_retryable() => {
                    info!(%payment_id, "Replaying non-retryable failure");
                    return Ok(PaymentResponse::from_transaction(&current));
                }
                TransactionStatus::Failed => {
                    if let Some(attempts) = attempts
                        && attempts > self.max_attempts
                    {
                        warn!(%payment_id, attempts, "Retry limit reached");
                        return Ok(PaymentResponse::retry_limit_reached(&current, self.max_attempts));
                    }
                    info!(
                        %payment_id,
                        previous_vendor = current.vendor_id.as_deref().unwrap_or("-"),
                        "Retrying after retryable failure"
                    );
                }
            }
        }

        self.attempt(request, user_id, attempts.unwrap_or(0)).await
    }

    pub async fn status(&self, payment_id: Uuid) -> Result<PaymentStatusResponse> {
        match self.cache.status(payment_id).await {
            Ok(Some(mut cached)) => {
                cached.retry_count = self.retry_count(payment_id, cached.retry_count).await;
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(%payment_id, error = %e, "Status cache read failed"),
        }

        match self.current_transaction(payment_id).await? {
            Some(txn) => {
                let attempts = self.retry_count(payment_id, 0).await;
                Ok(PaymentStatusResponse::from_transaction(&txn, attempts))
            }
            None => Ok(PaymentStatusResponse::not_found(payment_id)),
        }
    }

    async fn retry_count(&self, payment_id: Uuid, fallback: u32) -> u32 {
        match self.ledger.attempts(payment_id).await {
            Ok(attempts) => attempts,
            Err(e) => {
                warn!(%payment_id, error = %e, "Retry counter unavailable");
                fallback
            }
        }
    }

    /// Latest attempt for the payment, from the cache when possible.
    async fn current_transaction(&self, payment_id: Uuid) -> Result<Option<Transaction>> {
        match self.cache.transaction(payment_id).await {
            Ok(Some(txn)) => return Ok(Some(txn)),
            Ok(None) => {}
            Err(e) => warn!(%payment_id, error = %e, "Payment cache read failed"),
        }
        self.transactions.latest_for_payment(payment_id).await
    }

    async fn attempt(
        &self,
        request: &PaymentRequest,
        user_id: Uuid,
        attempts: u32,
    ) -> Result<PaymentResponse> {
        let payment_id = request.payment_id;
        let failed_vendors = self.ledger.failed_vendors(payment_id).await?;
        let candidates = self.vendors.available_vendors().await?;

        let mut fees = HashMap::new();
        for vendor in candidates
            .iter()
            .filter(|v| !v.down && !failed_vendors.contains(&v.vendor_id))
        {
            if let Some(fee) = self.pricing.fee(&vendor.vendor_id, request.amount).await? {
                fees.insert(vendor.vendor_id.clone(), fee);
            }
        }

        let Some(vendor) = routing::select(&candidates, &failed_vendors, |id| fees.get(id).copied())
        else {
            warn!(%payment_id, excluded = failed_vendors.len(), "No vendor left to route to");
            let txn = Transaction::rejected(request, user_id, NO_VENDOR_AVAILABLE, FailureType::VendorError);
            self.transactions.store(txn.clone()).await?;
            self.refresh_cache(&txn, attempts).await;
            return Ok(PaymentResponse::from_transaction(&txn));
        };
        let vendor_id = vendor.vendor_id.clone();
        debug!(%payment_id, vendor = %vendor_id, "Vendor selected");

        let mut txn = Transaction::initiated(request, user_id, &vendor_id);
        self.transactions.store(txn.clone()).await?;
        // The cache must never trail the store while the vendor call is open.
        self.refresh_cache(&txn, attempts).await;

        let outcome = match self.gateway.execute(&vendor_id, request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%payment_id, vendor = %vendor_id, error = %e, "Vendor call failed");
                VendorOutcome::Declined {
                    reason: format!("Vendor call failed: {e}"),
                    failure_type: FailureType::VendorError,
                }
            }
        };

        match &outcome {
            VendorOutcome::Approved => txn.mark_succeeded()?,
            VendorOutcome::Pending => txn.mark_pending()?,
            VendorOutcome::Declined {
                reason,
                failure_type,
            } => txn.mark_failed(reason.clone(), *failure_type)?,
        }
        self.transactions.store(txn.clone()).await?;
        self.refresh_cache(&txn, attempts).await;

        if let VendorOutcome::Declined { failure_type, .. } = outcome {
            if failure_type.excludes_vendor() {
                self.ledger.exclude_vendor(payment_id, &vendor_id).await?;
            }
            if failure_type.requires_new_instrument()
                && let Err(e) = self
                    .ledger
                    .record_declined_instrument(payment_id, txn.instrument_id)
                    .await
            {
                warn!(%payment_id, error = %e, "Could not record declined instrument");
            }
        }

        info!(
            %payment_id,
            txn_id = %txn.txn_id,
            vendor = %vendor_id,
            status = %txn.status,
            "Payment attempt finished"
        );
        Ok(PaymentResponse::from_transaction(&txn))
    }

    async fn refresh_cache(&self, txn: &Transaction, attempts: u32) {
        if let Err(e) = self.cache.put_transaction(txn).await {
            warn!(payment_id = %txn.payment_id, error = %e, "Payment cache write failed");
        }
        let status = PaymentStatusResponse::from_transaction(txn, attempts);
        if let Err(e) = self.cache.put_status(&status).await {
            warn!(payment_id = %txn.payment_id, error = %e, "Status cache write failed");
        }
    }
}
