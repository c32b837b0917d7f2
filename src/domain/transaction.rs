use super::money::Amount;
use crate::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Initiated,
    Success,
    Failed,
    Pending,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Initiated => write!(f, "INITIATED"),
            TransactionStatus::Success => write!(f, "SUCCESS"),
            TransactionStatus::Failed => write!(f, "FAILED"),
            TransactionStatus::Pending => write!(f, "PENDING"),
        }
    }
}

/// Classification of a failed settlement attempt.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    /// Vendor-side processing failure.
    VendorError,
    /// Vendor did not respond in time.
    Timeout,
    /// The instrument itself was rejected, e.g. insufficient funds.
    InstrumentDecline,
    /// The request is invalid and must never be retried.
    ValidationError,
}

impl FailureType {
    /// Another vendor may succeed where this one failed.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureType::VendorError | FailureType::Timeout)
    }

    /// The vendor that failed should not be selected again for this payment.
    pub fn excludes_vendor(self) -> bool {
        self.is_retryable()
    }

    pub fn requires_new_instrument(self) -> bool {
        self == FailureType::InstrumentDecline
    }

    pub fn response_code(self) -> &'static str {
        match self {
            FailureType::VendorError => "50",
            FailureType::InstrumentDecline => "51",
            FailureType::ValidationError => "40",
            FailureType::Timeout => "54",
        }
    }
}

pub const RESPONSE_CODE_APPROVED: &str = "00";
pub const RESPONSE_CODE_UNCLASSIFIED: &str = "99";
pub const RESPONSE_CODE_RETRY_LIMIT: &str = "65";

const RETRYABLE_MARKERS: &[&str] = &[
    "vendor",
    "timeout",
    "temporarily unavailable",
    "network error",
];

/// Classifies a persisted free-text failure reason.
///
/// Only used when no structured `FailureType` survived; anything that does
/// not look like a vendor or transport problem is treated as final.
pub fn is_retryable_failure(reason: Option<&str>) -> bool {
    let Some(reason) = reason else {
        return false;
    };
    let reason = reason.to_lowercase();
    RETRYABLE_MARKERS.iter().any(|m| reason.contains(m))
}

/// The instrument a client chose for a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRef {
    pub instrument_id: Uuid,
    pub method_id: String,
    pub masked_details: Option<String>,
    pub network: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payment_id: Uuid,
    pub merchant_id: Uuid,
    pub amount: Amount,
    pub currency: String,
    pub instrument: InstrumentRef,
}

/// What a vendor reported for one settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorOutcome {
    Approved,
    /// Accepted, but the final outcome is not known yet.
    Pending,
    Declined {
        reason: String,
        failure_type: FailureType,
    },
}

/// The durable record of one attempt for a payment id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub txn_id: Uuid,
    pub user_id: Uuid,
    pub merchant_id: Uuid,
    pub payment_id: Uuid,
    pub instrument_id: Uuid,
    pub method_id: String,
    pub amount: Amount,
    pub currency: String,
    pub vendor_id: Option<String>,
    pub status: TransactionStatus,
    pub failure_reason: Option<String>,
    pub failure_type: Option<FailureType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    fn new(request: &PaymentRequest, user_id: Uuid, vendor_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            txn_id: Uuid::new_v4(),
            user_id,
            merchant_id: request.merchant_id,
            payment_id: request.payment_id,
            instrument_id: request.instrument.instrument_id,
            method_id: request.instrument.method_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            vendor_id,
            status: TransactionStatus::Initiated,
            failure_reason: None,
            failure_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A new attempt routed to `vendor_id`, not yet settled.
    pub fn initiated(request: &PaymentRequest, user_id: Uuid, vendor_id: &str) -> Self {
        Self::new(request, user_id, Some(vendor_id.to_string()))
    }

    /// An attempt that failed before any vendor could be chosen.
    pub fn rejected(
        request: &PaymentRequest,
        user_id: Uuid,
        reason: impl Into<String>,
        failure_type: FailureType,
    ) -> Self {
        let mut txn = Self::new(request, user_id, None);
        txn.status = TransactionStatus::Failed;
        txn.failure_reason = Some(reason.into());
        txn.failure_type = Some(failure_type);
        txn
    }

    fn settle(&mut self, status: TransactionStatus) -> Result<()> {
        if self.status != TransactionStatus::Initiated {
            return Err(GatewayError::ValidationError(format!(
                "Transaction {} cannot move from {} to {}",
                self.txn_id, self.status, status
            )));
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_succeeded(&mut self) -> Result<()> {
        self.settle(TransactionStatus::Success)
    }

    pub fn mark_pending(&mut self) -> Result<()> {
        self.settle(TransactionStatus::Pending)
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>, failure_type: FailureType) -> Result<()> {
        self.settle(TransactionStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.failure_type = Some(failure_type);
        Ok(())
    }

    /// Whether a new attempt may be made after this one.
    pub fn is_retryable(&self) -> bool {
        if self.status != TransactionStatus::Failed {
            return false;
        }
        match self.failure_type {
            Some(failure_type) => failure_type.is_retryable(),
            None => is_retryable_failure(self.failure_reason.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub txn_id: Uuid,
    pub status: TransactionStatus,
    pub vendor_id: Option<String>,
    pub failure_reason: Option<String>,
    pub retryable: bool,
    pub requires_new_instrument: bool,
    pub response_code: String,
}

impl PaymentResponse {
    pub fn from_transaction(txn: &Transaction) -> Self {
        let (retryable, requires_new_instrument, response_code) = match (txn.status, txn.failure_type) {
            (TransactionStatus::Success, _) => (false, false, RESPONSE_CODE_APPROVED),
            (TransactionStatus::Failed, Some(failure_type)) => (
                failure_type.is_retryable(),
                failure_type.requires_new_instrument(),
                failure_type.response_code(),
            ),
            (TransactionStatus::Failed, None) => (
                is_retryable_failure(txn.failure_reason.as_deref()),
                false,
                RESPONSE_CODE_UNCLASSIFIED,
            ),
            _ => (false, false, RESPONSE_CODE_UNCLASSIFIED),
        };

        Self {
            payment_id: txn.payment_id,
            txn_id: txn.txn_id,
            status: txn.status,
            vendor_id: txn.vendor_id.clone(),
            failure_reason: txn.failure_reason.clone(),
            retryable,
            requires_new_instrument,
            response_code: response_code.to_string(),
        }
    }

    /// The response for a payment whose retry budget is spent.
    pub fn retry_limit_reached(txn: &Transaction, max_attempts: u32) -> Self {
        let mut response = Self::from_transaction(txn);
        response.retryable = false;
        response.failure_reason = Some(format!(
            "Retry limit of {max_attempts} attempts reached; last failure: {}",
            txn.failure_reason.as_deref().unwrap_or("unknown")
        ));
        response.response_code = RESPONSE_CODE_RETRY_LIMIT.to_string();
        response
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Initiated,
    Success,
    Failed,
    Pending,
    NotFound,
}

impl From<TransactionStatus> for PaymentStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Initiated => PaymentStatus::Initiated,
            TransactionStatus::Success => PaymentStatus::Success,
            TransactionStatus::Failed => PaymentStatus::Failed,
            TransactionStatus::Pending => PaymentStatus::Pending,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Initiated => write!(f, "INITIATED"),
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub payment_id: Uuid,
    pub txn_id: Option<Uuid>,
    pub status: PaymentStatus,
    pub amount: Option<Amount>,
    pub failure_reason: Option<String>,
    pub retry_count: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PaymentStatusResponse {
    pub fn from_transaction(txn: &Transaction, retry_count: u32) -> Self {
        Self {
            payment_id: txn.payment_id,
            txn_id: Some(txn.txn_id),
            status: txn.status.into(),
            amount: Some(txn.amount),
            failure_reason: txn.failure_reason.clone(),
            retry_count,
            created_at: Some(txn.created_at),
            updated_at: Some(txn.updated_at),
        }
    }

    pub fn not_found(payment_id: Uuid) -> Self {
        Self {
            payment_id,
            txn_id: None,
            status: PaymentStatus::NotFound,
            amount: None,
            failure_reason: None,
            retry_count: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ALL_TYPES: [FailureType; 4] = [
        FailureType::VendorError,
        FailureType::Timeout,
        FailureType::InstrumentDecline,
        FailureType::ValidationError,
    ];

    fn request() -> PaymentRequest {
        PaymentRequest {
            payment_id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            amount: Amount::new(dec!(250.00)).unwrap(),
            currency: "INR".to_string(),
            instrument: InstrumentRef {
                instrument_id: Uuid::new_v4(),
                method_id: "CREDIT_CARD".to_string(),
                masked_details: Some("**** 4242".to_string()),
                network: Some("VISA".to_string()),
                issuer: Some("HDFC".to_string()),
            },
        }
    }

    #[test]
    fn test_failure_flags_follow_taxonomy() {
        for failure_type in ALL_TYPES {
            let mut txn = Transaction::initiated(&request(), Uuid::new_v4(), "V1");
            txn.mark_failed("boom", failure_type).unwrap();
            let response = PaymentResponse::from_transaction(&txn);

            assert_eq!(
                response.requires_new_instrument,
                failure_type == FailureType::InstrumentDecline
            );
            assert_eq!(
                response.retryable,
                matches!(failure_type, FailureType::VendorError | FailureType::Timeout)
            );
            assert_eq!(response.response_code, failure_type.response_code());
        }
    }

    #[test]
    fn test_success_response() {
        let mut txn = Transaction::initiated(&request(), Uuid::new_v4(), "V1");
        txn.mark_succeeded().unwrap();
        let response = PaymentResponse::from_transaction(&txn);
        assert_eq!(response.status, TransactionStatus::Success);
        assert!(!response.retryable);
        assert!(!response.requires_new_instrument);
        assert_eq!(response.response_code, "00");
    }

    #[test]
    fn test_settled_transaction_cannot_move_again() {
        let mut txn = Transaction::initiated(&request(), Uuid::new_v4(), "V1");
        txn.mark_succeeded().unwrap();
        assert!(matches!(
            txn.mark_failed("late failure", FailureType::Timeout),
            Err(GatewayError::ValidationError(_))
        ));
        assert_eq!(txn.status, TransactionStatus::Success);
    }

    #[test]
    fn test_reason_heuristic() {
        assert!(is_retryable_failure(Some("Vendor processing error")));
        assert!(is_retryable_failure(Some("Gateway timeout")));
        assert!(is_retryable_failure(Some("Issuer temporarily unavailable")));
        assert!(is_retryable_failure(Some("network error talking to acquirer")));
        assert!(is_retryable_failure(Some(
            "No payment vendors available (all vendors exhausted)"
        )));
        assert!(!is_retryable_failure(Some("Insufficient funds")));
        assert!(!is_retryable_failure(Some("Invalid card number")));
        assert!(!is_retryable_failure(None));
    }

    #[test]
    fn test_unstructured_failure_falls_back_to_heuristic() {
        let mut txn = Transaction::initiated(&request(), Uuid::new_v4(), "V1");
        txn.status = TransactionStatus::Failed;
        txn.failure_reason = Some("Vendor unreachable".to_string());
        assert!(txn.is_retryable());

        txn.failure_reason = Some("Card blocked".to_string());
        assert!(!txn.is_retryable());
        assert_eq!(PaymentResponse::from_transaction(&txn).response_code, "99");
    }

    #[test]
    fn test_retry_limit_response() {
        let mut txn = Transaction::initiated(&request(), Uuid::new_v4(), "V1");
        txn.mark_failed("Vendor error", FailureType::VendorError).unwrap();
        let response = PaymentResponse::retry_limit_reached(&txn, 3);
        assert!(!response.retryable);
        assert_eq!(response.response_code, "65");
        assert!(response.failure_reason.unwrap().contains("Vendor error"));
    }

    #[test]
    fn test_not_found_status() {
        let id = Uuid::new_v4();
        let status = PaymentStatusResponse::not_found(id);
        assert_eq!(status.status, PaymentStatus::NotFound);
        assert_eq!(status.retry_count, 0);
        assert_eq!(status.status.to_string(), "NOT_FOUND");
    }
}
