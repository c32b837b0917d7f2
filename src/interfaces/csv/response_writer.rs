use crate::domain::checkout::CheckoutResponse;
use crate::domain::transaction::{PaymentResponse, PaymentStatusResponse};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

/// One output row. Columns that do not apply to an operation stay empty.
#[derive(Debug, Serialize)]
struct ResponseRecord {
    op: &'static str,
    id: Uuid,
    payment_id: Uuid,
    status: String,
    vendor: Option<String>,
    retryable: Option<bool>,
    requires_new_instrument: Option<bool>,
    response_code: Option<String>,
    detail: Option<String>,
}

/// Writes gateway responses as CSV, one row per request.
pub struct ResponseWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// `detail` lists the eligible instrument ids, space separated.
    pub fn write_checkout(&mut self, id: Uuid, response: &CheckoutResponse) -> Result<()> {
        let eligible: Vec<String> = response
            .eligible_instruments()
            .map(|i| i.instrument_id.to_string())
            .collect();
        self.write(ResponseRecord {
            op: "checkout",
            id,
            payment_id: response.payment_id,
            status: "OK".to_string(),
            vendor: None,
            retryable: None,
            requires_new_instrument: None,
            response_code: None,
            detail: Some(eligible.join(" ")),
        })
    }

    pub fn write_payment(&mut self, response: &PaymentResponse) -> Result<()> {
        self.write(ResponseRecord {
            op: "pay",
            id: response.payment_id,
            payment_id: response.payment_id,
            status: response.status.to_string(),
            vendor: response.vendor_id.clone(),
            retryable: Some(response.retryable),
            requires_new_instrument: Some(response.requires_new_instrument),
            response_code: Some(response.response_code.clone()),
            detail: response.failure_reason.clone(),
        })
    }

    /// `detail` carries the retry count, then the failure reason if any.
    pub fn write_status(&mut self, response: &PaymentStatusResponse) -> Result<()> {
        let detail = match &response.failure_reason {
            Some(reason) => format!("retries={}; {reason}", response.retry_count),
            None => format!("retries={}", response.retry_count),
        };
        self.write(ResponseRecord {
            op: "status",
            id: response.payment_id,
            payment_id: response.payment_id,
            status: response.status.to_string(),
            vendor: None,
            retryable: None,
            requires_new_instrument: None,
            response_code: None,
            detail: Some(detail),
        })
    }

    fn write(&mut self, record: ResponseRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
