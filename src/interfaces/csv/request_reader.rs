use crate::domain::checkout::CheckoutRequest;
use crate::domain::money::Amount;
use crate::error::{GatewayError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOp {
    Checkout,
    Pay,
    Status,
}

/// One row of the request file.
///
/// `id` is the idempotency key for `checkout` and the payment id for `pay`
/// and `status`. Which of the other columns are required depends on `op`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestRecord {
    pub op: RequestOp,
    pub id: Uuid,
    #[serde(default)]
    pub user: Option<Uuid>,
    #[serde(default)]
    pub merchant: Option<Uuid>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub mcc: Option<String>,
    #[serde(default)]
    pub instrument: Option<Uuid>,
    #[serde(default)]
    pub retry_of: Option<Uuid>,
}

/// A payment row before its instrument is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayCommand {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub merchant_id: Uuid,
    pub amount: Amount,
    pub instrument_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Checkout(CheckoutRequest),
    Pay(PayCommand),
    Status(Uuid),
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| GatewayError::ValidationError(format!("missing column '{column}'")))
}

impl RequestRecord {
    pub fn into_command(self) -> Result<Command> {
        match self.op {
            RequestOp::Checkout => Ok(Command::Checkout(CheckoutRequest {
                checkout_id: Uuid::new_v4(),
                idempotency_key: self.id,
                merchant_id: required(self.merchant, "merchant")?,
                user_id: required(self.user, "user")?,
                amount: Amount::new(required(self.amount, "amount")?)?,
                mcc: self.mcc.filter(|m| !m.is_empty()),
                retry_payment_id: self.retry_of,
            })),
            RequestOp::Pay => Ok(Command::Pay(PayCommand {
                payment_id: self.id,
                user_id: required(self.user, "user")?,
                merchant_id: required(self.merchant, "merchant")?,
                amount: Amount::new(required(self.amount, "amount")?)?,
                instrument_id: required(self.instrument, "instrument")?,
            })),
            RequestOp::Status => Ok(Command::Status(self.id)),
        }
    }
}

/// Reads request rows from a CSV source.
///
/// Whitespace is trimmed and short rows are accepted; columns a row does not
/// reach are treated as empty.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily parses rows into commands, one result per row.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map_err(GatewayError::from)
                .and_then(RequestRecord::into_command)
        })
    }
}
