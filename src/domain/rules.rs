//! Eligibility rules for payment methods and instruments.
//!
//! Checks run in a fixed order and the first failing check wins:
//! merchant enablement, MCC policy, network compatibility (instrument only),
//! merchant amount limits, and method-level regulatory ceilings.

use super::catalog::{Instrument, MerchantPaymentConfig, PaymentMethod};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// Why a method or instrument cannot be offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    NotEnabledForMerchant,
    RestrictedCategory { method_id: String, mcc: String },
    NetworkNotSupported { network: Option<String> },
    BelowMinimum { minimum: Decimal },
    AboveMaximum { maximum: Decimal },
    RegulatoryLimit { method_id: String, limit: &'static str },
    InstrumentDown,
    PreviouslyDeclined,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::NotEnabledForMerchant => {
                write!(f, "Payment method not enabled for this merchant")
            }
            Ineligibility::RestrictedCategory { method_id, .. } if method_id == "CREDIT_CARD" => {
                write!(f, "Credit Cards not allowed for this Merchant Category")
            }
            Ineligibility::RestrictedCategory { method_id, mcc } => {
                write!(f, "{method_id} not allowed for Merchant Category {mcc}")
            }
            Ineligibility::NetworkNotSupported { network } => write!(
                f,
                "Network {} not supported by merchant",
                network.as_deref().unwrap_or("UNKNOWN")
            ),
            Ineligibility::BelowMinimum { minimum } => {
                write!(f, "Amount below merchant's minimum of {}", minimum.normalize())
            }
            Ineligibility::AboveMaximum { maximum } => {
                write!(f, "Amount exceeds merchant's maximum of {}", maximum.normalize())
            }
            Ineligibility::RegulatoryLimit { method_id, limit } => {
                write!(f, "Amount exceeds {method_id} regulatory limit of {limit}")
            }
            Ineligibility::InstrumentDown => write!(f, "Instrument detected as Down"),
            Ineligibility::PreviouslyDeclined => {
                write!(f, "Instrument previously declined for this payment")
            }
        }
    }
}

/// Static MCC policy: `(mcc, blocked method)`.
const MCC_RESTRICTIONS: &[(&str, &str)] = &[("6011", "CREDIT_CARD"), ("7995", "CREDIT_CARD")];

fn restricted_by_mcc(method_id: &str, mcc: Option<&str>) -> Option<Ineligibility> {
    let mcc = mcc?;
    MCC_RESTRICTIONS
        .iter()
        .find(|(code, blocked)| *code == mcc && *blocked == method_id)
        .map(|_| Ineligibility::RestrictedCategory {
            method_id: method_id.to_string(),
            mcc: mcc.to_string(),
        })
}

/// Ceiling that applies regardless of merchant configuration, with its
/// display form.
fn regulatory_ceiling(method_id: &str) -> Option<(Decimal, &'static str)> {
    match method_id {
        "UPI" => Some((dec!(100000), "1,00,000")),
        _ => None,
    }
}

/// Evaluates eligibility of `method` (and optionally one of its instruments)
/// for a merchant whose config for this method is `config`.
///
/// Pure: the caller resolves the merchant config. Passing `None` for
/// `instrument` evaluates the method-level subset only.
pub fn evaluate(
    method: &PaymentMethod,
    instrument: Option<&Instrument>,
    config: Option<&MerchantPaymentConfig>,
    mcc: Option<&str>,
    amount: Decimal,
) -> Option<Ineligibility> {
    let config = match config {
        Some(config) if config.enabled => config,
        _ => return Some(Ineligibility::NotEnabledForMerchant),
    };

    if let Some(restriction) = restricted_by_mcc(&method.method_id, mcc) {
        return Some(restriction);
    }

    if let Some(instrument) = instrument
        && !config.accepts_network(instrument.network.as_deref())
    {
        return Some(Ineligibility::NetworkNotSupported {
            network: instrument.network.clone(),
        });
    }

    if let Some(minimum) = config.min_amount
        && amount < minimum
    {
        return Some(Ineligibility::BelowMinimum { minimum });
    }
    if let Some(maximum) = config.max_amount
        && amount > maximum
    {
        return Some(Ineligibility::AboveMaximum { maximum });
    }

    if let Some((limit, display)) = regulatory_ceiling(&method.method_id)
        && amount > limit
    {
        return Some(Ineligibility::RegulatoryLimit {
            method_id: method.method_id.clone(),
            limit: display,
        });
    }

    None
}
