#![allow(dead_code)]

use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const USER: &str = "00000000-0000-0000-0000-000000000001";
pub const MERCHANT: &str = "00000000-0000-0000-0000-000000000002";
pub const VISA_CARD: &str = "00000000-0000-0000-0000-00000000000a";
pub const AMEX_CARD: &str = "00000000-0000-0000-0000-00000000000b";
pub const UPI_VPA: &str = "00000000-0000-0000-0000-00000000000c";
pub const DEBIT_CARD: &str = "00000000-0000-0000-0000-00000000000d";

pub const HEADER: [&str; 8] = [
    "op", "id", "user", "merchant", "amount", "mcc", "instrument", "retry_of",
];

/// Catalog shared by the CLI tests; `vendor_script` is spliced in as JSON.
pub fn fixture_json(vendor_script: &str) -> String {
    format!(
        r#"{{
    "methods": [
        {{"method_id": "CREDIT_CARD", "method_name": "Credit Card", "supported_networks": ["VISA", "MASTERCARD", "AMEX"]}},
        {{"method_id": "DEBIT_CARD", "method_name": "Debit Card", "supported_networks": ["VISA"]}},
        {{"method_id": "UPI", "method_name": "UPI"}}
    ],
    "instruments": [
        {{"instrument_id": "{VISA_CARD}", "user_id": "{USER}", "method_id": "CREDIT_CARD",
          "masked_details": "**** 4242", "network": "VISA", "issuer": "HDFC"}},
        {{"instrument_id": "{AMEX_CARD}", "user_id": "{USER}", "method_id": "CREDIT_CARD",
          "masked_details": "**** 0005", "network": "AMEX", "issuer": "AXIS"}},
        {{"instrument_id": "{UPI_VPA}", "user_id": "{USER}", "method_id": "UPI",
          "masked_details": "user@okbank", "issuer": "SBI"}},
        {{"instrument_id": "{DEBIT_CARD}", "user_id": "{USER}", "method_id": "DEBIT_CARD",
          "masked_details": "**** 1881", "network": "VISA", "issuer": "ICICI"}}
    ],
    "merchant_configs": [
        {{"merchant_id": "{MERCHANT}", "method_id": "CREDIT_CARD", "supported_networks": ["VISA"],
          "min_amount": 10, "max_amount": 50000}},
        {{"merchant_id": "{MERCHANT}", "method_id": "DEBIT_CARD"}},
        {{"merchant_id": "{MERCHANT}", "method_id": "UPI"}}
    ],
    "vendors": [
        {{"vendor_id": "razorpay", "uptime_score": 99.5, "error_rate": 0.5}},
        {{"vendor_id": "payu", "uptime_score": 98.0, "error_rate": 1.0}},
        {{"vendor_id": "cashfree", "uptime_score": 97.0, "error_rate": 1.5}}
    ],
    "pricing": [
        {{"vendor_id": "razorpay", "min_amount": 0, "max_amount": 1000000, "fee_percent": 2, "fixed_fee": 3}}
    ],
    "vendor_script": {vendor_script}
}}"#
    )
}

pub fn write_fixture(vendor_script: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", fixture_json(vendor_script)).unwrap();
    file
}

/// Writes a request file; each row lists its columns in `HEADER` order and
/// may stop early.
pub fn write_requests(rows: &[&[&str]]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(file.path())
        .unwrap();
    wtr.write_record(HEADER).unwrap();
    for row in rows {
        wtr.write_record(*row).unwrap();
    }
    wtr.flush().unwrap();
    file
}

/// `payments` independent payments on the VISA card, each paid then queried.
pub fn generate_requests(path: &Path, payments: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
    wtr.write_record(HEADER)?;

    for i in 1..=payments {
        let payment_id = format!("00000000-0000-0000-0001-{i:012x}");
        wtr.write_record([
            "pay",
            &payment_id,
            USER,
            MERCHANT,
            "100.00",
            "",
            VISA_CARD,
            "",
        ])?;
        wtr.write_record(["status", &payment_id])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Rows of the CLI output, header excluded, split on commas.
pub fn output_rows(stdout: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_reader(stdout);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
