use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

mod common;
use common::{AMEX_CARD, DEBIT_CARD, MERCHANT, UPI_VPA, USER, VISA_CARD};

const PAYMENT: &str = "00000000-0000-0000-0000-0000000000f1";
const CHECKOUT_KEY: &str = "00000000-0000-0000-0000-0000000000c1";
const RETRY_CHECKOUT_KEY: &str = "00000000-0000-0000-0000-0000000000c2";

const FAILING_RAZORPAY: &str = r#"{"vendors": {"razorpay": [
    {"outcome": "decline", "failure_type": "VENDOR_ERROR", "reason": "Vendor gateway error"},
    {"outcome": "approve"}
]}}"#;

fn run(fixture: &tempfile::NamedTempFile, requests: &tempfile::NamedTempFile) -> Vec<Vec<String>> {
    let output = Command::new(cargo_bin!("paygate"))
        .arg(fixture.path())
        .arg(requests.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    common::output_rows(&output.stdout)
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = common::write_fixture("{}");
    let requests = common::write_requests(&[
        &["checkout", CHECKOUT_KEY, USER, MERCHANT, "250.00", "5411"],
        &["pay", PAYMENT, USER, MERCHANT, "250.00", "", VISA_CARD],
        &["status", PAYMENT],
    ]);

    let mut cmd = Command::new(cargo_bin!("paygate"));
    cmd.arg(fixture.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "op,id,payment_id,status,vendor,retryable,requires_new_instrument,response_code,detail",
        ))
        .stdout(predicate::str::contains(format!(
            "pay,{PAYMENT},{PAYMENT},SUCCESS,razorpay,false,false,00,"
        )))
        .stdout(predicate::str::contains(format!(
            "status,{PAYMENT},{PAYMENT},SUCCESS,,,,,retries=1"
        )));

    Ok(())
}

#[test]
fn test_checkout_lists_eligible_instruments() {
    let fixture = common::write_fixture("{}");
    let requests = common::write_requests(&[
        &["checkout", CHECKOUT_KEY, USER, MERCHANT, "250.00"],
        &["checkout", CHECKOUT_KEY, USER, MERCHANT, "99999.00", "6011"],
    ]);

    let rows = run(&fixture, &requests);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][3], "OK");
    assert_eq!(rows[0][8], format!("{VISA_CARD} {DEBIT_CARD} {UPI_VPA}"));
    assert!(!rows[0][8].contains(AMEX_CARD));

    // Same idempotency key: the first response comes back unchanged.
    assert_eq!(rows[1], rows[0]);
}

#[test]
fn test_cli_retry_moves_to_next_vendor() {
    let fixture = common::write_fixture(FAILING_RAZORPAY);
    let requests = common::write_requests(&[
        &["pay", PAYMENT, USER, MERCHANT, "500", "", VISA_CARD],
        &["pay", PAYMENT, USER, MERCHANT, "500", "", VISA_CARD],
        &["pay", PAYMENT, USER, MERCHANT, "500", "", VISA_CARD],
        &["status", PAYMENT],
    ]);

    let rows = run(&fixture, &requests);
    assert_eq!(
        rows[0][3..8],
        ["FAILED", "razorpay", "true", "false", "50"]
    );
    assert_eq!(rows[0][8], "Vendor gateway error");
    assert_eq!(rows[1][3..8], ["SUCCESS", "payu", "false", "false", "00"]);
    assert_eq!(rows[2], rows[1]);
    assert_eq!(rows[3][8], "retries=3");
}

#[test]
fn test_declined_instrument_flagged_on_retry_checkout() {
    let fixture = common::write_fixture(&format!(r#"{{"declined_instruments": ["{VISA_CARD}"]}}"#));
    let requests = common::write_requests(&[
        &["pay", PAYMENT, USER, MERCHANT, "250", "", VISA_CARD],
        &["checkout", RETRY_CHECKOUT_KEY, USER, MERCHANT, "250", "", "", PAYMENT],
        &["checkout", CHECKOUT_KEY, USER, MERCHANT, "250"],
    ]);

    let rows = run(&fixture, &requests);
    assert_eq!(rows[0][3..8], ["FAILED", "razorpay", "false", "true", "51"]);
    assert_eq!(rows[1][8], format!("{DEBIT_CARD} {UPI_VPA}"));
    assert!(rows[2][8].contains(VISA_CARD));
}

#[test]
fn test_retry_cap_from_config() {
    let fixture = common::write_fixture(FAILING_RAZORPAY);
    let requests = common::write_requests(&[
        &["pay", PAYMENT, USER, MERCHANT, "500", "", VISA_CARD],
        &["pay", PAYMENT, USER, MERCHANT, "500", "", VISA_CARD],
    ]);
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[retry]\nmax_attempts = 1").unwrap();

    let output = Command::new(cargo_bin!("paygate"))
        .arg(fixture.path())
        .arg(requests.path())
        .arg("--config")
        .arg(config.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows = common::output_rows(&output.stdout);
    assert_eq!(rows[0][7], "50");
    assert_eq!(rows[1][5..8], ["false", "false", "65"]);
    assert!(rows[1][8].starts_with("Retry limit of 1 attempts reached"));
}

#[test]
fn test_invalid_config_fails() {
    let fixture = common::write_fixture("{}");
    let requests = common::write_requests(&[]);
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[retry]\nmax_attempts = 0").unwrap();

    let mut cmd = Command::new(cargo_bin!("paygate"));
    cmd.arg(fixture.path())
        .arg(requests.path())
        .arg("--config")
        .arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
}
