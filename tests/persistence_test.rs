#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;
use common::{MERCHANT, USER, VISA_CARD};

const PAYMENT: &str = "00000000-0000-0000-0000-0000000000f1";

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: razorpay fails, payu settles the payment.
    let fixture = common::write_fixture(
        r#"{"vendors": {"razorpay": [{"outcome": "decline", "failure_type": "TIMEOUT", "reason": "Vendor timeout"}]}}"#,
    );
    let pay = common::write_requests(&[
        &["pay", PAYMENT, USER, MERCHANT, "100.0", "", VISA_CARD],
        &["pay", PAYMENT, USER, MERCHANT, "100.0", "", VISA_CARD],
    ]);

    let output1 = Command::new(cargo_bin!("paygate"))
        .arg(fixture.path())
        .arg(pay.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let rows1 = common::output_rows(&output1.stdout);
    assert_eq!(rows1[1][3], "SUCCESS");
    assert_eq!(rows1[1][4], "payu");

    // 2. Second run on the same DB: caches are gone, the stored attempt is not.
    let replay = common::write_requests(&[
        &["status", PAYMENT],
        &["pay", PAYMENT, USER, MERCHANT, "100.0", "", VISA_CARD],
    ]);

    let output2 = Command::new(cargo_bin!("paygate"))
        .arg(fixture.path())
        .arg(replay.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let rows2 = common::output_rows(&output2.stdout);

    assert_eq!(rows2[0][3], "SUCCESS");
    assert_eq!(rows2[1][3..5], ["SUCCESS", "payu"]);
}
