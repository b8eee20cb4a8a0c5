use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value as Json;

fn tfguard() -> Command {
    Command::cargo_bin("tfguard").unwrap()
}

#[test]
fn scan_locked_bucket_passes() {
    tfguard()
        .args(&["scan", "tests/fixtures/locked.tf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed checks: 0"))
        .stdout(predicate::str::contains("PASSED for resource: aws_s3_bucket.locked"))
        .stdout(predicate::str::contains("PASSED for resource: aws_kms_key.main"));
}

#[test]
fn scan_disabled_lock_fails() {
    tfguard()
        .args(&["scan", "tests/fixtures/unlocked.tf.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Check: CKV_AWS_143"))
        .stdout(predicate::str::contains("FAILED for resource: aws_s3_bucket.unlocked"));
}

#[test]
fn scan_soft_fail() {
    tfguard()
        .args(&["scan", "tests/fixtures/unlocked.tf.json", "--soft-fail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed checks: 1"));
}

#[test]
fn scan_skip_check() {
    tfguard()
        .args(&["scan", "tests/fixtures/unlocked.tf.json", "--skip-check", "CKV_AWS_143"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SKIPPED for resource: aws_s3_bucket.unlocked"));
}

#[test]
fn scan_dynamic_block_directory_json() {
    let out = tfguard()
        .args(&["scan", "tests/fixtures/dynamic", "-o", "json", "--jobs", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Json = serde_json::from_slice(&out).unwrap();
    let records = report["records"].as_array().unwrap();
    // .terraform is not scanned, so only the one bucket shows up
    assert_eq!(report["summary"]["resources"], 1);
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r["verdict"] == "PASSED"));
    assert!(records.iter().any(|r| r["check_id"] == "CKV_AWS_143"));
}

#[test]
fn scan_hcl2_shaped_yaml() {
    tfguard()
        .args(&["scan", "tests/fixtures/hcl2.yaml", "--check", "CKV_AWS_143"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED for resource: aws_s3_bucket.test"));
}

#[test]
fn scan_absent_lock_default_and_policy_override() {
    tfguard()
        .args(&["scan", "tests/fixtures/bare.tf", "--check", "CKV_AWS_143"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED for resource: aws_s3_bucket.bare"));

    tfguard()
        .args(&["scan", "tests/fixtures/bare.tf", "--config", "tests/fixtures/policy.yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED for resource: aws_s3_bucket.bare"))
        .stdout(predicate::str::contains("CKV_AWS_21").not());
}

#[test]
fn scan_directory_skips_non_terraform_files() {
    tfguard()
        .args(&["scan", "tests/fixtures/mixed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed checks: 0"))
        .stdout(predicate::str::contains("PASSED for resource: aws_s3_bucket.mixed"))
        .stderr(predicate::str::contains("multi.yaml"));
}

#[test]
fn scan_named_unparsable_file_is_an_error() {
    tfguard()
        .args(&["scan", "tests/fixtures/mixed/multi.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parse YAML"));
}

#[test]
fn scan_named_non_mapping_file_has_no_resources() {
    tfguard()
        .args(&["scan", "tests/fixtures/mixed/list.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(0 resources)"));
}

#[test]
fn scan_rejects_unknown_flag() {
    tfguard()
        .args(&["scan", "tests/fixtures/locked.tf", "--allow-unencrypted"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--allow-unencrypted"));
}

#[test]
fn scan_missing_file_is_an_error() {
    tfguard()
        .args(&["scan", "tests/fixtures/does-not-exist.tf"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.tf"));
}

#[test]
fn list_checks() {
    tfguard()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("CKV_AWS_143\taws_s3_bucket"))
        .stdout(predicate::str::contains("CKV_AWS_7\taws_kms_key"));
}
