//! Integration tests for workspace configuration via CLI.
//!
//! These tests verify that:
//! - `rb config set/get/list` round-trip values
//! - missing keys read back as absent, not as an error
//! - writes require edit permission

mod common;

use common::TestEnv;
use predicates::prelude::*;

// === Set / Get Tests ===

#[test]
fn test_config_set_and_get() {
    let env = TestEnv::init_admin();

    env.rb()
        .args(["config", "set", "export_dir", "/srv/exports"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\":\"export_dir\""))
        .stdout(predicate::str::contains("\"value\":\"/srv/exports\""));

    env.rb()
        .args(["config", "get", "export_dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"value\":\"/srv/exports\""));
}

#[test]
fn test_config_get_missing_key() {
    let env = TestEnv::init_admin();

    env.rb()
        .args(["config", "get", "export_dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"value\":null"));

    env.rb()
        .args(["-H", "config", "get", "export_dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export_dir is not set"));
}

#[test]
fn test_config_set_overwrites() {
    let env = TestEnv::init_admin();

    env.rb()
        .args(["config", "set", "audit_retention_days", "30"])
        .assert()
        .success();
    env.rb()
        .args(["config", "set", "audit_retention_days", "60"])
        .assert()
        .success();

    env.rb()
        .args(["config", "get", "audit_retention_days"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"value\":\"60\""));
}

#[test]
fn test_config_set_blank_key() {
    let env = TestEnv::init_admin();

    env.rb()
        .args(["config", "set", " ", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be blank"));
}

#[test]
fn test_config_set_denied_for_viewer() {
    let env = TestEnv::init();
    env.login("viewer", "viewer123");

    env.rb()
        .args(["config", "set", "export_dir", "/srv/exports"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Permission denied"));
}

#[test]
fn test_config_get_allowed_for_viewer() {
    let env = TestEnv::init();
    env.login("viewer", "viewer123");

    env.rb()
        .args(["config", "get", "export_dir"])
        .assert()
        .success();
}

// === List Tests ===

#[test]
fn test_config_list_empty() {
    let env = TestEnv::init_admin();

    env.rb()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":0"));

    env.rb()
        .args(["-H", "config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No config values set"));
}

#[test]
fn test_config_list_is_sorted() {
    let env = TestEnv::init_admin();
    env.rb()
        .args(["config", "set", "export_dir", "/srv/exports"])
        .assert()
        .success();
    env.rb()
        .args(["config", "set", "audit_retention_days", "30"])
        .assert()
        .success();

    // BTreeMap order: audit_retention_days before export_dir.
    env.rb()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":2"))
        .stdout(predicate::str::contains(
            "\"audit_retention_days\":\"30\",\"export_dir\":\"/srv/exports\"",
        ));
}

#[test]
fn test_config_requires_session() {
    let env = TestEnv::init();

    env.rb()
        .args(["config", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}
