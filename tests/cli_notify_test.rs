//! Integration tests for the notification inbox via CLI.
//!
//! These tests verify that:
//! - risk mutations notify the acting user
//! - `rb notify list/count/read/read-all/delete` work and stay
//!   scoped to the session user
//! - malformed and unknown notification IDs are rejected

mod common;

use common::TestEnv;
use predicates::prelude::*;

/// Initialize, log in as admin, and create a selected project.
fn project_env() -> TestEnv {
    let env = TestEnv::init_admin();
    env.rb()
        .args(["project", "create", "Harbor Tunnel"])
        .assert()
        .success();
    env
}

/// Parse `rb notify list` output.
fn notify_list(env: &TestEnv) -> serde_json::Value {
    let output = env.rb().args(["notify", "list"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap()
}

/// ID of the newest notification for the session user.
fn newest_notification_id(env: &TestEnv) -> String {
    notify_list(env)["notifications"][0]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

// === Creation Side Effect Tests ===

#[test]
fn test_risk_create_notifies_acting_user() {
    let env = project_env();

    env.rb()
        .args(["risk", "create", "Groundwater ingress"])
        .assert()
        .success();

    env.rb()
        .args(["notify", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unread\":1"));

    let json = notify_list(&env);
    assert_eq!(json["count"], 1);
    assert_eq!(json["notifications"][0]["title"], "Risk added");
    assert_eq!(json["notifications"][0]["kind"], "info");
    assert_eq!(json["notifications"][0]["read"], false);
}

#[test]
fn test_risk_update_and_delete_notify() {
    let env = project_env();
    env.rb()
        .args(["risk", "create", "Groundwater ingress"])
        .assert()
        .success();
    env.rb()
        .args(["risk", "update", "1", "--name", "Renamed"])
        .assert()
        .success();
    env.rb()
        .args(["risk", "delete", "1", "--force"])
        .assert()
        .success();

    let json = notify_list(&env);
    assert_eq!(json["count"], 3);
    // Newest first; the delete notification is a warning.
    assert_eq!(json["notifications"][0]["title"], "Risk removed");
    assert_eq!(json["notifications"][0]["kind"], "warning");
    // The deleted risk is gone, so only the project is linked.
    assert!(json["notifications"][0].get("risk_id").is_none());
    assert_eq!(json["notifications"][1]["title"], "Risk updated");
}

// === Read Tests ===

#[test]
fn test_notify_read_decrements_unread() {
    let env = project_env();
    env.rb()
        .args(["risk", "create", "First"])
        .assert()
        .success();
    env.rb()
        .args(["risk", "create", "Second"])
        .assert()
        .success();

    let id = newest_notification_id(&env);
    env.rb()
        .args(["notify", "read", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\"id\":\"{}\"", id)));

    env.rb()
        .args(["notify", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unread\":1"));
}

#[test]
fn test_notify_list_unread_only() {
    let env = project_env();
    env.rb()
        .args(["risk", "create", "First"])
        .assert()
        .success();
    env.rb()
        .args(["risk", "create", "Second"])
        .assert()
        .success();

    let id = newest_notification_id(&env);
    env.rb().args(["notify", "read", &id]).assert().success();

    env.rb()
        .args(["notify", "list", "--unread"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":1"))
        .stdout(predicate::str::contains("\"unread\":1"));

    // The full list still has both.
    assert_eq!(notify_list(&env)["count"], 2);
}

#[test]
fn test_notify_read_all() {
    let env = project_env();
    for name in ["First", "Second", "Third"] {
        env.rb().args(["risk", "create", name]).assert().success();
    }

    env.rb()
        .args(["notify", "read-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"marked\":3"));

    env.rb()
        .args(["notify", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unread\":0"));

    // Marking again finds nothing unread.
    env.rb()
        .args(["notify", "read-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"marked\":0"));
}

#[test]
fn test_notify_read_rejects_malformed_id() {
    let env = project_env();

    env.rb()
        .args(["notify", "read", "xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid ID format"));
}

#[test]
fn test_notify_read_unknown_id() {
    let env = project_env();

    env.rb()
        .args(["notify", "read", "ntf-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// === Delete Tests ===

#[test]
fn test_notify_delete_removes_notification() {
    let env = project_env();
    env.rb()
        .args(["risk", "create", "Groundwater ingress"])
        .assert()
        .success();

    let id = newest_notification_id(&env);
    env.rb()
        .args(["notify", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\"id\":\"{}\"", id)));

    assert_eq!(notify_list(&env)["count"], 0);
}

// === Per-User Scoping Tests ===

#[test]
fn test_notifications_are_per_user() {
    let env = project_env();
    env.rb()
        .args(["risk", "create", "Admin risk"])
        .assert()
        .success();

    // The manager starts with an empty inbox and only sees their own.
    env.login("manager", "manager123");
    env.rb()
        .args(["notify", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unread\":0"));

    env.rb()
        .args(["risk", "create", "Manager risk"])
        .assert()
        .success();
    let json = notify_list(&env);
    assert_eq!(json["count"], 1);
    assert!(
        json["notifications"][0]["message"]
            .as_str()
            .unwrap()
            .contains("manager")
    );

    // Admin's inbox is untouched by the manager's read-all.
    env.rb().args(["notify", "read-all"]).assert().success();
    env.login("admin", "admin123");
    env.rb()
        .args(["notify", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unread\":1"));
}

#[test]
fn test_notify_requires_session() {
    let env = TestEnv::init();

    env.rb()
        .args(["notify", "count"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

// === Human Output Tests ===

#[test]
fn test_notify_list_human_marks_unread() {
    let env = project_env();
    env.rb()
        .args(["risk", "create", "Groundwater ingress"])
        .assert()
        .success();

    env.rb()
        .args(["-H", "notify", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* "))
        .stdout(predicate::str::contains("[info] Risk added"));
}
