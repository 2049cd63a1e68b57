use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use quoteguard_cli::commands::{approve, cancel, config, confirm, resolve};
use quoteguard_core::config::AppConfig;
use rust_decimal::Decimal;
use serde_json::{json, Value};

#[test]
fn resolve_routes_mid_band_total_to_manager() {
    let result = resolve::run(&AppConfig::default(), Decimal::new(750, 0), Some("employee"));
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "resolve");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["decision"], "route_to_approver");
    assert_eq!(payload["data"]["tier"], "manager_review");
    assert_eq!(payload["data"]["role"], "manager_level_1");
}

#[test]
fn resolve_rejects_unknown_role_token() {
    let result = resolve::run(&AppConfig::default(), Decimal::new(100, 0), Some("intern"));

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["decision"], "reject");
    assert_eq!(payload["data"]["reason"]["kind"], "unknown_role");
    assert_eq!(payload["data"]["reason"]["token"], "intern");
}

#[test]
fn resolve_rejects_missing_role_in_standard_band() {
    let result = resolve::run(&AppConfig::default(), Decimal::new(499, 0), None);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["reason"]["kind"], "missing_acting_role");
    let message = payload["message"].as_str().unwrap_or_default();
    assert!(message.starts_with("Sale order not confirmed"));
}

#[test]
fn confirm_small_order_updates_fixture_and_reports_training_event() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path());

    let result = confirm::run(&AppConfig::default(), &path, &["S1".to_string()], "e-sam");
    assert_eq!(result.exit_code, 0, "expected confirm success: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "confirm");
    assert_eq!(payload["status"], "ok");
    let outcome = &payload["data"]["results"][0]["outcome"];
    assert_eq!(outcome["outcome"], "confirmed");
    assert_eq!(outcome["tier"], "standard");
    assert_eq!(outcome["events"][0]["request"]["title"], "Training: CRM Onboarding");
    assert_eq!(payload["data"]["notices"][0]["body"], "Sam Seller confirmed the quotation S1.");

    let saved = read_fixture(&path);
    assert_eq!(saved["orders"][0]["state"], "confirmed");
    assert_eq!(saved["orders"][1]["state"], "draft");
}

#[test]
fn confirm_then_approve_completes_the_approval_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path());

    let routed = confirm::run(&AppConfig::default(), &path, &["S2".to_string()], "e-sam");
    let payload = parse_payload(&routed.output);
    let outcome = &payload["data"]["results"][0]["outcome"];
    assert_eq!(outcome["outcome"], "pending_approval");
    assert_eq!(outcome["approval"]["approver_id"], "e-mia");
    let approval_id = outcome["approval"]["id"].as_str().expect("approval id").to_string();

    let saved = read_fixture(&path);
    assert_eq!(saved["orders"][1]["state"], "draft");
    assert_eq!(saved["approvals"][0]["status"], "pending");

    let approved = approve::run(&AppConfig::default(), &path, &approval_id, "e-mia", "ok");
    assert_eq!(approved.exit_code, 0, "expected approve success: {}", approved.output);
    let payload = parse_payload(&approved.output);
    assert_eq!(payload["data"]["outcome"]["outcome"], "confirmed");

    let saved = read_fixture(&path);
    assert_eq!(saved["orders"][1]["state"], "confirmed");
    assert_eq!(saved["approvals"][0]["status"], "done");
    assert_eq!(saved["approvals"][0]["feedback"], "ok");

    let again = approve::run(&AppConfig::default(), &path, &approval_id, "e-mia", "ok");
    assert_eq!(again.exit_code, 4);
    assert_eq!(parse_payload(&again.output)["error_class"], "approval_closed");
}

#[test]
fn approve_refuses_an_approver_below_the_routed_role() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path());

    let routed = confirm::run(&AppConfig::default(), &path, &["S2".to_string()], "e-sam");
    let payload = parse_payload(&routed.output);
    let approval_id = payload["data"]["results"][0]["outcome"]["approval"]["id"]
        .as_str()
        .expect("approval id")
        .to_string();

    let refused = approve::run(&AppConfig::default(), &path, &approval_id, "e-sam", "mine");
    assert_eq!(refused.exit_code, 4);
    assert_eq!(parse_payload(&refused.output)["error_class"], "not_authorized");

    let saved = read_fixture(&path);
    assert_eq!(saved["orders"][1]["state"], "draft");
    assert_eq!(saved["approvals"].as_array().expect("approvals").len(), 1);
    assert_eq!(saved["approvals"][0]["status"], "pending");
}

#[test]
fn confirm_batch_reports_unknown_orders_per_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path());

    let orders = ["S1".to_string(), "S404".to_string()];
    let result = confirm::run(&AppConfig::default(), &path, &orders, "e-sam");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["results"][0]["outcome"]["outcome"], "confirmed");
    assert_eq!(payload["data"]["results"][1]["error_class"], "not_found");
    assert_eq!(payload["message"], "1 of 2 orders confirmed by Sam Seller");
}

#[test]
fn confirm_fails_for_missing_fixture_and_unknown_actor() {
    let dir = tempfile::tempdir().expect("tempdir");

    let missing = confirm::run(
        &AppConfig::default(),
        &dir.path().join("absent.json"),
        &["S1".to_string()],
        "e-sam",
    );
    assert_eq!(missing.exit_code, 3);
    assert_eq!(parse_payload(&missing.output)["error_class"], "fixture");

    let path = write_fixture(dir.path());
    let unknown = confirm::run(&AppConfig::default(), &path, &["S1".to_string()], "e-ghost");
    assert_eq!(unknown.exit_code, 3);
    assert_eq!(parse_payload(&unknown.output)["error_class"], "unknown_actor");
}

#[test]
fn cancel_rejects_second_cancellation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path());

    let first = cancel::run(&AppConfig::default(), &path, "S1", "e-sam");
    assert_eq!(first.exit_code, 0, "expected cancel success: {}", first.output);
    assert_eq!(read_fixture(&path)["orders"][0]["state"], "cancelled");

    let second = cancel::run(&AppConfig::default(), &path, "S1", "e-sam");
    assert_eq!(second.exit_code, 4);
    assert_eq!(parse_payload(&second.output)["error_class"], "invalid_transition");
}

#[test]
fn config_reports_env_source_for_overridden_cap() {
    with_env(&[("QUOTEGUARD_POLICY_LIMITED_CAP", "300")], || {
        let output = config::run(None);
        assert!(output.contains("- policy.limited_cap = 300 (source: env (QUOTEGUARD_POLICY_LIMITED_CAP))"));
        assert!(output.contains("- policy.manager_threshold = 500 (source: default)"));
    });
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("QUOTEGUARD_POLICY_SENIOR_THRESHOLD", "100")], || {
        let output = config::run(None);
        assert!(output.starts_with("config validation failed"));
    });
}

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let fixture = json!({
        "employees": [
            { "id": "e-sam", "name": "Sam Seller", "role": "employee", "user_id": "u-sam" },
            { "id": "e-mia", "name": "Mia Manager", "role": "manager_level_1", "user_id": "u-mia" },
            { "id": "e-ada", "name": "Ada Admin", "role": "administrator", "user_id": "u-ada" }
        ],
        "orders": [
            {
                "id": "S1",
                "name": "S1",
                "partner": { "id": "P-1", "name": "Acme Realty", "city": "Lyon" },
                "owner": "u-sam",
                "state": "draft",
                "lines": [
                    {
                        "id": "L1",
                        "unit_price": "300",
                        "training_date": "2026-11-03",
                        "product": { "id": "p-crm", "name": "CRM Onboarding" }
                    }
                ]
            },
            {
                "id": "S2",
                "name": "S2",
                "partner": { "id": "P-1", "name": "Acme Realty" },
                "owner": "u-sam",
                "lines": [ { "id": "L1", "unit_price": 750 } ]
            }
        ]
    });

    let path = dir.join("fixture.json");
    fs::write(&path, fixture.to_string()).expect("write fixture");
    path
}

fn read_fixture(path: &Path) -> Value {
    parse_payload(&fs::read_to_string(path).expect("read fixture"))
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "QUOTEGUARD_POLICY_MANAGER_THRESHOLD",
        "QUOTEGUARD_POLICY_SENIOR_THRESHOLD",
        "QUOTEGUARD_POLICY_EXECUTIVE_THRESHOLD",
        "QUOTEGUARD_POLICY_LIMITED_CAP",
        "QUOTEGUARD_APPROVAL_DEADLINE_DAYS",
        "QUOTEGUARD_TRAINING_SHAPE",
        "QUOTEGUARD_TRAINING_DURATION_HOURS",
        "QUOTEGUARD_TRAINING_REMINDER_MINUTES",
        "QUOTEGUARD_LOGGING_LEVEL",
        "QUOTEGUARD_LOGGING_FORMAT",
        "QUOTEGUARD_LOG_LEVEL",
        "QUOTEGUARD_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
