//! The serialized report shape and its JSON round-trip guarantees.

use verdict::{Status, ValidateInput, ValidationReport, run_checks, version};

fn report_json(document: &str, rules: &str) -> String {
    run_checks(
        ValidateInput {
            content: document,
            name: "data.yaml",
        },
        ValidateInput {
            content: rules,
            name: "checks",
        },
        false,
    )
    .unwrap()
}

#[test]
fn test_report_is_valid_json_with_expected_shape() {
    let json = report_json("a: 1\n", "rule r { a == 1 }");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["status"], "PASS");
    assert_eq!(value["rules"][0]["name"], "r");
    assert_eq!(value["rules"][0]["status"], "PASS");
    assert_eq!(value["rules"][0]["clauses"][0]["clause"], "a == 1");
    assert!(value["rules"][0]["clauses"][0]["line"].is_u64());
}

#[test]
fn test_round_trip_preserves_status_and_order() {
    let json = report_json(
        "a: 1\nb: 2\n",
        "rule one { a == 1 }\nrule two { b == 9 }\nrule three { c exists }",
    );
    let report = ValidationReport::from_json(&json).unwrap();
    assert_eq!(report.status, Status::Fail);
    let statuses: Vec<_> = report.rules.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![Status::Pass, Status::Fail, Status::Fail]);

    // Serializing again reproduces the same document.
    let again = report.to_json().unwrap();
    assert_eq!(ValidationReport::from_json(&again).unwrap(), report);
}

#[test]
fn test_passing_clauses_have_no_message() {
    let json = report_json("a: 1\n", "rule r { a == 1 }");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["rules"][0]["clauses"][0].get("message").is_none());
}

#[test]
fn test_version_is_semver_shaped() {
    let v = version();
    assert_eq!(v.split('.').count(), 3);
    assert!(v.split('.').all(|part| part.chars().all(|c| c.is_ascii_digit())));
}
