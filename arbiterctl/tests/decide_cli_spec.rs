use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CHARTER: &str = r#"
usage:
  approved:
    - document_categorization
    - analyst_support
  prohibited:
    - automated_compliance_decisions
risk_controls:
  confidence_threshold: 0.7
  human_in_the_loop: true
"#;

const MODEL: &str = r#"{
  "model_version": "v1.0.0",
  "classes": ["ENVIRONMENTAL", "PRODUCT_SAFETY"],
  "vectorizer": {
    "ngram_range": [1, 2],
    "vocabulary": {"waste": 0, "helmet": 1, "hazardous waste": 2},
    "idf": [1.0, 1.0, 1.5]
  },
  "coefficients": [[2.0, -1.0, 1.0], [-1.0, 2.0, -1.0]],
  "intercepts": [0.0, 0.0]
}"#;

struct Fixture {
    _dir: TempDir,
    governance: PathBuf,
    model: PathBuf,
    audit_log: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let governance = dir.path().join("governance.yaml");
    let model = dir.path().join("model.json");
    let audit_log = dir.path().join("logs").join("inference_log.jsonl");
    fs::write(&governance, CHARTER).unwrap();
    fs::write(&model, MODEL).unwrap();
    Fixture {
        _dir: dir,
        governance,
        model,
        audit_log,
    }
}

fn arbiterctl() -> Command {
    Command::cargo_bin("arbiterctl").unwrap()
}

#[test]
fn decide_prints_decision_and_appends_audit_record() {
    let fx = fixture();

    arbiterctl()
        .args([
            "decide",
            "hazardous waste disposal",
            "--use-case",
            "document_categorization",
            "--requester",
            "analyst-1",
            "--governance",
            fx.governance.to_str().unwrap(),
            "--model",
            fx.model.to_str().unwrap(),
            "--audit-log",
            fx.audit_log.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"predicted_label\": \"ENVIRONMENTAL\""));

    let log = fs::read_to_string(&fx.audit_log).unwrap();
    assert_eq!(log.lines().count(), 1);
    let record: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(record["requester"], "analyst-1");
    assert_eq!(record["use_case"], "document_categorization");
    assert_eq!(record["model_version"], "v1.0.0");
}

#[test]
fn low_confidence_decision_warns_about_human_review() {
    let fx = fixture();

    // "waste helmet" scores both classes identically: the tie resolves to
    // the first label at confidence 0.5, below the 0.7 threshold
    arbiterctl()
        .args([
            "decide",
            "waste helmet",
            "--use-case",
            "analyst_support",
            "--requester",
            "analyst-1",
            "--governance",
            fx.governance.to_str().unwrap(),
            "--model",
            fx.model.to_str().unwrap(),
            "--audit-log",
            fx.audit_log.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"predicted_label\": \"ENVIRONMENTAL\""))
        .stdout(predicate::str::contains("\"human_review_required\": true"))
        .stderr(predicate::str::contains("Human review required"));
}

#[test]
fn prohibited_use_case_is_blocked_with_exit_code_2() {
    let fx = fixture();

    arbiterctl()
        .args([
            "decide",
            "this device is approved for market release",
            "--use-case",
            "automated_compliance_decisions",
            "--requester",
            "system_bot",
            "--governance",
            fx.governance.to_str().unwrap(),
            "--model",
            fx.model.to_str().unwrap(),
            "--audit-log",
            fx.audit_log.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Blocked by governance"));

    // rejected requests leave no audit record
    let log = fs::read_to_string(&fx.audit_log).unwrap();
    assert_eq!(log.lines().count(), 0);
}

#[test]
fn validate_accepts_a_good_charter() {
    let fx = fixture();

    arbiterctl()
        .args(["validate", "--governance", fx.governance.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn validate_reports_schema_violations() {
    let fx = fixture();
    fs::write(
        &fx.governance,
        r#"
usage:
  approved: [document_categorization]
  prohibited: []
risk_controls:
  confidence_threshold: high
  human_in_the_loop: true
"#,
    )
    .unwrap();

    arbiterctl()
        .args(["validate", "--governance", fx.governance.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("confidence_threshold"));
}

#[test]
fn risk_writes_artifacts() {
    let fx = fixture();
    let stress = fx._dir.path().join("stress.json");
    let out = fx._dir.path().join("risk");
    fs::write(
        &stress,
        r#"[{"id": "s1", "text": "waste helmet"}, {"id": "s2", "text": "hazardous waste"}]"#,
    )
    .unwrap();

    arbiterctl()
        .args([
            "risk",
            "--stress",
            stress.to_str().unwrap(),
            "--model",
            fx.model.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let low: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("low_confidence_predictions.json")).unwrap())
            .unwrap();
    assert_eq!(low.as_array().unwrap().len(), 1);
    assert_eq!(low[0]["id"], "s1");

    let pairs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("confusion_pairs.json")).unwrap()).unwrap();
    assert_eq!(pairs.as_array().unwrap().len(), 1);
}
