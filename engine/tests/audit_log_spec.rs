use chrono::Utc;
use engine::audit::{AuditError, AuditRecord, AuditSink, JsonlAuditLog};
use engine::service::Decision;
use std::fs;
use tempfile::TempDir;

fn record(requester: &str) -> AuditRecord {
    AuditRecord {
        timestamp: Utc::now(),
        requester: requester.to_string(),
        use_case: "document_categorization".to_string(),
        model_version: "v1.0.0".to_string(),
        decision: Decision {
            predicted_label: "ENVIRONMENTAL".to_string(),
            confidence: 0.82,
            human_review_required: false,
        },
    }
}

#[test]
fn append_writes_one_parseable_line_per_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inference_log.jsonl");

    let mut log = JsonlAuditLog::open(&path).unwrap();
    let first = record("analyst-1");
    let second = record("analyst-2");
    log.append(&first).unwrap();
    log.append(&second).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: AuditRecord = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed, first);
    let parsed: AuditRecord = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(parsed, second);
}

#[test]
fn wire_format_uses_snake_case_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inference_log.jsonl");

    let mut log = JsonlAuditLog::open(&path).unwrap();
    log.append(&record("analyst-1")).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    for field in ["timestamp", "requester", "use_case", "model_version", "decision"] {
        assert!(value.get(field).is_some(), "missing field {}", field);
    }
    let decision = value.get("decision").unwrap();
    for field in ["predicted_label", "confidence", "human_review_required"] {
        assert!(decision.get(field).is_some(), "missing field {}", field);
    }
}

#[test]
fn creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs").join("audit").join("inference_log.jsonl");

    let mut log = JsonlAuditLog::open(&path).unwrap();
    log.append(&record("analyst-1")).unwrap();

    assert!(path.exists());
}

#[test]
fn reopen_appends_rather_than_truncates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inference_log.jsonl");

    {
        let mut log = JsonlAuditLog::open(&path).unwrap();
        log.append(&record("analyst-1")).unwrap();
    }
    {
        let mut log = JsonlAuditLog::open(&path).unwrap();
        log.append(&record("analyst-2")).unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn unwritable_path_fails_at_open() {
    let dir = TempDir::new().unwrap();
    // the path is an existing directory, not a file
    let err = JsonlAuditLog::open(dir.path()).unwrap_err();
    assert!(matches!(err, AuditError::Open { .. }));
}
