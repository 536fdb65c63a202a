use pipeline::{RepositoryId, RunId, ScriptExit, Timestamp, WorkflowName};

use super::*;

fn record(workflow: &str, outcome: JobOutcome) -> RunRecord {
    RunRecord {
        run_id: RunId::new_random(),
        workflow: WorkflowName::new(workflow).unwrap(),
        outcome,
        started_at: Timestamp::now(),
        finished_at: Timestamp::now(),
    }
}

fn report(runs: Vec<RunRecord>) -> DispatchReport {
    DispatchReport {
        event: "push".to_string(),
        repository: RepositoryId::new("acme/governance").unwrap(),
        runs,
    }
}

#[test]
fn test_empty_report_exits_zero() {
    let report = report(Vec::new());
    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_skipped_jobs_do_not_fail_the_dispatch() {
    let report = report(vec![
        record("a", JobOutcome::Succeeded),
        record(
            "b",
            JobOutcome::Skipped {
                reason: "label 'x' not present".to_string(),
            },
        ),
    ]);
    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_first_failure_in_definition_order_decides_exit_code() {
    let report = report(vec![
        record("a", JobOutcome::Succeeded),
        record(
            "b",
            JobOutcome::ScriptFailed {
                exit: ScriptExit::Code { code: 4 },
            },
        ),
        record(
            "c",
            JobOutcome::Errored {
                stage: FailureStage::Credentials,
                message: "not installed".to_string(),
            },
        ),
    ]);
    assert!(!report.is_success());
    assert_eq!(report.exit_code(), 4);
    assert_eq!(report.count(|o| !o.is_success()), 2);
}

#[test]
fn test_non_script_failures_map_to_one() {
    let errored = JobOutcome::Errored {
        stage: FailureStage::Launch,
        message: "not found".to_string(),
    };
    assert_eq!(errored.exit_code(), 1);
    assert_eq!(
        JobOutcome::ScriptFailed {
            exit: ScriptExit::Signal
        }
        .exit_code(),
        1
    );
}

#[test]
fn test_outcome_serializes_with_tag() {
    let json = serde_json::to_value(JobOutcome::ScriptFailed {
        exit: ScriptExit::Code { code: 2 },
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "outcome": "script_failed", "exit": { "kind": "code", "code": 2 } })
    );
    assert_eq!(FailureStage::ChangedFiles.to_string(), "changed_files");
}
