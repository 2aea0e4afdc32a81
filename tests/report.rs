use std::fs;

use gherkin_bridge::{
    aggregate,
    messages::{Ndjson, Publisher},
    Config, EventLog, IdGenerator, Loader, MessageAssembler, Registry,
};
use serde_json::Value;

const MANIFEST: &str = include_str!("features/steps.json");

const CUKES: &str = include_str!("features/cukes.feature");

/// First attempt fails on worker 0, the retry passes on worker 1. A second
/// test was skipped before running, and one line is garbage.
const RECORDS: &str = r#"
{"type": "testEnd", "file": "cukes.feature.rs", "line": 7, "titlePath": ["eating"], "worker": 0, "attempt": 0, "status": "failed", "startTime": 1000, "durationMs": 40, "bdd": {"uri": "features/cukes.feature", "pickleLine": 2}, "steps": [{"index": 0, "status": "passed", "startTime": 1010, "durationMs": 5}, {"index": 1, "status": "failed", "startTime": 1015, "durationMs": 5, "error": "too many"}], "hooks": [{"hook": 0, "kind": "before", "status": "passed", "startTime": 1005, "durationMs": 5}, {"hook": 1, "kind": "beforeAll", "status": "passed", "startTime": 1000, "durationMs": 2}]}
{"type": "testEnd", "file": "other.feature.rs", "line": 3, "titlePath": ["later"], "status": "skipped", "startTime": 1000}
not json at all
{"type": "testEnd", "file": "cukes.feature.rs", "line": 7, "titlePath": ["eating"], "worker": 1, "attempt": 1, "status": "passed", "startTime": 1100, "durationMs": 30, "bdd": {"uri": "features/cukes.feature", "pickleLine": 2}, "steps": [{"index": 0, "status": "passed", "startTime": 1110, "durationMs": 5}, {"index": 1, "status": "passed", "startTime": 1115, "durationMs": 5}, {"index": 2, "status": "passed", "startTime": 1120, "durationMs": 5}], "hooks": [{"hook": 0, "kind": "before", "status": "passed", "startTime": 1105, "durationMs": 5}, {"hook": 1, "kind": "beforeAll", "status": "passed", "startTime": 1100, "durationMs": 2}]}
{"type": "runEnd", "startTime": 1000, "durationMs": 500, "status": "passed"}
"#;

struct Report {
    messages: Vec<Value>,
    anomalies: usize,
}

impl Report {
    fn kinds(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| m.as_object()?.keys().next().map(String::as_str))
            .collect()
    }

    fn all(&self, kind: &str) -> Vec<&Value> {
        self.messages.iter().filter_map(|m| m.get(kind)).collect()
    }
}

async fn report() -> Report {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("features")).unwrap();
    fs::write(dir.path().join("features/cukes.feature"), CUKES).unwrap();
    fs::write(dir.path().join("steps.json"), MANIFEST).unwrap();
    let config = Config { base_dir: dir.path().to_path_buf(), ..Config::default() };

    let registry = Registry::load(&config.steps_path()).unwrap();
    let ids = IdGenerator::new();
    let loaded = Loader::new(&config, ids.clone()).load().await.unwrap();

    let (log, malformed) = EventLog::read_ndjson(RECORDS.as_bytes()).unwrap();
    assert_eq!(malformed.len(), 1);
    let aggregation = aggregate(&log);
    let assembler = MessageAssembler::new(&loaded, &registry, &aggregation, ids);

    let mut out = Vec::new();
    Publisher::new()
        .subscribe(Ndjson::new(&mut out))
        .publish(assembler.envelopes())
        .unwrap();

    let messages = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    Report { messages, anomalies: assembler.anomalies().count() }
}

#[tokio::test]
async fn orders_envelopes() {
    let report = report().await;
    let kinds = report.kinds();

    assert_eq!(
        kinds[..10],
        [
            "meta",
            "source",
            "gherkinDocument",
            "pickle",
            "stepDefinition",
            "stepDefinition",
            "stepDefinition",
            "hook",
            "hook",
            "testRunStarted",
        ],
    );
    assert_eq!(kinds[10], "testCase");
    assert_eq!(kinds.last(), Some(&"testRunFinished"));
    assert_eq!(report.anomalies, 0);

    let pos = |k: &str| kinds.iter().position(|x| *x == k).unwrap();
    assert!(pos("testRunHookStarted") < pos("testCaseStarted"));
}

#[tokio::test]
async fn groups_attempts_and_excludes_pre_skipped() {
    let report = report().await;

    assert_eq!(report.all("testCase").len(), 1);
    let started = report.all("testCaseStarted");
    assert_eq!(started.len(), 2);
    assert_eq!(started[0]["attempt"], 0);
    assert_eq!(started[0]["workerId"], "0");
    assert_eq!(started[1]["attempt"], 1);
    assert_eq!(started[1]["workerId"], "1");

    let retried = report
        .all("testCaseFinished")
        .iter()
        .map(|f| f["willBeRetried"].as_bool().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(retried, [true, false]);
}

#[tokio::test]
async fn reports_step_results_per_attempt() {
    let report = report().await;
    let started = report.all("testCaseStarted");

    let statuses = |attempt: &Value| {
        report
            .all("testStepFinished")
            .iter()
            .filter(|f| f["testCaseStartedId"] == attempt["id"])
            .map(|f| f["testStepResult"]["status"].as_str().unwrap().to_owned())
            .collect::<Vec<_>>()
    };

    assert_eq!(statuses(started[0]), ["PASSED", "PASSED", "FAILED", "SKIPPED"]);
    assert_eq!(statuses(started[1]), ["PASSED"; 4]);

    let failed = report
        .all("testStepFinished")
        .into_iter()
        .find(|f| f["testStepResult"]["status"] == "FAILED")
        .unwrap();
    assert_eq!(failed["testStepResult"]["message"], "too many");
}

#[tokio::test]
async fn binds_steps_to_definitions() {
    let report = report().await;
    let case = report.all("testCase")[0];
    let steps = case["testSteps"].as_array().unwrap();

    assert_eq!(steps.len(), 4);
    assert!(steps[0].get("hookId").is_some());
    let defs = report.all("stepDefinition");
    assert_eq!(steps[1]["stepDefinitionIds"][0], defs[0]["id"]);
    assert_eq!(
        steps[1]["stepMatchArgumentsLists"][0]["stepMatchArguments"][0]["group"]
            ["value"],
        "5",
    );
}

#[tokio::test]
async fn deduplicates_global_hooks_per_worker() {
    let report = report().await;

    assert_eq!(report.all("testRunHookStarted").len(), 2);
    assert_eq!(report.all("testRunHookFinished").len(), 2);
}

#[tokio::test]
async fn derives_run_outcome_from_run_end() {
    let report = report().await;

    let started = report.all("testRunStarted")[0];
    assert_eq!(started["timestamp"]["seconds"], 1);
    assert_eq!(started["timestamp"]["nanos"], 0);

    let finished = report.all("testRunFinished")[0];
    assert_eq!(finished["success"], true);
    assert_eq!(finished["timestamp"]["seconds"], 1);
    assert_eq!(finished["timestamp"]["nanos"], 500_000_000);
    assert_eq!(finished["testRunStartedId"], started["id"]);
}
