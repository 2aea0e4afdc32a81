// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`MessageAssembler`] building the ordered [`Envelope`] sequence.

use std::collections::HashMap;

use once_cell::unsync::OnceCell;

use super::{
    envelope::{
        Envelope, Group, Hook, Meta, Source, StepDefinition,
        StepDefinitionPattern, StepMatchArgument, StepMatchArgumentsList,
        TestCase, TestCaseFinished, TestCaseStarted, TestRunFinished,
        TestRunHookFinished, TestRunHookStarted, TestRunStarted, TestStep,
        TestStepFinished, TestStepResult, TestStepResultStatus,
        TestStepStarted,
    },
    timestamp::{Duration, Timestamp},
};
use crate::{
    hook::{HookId, HookKind},
    id::IdGenerator,
    parser::Loaded,
    registry::Registry,
    report::{self, Aggregation, Anomaly, HookInstance, RunStatus, TestCaseRun},
    step::DefinitionId,
};

/// Builder of the [`Envelope`] sequence of a single report.
///
/// The sequence is built once, on first access, and cached afterwards.
#[derive(Debug)]
pub struct MessageAssembler<'a> {
    loaded: &'a Loaded,
    registry: &'a Registry,
    aggregation: &'a Aggregation,
    ids: IdGenerator,
    built: OnceCell<Built>,
}

#[derive(Debug)]
struct Built {
    envelopes: Vec<Envelope>,
    anomalies: Vec<Anomaly>,
}

impl<'a> MessageAssembler<'a> {
    /// Creates a new [`MessageAssembler`].
    ///
    /// The `ids` must be the [`IdGenerator`] the `loaded` documents were
    /// loaded with, so no ID is issued twice.
    #[must_use]
    pub fn new(
        loaded: &'a Loaded,
        registry: &'a Registry,
        aggregation: &'a Aggregation,
        ids: IdGenerator,
    ) -> Self {
        Self { loaded, registry, aggregation, ids, built: OnceCell::new() }
    }

    /// Returns the ordered [`Envelope`] sequence.
    pub fn envelopes(&self) -> &[Envelope] {
        &self.built().envelopes
    }

    /// Returns the [`Anomaly`]s found while aggregating and assembling.
    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> + '_ {
        self.aggregation.anomalies.iter().chain(&self.built().anomalies)
    }

    fn built(&self) -> &Built {
        self.built.get_or_init(|| {
            let built = Build::new(self).run();
            tracing::info!(
                envelopes = built.envelopes.len(),
                anomalies = built.anomalies.len(),
                "assembled messages",
            );
            built
        })
    }
}

/// Planned step of a [`TestCase`].
#[derive(Clone, Copy, Debug)]
enum Planned {
    Hook { hook: HookId, step: Option<usize> },
    Pickle { index: usize, unmatched: Option<TestStepResultStatus> },
}

/// [`TestCase`] along with its aggregated counterpart.
struct PlannedCase<'a> {
    id: String,
    case: &'a report::TestCase,
    steps: Vec<(String, Planned)>,
}

/// State of a single build.
struct Build<'s, 'a> {
    asm: &'s MessageAssembler<'a>,
    out: Vec<Envelope>,
    anomalies: Vec<Anomaly>,
    step_ids: HashMap<DefinitionId, String>,
    hook_ids: HashMap<HookId, String>,
    run_id: String,
}

impl<'s, 'a> Build<'s, 'a> {
    fn new(asm: &'s MessageAssembler<'a>) -> Self {
        Self {
            asm,
            out: Vec::new(),
            anomalies: Vec::new(),
            step_ids: HashMap::new(),
            hook_ids: HashMap::new(),
            run_id: String::new(),
        }
    }

    fn run(mut self) -> Built {
        let MessageAssembler { loaded, registry, aggregation, .. } = *self.asm;

        self.out.push(Envelope::Meta(Meta::current()));
        for doc in &loaded.documents {
            self.out.push(Envelope::Source(Source::of(doc)));
            self.out.push(Envelope::GherkinDocument(doc.clone()));
        }
        for pickle in &loaded.pickles {
            self.out.push(Envelope::Pickle(pickle.clone()));
        }
        self.definitions(registry);

        let (started, finished) = self.run_timing();
        self.run_id = self.asm.ids.next_id();
        self.out.push(Envelope::TestRunStarted(TestRunStarted {
            timestamp: Timestamp::from_millis(started),
            id: self.run_id.clone(),
        }));

        let cases = aggregation
            .test_cases
            .iter()
            .filter_map(|tc| self.test_case(tc))
            .collect::<Vec<_>>();

        self.global_hooks(HookKind::BeforeAll);
        for planned in &cases {
            for (n, run) in planned.case.runs.iter().enumerate() {
                self.test_case_run(planned, run, planned.case.will_be_retried(n));
            }
        }
        self.global_hooks(HookKind::AfterAll);

        let success = aggregation.run_end.as_ref().map_or_else(
            || {
                tracing::warn!("host reported no end of run, assuming failure");
                false
            },
            |end| end.status == RunStatus::Passed,
        );
        self.out.push(Envelope::TestRunFinished(TestRunFinished {
            success,
            timestamp: Timestamp::from_millis(finished),
            test_run_started_id: self.run_id.clone(),
        }));

        Built { envelopes: self.out, anomalies: self.anomalies }
    }

    fn definitions(&mut self, registry: &Registry) {
        for def in registry.steps.definitions() {
            let id = self.asm.ids.next_id();
            _ = self.step_ids.insert(def.id, id.clone());
            self.out.push(Envelope::StepDefinition(StepDefinition {
                id,
                pattern: StepDefinitionPattern {
                    source: def.pattern.source().to_owned(),
                    ty: def.pattern.kind(),
                },
                source_reference: def.location.as_ref().into(),
            }));
        }
        for def in registry.hooks.definitions() {
            let id = self.asm.ids.next_id();
            _ = self.hook_ids.insert(def.id, id.clone());
            self.out.push(Envelope::Hook(Hook {
                id,
                name: def.name.clone(),
                source_reference: def.location.as_ref().into(),
                tag_expression: def.tags.as_ref().map(|t| t.source().to_owned()),
                ty: def.kind.message_type(),
            }));
        }
    }

    /// Start and finish of the whole run, in milliseconds since the Unix
    /// epoch.
    fn run_timing(&self) -> (u64, u64) {
        let agg = self.asm.aggregation;
        let runs = agg.test_cases.iter().flat_map(|tc| &tc.runs);
        let starts = runs
            .clone()
            .map(|r| r.start_time)
            .chain(agg.global_hooks.iter().map(|h| h.start_time));
        let ends = runs
            .map(TestCaseRun::end_time)
            .chain(agg.global_hooks.iter().map(HookInstance::end_time));

        let end = agg.run_end.as_ref();
        let start = end
            .and_then(|e| e.start_time)
            .or_else(|| starts.min())
            .unwrap_or_default();
        let finish = end
            .and_then(|e| e.duration_ms)
            .map(|d| start.saturating_add(d))
            .or_else(|| ends.max())
            .unwrap_or(start);
        (start, finish.max(start))
    }

    /// Emits the `testCase` of the given aggregated one, and plans its steps.
    fn test_case(&mut self, case: &'a report::TestCase) -> Option<PlannedCase<'a>> {
        let loaded = self.asm.loaded;
        let Some(pickle) = loaded.pickle_at(&case.bdd.uri, case.bdd.pickle_line) else {
            Anomaly::UnknownPickle {
                uri: case.bdd.uri.clone(),
                line: case.bdd.pickle_line,
            }
            .record(&mut self.anomalies);
            return None;
        };

        for index in case.runs.iter().flat_map(|r| &r.steps).map(|s| s.index) {
            if index >= pickle.steps.len() {
                Anomaly::UnknownStep {
                    identity: case.identity.clone(),
                    index,
                    count: pickle.steps.len(),
                }
                .record(&mut self.anomalies);
            }
        }

        let registry = self.asm.registry;
        let mut items = Vec::<(Planned, TestStep)>::new();

        for (hook, _) in self.hooks_of(case, HookKind::Before, None) {
            items.push((Planned::Hook { hook, step: None }, self.hook_step(hook)));
        }
        for (index, ps) in pickle.steps.iter().enumerate() {
            for (hook, step) in self.hooks_of(case, HookKind::BeforeStep, Some(index)) {
                items.push((Planned::Hook { hook, step }, self.hook_step(hook)));
            }

            let matches =
                registry.steps.matches(ps.resolved, &ps.text, pickle.tag_names());
            let unmatched = match matches.len() {
                0 => Some(TestStepResultStatus::Undefined),
                1 => None,
                _ => Some(TestStepResultStatus::Ambiguous),
            };
            let definition_ids = matches
                .iter()
                .filter_map(|m| self.step_ids.get(&m.definition.id).cloned())
                .collect();
            let arguments = matches
                .iter()
                .map(|m| StepMatchArgumentsList {
                    step_match_arguments: m
                        .arguments
                        .iter()
                        .map(|a| StepMatchArgument {
                            group: Group {
                                children: vec![],
                                start: Some(a.start),
                                value: Some(a.raw.clone()),
                            },
                            parameter_type_name: a.parameter_type,
                        })
                        .collect(),
                })
                .collect();
            items.push((
                Planned::Pickle { index, unmatched },
                TestStep {
                    id: self.asm.ids.next_id(),
                    hook_id: None,
                    pickle_step_id: Some(ps.id.clone()),
                    step_definition_ids: Some(definition_ids),
                    step_match_arguments_lists: Some(arguments),
                },
            ));

            for (hook, step) in self.hooks_of(case, HookKind::AfterStep, Some(index)) {
                items.push((Planned::Hook { hook, step }, self.hook_step(hook)));
            }
        }
        for (hook, _) in self.hooks_of(case, HookKind::After, None) {
            items.push((Planned::Hook { hook, step: None }, self.hook_step(hook)));
        }

        let (plan, test_steps): (Vec<_>, Vec<_>) = items
            .into_iter()
            .map(|(planned, step)| ((step.id.clone(), planned), step))
            .unzip();

        let id = self.asm.ids.next_id();
        self.out.push(Envelope::TestCase(TestCase {
            id: id.clone(),
            pickle_id: pickle.id.clone(),
            test_steps,
            test_run_started_id: self.run_id.clone(),
        }));
        Some(PlannedCase { id, case, steps: plan })
    }

    /// Returns the registered hooks of the given `kind` observed in any run
    /// of the `case` (around the given `step`, for step hooks), in execution
    /// order.
    fn hooks_of(
        &mut self,
        case: &report::TestCase,
        kind: HookKind,
        step: Option<usize>,
    ) -> Vec<(HookId, Option<usize>)> {
        let hooks = &self.asm.registry.hooks;
        let mut found = Vec::new();
        for (hook, at) in case.observed_hooks(kind) {
            if at != step {
                continue;
            }
            match hooks.execution_key(hook) {
                Some(key) => found.push((key, (hook, at))),
                None => {
                    let anomaly = Anomaly::UnknownHook { hook };
                    if !self.anomalies.contains(&anomaly) {
                        anomaly.record(&mut self.anomalies);
                    }
                }
            }
        }
        found.sort_by_key(|(key, _)| *key);
        found.into_iter().map(|(_, h)| h).collect()
    }

    fn hook_step(&self, hook: HookId) -> TestStep {
        TestStep {
            id: self.asm.ids.next_id(),
            hook_id: self.hook_ids.get(&hook).cloned(),
            pickle_step_id: None,
            step_definition_ids: None,
            step_match_arguments_lists: None,
        }
    }

    /// Emits the envelopes of a single attempt of a [`TestCase`].
    fn test_case_run(&mut self, planned: &PlannedCase<'_>, run: &TestCaseRun, retried: bool) {
        let started_id = self.asm.ids.next_id();
        self.out.push(Envelope::TestCaseStarted(TestCaseStarted {
            attempt: run.attempt,
            id: started_id.clone(),
            test_case_id: planned.id.clone(),
            worker_id: Some(run.worker.to_string()),
            timestamp: Timestamp::from_millis(run.start_time),
        }));

        let mut cursor = run.start_time;
        for (step_id, step) in &planned.steps {
            let (start, duration, status, message) = match *step {
                Planned::Hook { hook, step } => match run.hook(hook, step) {
                    Some(h) => (
                        h.start_time,
                        h.duration_ms,
                        TestStepResultStatus::from(h.status),
                        h.error.clone(),
                    ),
                    None => (cursor, 0, TestStepResultStatus::Skipped, None),
                },
                Planned::Pickle { index, unmatched } => match run.step(index) {
                    Some(s) => (
                        s.start_time,
                        s.duration_ms,
                        TestStepResultStatus::from(s.status),
                        s.error.clone(),
                    ),
                    None => (
                        cursor,
                        0,
                        unmatched.unwrap_or(TestStepResultStatus::Skipped),
                        None,
                    ),
                },
            };
            let end = start.saturating_add(duration);
            cursor = cursor.max(end);

            self.out.push(Envelope::TestStepStarted(TestStepStarted {
                test_case_started_id: started_id.clone(),
                test_step_id: step_id.clone(),
                timestamp: Timestamp::from_millis(start),
            }));
            self.out.push(Envelope::TestStepFinished(TestStepFinished {
                test_case_started_id: started_id.clone(),
                test_step_id: step_id.clone(),
                test_step_result: TestStepResult {
                    duration: Duration::from_millis(duration),
                    status,
                    message,
                },
                timestamp: Timestamp::from_millis(end),
            }));
        }

        self.out.push(Envelope::TestCaseFinished(TestCaseFinished {
            test_case_started_id: started_id,
            timestamp: Timestamp::from_millis(run.end_time().max(cursor)),
            will_be_retried: retried,
        }));
    }

    /// Emits the started/finished pairs of every global hook of the given
    /// `kind`.
    fn global_hooks(&mut self, kind: HookKind) {
        let agg = self.asm.aggregation;
        for h in agg.global_hooks.iter().filter(|h| h.kind == kind) {
            let Some(hook_id) = self.hook_ids.get(&h.hook).cloned() else {
                let anomaly = Anomaly::UnknownHook { hook: h.hook };
                if !self.anomalies.contains(&anomaly) {
                    anomaly.record(&mut self.anomalies);
                }
                continue;
            };
            let id = self.asm.ids.next_id();
            self.out.push(Envelope::TestRunHookStarted(TestRunHookStarted {
                id: id.clone(),
                test_run_started_id: self.run_id.clone(),
                hook_id,
                timestamp: Timestamp::from_millis(h.start_time),
            }));
            self.out.push(Envelope::TestRunHookFinished(TestRunHookFinished {
                test_run_hook_started_id: id,
                result: TestStepResult {
                    duration: Duration::from_millis(h.duration_ms),
                    status: h.status.into(),
                    message: h.error.clone(),
                },
                timestamp: Timestamp::from_millis(h.end_time()),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        document::Document,
        pickle,
        report::{
            BddData, EventLog, ExecutionEvent, HookOutcome, RunEnd, StepOutcome,
            TestStatus,
        },
        step::Pattern,
    };

    const SRC: &str = "\
Feature: Cukes
  Scenario: eating
    Given I have 5 cukes
    When I eat 2
    Then I juggle
";

    fn loaded(ids: &IdGenerator) -> Loaded {
        let feature =
            gherkin::Feature::parse(SRC, gherkin::GherkinEnv::default()).unwrap();
        let doc = Document::new(
            "features/cukes.feature".into(),
            PathBuf::from("features/cukes.feature"),
            SRC.into(),
            &feature,
            ids,
        );
        let pickles = pickle::compile(&doc, ids).unwrap();
        Loaded { documents: vec![doc], pickles }
    }

    fn registry() -> Registry {
        Registry::new()
            .given(Pattern::expression("I have {int} cukes").unwrap(), "steps::have")
            .when(Pattern::expression("I eat {int}").unwrap(), "steps::eat")
            .hook(HookKind::Before, "hooks::reset")
    }

    fn event(attempt: usize, status: TestStatus, steps: &[usize]) -> ExecutionEvent {
        let start = 1_000 + 100 * attempt as u64;
        ExecutionEvent {
            project: String::new(),
            file: "gen/cukes.feature.rs".into(),
            line: 10,
            title_path: vec!["eating".into()],
            worker: attempt,
            attempt,
            status,
            verdict: None,
            start_time: start,
            duration_ms: 50,
            bdd: Some(BddData { uri: "features/cukes.feature".into(), pickle_line: 2 }),
            steps: steps
                .iter()
                .map(|&index| StepOutcome {
                    index,
                    status,
                    start_time: start + 10 * (index as u64 + 1),
                    duration_ms: 5,
                    error: None,
                })
                .collect(),
            hooks: vec![HookOutcome {
                hook: HookId(0),
                kind: HookKind::Before,
                step: None,
                status: TestStatus::Passed,
                start_time: start,
                duration_ms: 2,
                error: None,
            }],
            annotations: vec![],
        }
    }

    fn aggregation(events: Vec<ExecutionEvent>, end: Option<RunEnd>) -> Aggregation {
        let mut log = EventLog::new();
        for ev in events {
            log.push(ev);
        }
        if let Some(end) = end {
            log.push(end);
        }
        report::aggregate(&log)
    }

    fn kinds(envs: &[Envelope]) -> Vec<&'static str> {
        envs.iter().map(Envelope::kind).collect()
    }

    #[test]
    fn orders_envelopes() {
        let ids = IdGenerator::new();
        let loaded = loaded(&ids);
        let registry = registry();
        let agg = aggregation(
            vec![event(0, TestStatus::Passed, &[0, 1])],
            Some(RunEnd { start_time: None, duration_ms: None, status: RunStatus::Passed }),
        );

        let asm = MessageAssembler::new(&loaded, &registry, &agg, ids);
        let kinds = kinds(asm.envelopes());

        assert_eq!(
            kinds[..8],
            [
                "meta",
                "source",
                "gherkinDocument",
                "pickle",
                "stepDefinition",
                "stepDefinition",
                "hook",
                "testRunStarted",
            ],
        );
        assert_eq!(kinds[8], "testCase");
        assert_eq!(kinds[9], "testCaseStarted");
        // Before hook plus three pickle steps.
        assert_eq!(kinds.iter().filter(|k| **k == "testStepFinished").count(), 4);
        assert_eq!(kinds[kinds.len() - 2], "testCaseFinished");
        assert_eq!(kinds.last(), Some(&"testRunFinished"));
    }

    #[test]
    fn builds_only_once() {
        let ids = IdGenerator::new();
        let loaded = loaded(&ids);
        let registry = registry();
        let agg = aggregation(vec![event(0, TestStatus::Passed, &[0, 1])], None);

        let asm = MessageAssembler::new(&loaded, &registry, &agg, ids);

        assert!(std::ptr::eq(asm.envelopes(), asm.envelopes()));
    }

    #[test]
    fn fills_missing_outcomes() {
        let ids = IdGenerator::new();
        let loaded = loaded(&ids);
        let registry = registry();
        let agg = aggregation(vec![event(0, TestStatus::Failed, &[0])], None);

        let asm = MessageAssembler::new(&loaded, &registry, &agg, ids);

        let statuses = asm
            .envelopes()
            .iter()
            .filter_map(|e| match e {
                Envelope::TestStepFinished(f) => Some(f.test_step_result.status),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            statuses,
            [
                TestStepResultStatus::Passed,
                TestStepResultStatus::Failed,
                TestStepResultStatus::Skipped,
                TestStepResultStatus::Undefined,
            ],
        );
    }

    #[test]
    fn marks_retried_runs() {
        let ids = IdGenerator::new();
        let loaded = loaded(&ids);
        let registry = registry();
        let agg = aggregation(
            vec![
                event(1, TestStatus::Passed, &[0, 1]),
                event(0, TestStatus::Failed, &[0, 1]),
            ],
            Some(RunEnd { start_time: None, duration_ms: None, status: RunStatus::Passed }),
        );

        let asm = MessageAssembler::new(&loaded, &registry, &agg, ids);

        let retried = asm
            .envelopes()
            .iter()
            .filter_map(|e| match e {
                Envelope::TestCaseFinished(f) => Some(f.will_be_retried),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(retried, [true, false]);
        let Some(Envelope::TestRunFinished(fin)) = asm.envelopes().last() else {
            panic!("expected `testRunFinished` last");
        };
        assert!(fin.success);
    }

    #[test]
    fn derives_run_timing() {
        let ids = IdGenerator::new();
        let loaded = loaded(&ids);
        let registry = registry();
        let agg = aggregation(
            vec![event(0, TestStatus::Failed, &[]), event(1, TestStatus::Passed, &[])],
            None,
        );

        let asm = MessageAssembler::new(&loaded, &registry, &agg, ids);

        let envs = asm.envelopes();
        let Some(Envelope::TestRunStarted(started)) =
            envs.iter().find(|e| e.kind() == "testRunStarted")
        else {
            panic!("expected `testRunStarted`");
        };
        let Some(Envelope::TestRunFinished(finished)) = envs.last() else {
            panic!("expected `testRunFinished` last");
        };
        assert_eq!(started.timestamp, Timestamp::from_millis(1_000));
        assert_eq!(finished.timestamp, Timestamp::from_millis(1_150));
        assert!(!finished.success);
    }

    #[test]
    fn skips_unknown_pickles() {
        let ids = IdGenerator::new();
        let loaded = loaded(&ids);
        let registry = registry();
        let mut ev = event(0, TestStatus::Passed, &[]);
        ev.bdd = Some(BddData { uri: "features/gone.feature".into(), pickle_line: 2 });
        let agg = aggregation(vec![ev], None);

        let asm = MessageAssembler::new(&loaded, &registry, &agg, ids);

        assert!(!kinds(asm.envelopes()).contains(&"testCase"));
        assert!(matches!(
            asm.anomalies().collect::<Vec<_>>()[..],
            [Anomaly::UnknownPickle { .. }],
        ));
    }
}
