//! End-to-end workflow runs against a scripted session and locator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use action_flow::{
    Credential, ErrorKind, Outcome, Step, StepPhase, StudyEntry, StudyLogWorkflow,
    SubmissionRequest, UiContract, WorkflowExecutor,
};
use action_primitives::{
    ActionError, DefaultActionPrimitives, DefaultWaitStrategy, ElementHandle, FieldLocator,
    FieldSpec, Probe,
};
use async_trait::async_trait;
use cdp_adapter::{
    AdapterError, AdapterErrorKind, NetworkSnapshot, PageSession, SessionId, SessionProvider,
};
use serde_json::Value;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

#[derive(Clone, Default)]
struct Script {
    calls: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
    acquisitions: Arc<AtomicUsize>,
    fail_launch: bool,
    fail_click_containing: Option<String>,
    screenshot_fails: bool,
    close_fails: bool,
    busy_network: bool,
}

impl Script {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn selects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with("select "))
            .collect()
    }
}

struct ScriptedSession {
    id: SessionId,
    script: Script,
}

impl ScriptedSession {
    fn record(&self, call: String) {
        self.script.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.record(format!("navigate {url}"));
        Ok(())
    }

    async fn evaluate(&self, _expression: &str) -> Result<Value, AdapterError> {
        Ok(Value::Null)
    }

    async fn click(&self, selector: &str) -> Result<(), AdapterError> {
        self.record(format!("click {selector}"));
        if let Some(needle) = &self.script.fail_click_containing {
            if selector.contains(needle.as_str()) {
                return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint("click dispatch"));
            }
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), AdapterError> {
        self.record(format!("fill {selector} {text}"));
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), AdapterError> {
        self.record(format!("select {selector} {value}"));
        Ok(())
    }

    async fn network_snapshot(&self) -> Result<NetworkSnapshot, AdapterError> {
        Ok(if self.script.busy_network {
            NetworkSnapshot {
                inflight: 2,
                requests: 2,
                since_last_activity: Duration::ZERO,
            }
        } else {
            NetworkSnapshot {
                inflight: 0,
                requests: 4,
                since_last_activity: Duration::from_secs(5),
            }
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.record("screenshot".to_string());
        if self.script.screenshot_fails {
            return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint("capture failed"));
        }
        Ok(PNG.to_vec())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.record("close".to_string());
        self.script.closes.fetch_add(1, Ordering::SeqCst);
        if self.script.close_fails {
            return Err(AdapterError::new(AdapterErrorKind::CdpIo).with_hint("browser gone"));
        }
        Ok(())
    }
}

struct ScriptedProvider {
    script: Script,
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    async fn acquire(&self) -> Result<Box<dyn PageSession>, AdapterError> {
        self.script.acquisitions.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_launch {
            return Err(AdapterError::new(AdapterErrorKind::Launch).with_hint("no chrome"));
        }
        Ok(Box::new(ScriptedSession {
            id: SessionId::new(),
            script: self.script.clone(),
        }))
    }
}

/// Resolves every field to its own description, except the ones listed as
/// missing. Hidden fields are attached but never rendered.
#[derive(Default)]
struct TableLocator {
    missing: Vec<FieldSpec>,
    hidden: Vec<FieldSpec>,
}

#[async_trait]
impl FieldLocator for TableLocator {
    async fn probe(
        &self,
        _page: &dyn PageSession,
        spec: &FieldSpec,
    ) -> Result<Option<Probe>, ActionError> {
        if self.missing.contains(spec) {
            return Ok(None);
        }
        Ok(Some(Probe {
            handle: ElementHandle {
                selector: spec.to_string(),
                spec: spec.clone(),
            },
            visible: !self.hidden.contains(spec),
        }))
    }
}

fn workflow(script: &Script, locator: TableLocator) -> StudyLogWorkflow {
    let locator: Arc<dyn FieldLocator> = Arc::new(locator);
    let wait = Arc::new(DefaultWaitStrategy::new(locator.clone()));
    let primitives = Arc::new(DefaultActionPrimitives::new(locator, wait));
    let provider = Arc::new(ScriptedProvider {
        script: script.clone(),
    });
    StudyLogWorkflow::new(provider, primitives)
}

fn credential() -> Credential {
    Credential::new("student01", "s3cret-pass")
}

fn request(pairs: &[(&str, i64)], comment: &str) -> SubmissionRequest {
    let entries = pairs
        .iter()
        .map(|(label, hours)| StudyEntry::parse(label, *hours).unwrap())
        .collect();
    SubmissionRequest::new(entries, comment).unwrap()
}

fn step_names(result: &action_flow::WorkflowResult, phase: &StepPhase) -> Vec<String> {
    result
        .log
        .markers()
        .iter()
        .filter(|marker| &marker.phase == phase)
        .map(|marker| marker.step.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn happy_path_fills_form_and_returns_confirmation() {
    let script = Script::default();
    let flow = workflow(&script, TableLocator::default());
    let contract = UiContract::v1();

    let result = flow
        .execute(
            &credential(),
            &request(&[("国語", 1), ("数学", 2), ("英語", 0)], "good day"),
        )
        .await;

    assert!(result.is_success(), "{:?}", result.outcome);
    assert_eq!(result.confirmation_image(), Some(PNG));
    assert!(result.finished_at >= result.started_at);

    assert_eq!(
        script.selects(),
        vec![
            format!("select {} 2: 1", contract.subject_field("国語".parse().unwrap())),
            format!("select {} 3: 2", contract.subject_field("数学".parse().unwrap())),
            format!("select {} 1: 0", contract.subject_field("英語".parse().unwrap())),
        ]
    );

    let calls = script.calls();
    assert_eq!(calls[0], "navigate https://id.classi.jp/login/identifier");
    assert!(calls.contains(&format!("fill {} student01", contract.identifier_field)));
    assert!(calls.contains(&format!("fill {} good day", contract.comment_field)));
    assert!(calls.contains(&format!("click {}", contract.reveal_gesture)));
    assert_eq!(calls.last().map(String::as_str), Some("close"));
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);

    assert_eq!(
        step_names(&result, &StepPhase::Succeeded),
        vec![
            "acquire_session",
            "open_login",
            "enter_identifier",
            "enter_secret",
            "open_record_form",
            "select_hours[国語]",
            "select_hours[数学]",
            "select_hours[英語]",
            "enter_comment",
            "confirm_record",
            "capture_confirmation",
            "release_session",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn two_subjects_with_comment_reach_confirmation() {
    let script = Script::default();
    let contract = UiContract::v1();

    let result = workflow(&script, TableLocator::default())
        .execute(
            &credential(),
            &request(&[("国語", 2), ("数学", 0)], "良い一日でした"),
        )
        .await;

    assert!(result.is_success(), "{:?}", result.outcome);
    assert!(!result.confirmation_image().unwrap_or_default().is_empty());
    assert_eq!(
        script.selects(),
        vec![
            format!("select {} 3: 2", contract.subject_field("国語".parse().unwrap())),
            format!("select {} 1: 0", contract.subject_field("数学".parse().unwrap())),
        ]
    );
    assert!(script
        .calls()
        .contains(&format!("fill {} 良い一日でした", contract.comment_field)));
    assert_eq!(
        step_names(&result, &StepPhase::Succeeded),
        vec![
            "acquire_session",
            "open_login",
            "enter_identifier",
            "enter_secret",
            "open_record_form",
            "select_hours[国語]",
            "select_hours[数学]",
            "enter_comment",
            "confirm_record",
            "capture_confirmation",
            "release_session",
        ]
    );
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn secret_field_that_never_renders_times_out_with_diagnostics() {
    let script = Script::default();
    let contract = UiContract::v1();
    let locator = TableLocator {
        hidden: vec![contract.secret_field.clone()],
        ..TableLocator::default()
    };

    let result = workflow(&script, locator)
        .execute(&credential(), &request(&[("国語", 1)], ""))
        .await;

    assert_eq!(result.error_kind(), Some(&ErrorKind::Timeout));
    assert_eq!(result.diagnostic_image(), Some(PNG));
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);

    let calls = script.calls();
    assert!(calls.contains(&"screenshot".to_string()));
    assert!(!calls.iter().any(|c| c.contains("s3cret-pass")));
    assert!(!calls.iter().any(|c| c.starts_with("select ")));

    let phases = result.log.phases_of(Step::EnterSecret);
    assert_eq!(phases.first(), Some(&&StepPhase::Started));
    assert!(matches!(phases.last(), Some(StepPhase::Failed { .. })));
    assert!(result.log.phases_of(Step::OpenRecordForm).is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_step_logs_started_before_succeeded() {
    let script = Script::default();
    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("化学", 4)], ""))
        .await;

    let markers = result.log.markers();
    for pair in markers.chunks(2) {
        assert_eq!(pair[0].step, pair[1].step);
        assert_eq!(pair[0].phase, StepPhase::Started);
        assert_eq!(pair[1].phase, StepPhase::Succeeded);
    }
    let seqs: Vec<u32> = markers.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, (1..=markers.len() as u32).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn entries_are_applied_in_request_order() {
    let script = Script::default();
    let result = workflow(&script, TableLocator::default())
        .execute(
            &credential(),
            &request(&[("情報", 7), ("公民", 3), ("地歴", 5)], ""),
        )
        .await;

    assert!(result.is_success());
    let started: Vec<String> = step_names(&result, &StepPhase::Started)
        .into_iter()
        .filter(|step| step.starts_with("select_hours"))
        .collect();
    assert_eq!(
        started,
        vec!["select_hours[情報]", "select_hours[公民]", "select_hours[地歴]"]
    );
    let values: Vec<String> = script
        .selects()
        .iter()
        .filter_map(|call| call.split("role=combobox ").nth(1).map(str::to_string))
        .collect();
    assert_eq!(values, vec!["8: 7", "4: 3", "6: 5"]);
}

#[tokio::test(start_paused = true)]
async fn missing_subject_control_fails_with_diagnostics_and_single_close() {
    let script = Script::default();
    let contract = UiContract::v1();
    let missing = contract.subject_field("情報".parse().unwrap());
    let locator = TableLocator {
        missing: vec![missing.clone()],
        ..TableLocator::default()
    };

    let result = workflow(&script, locator)
        .execute(&credential(), &request(&[("国語", 1), ("情報", 2)], "x"))
        .await;

    match &result.outcome {
        Outcome::Failure {
            kind,
            diagnostic_image,
            ..
        } => {
            assert_eq!(
                kind,
                &ErrorKind::FieldNotFound {
                    spec: missing.to_string()
                }
            );
            assert_eq!(diagnostic_image.as_deref(), Some(PNG));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
    let calls = script.calls();
    assert!(!calls.iter().any(|c| c.contains("内容を確定する")));
    assert!(!calls.iter().any(|c| c.contains("今日はどんな一日でしたか")));

    let phases = result.log.phases_of(Step::SelectHours("情報".parse().unwrap()));
    assert_eq!(phases.len(), 2);
    assert!(matches!(phases[1], StepPhase::Failed { .. }));
}

#[tokio::test(start_paused = true)]
async fn session_acquisition_failure_never_closes() {
    let script = Script {
        fail_launch: true,
        ..Script::default()
    };

    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("国語", 1)], ""))
        .await;

    assert_eq!(result.error_kind(), Some(&ErrorKind::SessionAcquisition));
    assert_eq!(result.diagnostic_image(), None);
    assert_eq!(script.closes.load(Ordering::SeqCst), 0);
    assert!(script.calls().is_empty());
    assert_eq!(result.log.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn network_that_never_settles_times_out() {
    let script = Script {
        busy_network: true,
        ..Script::default()
    };

    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("数学", 2)], ""))
        .await;

    assert_eq!(result.error_kind(), Some(&ErrorKind::Timeout));
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
    assert!(matches!(
        result.log.phases_of(Step::OpenLogin).last(),
        Some(StepPhase::Failed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn failed_diagnostic_screenshot_is_swallowed() {
    let script = Script {
        fail_click_containing: Some("ログインする".to_string()),
        screenshot_fails: true,
        ..Script::default()
    };

    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("英語", 3)], ""))
        .await;

    assert_eq!(result.error_kind(), Some(&ErrorKind::Browser));
    assert_eq!(result.diagnostic_image(), None);
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
    assert!(result
        .log
        .phases_of(Step::Diagnostics)
        .iter()
        .any(|phase| matches!(phase, StepPhase::Note { message } if message.contains("failed"))));
}

#[tokio::test(start_paused = true)]
async fn close_error_after_success_keeps_success() {
    let script = Script {
        close_fails: true,
        ..Script::default()
    };

    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("地歴", 6)], ""))
        .await;

    assert!(result.is_success());
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
    assert!(matches!(
        result.log.phases_of(Step::ReleaseSession).last(),
        Some(StepPhase::Failed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn empty_comment_is_filled_as_empty() {
    let script = Script::default();
    let contract = UiContract::v1();

    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("国語", 0)], ""))
        .await;

    assert!(result.is_success());
    assert!(script
        .calls()
        .contains(&format!("fill {} ", contract.comment_field)));
}

#[tokio::test(start_paused = true)]
async fn sequential_runs_are_independent() {
    let script = Script::default();
    let flow = workflow(&script, TableLocator::default());

    let first = flow
        .execute(&credential(), &request(&[("国語", 1)], "one"))
        .await;
    let second = flow
        .execute(&credential(), &request(&[("数学", 2), ("化学", 3)], "two"))
        .await;

    assert!(first.is_success() && second.is_success());
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(script.acquisitions.load(Ordering::SeqCst), 2);
    assert_eq!(script.closes.load(Ordering::SeqCst), 2);
    assert!(second.log.len() > first.log.len());
    assert!(first
        .log
        .markers()
        .iter()
        .all(|m| !m.step.contains("数学")));
}

#[tokio::test(start_paused = true)]
async fn secret_never_appears_in_step_log() {
    let script = Script {
        fail_click_containing: Some("ログインする".to_string()),
        ..Script::default()
    };

    let result = workflow(&script, TableLocator::default())
        .execute(&credential(), &request(&[("国語", 1)], ""))
        .await;

    let log = serde_json::to_string(&result.log).unwrap();
    assert!(!log.contains("s3cret-pass"));
    assert!(!result
        .error_message()
        .unwrap_or_default()
        .contains("s3cret-pass"));
}

#[tokio::test(start_paused = true)]
async fn settle_delay_comes_from_contract() {
    let script = Script::default();
    let flow = workflow(&script, TableLocator::default())
        .with_contract(UiContract::v1().with_settle_delay(Duration::from_secs(3)));

    let started = tokio::time::Instant::now();
    let result = flow
        .execute(&credential(), &request(&[("公民", 1)], ""))
        .await;

    assert!(result.is_success());
    assert!(started.elapsed() >= Duration::from_secs(3));
}
