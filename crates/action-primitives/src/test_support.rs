//! Scripted page double shared by the unit tests of this crate.

use async_trait::async_trait;
use cdp_adapter::{
    AdapterError, AdapterErrorKind, NetworkSnapshot, NetworkTracker, PageSession, SessionId,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct FakePage {
    pub id: SessionId,
    pub calls: Mutex<Vec<String>>,
    pub evaluations: Mutex<VecDeque<Value>>,
    pub expressions: Mutex<Vec<String>>,
    pub network: Mutex<VecDeque<NetworkSnapshot>>,
    pub always_busy: bool,
    pub missing_option: bool,
    /// Live tracker; takes precedence over the scripted snapshots.
    pub tracker: Option<Arc<NetworkTracker>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_evaluate(&self, value: Value) {
        self.evaluations.lock().unwrap().push_back(value);
    }

    pub fn push_busy(&self, inflight: u64) {
        self.network.lock().unwrap().push_back(NetworkSnapshot {
            inflight,
            requests: inflight,
            since_last_activity: Duration::ZERO,
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn expressions(&self) -> Vec<String> {
        self.expressions.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PageSession for FakePage {
    fn id(&self) -> SessionId {
        self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.record(format!("navigate {url}"));
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError> {
        self.record("evaluate".to_string());
        self.expressions.lock().unwrap().push(expression.to_string());
        Ok(self
            .evaluations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<(), AdapterError> {
        self.record(format!("click {selector}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), AdapterError> {
        self.record(format!("fill {selector} {text}"));
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), AdapterError> {
        self.record(format!("select {selector} {value}"));
        if self.missing_option {
            return Err(AdapterError::new(AdapterErrorKind::OptionNotFound).with_hint(value));
        }
        Ok(())
    }

    async fn network_snapshot(&self) -> Result<NetworkSnapshot, AdapterError> {
        if let Some(tracker) = &self.tracker {
            return Ok(tracker.snapshot());
        }
        if self.always_busy {
            return Ok(NetworkSnapshot {
                inflight: 1,
                requests: 1,
                since_last_activity: Duration::ZERO,
            });
        }
        Ok(self
            .network
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(NetworkSnapshot {
                inflight: 0,
                requests: 0,
                since_last_activity: Duration::from_secs(5),
            }))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.record("screenshot".to_string());
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.record("close".to_string());
        Ok(())
    }
}
