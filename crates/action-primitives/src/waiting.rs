//! Synchronization policy applied between workflow steps

use crate::{
    errors::ActionError,
    locator::{FieldLocator, ScriptFieldLocator},
    types::{FieldSpec, WaitKind},
};
use async_trait::async_trait;
use cdp_adapter::PageSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Waiting strategy trait
#[async_trait]
pub trait WaitStrategy: Send + Sync {
    /// Block until `kind` holds on `page`, or fail with `WaitTimeout`.
    async fn wait(&self, page: &dyn PageSession, kind: &WaitKind) -> Result<(), ActionError>;
}

/// Default waiting strategy implementation
pub struct DefaultWaitStrategy {
    locator: Arc<dyn FieldLocator>,

    /// Upper bound for every non-fixed wait (milliseconds)
    pub timeout_ms: u64,

    /// Network idle quiet period (milliseconds)
    pub network_quiet_ms: u64,

    /// Delay between readiness checks (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for DefaultWaitStrategy {
    fn default() -> Self {
        Self::new(Arc::new(ScriptFieldLocator::new()))
    }
}

impl DefaultWaitStrategy {
    pub fn new(locator: Arc<dyn FieldLocator>) -> Self {
        Self {
            locator,
            timeout_ms: 30_000,
            network_quiet_ms: 500,
            poll_interval_ms: 100,
        }
    }

    pub fn with_timeouts(mut self, timeout_ms: u64, network_quiet_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self.network_quiet_ms = network_quiet_ms;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    fn bound(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    async fn wait_network_settled(&self, page: &dyn PageSession) -> Result<(), ActionError> {
        let quiet = Duration::from_millis(self.network_quiet_ms);
        let poll = self.poll();

        let started = Instant::now();

        let settled = async {
            loop {
                let snapshot = page.network_snapshot().await?;
                if snapshot.is_quiet_within(quiet, started.elapsed()) {
                    return Ok::<(), ActionError>(());
                }
                debug!(
                    inflight = snapshot.inflight,
                    idle_ms = snapshot.since_last_activity.as_millis() as u64,
                    "waiting for network to settle"
                );
                sleep(poll).await;
            }
        };

        match timeout(self.bound(), settled).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout_ms, "network never settled");
                Err(ActionError::WaitTimeout(format!(
                    "network not settled within {}ms",
                    self.timeout_ms
                )))
            }
        }
    }

    async fn wait_element_visible(
        &self,
        page: &dyn PageSession,
        spec: &FieldSpec,
    ) -> Result<(), ActionError> {
        let poll = self.poll();

        let visible = async {
            loop {
                match self.locator.probe(page, spec).await? {
                    Some(probe) if probe.visible => return Ok::<(), ActionError>(()),
                    Some(_) => debug!(field = %spec, "field attached but not rendered"),
                    None => debug!(field = %spec, "field not attached yet"),
                }
                sleep(poll).await;
            }
        };

        match timeout(self.bound(), visible).await {
            Ok(result) => result,
            Err(_) => {
                warn!(field = %spec, timeout_ms = self.timeout_ms, "field never became visible");
                Err(ActionError::WaitTimeout(format!(
                    "{spec} not visible within {}ms",
                    self.timeout_ms
                )))
            }
        }
    }
}

#[async_trait]
impl WaitStrategy for DefaultWaitStrategy {
    async fn wait(&self, page: &dyn PageSession, kind: &WaitKind) -> Result<(), ActionError> {
        match kind {
            WaitKind::NetworkSettled => self.wait_network_settled(page).await,
            WaitKind::ElementVisible(spec) => self.wait_element_visible(page, spec).await,
            WaitKind::FixedDelay(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "fixed delay");
                sleep(*delay).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePage;
    use crate::types::{ElementHandle, Probe};
    use cdp_adapter::NetworkTracker;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports the field missing, then attached-but-hidden, then visible.
    struct AppearingLocator {
        probes: AtomicUsize,
        visible_after: usize,
    }

    #[async_trait]
    impl FieldLocator for AppearingLocator {
        async fn probe(
            &self,
            _page: &dyn PageSession,
            spec: &FieldSpec,
        ) -> Result<Option<Probe>, ActionError> {
            let seen = self.probes.fetch_add(1, Ordering::SeqCst);
            if seen == 0 {
                return Ok(None);
            }
            Ok(Some(Probe {
                handle: ElementHandle {
                    selector: "#secret".to_string(),
                    spec: spec.clone(),
                },
                visible: seen >= self.visible_after,
            }))
        }
    }

    #[test]
    fn test_default_wait_strategy_config() {
        let strategy = DefaultWaitStrategy::default();
        assert_eq!(strategy.timeout_ms, 30_000);
        assert_eq!(strategy.network_quiet_ms, 500);
        assert_eq!(strategy.poll_interval_ms, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn network_settled_waits_out_busy_snapshots() {
        let page = FakePage::new();
        page.push_busy(3);
        page.push_busy(1);
        let strategy = DefaultWaitStrategy::default();
        strategy
            .wait(&page, &WaitKind::NetworkSettled)
            .await
            .expect("settles");
    }

    #[tokio::test(start_paused = true)]
    async fn network_settled_observes_request_fired_after_wait_starts() {
        let tracker = Arc::new(NetworkTracker::new());
        tokio::time::advance(Duration::from_millis(800)).await;

        let navigation = Arc::clone(&tracker);
        let traffic = tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            navigation.request_started("nav-1");
            sleep(Duration::from_millis(300)).await;
            navigation.request_finished("nav-1");
        });

        let page = FakePage {
            tracker: Some(Arc::clone(&tracker)),
            ..FakePage::default()
        };
        let started = Instant::now();
        DefaultWaitStrategy::default()
            .wait(&page, &WaitKind::NetworkSettled)
            .await
            .expect("settles");

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.inflight, 0);
        assert!(started.elapsed() >= Duration::from_millis(820));
        traffic.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn network_settled_times_out() {
        let page = FakePage {
            always_busy: true,
            ..FakePage::default()
        };
        let strategy = DefaultWaitStrategy::default().with_timeouts(2_000, 500);
        let err = strategy
            .wait(&page, &WaitKind::NetworkSettled)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::WaitTimeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn element_visible_polls_until_rendered() {
        let locator = Arc::new(AppearingLocator {
            probes: AtomicUsize::new(0),
            visible_after: 3,
        });
        let strategy = DefaultWaitStrategy::new(locator.clone());
        let page = FakePage::new();
        strategy
            .wait(
                &page,
                &WaitKind::ElementVisible(FieldSpec::role("textbox", "入力してください")),
            )
            .await
            .expect("becomes visible");
        assert_eq!(locator.probes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn element_visible_times_out_when_hidden() {
        let locator = Arc::new(AppearingLocator {
            probes: AtomicUsize::new(0),
            visible_after: usize::MAX,
        });
        let strategy = DefaultWaitStrategy::new(locator).with_timeouts(1_000, 500);
        let page = FakePage::new();
        let spec = FieldSpec::role("button", "ログインする");
        let err = strategy
            .wait(&page, &WaitKind::ElementVisible(spec.clone()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ActionError::WaitTimeout(format!("{spec} not visible within 1000ms"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_delay_sleeps_unconditionally() {
        let page = FakePage {
            always_busy: true,
            ..FakePage::default()
        };
        let strategy = DefaultWaitStrategy::default();
        let started = tokio::time::Instant::now();
        strategy
            .wait(&page, &WaitKind::FixedDelay(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
