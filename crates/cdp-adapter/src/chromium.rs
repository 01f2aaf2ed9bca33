//! `chromiumoxide`-backed session provider.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::ids::SessionId;
use crate::network::{NetworkSnapshot, NetworkTracker};
use crate::session::{PageSession, SessionProvider};

/// Launches (or attaches to) a dedicated Chromium per acquired session.
#[derive(Clone, Debug)]
pub struct ChromiumProvider {
    cfg: CdpConfig,
}

impl ChromiumProvider {
    pub fn new(cfg: CdpConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CdpConfig {
        &self.cfg
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    async fn acquire(&self) -> Result<Box<dyn PageSession>, AdapterError> {
        let session = ChromiumSession::launch(&self.cfg).await?;
        Ok(Box::new(session))
    }
}

#[derive(Default)]
struct SessionTasks {
    handler: Option<JoinHandle<()>>,
    listeners: Vec<JoinHandle<()>>,
}

impl SessionTasks {
    fn abort_listeners(&mut self) {
        for task in self.listeners.drain(..) {
            task.abort();
        }
    }

    fn abort_all(&mut self) {
        self.abort_listeners();
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// One browser process (or remote attachment) with a single page.
pub struct ChromiumSession {
    id: SessionId,
    page: Page,
    browser: Mutex<Option<Browser>>,
    attached: bool,
    tracker: Arc<NetworkTracker>,
    tasks: parking_lot::Mutex<SessionTasks>,
    profile: parking_lot::Mutex<Option<TempDir>>,
}

impl ChromiumSession {
    pub async fn launch(cfg: &CdpConfig) -> Result<Self, AdapterError> {
        let id = SessionId::new();

        let (mut browser, mut handler, profile, attached) = match &cfg.websocket_url {
            Some(ws_url) => {
                let (browser, handler) = Browser::connect(ws_url.clone())
                    .await
                    .map_err(|err| launch_error(format!("connect {ws_url}: {err}")))?;
                (browser, handler, None, true)
            }
            None => {
                let profile = tempfile::Builder::new()
                    .prefix("studylog-profile-")
                    .tempdir()
                    .map_err(|err| launch_error(format!("failed to create profile dir: {err}")))?;
                let browser_cfg = browser_config(cfg, profile.path())?;
                let (browser, handler) = Browser::launch(browser_cfg)
                    .await
                    .map_err(|err| launch_error(err.to_string()))?;
                (browser, handler, Some(profile), false)
            }
        };

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp-session", ?err, "browser handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                if !attached {
                    let _ = browser.close().await;
                }
                handler_task.abort();
                return Err(launch_error(format!("failed to open page: {err}")));
            }
        };

        let tracker = Arc::new(NetworkTracker::new());
        let listeners = match spawn_network_listeners(&page, &tracker).await {
            Ok(listeners) => listeners,
            Err(err) => {
                if !attached {
                    let _ = browser.close().await;
                }
                handler_task.abort();
                return Err(launch_error(format!("failed to enable network tracking: {err}")));
            }
        };

        info!(target: "cdp-session", session = %id, attached, "browser session ready");

        Ok(Self {
            id,
            page,
            browser: Mutex::new(Some(browser)),
            attached,
            tracker,
            tasks: parking_lot::Mutex::new(SessionTasks {
                handler: Some(handler_task),
                listeners,
            }),
            profile: parking_lot::Mutex::new(profile),
        })
    }

    async fn ensure_open(&self) -> Result<(), AdapterError> {
        if self.browser.lock().await.is_none() {
            return Err(AdapterError::new(AdapterErrorKind::Closed));
        }
        Ok(())
    }

    async fn focus(&self, selector: &str) -> Result<(), AdapterError> {
        let element = self.page.find_element(selector).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("{selector}: {err}"))
        })?;
        element.click().await?;
        Ok(())
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    fn id(&self) -> SessionId {
        self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        self.ensure_open().await?;
        debug!(target: "cdp-session", session = %self.id, %url, "navigate");
        self.page.goto(url).await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError> {
        self.ensure_open().await?;
        let result = self.page.evaluate(expression).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<(), AdapterError> {
        self.ensure_open().await?;
        self.focus(selector).await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), AdapterError> {
        self.ensure_open().await?;
        self.focus(selector).await?;

        let selector_literal = json_literal(selector)?;
        let cleared = self
            .evaluate(&format!(
                r#"(() => {{
                    const el = document.querySelector({selector_literal});
                    if (!el) return false;
                    el.focus();
                    if (typeof el.select === 'function') el.select();
                    el.value = '';
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return true;
                }})()"#
            ))
            .await?;
        if cleared != Value::Bool(true) {
            return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("fill target vanished: {selector}")));
        }

        if !text.is_empty() {
            self.page.execute(InsertTextParams::new(text)).await?;
        }

        self.evaluate(&format!(
            r#"(() => {{
                const el = document.querySelector({selector_literal});
                if (el) el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#
        ))
        .await?;
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), AdapterError> {
        self.ensure_open().await?;
        let expression = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return {{ status: 'not-found' }};
                const options = Array.from(el.options || []);
                const option = options.find(opt => opt.value === {value});
                if (!option) return {{ status: 'option-missing' }};
                el.value = option.value;
                option.selected = true;
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ status: 'ok' }};
            }})()"#,
            selector = json_literal(selector)?,
            value = json_literal(value)?,
        );

        let response = self.evaluate(&expression).await?;
        match response.get("status").and_then(Value::as_str) {
            Some("ok") => Ok(()),
            Some("not-found") => Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("select target missing: {selector}"))),
            Some("option-missing") => Err(AdapterError::new(AdapterErrorKind::OptionNotFound)
                .with_hint(format!("no option with value {value:?}"))),
            other => Err(AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("selectOption failed: {other:?}"))
                .with_data(response.clone())),
        }
    }

    async fn network_snapshot(&self) -> Result<NetworkSnapshot, AdapterError> {
        self.ensure_open().await?;
        Ok(self.tracker.snapshot())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.ensure_open().await?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(&self) -> Result<(), AdapterError> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Err(AdapterError::new(AdapterErrorKind::Closed));
        };

        self.tasks.lock().abort_listeners();

        let result = if self.attached {
            self.page
                .clone()
                .close()
                .await
                .map_err(AdapterError::from)
        } else {
            match browser.close().await {
                Ok(_) => {
                    if let Err(err) = browser.wait().await {
                        warn!(target: "cdp-session", session = %self.id, ?err, "browser did not exit cleanly");
                    }
                    Ok(())
                }
                Err(err) => Err(AdapterError::from(err)),
            }
        };

        self.tasks.lock().abort_all();
        // TempDir removal happens on drop.
        self.profile.lock().take();

        info!(target: "cdp-session", session = %self.id, ok = result.is_ok(), "browser session closed");
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.tasks.get_mut().abort_all();
    }
}

async fn spawn_network_listeners(
    page: &Page,
    tracker: &Arc<NetworkTracker>,
) -> Result<Vec<JoinHandle<()>>, AdapterError> {
    let mut started = page.event_listener::<EventRequestWillBeSent>().await?;
    let mut finished = page.event_listener::<EventLoadingFinished>().await?;
    let mut failed = page.event_listener::<EventLoadingFailed>().await?;

    let mut listeners = Vec::with_capacity(3);

    let on_start = Arc::clone(tracker);
    listeners.push(tokio::spawn(async move {
        while let Some(event) = started.next().await {
            on_start.request_started(event.request_id.as_ref());
        }
    }));

    let on_finish = Arc::clone(tracker);
    listeners.push(tokio::spawn(async move {
        while let Some(event) = finished.next().await {
            on_finish.request_finished(event.request_id.as_ref());
        }
    }));

    let on_fail = Arc::clone(tracker);
    listeners.push(tokio::spawn(async move {
        while let Some(event) = failed.next().await {
            on_fail.request_finished(event.request_id.as_ref());
        }
    }));

    page.execute(NetworkEnableParams::default()).await?;
    Ok(listeners)
}

fn browser_config(cfg: &CdpConfig, profile_dir: &Path) -> Result<BrowserConfig, AdapterError> {
    if !cfg.executable.as_os_str().is_empty() && !cfg.executable.exists() {
        return Err(launch_error(format!(
            "chrome executable not found at {}",
            cfg.executable.display()
        ))
        .with_data(json!({
            "expected": cfg.executable,
            "hint": "Set STUDYLOG_CHROME to the full path of chrome/chromium."
        })));
    }

    let mut builder = BrowserConfig::builder()
        .user_data_dir(profile_dir)
        .window_size(cfg.window_width, cfg.window_height)
        .request_timeout(Duration::from_millis(cfg.default_deadline_ms))
        .launch_timeout(Duration::from_millis(cfg.launch_timeout_ms))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--lang=ja-JP");

    if !cfg.executable.as_os_str().is_empty() {
        builder = builder.chrome_executable(&cfg.executable);
    }

    if !cfg.headless {
        builder = builder.with_head();
    }

    if cfg.disable_sandbox {
        builder = builder.no_sandbox();
    }

    builder
        .build()
        .map_err(|err| launch_error(format!("browser config error: {err}")))
}

fn launch_error(hint: impl Into<String>) -> AdapterError {
    AdapterError::new(AdapterErrorKind::Launch).with_hint(hint)
}

fn json_literal(value: &str) -> Result<String, AdapterError> {
    serde_json::to_string(value)
        .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err.to_string()))
}
