//! Workflow executor implementation

use crate::contract::UiContract;
use crate::diagnostics;
use crate::errors::FlowError;
use crate::types::*;
use action_primitives::{ActionPrimitives, WaitKind};
use async_trait::async_trait;
use cdp_adapter::{PageSession, SessionProvider};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Workflow executor trait
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    /// Run the record submission once. Always yields exactly one terminal result.
    async fn execute(&self, credential: &Credential, request: &SubmissionRequest)
        -> WorkflowResult;
}

/// Per-run state. Created fresh for every execution and never shared.
struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    log: StepLog,
    session: Option<Box<dyn PageSession>>,
}

impl RunContext {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            log: StepLog::new(),
            session: None,
        }
    }

    fn finish(self, outcome: Outcome) -> WorkflowResult {
        WorkflowResult {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            outcome,
            log: self.log,
        }
    }
}

/// Drives the portal login, navigation and record form in a fixed order.
pub struct StudyLogWorkflow {
    provider: Arc<dyn SessionProvider>,
    primitives: Arc<dyn ActionPrimitives>,
    contract: UiContract,
}

impl StudyLogWorkflow {
    pub fn new(provider: Arc<dyn SessionProvider>, primitives: Arc<dyn ActionPrimitives>) -> Self {
        Self {
            provider,
            primitives,
            contract: UiContract::v1(),
        }
    }

    pub fn with_contract(mut self, contract: UiContract) -> Self {
        self.contract = contract;
        self
    }

    pub fn contract(&self) -> &UiContract {
        &self.contract
    }

    async fn drive(
        &self,
        run: &mut RunContext,
        credential: &Credential,
        request: &SubmissionRequest,
    ) -> Result<Vec<u8>, FlowError> {
        let session = record(&mut run.log, Step::AcquireSession, async {
            self.provider
                .acquire()
                .await
                .map_err(|err| FlowError::SessionAcquisition(err.to_string()))
        })
        .await?;
        info!(session = %session.id(), "session acquired");

        let page: &dyn PageSession = &**run.session.insert(session);
        let log = &mut run.log;

        record(log, Step::OpenLogin, self.open_login(page)).await?;
        record(
            log,
            Step::EnterIdentifier,
            self.enter_identifier(page, credential),
        )
        .await?;
        record(log, Step::EnterSecret, self.enter_secret(page, credential)).await?;
        record(log, Step::OpenRecordForm, self.open_record_form(page)).await?;

        for entry in request.entries() {
            record(
                log,
                Step::SelectHours(entry.subject),
                self.select_hours(page, entry),
            )
            .await?;
        }

        record(
            log,
            Step::EnterComment,
            self.enter_comment(page, request.comment()),
        )
        .await?;
        record(log, Step::ConfirmRecord, self.confirm_record(page)).await?;
        record(log, Step::CaptureConfirmation, self.capture_confirmation(page)).await
    }

    async fn open_login(&self, page: &dyn PageSession) -> Result<(), FlowError> {
        self.primitives
            .navigate(page, &self.contract.login_url)
            .await?;
        self.wait(page, WaitKind::NetworkSettled).await
    }

    async fn enter_identifier(
        &self,
        page: &dyn PageSession,
        credential: &Credential,
    ) -> Result<(), FlowError> {
        self.primitives
            .type_text(page, &self.contract.identifier_field, credential.identifier())
            .await?;
        self.primitives
            .click(page, &self.contract.to_secret_button)
            .await?;
        Ok(())
    }

    async fn enter_secret(
        &self,
        page: &dyn PageSession,
        credential: &Credential,
    ) -> Result<(), FlowError> {
        let contract = &self.contract;
        self.wait(page, WaitKind::NetworkSettled).await?;
        self.wait(page, WaitKind::ElementVisible(contract.secret_field.clone()))
            .await?;
        self.primitives
            .type_text(page, &contract.secret_field, credential.secret())
            .await?;
        self.primitives
            .click(page, &contract.reveal_gesture)
            .await?;
        self.wait(page, WaitKind::ElementVisible(contract.login_button.clone()))
            .await?;
        self.primitives.click(page, &contract.login_button).await?;
        Ok(())
    }

    async fn open_record_form(&self, page: &dyn PageSession) -> Result<(), FlowError> {
        let contract = &self.contract;
        self.wait(page, WaitKind::NetworkSettled).await?;
        self.wait(page, WaitKind::ElementVisible(contract.record_link.clone()))
            .await?;
        self.primitives.click(page, &contract.record_link).await?;
        self.wait(page, WaitKind::NetworkSettled).await?;
        self.wait(page, WaitKind::ElementVisible(contract.edit_link.clone()))
            .await?;
        self.primitives.click(page, &contract.edit_link).await?;
        self.wait(page, WaitKind::NetworkSettled).await
    }

    async fn select_hours(
        &self,
        page: &dyn PageSession,
        entry: &StudyEntry,
    ) -> Result<(), FlowError> {
        let field = self.contract.subject_field(entry.subject);
        let option = self.contract.hour_option(entry.hours);
        self.primitives.select(page, &field, option).await?;
        Ok(())
    }

    async fn enter_comment(&self, page: &dyn PageSession, comment: &str) -> Result<(), FlowError> {
        self.primitives
            .type_text(page, &self.contract.comment_field, comment)
            .await?;
        Ok(())
    }

    async fn confirm_record(&self, page: &dyn PageSession) -> Result<(), FlowError> {
        self.wait(
            page,
            WaitKind::ElementVisible(self.contract.confirm_button.clone()),
        )
        .await?;
        self.primitives
            .click(page, &self.contract.confirm_button)
            .await?;
        self.wait(page, WaitKind::NetworkSettled).await?;
        self.wait(page, WaitKind::FixedDelay(self.contract.settle_delay))
            .await
    }

    async fn capture_confirmation(&self, page: &dyn PageSession) -> Result<Vec<u8>, FlowError> {
        Ok(self.primitives.screenshot(page).await?)
    }

    async fn wait(&self, page: &dyn PageSession, kind: WaitKind) -> Result<(), FlowError> {
        self.primitives.wait_for(page, &kind).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowExecutor for StudyLogWorkflow {
    async fn execute(
        &self,
        credential: &Credential,
        request: &SubmissionRequest,
    ) -> WorkflowResult {
        let mut run = RunContext::new();
        let span = info_span!("studylog_run", run_id = %run.run_id);

        async move {
            info!(
                entries = request.entries().len(),
                contract = self.contract.version,
                "workflow started"
            );

            let outcome = match self.drive(&mut run, credential, request).await {
                Ok(confirmation_image) => {
                    release(&mut run).await;
                    Outcome::Success { confirmation_image }
                }
                Err(err) => {
                    warn!(error = %err, "workflow failed");
                    let diagnostic_image =
                        diagnostics::capture_on_failure(run.session.as_deref(), &mut run.log)
                            .await;
                    diagnostics::close_if_present(run.session.take(), &mut run.log).await;
                    Outcome::Failure {
                        kind: err.kind(),
                        message: err.to_string(),
                        diagnostic_image,
                    }
                }
            };

            let result = run.finish(outcome);
            info!(
                success = result.is_success(),
                markers = result.log.len(),
                "workflow finished"
            );
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrap one step with started/succeeded/failed markers.
async fn record<T>(
    log: &mut StepLog,
    step: Step,
    action: impl Future<Output = Result<T, FlowError>>,
) -> Result<T, FlowError> {
    log.started(step);
    info!(step = %step, "step started");
    match action.await {
        Ok(value) => {
            log.succeeded(step);
            info!(step = %step, "step succeeded");
            Ok(value)
        }
        Err(err) => {
            log.failed(step, err.to_string());
            warn!(step = %step, error = %err, "step failed");
            Err(err)
        }
    }
}

/// Release on the success path. A close error is logged and does not change the outcome.
async fn release(run: &mut RunContext) {
    let Some(session) = run.session.take() else {
        return;
    };

    run.log.started(Step::ReleaseSession);
    match session.close().await {
        Ok(()) => run.log.succeeded(Step::ReleaseSession),
        Err(err) => {
            warn!(session = %session.id(), error = %err, "session close failed");
            run.log.failed(Step::ReleaseSession, err.to_string());
        }
    }
}
