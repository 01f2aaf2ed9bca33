use std::sync::Arc;

use action_flow::{Credential, SubmissionRequest, WorkflowExecutor, WorkflowResult};
use tracing::{error, info};

use crate::errors::AppError;

#[derive(Clone)]
pub struct ServeState {
    executor: Arc<dyn WorkflowExecutor>,
    credential: Option<Arc<Credential>>,
}

impl ServeState {
    pub fn new(executor: Arc<dyn WorkflowExecutor>, credential: Option<Credential>) -> Self {
        Self {
            executor,
            credential: credential.map(Arc::new),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Result<Arc<Credential>, AppError> {
        self.credential.clone().ok_or(AppError::MissingCredentials)
    }

    /// Run one submission on its own task. The run finishes and releases its
    /// browser even when the requesting connection goes away.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<WorkflowResult, AppError> {
        let credential = self.credential()?;
        let executor = Arc::clone(&self.executor);

        info!(entries = request.entries().len(), "dispatching workflow run");
        tokio::spawn(async move { executor.execute(&credential, &request).await })
            .await
            .map_err(|err| {
                error!(?err, "workflow task aborted");
                AppError::Internal(format!("workflow task aborted: {err}"))
            })
    }
}
