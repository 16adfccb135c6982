//! Drives one upload attempt from strategy selection to a stored object.

mod handle;
mod multipart;
mod single;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::Config;
use crate::core::{
    Result, SessionState, ThresholdPolicy, UploadOutcome, UploadPlan, UploadReport, UploadRequest,
    UploadSession,
};
use crate::presign::{Authorizer, HttpAuthorizer, ObjectDescriptor};
use crate::transport::{PartTransport, PresignedPutTransport};

pub use handle::UploadHandle;

/// Parts in flight at once unless configured otherwise.
pub const DEFAULT_PART_CONCURRENCY: usize = 4;

/// Composes the threshold policy, the authorizer and the transport. Cheap to
/// clone; every call starts a fresh [`UploadSession`].
#[derive(Clone)]
pub struct UploadCoordinator {
    authorizer: Arc<dyn Authorizer>,
    transport: Arc<dyn PartTransport>,
    policy: ThresholdPolicy,
    part_concurrency: usize,
}

impl UploadCoordinator {
    pub fn new(authorizer: Arc<dyn Authorizer>, transport: Arc<dyn PartTransport>) -> Self {
        Self {
            authorizer,
            transport,
            policy: ThresholdPolicy::default(),
            part_concurrency: DEFAULT_PART_CONCURRENCY,
        }
    }

    /// HTTP authorizer and transport built from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|err| {
                crate::core::UploadError::internal(format!("Failed to build HTTP client: {}", err))
            })?;

        let mut authorizer = HttpAuthorizer::with_client(client, &config.endpoint)?;
        if let Some(token) = &config.token {
            authorizer = authorizer.with_token(token.clone());
        }

        let transport = PresignedPutTransport::with_timeouts(
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )?;

        Ok(Self::new(Arc::new(authorizer), Arc::new(transport))
            .with_policy(config.policy())
            .with_part_concurrency(config.part_concurrency))
    }

    pub fn with_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_part_concurrency(mut self, part_concurrency: usize) -> Self {
        self.part_concurrency = part_concurrency.max(1);
        self
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    /// Runs one attempt inline. Dropping this future stops the attempt without
    /// remote cleanup; use [`spawn`](Self::spawn) when cancellation must abort.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        self.upload_with_report(request).await.0
    }

    pub async fn upload_with_report(
        &self,
        request: UploadRequest,
    ) -> (Result<UploadOutcome>, UploadReport) {
        let (percent_tx, _) = watch::channel(0);
        self.run(request, percent_tx, CancellationToken::new()).await
    }

    /// Runs the attempt on its own task. Cancelling or dropping the handle
    /// aborts a multipart session on the backend.
    pub fn spawn(&self, request: UploadRequest) -> UploadHandle {
        let (percent_tx, percent_rx) = watch::channel(0);
        let cancel = CancellationToken::new();

        let coordinator = self.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move { coordinator.run(request, percent_tx, token).await });

        UploadHandle::new(percent_rx, cancel, join)
    }

    /// Full attempt with caller supplied progress channel and cancellation.
    pub async fn run(
        &self,
        request: UploadRequest,
        percent_tx: watch::Sender<u8>,
        cancel: CancellationToken,
    ) -> (Result<UploadOutcome>, UploadReport) {
        let mut session = UploadSession::new();
        let span =
            tracing::info_span!("upload", session = %session.id(), file = %request.file_name());

        let result = async {
            let result = self.drive(&mut session, &request, percent_tx, &cancel).await;

            match &result {
                Ok(outcome) => {
                    tracing::info!(key = %outcome.key, bytes = request.size(), "upload finished");
                }
                Err(err) => {
                    tracing::error!(kind = ?err.kind(), error = %err, "upload failed");
                    if !session.state().is_terminal() {
                        let _ = session.transition(SessionState::Failed);
                    }
                }
            }

            result
        }
        .instrument(span)
        .await;

        (result, session.report())
    }

    async fn drive(
        &self,
        session: &mut UploadSession,
        request: &UploadRequest,
        percent_tx: watch::Sender<u8>,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        request.validate()?;

        let plan = self.policy.plan(request.size());
        session.select_mode(plan.mode())?;
        tracing::info!(
            mode = ?plan.mode(),
            bytes = request.size(),
            parts = plan.part_count(),
            "strategy selected"
        );

        match plan {
            UploadPlan::Single => self.upload_single(session, request, percent_tx, cancel).await,
            UploadPlan::Multipart { ranges, .. } => {
                self.upload_multipart(session, request, ranges, percent_tx, cancel).await
            }
        }
    }
}

fn describe(request: &UploadRequest) -> ObjectDescriptor {
    ObjectDescriptor {
        file_name: request.file_name().to_string(),
        content_type: request.content_type().to_string(),
        category: request.category().to_string(),
    }
}
