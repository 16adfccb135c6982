use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{UploadCoordinator, describe};
use crate::core::{
    ProgressAggregator, Result, SessionState, UnitProgress, UploadError, UploadOutcome,
    UploadRequest, UploadSession,
};

impl UploadCoordinator {
    /// One presigned URL, one write. Nothing remote to clean up on failure.
    pub(super) async fn upload_single(
        &self,
        session: &mut UploadSession,
        request: &UploadRequest,
        percent_tx: watch::Sender<u8>,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        let aggregator = Arc::new(ProgressAggregator::new(vec![request.size()], percent_tx));
        let object = describe(request);

        session.transition(SessionState::SingleInFlight)?;

        let work = async {
            let grant = self.authorizer.issue_single(&object).await?;
            session.assign_key(&grant.key)?;

            self.transport
                .put(
                    &grant.presigned_url,
                    request.payload().clone(),
                    request.content_type(),
                    UnitProgress::new(aggregator.clone(), 0),
                )
                .await?;

            Ok::<_, UploadError>(grant)
        };

        let grant = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = work => result,
        }?;

        aggregator.finish(0);
        session.transition(SessionState::Done)?;

        Ok(UploadOutcome {
            key: grant.key,
            url: grant.url,
            file_name: request.file_name().to_string(),
        })
    }
}
