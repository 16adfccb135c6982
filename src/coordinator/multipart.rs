use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Semaphore, watch};
use tokio_util::sync::CancellationToken;

use super::{UploadCoordinator, describe};
use crate::core::{
    ByteRange, MultipartTarget, PartTask, ProgressAggregator, Result, SessionId, SessionState,
    UnitProgress, UploadError, UploadOutcome, UploadRequest, UploadSession,
};
use crate::presign::{Authorizer, match_part_grants};

impl UploadCoordinator {
    /// init -> issue all part URLs -> upload every part -> complete. Once the
    /// backend has handed out an upload id, any failure ends in an abort.
    pub(super) async fn upload_multipart(
        &self,
        session: &mut UploadSession,
        request: &UploadRequest,
        ranges: Vec<ByteRange>,
        percent_tx: watch::Sender<u8>,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        let sizes = ranges.iter().map(|range| range.len()).collect();
        let aggregator = Arc::new(ProgressAggregator::new(sizes, percent_tx));
        let object = describe(request);

        let grant = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.authorizer.init_multipart(&object) => result,
        }?;

        let target = MultipartTarget {
            upload_id: grant.upload_id,
            key: grant.key,
        };
        session.assign_target(&target)?;
        session.transition(SessionState::MultipartInitiated)?;
        tracing::info!(
            upload_id = %target.upload_id,
            key = %target.key,
            "multipart upload initiated"
        );

        let result = self
            .transfer_parts(session, request, &target, ranges, &aggregator, cancel)
            .await;

        let err = match result {
            Ok(outcome) => return Ok(outcome),
            Err(err) => err,
        };

        if let Err(transition_err) = session.transition(SessionState::Aborting) {
            tracing::warn!(error = %transition_err, "skipping abort");
            return Err(err);
        }
        abort_quietly(self.authorizer.as_ref(), &target, session.id()).await;

        let terminal = match err {
            UploadError::Cancelled => SessionState::Aborted,
            _ => SessionState::Failed,
        };
        session.transition(terminal)?;

        Err(err)
    }

    async fn transfer_parts(
        &self,
        session: &mut UploadSession,
        request: &UploadRequest,
        target: &MultipartTarget,
        ranges: Vec<ByteRange>,
        aggregator: &Arc<ProgressAggregator>,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        let part_numbers: Vec<u32> = (1..=ranges.len() as u32).collect();

        let grants = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.authorizer.issue_parts(target, &part_numbers) => result,
        }?;
        let grants = match_part_grants(&part_numbers, grants)?;

        let parts: Vec<PartTask> = grants
            .into_iter()
            .zip(ranges)
            .map(|(grant, range)| PartTask::new(grant.part_number, range, grant.presigned_url))
            .collect();
        session.set_parts(parts.clone());
        session.transition(SessionState::PartsAuthorized)?;
        session.transition(SessionState::PartsUploading)?;

        let semaphore = Arc::new(Semaphore::new(self.part_concurrency));
        let uploads = parts.iter().enumerate().map(|(unit, part)| {
            let semaphore = semaphore.clone();
            let transport = self.transport.clone();
            let progress = UnitProgress::new(aggregator.clone(), unit);
            let body = request.slice(&part.range);

            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| UploadError::internal("part semaphore closed"))?;

                let receipt = transport
                    .put(&part.presigned_url, body, request.content_type(), progress.clone())
                    .await
                    .map_err(|err| err.for_part(part.part_number))?;

                let e_tag = receipt
                    .e_tag
                    .filter(|e_tag| !e_tag.is_empty())
                    .ok_or_else(|| {
                        UploadError::transport(Some(part.part_number), "storage returned no ETag")
                    })?;

                progress.finish();
                tracing::debug!(part = part.part_number, e_tag = %e_tag, "part uploaded");

                Ok::<_, UploadError>((part.part_number, e_tag))
            }
        });

        // Every part settles before anything is decided.
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            results = join_all(uploads) => results,
        };

        let mut first_error = None;
        for result in results {
            match result {
                Ok((part_number, e_tag)) => session.record_receipt(part_number, e_tag),
                Err(err) => {
                    tracing::warn!(error = %err, "part failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let completed_parts = session
            .completed_parts()
            .ok_or_else(|| UploadError::internal("part finished without a receipt"))?;

        session.transition(SessionState::Completing)?;
        let completed = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.authorizer.complete_multipart(target, &completed_parts) => {
                result.map_err(|err| UploadError::Completion { reason: err.to_string() })
            }
        }?;

        if completed.key != target.key {
            tracing::warn!(
                expected = %target.key,
                returned = %completed.key,
                "completion returned a different key"
            );
        }
        session.transition(SessionState::Done)?;

        Ok(UploadOutcome {
            key: target.key.clone(),
            url: completed.url,
            file_name: request.file_name().to_string(),
        })
    }
}

/// Best effort. A failed abort is logged and never replaces the original error.
async fn abort_quietly(authorizer: &dyn Authorizer, target: &MultipartTarget, session: SessionId) {
    match authorizer.abort_multipart(target).await {
        Ok(()) => {
            tracing::info!(%session, upload_id = %target.upload_id, "multipart upload aborted");
        }
        Err(err) => {
            let err = UploadError::Abort { reason: err.to_string() };
            tracing::warn!(%session, upload_id = %target.upload_id, error = %err, "abort failed");
        }
    }
}
