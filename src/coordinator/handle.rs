use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::core::{Result, UploadError, UploadOutcome, UploadReport};

/// Handle to a spawned upload attempt. Dropping it cancels the attempt.
pub struct UploadHandle {
    progress: watch::Receiver<u8>,
    cancel: CancellationToken,
    join: JoinHandle<(Result<UploadOutcome>, UploadReport)>,
    _guard: DropGuard,
}

impl UploadHandle {
    pub(super) fn new(
        progress: watch::Receiver<u8>,
        cancel: CancellationToken,
        join: JoinHandle<(Result<UploadOutcome>, UploadReport)>,
    ) -> Self {
        let _guard = cancel.clone().drop_guard();

        Self {
            progress,
            cancel,
            join,
            _guard,
        }
    }

    /// Percentage in `[0, 100]`, never decreasing.
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.clone()
    }

    pub fn percent(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn finish(self) -> Result<UploadOutcome> {
        self.finish_with_report().await.0
    }

    /// The report is missing only when the upload task panicked.
    pub async fn finish_with_report(self) -> (Result<UploadOutcome>, Option<UploadReport>) {
        let UploadHandle { join, _guard, .. } = self;

        let finished = join.await;
        // The task is done, so releasing the guard cancels nothing.
        drop(_guard);

        match finished {
            Ok((result, report)) => (result, Some(report)),
            Err(err) => (
                Err(UploadError::internal(format!("Upload task failed: {}", err))),
                None,
            ),
        }
    }
}
