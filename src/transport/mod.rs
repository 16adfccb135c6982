//! Writes of one byte range against a presigned URL.

mod progress_stream;
mod put;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::{Result, UnitProgress};

pub use progress_stream::{BODY_SLICE_SIZE, ProgressStream, sliced};
pub use put::PresignedPutTransport;

/// What the storage service handed back for an acknowledged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    /// Raw `ETag` header value. Required for multipart parts.
    pub e_tag: Option<String>,
}

/// Performs one authorized write. Never retries; any failure is reported as a
/// transport error and dropping the future cancels the request.
#[async_trait]
pub trait PartTransport: Send + Sync {
    async fn put(
        &self,
        presigned_url: &str,
        body: Bytes,
        content_type: &str,
        progress: UnitProgress,
    ) -> Result<PutReceipt>;
}
