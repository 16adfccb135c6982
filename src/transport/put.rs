use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Body, Client};

use super::progress_stream::{BODY_SLICE_SIZE, ProgressStream, sliced};
use super::{PartTransport, PutReceipt};
use crate::core::{Result, UnitProgress, UploadError};

/// [`PartTransport`] issuing a streamed `PUT` with reqwest.
#[derive(Debug, Clone)]
pub struct PresignedPutTransport {
    client: Client,
    slice_size: usize,
}

impl PresignedPutTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            slice_size: BODY_SLICE_SIZE,
        }
    }

    /// Client with the given whole-request and connect timeouts.
    pub fn with_timeouts(request_timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|err| UploadError::internal(format!("Failed to build HTTP client: {}", err)))?;

        Ok(Self::new(client))
    }

    pub fn with_slice_size(mut self, slice_size: usize) -> Self {
        self.slice_size = slice_size.max(1);
        self
    }
}

impl Default for PresignedPutTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl PartTransport for PresignedPutTransport {
    async fn put(
        &self,
        presigned_url: &str,
        body: Bytes,
        content_type: &str,
        progress: UnitProgress,
    ) -> Result<PutReceipt> {
        let length = body.len() as u64;
        let stream = ProgressStream::new(sliced(body, self.slice_size), progress);

        let response = self
            .client
            .put(presigned_url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, length)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|err| UploadError::transport(None, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::transport(
                None,
                format!("storage responded with status {}", status),
            ));
        }

        let e_tag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        tracing::trace!(bytes = length, e_tag = ?e_tag, "put acknowledged");

        Ok(PutReceipt { e_tag })
    }
}
