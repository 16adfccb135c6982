use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{Result, UploadError};

/// Local identifier of one upload attempt, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the caller wants stored. Immutable for the lifetime of one attempt.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    payload: Bytes,
    file_name: String,
    content_type: String,
    category: String,
}

impl UploadRequest {
    pub fn new(
        payload: impl Into<Bytes>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            category: category.into(),
        }
    }

    /// Reads the whole file into memory and names the request after it.
    pub async fn from_path(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                UploadError::validation(format!("Can't read file name of {}", path.display()))
            })?
            .to_string();

        let payload = tokio::fs::read(path).await?;

        Ok(Self::new(payload, file_name, content_type, category))
    }

    /// Stores the object under `file_name` instead of the name it was read from.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Rejects requests the backend could never authorize.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            return Err(UploadError::validation("file name is empty"));
        }
        if self.content_type.trim().is_empty() {
            return Err(UploadError::validation("content type is empty"));
        }

        Ok(())
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Cheap sub-slice of the payload. `range` must lie within the payload.
    pub fn slice(&self, range: &ByteRange) -> Bytes {
        self.payload.slice(range.start as usize..range.end as usize)
    }
}

/// Half-open byte range `[start, end)` over the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Transport mode chosen for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransportMode {
    Single,
    Multipart,
}

/// Receipt of one finished part, as sent to the completion call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    pub part_number: u32,
    #[serde(rename = "eTag")]
    pub e_tag: String,
}

/// Where the stored object ended up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub key: String,
    pub url: String,
    pub file_name: String,
}

// Requests and outcomes cross task boundaries.
const _: () = {
    fn assert_send<T: Send + Sync>() {}
    fn assert_types() {
        assert_send::<UploadRequest>();
        assert_send::<UploadOutcome>();
        assert_send::<CompletedPart>();
    }
};
