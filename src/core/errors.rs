use std::fmt;

use thiserror::Error;

/// Backend call that produced an authorization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    IssueSingle,
    InitMultipart,
    IssueParts,
    CompleteMultipart,
    AbortMultipart,
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthOperation::IssueSingle => "issue_single",
            AuthOperation::InitMultipart => "init_multipart",
            AuthOperation::IssueParts => "issue_parts",
            AuthOperation::CompleteMultipart => "complete_multipart",
            AuthOperation::AbortMultipart => "abort_multipart",
        };
        f.write_str(name)
    }
}

/// Coarse failure classes. Used for logging, never for caller branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Authorization,
    Transport,
    Completion,
    Abort,
    Cancelled,
    Internal,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid upload request: {0}")]
    Validation(String),

    #[error("Authorization failed during {operation}: {reason}")]
    Authorization {
        operation: AuthOperation,
        reason: String,
    },

    #[error("Transport failed{}: {reason}", part_label(.part))]
    Transport {
        part: Option<u32>,
        reason: String,
    },

    #[error("Completing multipart upload failed: {reason}")]
    Completion { reason: String },

    #[error("Aborting multipart upload failed: {reason}")]
    Abort { reason: String },

    #[error("Upload was cancelled")]
    Cancelled,

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn part_label(part: &Option<u32>) -> String {
    match part {
        Some(number) => format!(" for part {}", number),
        None => String::new(),
    }
}

impl UploadError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn authorization(operation: AuthOperation, reason: impl fmt::Display) -> Self {
        Self::Authorization {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn transport(part: Option<u32>, reason: impl fmt::Display) -> Self {
        Self::Transport {
            part,
            reason: reason.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Tags a transport error with the part it happened on.
    pub fn for_part(self, number: u32) -> Self {
        match self {
            UploadError::Transport { reason, .. } => UploadError::Transport {
                part: Some(number),
                reason,
            },
            other => other,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            UploadError::Validation(_) | UploadError::Io(_) => FailureKind::Validation,
            UploadError::Authorization { .. } | UploadError::Url(_) => FailureKind::Authorization,
            UploadError::Transport { .. } => FailureKind::Transport,
            UploadError::Completion { .. } => FailureKind::Completion,
            UploadError::Abort { .. } => FailureKind::Abort,
            UploadError::Cancelled => FailureKind::Cancelled,
            UploadError::Internal(_) => FailureKind::Internal,
        }
    }
}

/// Error alias
pub type Result<T, E = UploadError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_carries_part_number() {
        let err = UploadError::transport(None, "connection reset").for_part(2);
        assert_eq!(err.to_string(), "Transport failed for part 2: connection reset");
        assert_eq!(err.kind(), FailureKind::Transport);

        let whole = UploadError::transport(None, "status 403");
        assert_eq!(whole.to_string(), "Transport failed: status 403");
    }

    #[test]
    fn test_for_part_leaves_other_errors_alone() {
        let err = UploadError::authorization(AuthOperation::IssueParts, "status 500").for_part(1);
        assert_eq!(err.kind(), FailureKind::Authorization);
        assert!(err.to_string().contains("issue_parts"));
    }
}
