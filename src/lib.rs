//! Client side coordinator for uploading objects straight to object storage
//! through presigned URLs issued by a trusted backend.
//!
//! Small payloads go up in one `PUT`. Larger ones become a multipart upload:
//! the backend opens the upload, hands out one URL per part, the parts are
//! written concurrently and the backend assembles them. A failed multipart
//! attempt is aborted and reported as a plain failure.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod presign;
pub mod transport;
pub mod utils;

pub use config::{Config, ConfigError};
pub use coordinator::{UploadCoordinator, UploadHandle};
pub use presign::{Authorizer, HttpAuthorizer};
pub use transport::{PartTransport, PresignedPutTransport, PutReceipt};

pub use self::core::{
    FailureKind, ProgressAggregator, Result, SessionState, ThresholdPolicy, TransportMode,
    UploadError, UploadOutcome, UploadPlan, UploadReport, UploadRequest,
};
