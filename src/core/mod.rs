mod errors;
mod policy;
mod progress;
mod session;
mod types;

#[cfg(test)]
mod tests;

pub use errors::{AuthOperation, FailureKind, Result, UploadError};
pub use policy::{
    DEFAULT_MULTIPART_THRESHOLD, DEFAULT_PART_SIZE, ThresholdPolicy, UploadPlan, partition,
};
pub use progress::{ProgressAggregator, UnitProgress};
pub use session::{MultipartTarget, PartTask, SessionState, UploadReport, UploadSession};
pub use types::{ByteRange, CompletedPart, SessionId, TransportMode, UploadOutcome, UploadRequest};
