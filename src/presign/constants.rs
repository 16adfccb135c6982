pub const ISSUE_SINGLE_PATH: &str = "uploads/presign";
pub const INIT_MULTIPART_PATH: &str = "uploads/multipart/init";
pub const ISSUE_PARTS_PATH: &str = "uploads/multipart/parts";
pub const COMPLETE_MULTIPART_PATH: &str = "uploads/multipart/complete";
pub const ABORT_MULTIPART_PATH: &str = "uploads/multipart/abort";

/// Seconds
pub const DEFAULT_TIMEOUT: u64 = 30;
