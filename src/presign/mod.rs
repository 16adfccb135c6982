//! Calls to the trusted backend that hands out presigned URLs.

mod client;
mod constants;
pub mod types;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::{AuthOperation, CompletedPart, MultipartTarget, Result, UploadError};

pub use client::HttpAuthorizer;
pub use types::{CompletedObject, MultipartGrant, ObjectDescriptor, PartGrant, SingleGrant};

/// Issues presigned URLs and drives the remote side of a multipart upload.
///
/// Every call is a single request. Implementations must not retry.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// One URL for writing the whole object.
    async fn issue_single(&self, object: &ObjectDescriptor) -> Result<SingleGrant>;

    /// Opens a multipart upload and fixes its upload id and key.
    async fn init_multipart(&self, object: &ObjectDescriptor) -> Result<MultipartGrant>;

    /// One URL per requested part number.
    async fn issue_parts(
        &self,
        target: &MultipartTarget,
        part_numbers: &[u32],
    ) -> Result<Vec<PartGrant>>;

    /// Assembles the object. `parts` is ordered by ascending part number.
    async fn complete_multipart(
        &self,
        target: &MultipartTarget,
        parts: &[CompletedPart],
    ) -> Result<CompletedObject>;

    /// Discards the multipart upload and every part written so far.
    async fn abort_multipart(&self, target: &MultipartTarget) -> Result<()>;
}

/// Pairs every requested part number with exactly one granted URL, in the
/// order requested.
pub fn match_part_grants(requested: &[u32], grants: Vec<PartGrant>) -> Result<Vec<PartGrant>> {
    let mut by_number: HashMap<u32, PartGrant> = HashMap::with_capacity(grants.len());
    for grant in grants {
        let number = grant.part_number;
        if by_number.insert(number, grant).is_some() {
            return Err(UploadError::authorization(
                AuthOperation::IssueParts,
                format!("part {} granted twice", number),
            ));
        }
    }

    let mut matched = Vec::with_capacity(requested.len());
    for number in requested {
        let grant = by_number.remove(number).ok_or_else(|| {
            UploadError::authorization(
                AuthOperation::IssueParts,
                format!("no url for part {}", number),
            )
        })?;
        if grant.presigned_url.is_empty() {
            return Err(UploadError::authorization(
                AuthOperation::IssueParts,
                format!("empty url for part {}", number),
            ));
        }
        matched.push(grant);
    }

    if let Some(extra) = by_number.keys().min() {
        return Err(UploadError::authorization(
            AuthOperation::IssueParts,
            format!("url for unrequested part {}", extra),
        ));
    }

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(part_number: u32) -> PartGrant {
        PartGrant {
            part_number,
            presigned_url: format!("https://storage.test/part/{}", part_number),
        }
    }

    #[test]
    fn test_grants_follow_requested_order() {
        let matched = match_part_grants(&[1, 2, 3], vec![grant(3), grant(1), grant(2)]).unwrap();
        let numbers: Vec<u32> = matched.iter().map(|g| g.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_duplicate_or_extra_grants_are_rejected() {
        assert!(match_part_grants(&[1, 2], vec![grant(1)]).is_err());
        assert!(match_part_grants(&[1], vec![grant(1), grant(1)]).is_err());
        assert!(match_part_grants(&[1], vec![grant(1), grant(4)]).is_err());

        let empty = PartGrant { part_number: 1, presigned_url: String::new() };
        assert!(match_part_grants(&[1], vec![empty]).is_err());
    }
}
