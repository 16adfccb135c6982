use serde::{Deserialize, Serialize};

use crate::core::CompletedPart;

/// Body of `issue_single` and `init_multipart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub file_name: String,
    pub content_type: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleGrant {
    pub presigned_url: String,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartGrant {
    pub upload_id: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePartsRequest {
    pub upload_id: String,
    pub key: String,
    pub part_numbers: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartGrant {
    pub part_number: u32,
    pub presigned_url: String,
}

/// Backends answer `issue_parts` either with a bare array or wrapped in `parts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum PartGrantsBody {
    Bare(Vec<PartGrant>),
    Wrapped { parts: Vec<PartGrant> },
}

impl PartGrantsBody {
    pub(crate) fn into_grants(self) -> Vec<PartGrant> {
        match self {
            PartGrantsBody::Bare(parts) => parts,
            PartGrantsBody::Wrapped { parts } => parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartRequest {
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<CompletedPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedObject {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortMultipartRequest {
    pub upload_id: String,
    pub key: String,
}
