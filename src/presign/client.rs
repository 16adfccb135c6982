use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::Authorizer;
use super::constants::{
    ABORT_MULTIPART_PATH, COMPLETE_MULTIPART_PATH, DEFAULT_TIMEOUT, INIT_MULTIPART_PATH,
    ISSUE_PARTS_PATH, ISSUE_SINGLE_PATH,
};
use super::types::{
    AbortMultipartRequest, CompleteMultipartRequest, CompletedObject, IssuePartsRequest,
    MultipartGrant, ObjectDescriptor, PartGrant, PartGrantsBody, SingleGrant,
};
use crate::core::{AuthOperation, CompletedPart, MultipartTarget, Result, UploadError};

/// [`Authorizer`] talking HTTP+JSON to the backend.
#[derive(Debug, Clone)]
pub struct HttpAuthorizer {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpAuthorizer {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT))
            .build()
            .map_err(|err| UploadError::internal(format!("Failed to build HTTP client: {}", err)))?;

        Self::with_client(client, endpoint)
    }

    pub fn with_client(client: Client, endpoint: &str) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)?;
        // Url::join drops the last segment unless the base ends with '/'
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            client,
            endpoint,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn create_headers(&self, operation: AuthOperation) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|err| UploadError::authorization(operation, err))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        operation: AuthOperation,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        let url = self.endpoint.join(path)?;
        let headers = self.create_headers(operation)?;

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|err| UploadError::authorization(operation, err))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UploadError::authorization(
                operation,
                format!("status {}: {}", status, text.trim()),
            ));
        }

        Ok(response)
    }

    async fn post_json<B, R>(&self, operation: AuthOperation, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.post(operation, path, body).await?;

        response.json::<R>().await.map_err(|err| {
            UploadError::authorization(operation, format!("malformed response: {}", err))
        })
    }
}

fn require(operation: AuthOperation, field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(UploadError::authorization(
            operation,
            format!("malformed response: empty {}", field),
        ));
    }

    Ok(())
}

#[async_trait]
impl Authorizer for HttpAuthorizer {
    async fn issue_single(&self, object: &ObjectDescriptor) -> Result<SingleGrant> {
        let operation = AuthOperation::IssueSingle;
        let grant: SingleGrant = self.post_json(operation, ISSUE_SINGLE_PATH, object).await?;
        require(operation, "presignedUrl", &grant.presigned_url)?;
        require(operation, "key", &grant.key)?;
        require(operation, "url", &grant.url)?;

        Ok(grant)
    }

    async fn init_multipart(&self, object: &ObjectDescriptor) -> Result<MultipartGrant> {
        let operation = AuthOperation::InitMultipart;
        let grant: MultipartGrant = self.post_json(operation, INIT_MULTIPART_PATH, object).await?;
        require(operation, "uploadId", &grant.upload_id)?;
        require(operation, "key", &grant.key)?;

        Ok(grant)
    }

    async fn issue_parts(
        &self,
        target: &MultipartTarget,
        part_numbers: &[u32],
    ) -> Result<Vec<PartGrant>> {
        let body = IssuePartsRequest {
            upload_id: target.upload_id.clone(),
            key: target.key.clone(),
            part_numbers: part_numbers.to_vec(),
        };
        let grants: PartGrantsBody =
            self.post_json(AuthOperation::IssueParts, ISSUE_PARTS_PATH, &body).await?;

        Ok(grants.into_grants())
    }

    async fn complete_multipart(
        &self,
        target: &MultipartTarget,
        parts: &[CompletedPart],
    ) -> Result<CompletedObject> {
        let body = CompleteMultipartRequest {
            upload_id: target.upload_id.clone(),
            key: target.key.clone(),
            parts: parts.to_vec(),
        };

        let operation = AuthOperation::CompleteMultipart;
        let completed: CompletedObject =
            self.post_json(operation, COMPLETE_MULTIPART_PATH, &body).await?;
        require(operation, "key", &completed.key)?;
        require(operation, "url", &completed.url)?;

        Ok(completed)
    }

    async fn abort_multipart(&self, target: &MultipartTarget) -> Result<()> {
        let body = AbortMultipartRequest {
            upload_id: target.upload_id.clone(),
            key: target.key.clone(),
        };
        self.post(AuthOperation::AbortMultipart, ABORT_MULTIPART_PATH, &body).await?;

        Ok(())
    }
}
