use async_trait::async_trait;
use jr_core::api::{AnnotationStats, ApiResponse, ExportFormat, FileDimensions, SubmitReceipt, UploadResponse};
use jr_core::config::ApiConfig;
use jr_core::identity::{IdentityStore, SessionIdentity, UNKNOWN_FINGERPRINT};
use jr_core::ReviewConfig;
use jr_session::{BackendError, ReviewBackend, Submission};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

/// Human-readable message from an error body.
///
/// The backend answers failures with `{"detail": ..}`; a non-string
/// detail is rendered as JSON, a non-JSON body is returned as is.
pub fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(body.to_string()),
        },
        Err(_) => Some(body.to_string()),
    }
}

/// [`ReviewBackend`] over HTTP. Every request carries the annotator
/// fingerprint header.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    fingerprint_header: String,
    fingerprint: String,
}

impl HttpBackend {
    /// An empty fingerprint is sent as `unknown`.
    pub fn new(api: &ApiConfig, fingerprint: impl Into<String>) -> Self {
        let fingerprint = Some(fingerprint.into())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| UNKNOWN_FINGERPRINT.to_string());
        Self {
            client: Client::new(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            fingerprint_header: api.fingerprint_header.clone(),
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Backend for `config`, identified by the persisted fingerprint.
    pub fn from_config<S: IdentityStore>(config: &ReviewConfig, identity: &SessionIdentity<S>) -> Self {
        Self::new(&config.api, identity.fingerprint())
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("invalid API base URL {}: {e}", self.base_url))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("API base URL cannot carry a path: {}", self.base_url))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn identified(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(self.fingerprint_header.as_str(), self.fingerprint.as_str())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.identified(request).send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        tracing::warn!(status = status.as_u16(), detail = %detail, "backend returned an error");
        Err(BackendError::Http { status: status.as_u16(), detail })
    }

    /// Unwrap `{success, data, ..}`; `None` when `data` is absent.
    async fn envelope<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, BackendError> {
        let response = self.send(request).await?;
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        if !body.success {
            return Err(BackendError::Rejected(body.failure_reason()));
        }
        Ok(body.data)
    }

    async fn required<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        self.envelope(request)
            .await?
            .ok_or_else(|| BackendError::MalformedResponse("response has no data".into()))
    }
}

#[async_trait]
impl ReviewBackend for HttpBackend {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, BackendError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.client.post(self.endpoint(&["upload"])?).multipart(form);
        tracing::debug!(filename, "uploading file");
        self.required(request).await
    }

    async fn submit(&self, project_id: &str, submission: &Submission) -> Result<SubmitReceipt, BackendError> {
        let url = self.endpoint(&["projects", project_id, "annotations"])?;
        let request = self.client.post(url).json(submission);
        tracing::debug!(project_id, item_id = %submission.item_id, "submitting annotation");
        Ok(self.envelope(request).await?.unwrap_or_default())
    }

    async fn dimensions(&self, file_hash: &str) -> Result<FileDimensions, BackendError> {
        let request = self
            .client
            .get(self.endpoint(&["analytics", "dimensions"])?)
            .query(&[("file_hash", file_hash)]);
        self.required(request).await
    }

    /// The stats endpoint is the one response without an envelope.
    async fn stats(&self, file_hash: &str, dimension: Option<&str>) -> Result<AnnotationStats, BackendError> {
        let mut request = self
            .client
            .get(self.endpoint(&["analytics", "stats"])?)
            .query(&[("file_hash", file_hash)]);
        if let Some(dimension) = dimension {
            request = request.query(&[("dimension", dimension)]);
        }
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))
    }

    async fn export(
        &self,
        file_hash: &str,
        dimension: Option<&str>,
        format: ExportFormat,
    ) -> Result<Vec<u8>, BackendError> {
        let mut request = self
            .client
            .get(self.endpoint(&["export"])?)
            .query(&[("file_hash", file_hash), ("format", format.as_str())]);
        if let Some(dimension) = dimension {
            request = request.query(&[("dimension", dimension)]);
        }
        let bytes = self.send(request).await?.bytes().await.map_err(transport)?;
        tracing::debug!(file_hash, size = bytes.len(), "export downloaded");
        Ok(bytes.to_vec())
    }
}
