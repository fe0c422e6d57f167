//! HTTP client for image download and label detection.

use std::time::Duration;

use base64::Engine;
use reqwest::{Client, Response, Url};

use crate::error::{ServiceErrorKind, VisionError};
use crate::retry::retry_with_backoff;
use crate::types::{
    DetectLabelsRequest, DetectLabelsResponse, ImagePayload, Label, LabelOutcome,
    ServiceErrorBody,
};

/// Default cap on downloaded image size; DetectLabels rejects larger inline images.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Downloads attachment images and sends them to a label service.
pub struct LabelClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
    max_image_bytes: usize,
}

impl LabelClient {
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`VisionError::InvalidEndpoint`] if `endpoint` does not parse.
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| VisionError::InvalidEndpoint(format!("'{endpoint}': {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.map(str::to_owned).filter(|k| !k.is_empty()),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_image_bytes: MAX_IMAGE_BYTES,
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    /// Downloads an image and labels it in one call.
    ///
    /// Callers that throttle the image host and the label service separately
    /// use [`LabelClient::download_image`] and [`LabelClient::label_image`]
    /// instead; this is those two steps back to back.
    ///
    /// # Errors
    ///
    /// Any download or label-service failure, after retries.
    pub async fn enrich(
        &self,
        image_url: &str,
        min_confidence: f32,
    ) -> Result<LabelOutcome, VisionError> {
        let bytes = self.download_image(image_url).await?;
        self.label_image(&bytes, min_confidence).await
    }

    /// Labels downloaded image bytes, keeping labels at or above `min_confidence`.
    ///
    /// # Errors
    ///
    /// See [`LabelClient::detect_labels`].
    pub async fn label_image(
        &self,
        image: &[u8],
        min_confidence: f32,
    ) -> Result<LabelOutcome, VisionError> {
        let labels = self.detect_labels(image, min_confidence).await?;
        let outcome = LabelOutcome::from_labels(&labels, min_confidence);
        tracing::debug!(
            returned = labels.len(),
            labelled = matches!(outcome, LabelOutcome::Labels(_)),
            "image labelled"
        );
        Ok(outcome)
    }

    /// Fetches the raw bytes of an image.
    ///
    /// # Errors
    ///
    /// - [`VisionError::ImageStatus`] on a non-2xx response (5xx retried).
    /// - [`VisionError::EmptyImage`] or [`VisionError::ImageOversize`] for
    ///   bodies the label service would reject anyway. An oversized body is
    ///   rejected from its `Content-Length`, or as soon as the bytes read so
    ///   far pass the limit.
    /// - [`VisionError::Http`] on transport failure.
    pub async fn download_image(&self, image_url: &str) -> Result<Vec<u8>, VisionError> {
        let limit = self.max_image_bytes;
        let bytes = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let mut response = self.client.get(image_url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(VisionError::ImageStatus {
                    status: status.as_u16(),
                });
            }
            if let Some(declared) = response.content_length() {
                let size = usize::try_from(declared).unwrap_or(usize::MAX);
                if size > limit {
                    return Err(VisionError::ImageOversize { size, limit });
                }
            }

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                let size = body.len().saturating_add(chunk.len());
                if size > limit {
                    return Err(VisionError::ImageOversize { size, limit });
                }
                body.extend_from_slice(&chunk);
            }
            Ok::<_, VisionError>(body)
        })
        .await?;

        if bytes.is_empty() {
            return Err(VisionError::EmptyImage);
        }
        Ok(bytes)
    }

    /// Sends image bytes to the label endpoint and returns every label it reports.
    ///
    /// # Errors
    ///
    /// - [`VisionError::Service`] for typed service errors. Throttling and
    ///   internal errors are retried.
    /// - [`VisionError::UnexpectedStatus`] for other non-2xx responses.
    /// - [`VisionError::Deserialize`] if the success body has the wrong shape.
    pub async fn detect_labels(
        &self,
        image: &[u8],
        min_confidence: f32,
    ) -> Result<Vec<Label>, VisionError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let body = DetectLabelsRequest {
            image: ImagePayload { bytes: &encoded },
            min_confidence,
        };
        let body = &body;

        let text = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let mut request = self.client.post(self.endpoint.clone()).json(body);
            if let Some(key) = self.api_key.as_deref() {
                request = request.bearer_auth(key);
            }
            let response = request.send().await?;
            let response = check_service_status(response).await?;
            Ok::<_, VisionError>(response.text().await?)
        })
        .await?;

        let parsed: DetectLabelsResponse =
            serde_json::from_str(&text).map_err(|e| VisionError::Deserialize {
                context: "DetectLabels".to_owned(),
                source: e,
            })?;
        Ok(parsed.labels)
    }
}

async fn check_service_status(response: Response) -> Result<Response, VisionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let amz_type = response
        .headers()
        .get("x-amzn-errortype")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(':').next().unwrap_or(v).to_owned());
    let body_text = response.text().await.unwrap_or_default();
    let body: ServiceErrorBody = serde_json::from_str(&body_text).unwrap_or_default();

    match body.type_.or(body.code).or(amz_type) {
        Some(code) => Err(VisionError::Service {
            kind: ServiceErrorKind::from_code(&code),
            message: body.message.unwrap_or_default(),
        }),
        None => Err(VisionError::UnexpectedStatus {
            status: status.as_u16(),
        }),
    }
}
