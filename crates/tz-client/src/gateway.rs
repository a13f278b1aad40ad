//! HTTP client for the TensorZero gateway.
//!
//! Every operation validates its arguments locally first, then issues exactly one request.
//! Non-2xx answers become [`GatewayError::Transport`] with the response body attached, and
//! 2xx bodies that do not match the contract become [`GatewayError::Parse`].

use crate::sse::InferenceStream;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::env;
use tracing::{debug, error};
use tz_types::{
    CreateDatapointRequest, Datapoint, DatapointOutputKind, DatapointResponse, FeedbackRequest,
    FeedbackResponse, GatewayError, GatewayResult, InferenceRequest, InferenceResponse,
};

/// Gateway URL used when `TENSORZERO_GATEWAY_URL` is unset.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";

/// Environment variable holding the gateway base URL.
pub const GATEWAY_URL_ENV: &str = "TENSORZERO_GATEWAY_URL";

/// Client bound to one gateway base URL.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    client: Client,
}

impl GatewayClient {
    /// Creates a client for the gateway at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> GatewayResult<Self> {
        Self::with_http_client(base_url, Client::new())
    }

    /// Creates a client that reuses an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `base_url` is not an absolute http(s) URL.
    pub fn with_http_client(base_url: &str, client: Client) -> GatewayResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| GatewayError::Validation(format!("Invalid gateway URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Validation(format!(
                "Invalid gateway URL {base_url}: not a base URL"
            )));
        }
        Ok(Self { base_url, client })
    }

    /// Creates a client from `TENSORZERO_GATEWAY_URL`, defaulting to `http://localhost:3000`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configured URL is invalid.
    pub fn from_env() -> GatewayResult<Self> {
        let url = env::var(GATEWAY_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        Self::new(&url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Validation(format!("Invalid gateway URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Runs a non-streaming inference.
    ///
    /// The request's `stream` flag is forced to `false`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a request without exactly one target, a transport
    /// error for non-2xx answers and a parse error for a body that is neither chat nor JSON.
    pub async fn infer_once(&self, mut request: InferenceRequest) -> GatewayResult<InferenceResponse> {
        request.validate()?;
        request.stream = Some(false);

        let url = self.endpoint(&["inference"])?;
        let response = self.post("Inference", url, &request).await?;
        let response: InferenceResponse = parse_body("Inference", response).await?;
        debug!(
            inference_id = %response.inference_id(),
            variant_name = %response.variant_name(),
            "Inference completed"
        );
        Ok(response)
    }

    /// Runs a streaming inference.
    ///
    /// The request's `stream` flag is forced to `true`. The returned stream yields one
    /// response per event; dropping it closes the connection.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a request without exactly one target and a transport
    /// error when the gateway does not accept the request or answers without a body.
    pub async fn infer_stream(&self, mut request: InferenceRequest) -> GatewayResult<InferenceStream> {
        request.validate()?;
        request.stream = Some(true);

        let url = self.endpoint(&["inference"])?;
        let response = self.post("Streaming inference", url, &request).await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            error!(status = %status, "Streaming inference response has no body");
            return Err(GatewayError::status(
                "Streaming inference",
                status.as_u16(),
                Some("response has no body".to_string()),
            ));
        }
        debug!("Streaming inference accepted");
        Ok(InferenceStream::from_response(response))
    }

    /// Attaches a metric value to an inference or episode.
    ///
    /// # Errors
    ///
    /// Returns a transport error for non-2xx answers and a parse error for an unexpected body.
    pub async fn submit_feedback(&self, request: &FeedbackRequest) -> GatewayResult<FeedbackResponse> {
        let url = self.endpoint(&["feedback"])?;
        let response = self.post("Feedback", url, request).await?;
        let response: FeedbackResponse = parse_body("Feedback", response).await?;
        debug!(
            feedback_id = %response.feedback_id,
            metric_name = %request.metric_name,
            "Feedback recorded"
        );
        Ok(response)
    }

    /// Adds a datapoint to `dataset_name`, built from an existing inference.
    ///
    /// `output_kind` defaults to [`DatapointOutputKind::Inherit`].
    ///
    /// # Errors
    ///
    /// Returns a validation error, before any request, when the dataset name or inference id
    /// is blank.
    pub async fn create_datapoint(
        &self,
        dataset_name: &str,
        inference_id: &str,
        output_kind: Option<DatapointOutputKind>,
    ) -> GatewayResult<DatapointResponse> {
        if dataset_name.trim().is_empty() {
            return Err(GatewayError::Validation("Dataset name must be a non-empty string".to_string()));
        }
        if inference_id.trim().is_empty() {
            return Err(GatewayError::Validation("Inference ID must be a non-empty string".to_string()));
        }

        let request = CreateDatapointRequest {
            inference_id: inference_id.to_string(),
            output: output_kind.unwrap_or_default(),
        };
        let url = self.endpoint(&["datasets", dataset_name, "datapoints"])?;
        let response = self.post("Create datapoint", url, &request).await?;
        let response: DatapointResponse = parse_body("Create datapoint", response).await?;
        debug!(dataset_name, datapoint_id = %response.id, "Datapoint created");
        Ok(response)
    }

    /// Replaces the datapoint `datapoint_id` in `dataset_name`.
    ///
    /// # Errors
    ///
    /// Returns a validation error, before any request, for blank identifiers or a datapoint
    /// that fails its local checks.
    pub async fn update_datapoint(
        &self,
        dataset_name: &str,
        datapoint_id: &str,
        datapoint: &Datapoint,
    ) -> GatewayResult<DatapointResponse> {
        if dataset_name.trim().is_empty() {
            return Err(GatewayError::Validation("Dataset name must be a non-empty string".to_string()));
        }
        if datapoint_id.trim().is_empty() {
            return Err(GatewayError::Validation("Datapoint ID must be a non-empty string".to_string()));
        }
        datapoint.validate()?;

        let url = self.endpoint(&["datasets", dataset_name, "datapoints", datapoint_id])?;
        let request = self.client.put(url.clone()).json(datapoint);
        let response = send("Update datapoint", &url, request).await?;
        let response: DatapointResponse = parse_body("Update datapoint", response).await?;
        debug!(dataset_name, datapoint_id = %response.id, "Datapoint updated");
        Ok(response)
    }

    async fn post<T: Serialize + ?Sized>(&self, operation: &str, url: Url, body: &T) -> GatewayResult<Response> {
        let request = self.client.post(url.clone()).json(body);
        send(operation, &url, request).await
    }
}

/// Sends a request and turns non-2xx answers into transport errors carrying the body text.
async fn send(operation: &str, url: &Url, request: reqwest::RequestBuilder) -> GatewayResult<Response> {
    let response = request.send().await.map_err(|e| {
        error!(error = %e, url = %url, operation, "Failed to send request to gateway");
        GatewayError::network(operation, e)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.ok().filter(|text| !text.trim().is_empty());
        error!(
            status = %status,
            error = body.as_deref().unwrap_or_default(),
            url = %url,
            operation,
            "Gateway returned error status"
        );
        return Err(GatewayError::status(operation, status.as_u16(), body));
    }

    Ok(response)
}

async fn parse_body<T: DeserializeOwned>(operation: &str, response: Response) -> GatewayResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::network(operation, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(error = %e, operation, "Failed to parse gateway response");
        GatewayError::Parse(format!("{operation} response did not match the expected shape: {e}"))
    })
}
