// Client for the prompt injection protection API.
//
// This module is the single point of outbound communication. It attaches
// configuration (base URL, timeout, optional API key), normalizes every
// failure into one error shape, and never silently swallows an error.
//
// # Overview
//
// The ApiClient covers the full HTTP surface consumed by the console:
// - Single and batch prompt analysis
// - Model listing and per-model detail
// - Server-curated example prompts
// - Usage analytics with an optional date range
// - A liveness probe that yields a boolean instead of an error
use crate::config::ApiConfig;
use crate::types::{
    AnalyticsSummary, AnalyzeResult, BatchRequest, BatchResult, HealthResponse, ModelInfo,
    PromptRequest,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Header carrying the API key when one is configured.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Fixed message surfaced when a request was sent but no response arrived.
pub const NO_RESPONSE_MESSAGE: &str =
    "No response received from server. Please check your connection.";

// Every transport, HTTP-status, and parse failure collapses into this one
// shape so callers need a single handling path.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Normalized, user-facing failure description
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Client for the prompt injection protection API.
//
// Cheap to clone; the underlying reqwest client shares its connection pool.
#[derive(Clone)]
pub struct ApiClient {
    // HTTP client carrying the configured request timeout
    client: Client,

    // Base URL of the protection API, including the versioned path
    base_url: String,

    // Optional API key attached to every outgoing request
    api_key: Option<String>,
}

impl ApiClient {
    //--------------------------------------------------------------------------
    // Construction and Initialization
    //--------------------------------------------------------------------------

    // Creates a new protection API client from validated configuration.
    //
    // # Errors
    //
    // Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::new(format!("Error: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    //--------------------------------------------------------------------------
    // Public API Methods
    //--------------------------------------------------------------------------

    // Analyzes a single prompt and returns its verdict.
    pub async fn analyze(&self, request: &PromptRequest) -> Result<AnalyzeResult, ApiError> {
        self.request("/prompts/analyze", |client, url| {
            client.post(url).json(request)
        })
        .await
    }

    // Analyzes a batch of prompts in exactly one network call.
    //
    // No client-side chunking happens here regardless of prompt count; the
    // caller bounds the batch to MAX_BATCH_PROMPTS before submitting.
    pub async fn batch_analyze(&self, request: &BatchRequest) -> Result<BatchResult, ApiError> {
        self.request("/prompts/batch-analyze", |client, url| {
            client.post(url).json(request)
        })
        .await
    }

    // Lists the LLM models offered by the protection service.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        self.request("/models", |client, url| client.get(url)).await
    }

    // Fetches the detail object for one model.
    //
    // The console renders this verbatim; no field of it is otherwise
    // consumed, so it stays an untyped JSON value.
    pub async fn model_details(&self, model_id: &str) -> Result<Value, ApiError> {
        let endpoint = format!("/models/{model_id}");
        self.request(&endpoint, |client, url| client.get(url)).await
    }

    // Fetches the server-curated example prompts.
    pub async fn example_prompts(&self) -> Result<Vec<String>, ApiError> {
        self.request("/prompts/examples", |client, url| client.get(url))
            .await
    }

    // Fetches the precomputed analytics summary.
    //
    // When a date range is given, both bounds are serialized as ISO-8601
    // and sent as `start_date`/`end_date` query parameters.
    pub async fn analytics(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<AnalyticsSummary, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(start) = start_date {
            params.push(("start_date", start.to_rfc3339()));
        }
        if let Some(end) = end_date {
            params.push(("end_date", end.to_rfc3339()));
        }

        self.request("/stats", |client, url| client.get(url).query(&params))
            .await
    }

    // Probes service liveness.
    //
    // Returns `true` only when the response body's `status` field equals
    // `"healthy"`. This is the one call that never propagates an error:
    // any transport or parse failure yields `false`.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        debug!("Probing API health at {}", url);

        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("API health check failed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            warn!("API health check returned status {}", response.status());
            return false;
        }

        match response.json::<HealthResponse>().await {
            Ok(body) => body.status == "healthy",
            Err(e) => {
                warn!("API health check returned an unreadable body: {}", e);
                false
            }
        }
    }

    //--------------------------------------------------------------------------
    // Helper Methods
    //--------------------------------------------------------------------------

    // Generic method handling both GET and POST requests, reducing
    // duplication across endpoints.
    //
    // Attaches the JSON content type and, when configured, the API key
    // header, then normalizes every failure into ApiError.
    async fn request<T, F>(&self, endpoint: &str, request_builder: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(&Client, &str) -> reqwest::RequestBuilder,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Dispatching request to {}", url);

        let mut builder =
            request_builder(&self.client, &url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(|e| {
            error!("Request to protection API failed: {}", e);
            normalize_transport_error(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read protection API response body: {}", e);
            normalize_transport_error(e)
        })?;

        if !status.is_success() {
            error!("Protection API error: {} - {}", status, body);
            return Err(ApiError::new(server_error_message(status, &body)));
        }

        debug!("Successfully received response from protection API");
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse protection API response: {}", e);
            ApiError::new(format!("Error: {e}"))
        })
    }
}

// Maps a reqwest failure onto the normalized error message rules.
//
// A request that could not even be constructed surfaces the underlying
// error; anything that was sent but got no usable response collapses to
// the fixed no-response message.
fn normalize_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_builder() {
        ApiError::new(format!("Error: {error}"))
    } else {
        ApiError::new(NO_RESPONSE_MESSAGE)
    }
}

// Builds the message for an error-status response: the server-supplied
// `detail` field when present, otherwise a generic status line.
fn server_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_prefers_detail_field() {
        let message = server_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": "Batch size exceeds the maximum of 20 prompts"}"#,
        );
        assert_eq!(message, "Batch size exceeds the maximum of 20 prompts");
    }

    #[test]
    fn server_error_falls_back_to_status_line() {
        let message = server_error_message(StatusCode::INTERNAL_SERVER_ERROR, "not json");
        assert_eq!(message, "Request failed with status code 500");

        // A JSON body without a string `detail` also falls back.
        let message = server_error_message(StatusCode::BAD_GATEWAY, r#"{"detail": 7}"#);
        assert_eq!(message, "Request failed with status code 502");
    }
}
