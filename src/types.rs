/// Common type definitions used throughout the application.
///
/// This module defines the request and response shapes exchanged with the
/// prompt injection protection API. Every entity here is transient: it is
/// built from an HTTP response, held in flow state for rendering, and
/// discarded when the command finishes.
///
/// # Type Categories
///
/// The types are organized into two main categories:
/// - Analysis types (single and batch prompt scoring)
/// - Analytics types (precomputed usage summaries)
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Upper bound on the number of prompts accepted in one batch request.
///
/// Batches over this size are rejected client-side before any network call.
pub const MAX_BATCH_PROMPTS: usize = 20;

//------------------------------------------------------------------------------
// Analysis Types
//------------------------------------------------------------------------------

/// A single prompt submitted for safety analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    /// The prompt text to analyze
    pub text: String,

    /// Name of the LLM model the prompt is intended for
    pub model_name: String,
}

/// A bounded set of prompts scored together in one request.
///
/// The protection service accepts at most [`MAX_BATCH_PROMPTS`] prompts per
/// batch; callers enforce the bound before constructing this request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Prompts to analyze, in submission order
    pub prompts: Vec<PromptRequest>,

    /// Model name applied to the whole batch
    pub model_name: String,
}

/// Safety verdict for one prompt from the protection layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionResult {
    /// Whether the prompt was judged safe
    pub is_safe: bool,

    /// Certainty of the verdict, in [0, 1]
    pub confidence: f64,

    /// Human-readable explanation of the verdict
    pub reason: String,

    /// Optional detail block with detection specifics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ProtectionDetails>,
}

/// Optional detail block attached to a protection verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectionDetails {
    /// Injection patterns matched in the prompt, when any were found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_patterns: Option<Vec<String>>,

    /// Time the protection layer spent analyzing, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_time_ms: Option<f64>,

    /// Length of the analyzed text in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<u64>,
}

/// Response generated by the downstream LLM.
///
/// Present only when the verdict was safe and the confidence passed the
/// server-side threshold. The threshold itself is never visible to this
/// client; absence of this field is the only signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated response text
    pub text: String,

    /// Model that produced the response
    pub model_used: String,

    /// Provider-specific metadata, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

/// Result of analyzing a single prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResult {
    /// Safety verdict from the protection layer
    pub protection_result: ProtectionResult,

    /// LLM response, when the prompt cleared the confidence threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<LlmResponse>,

    /// End-to-end processing time in seconds
    pub processing_time: f64,
}

/// One scored entry of a batch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeItem {
    /// The prompt text as submitted
    pub input: String,

    /// Safety verdict for this prompt
    pub protection_result: ProtectionResult,

    /// LLM response, when the prompt cleared the confidence threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<LlmResponse>,
}

/// Result of a batch analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Per-prompt results, in submission order
    pub results: Vec<AnalyzeItem>,

    /// Total server-side processing time in seconds
    pub total_processing_time: f64,
}

/// An LLM model offered by the protection service.
///
/// Models are returned as an ordered sequence, unique by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Stable model identifier used in requests
    pub id: String,

    /// Display name
    pub name: String,

    /// Hosting provider (e.g., "openai", "anthropic")
    pub provider: String,
}

//------------------------------------------------------------------------------
// Analytics Types
//------------------------------------------------------------------------------

/// Precomputed usage summary fetched from `/stats`.
///
/// Every aggregate field defaults to its zero value so that a sparse or
/// empty summary deserializes cleanly and reshaping degrades to empty
/// series instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Total prompts analyzed in the selected window
    #[serde(default)]
    pub total_prompts: u64,

    /// Prompts judged safe
    #[serde(default)]
    pub safe_prompts: u64,

    /// Prompts judged unsafe
    #[serde(default)]
    pub unsafe_prompts: u64,

    /// Mean verdict confidence across the window, in [0, 1]
    #[serde(default)]
    pub average_confidence: f64,

    /// Mean end-to-end processing time in seconds
    #[serde(default)]
    pub average_processing_time: f64,

    /// Prompts analyzed per day, keyed by ISO date string
    #[serde(default)]
    pub daily_counts: BTreeMap<String, u64>,

    /// Analysis count per model name
    #[serde(default)]
    pub model_usage: HashMap<String, u64>,

    /// Most frequently detected injection patterns, ranked by the server
    #[serde(default)]
    pub top_injection_patterns: Vec<PatternCount>,
}

/// Occurrence count for one detected injection pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCount {
    /// The detected pattern label
    pub pattern: String,

    /// How many times it was detected
    pub count: u64,
}

/// Body of the `/health` liveness probe.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status; `"healthy"` is the only value treated as alive
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_result_parses_without_llm_response() {
        let body = r#"{
            "protection_result": {
                "is_safe": true,
                "confidence": 0.62,
                "reason": "No injection patterns found"
            },
            "processing_time": 0.41
        }"#;

        let result: AnalyzeResult = serde_json::from_str(body).unwrap();
        assert!(result.protection_result.is_safe);
        assert!(result.llm_response.is_none());
        assert!(result.protection_result.details.is_none());
    }

    #[test]
    fn protection_details_fields_are_all_optional() {
        let body = r#"{
            "is_safe": false,
            "confidence": 0.97,
            "reason": "Instruction override attempt",
            "details": {"detected_patterns": ["ignore previous instructions"]}
        }"#;

        let result: ProtectionResult = serde_json::from_str(body).unwrap();
        let details = result.details.unwrap();
        assert_eq!(
            details.detected_patterns.as_deref(),
            Some(&["ignore previous instructions".to_string()][..])
        );
        assert!(details.analysis_time_ms.is_none());
        assert!(details.text_length.is_none());
    }

    #[test]
    fn analytics_summary_tolerates_missing_fields() {
        let summary: AnalyticsSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(summary.total_prompts, 0);
        assert!(summary.daily_counts.is_empty());
        assert!(summary.top_injection_patterns.is_empty());
    }
}
