// Single-prompt analysis flow.
//
// One analyze call per submission. The submitted text must be non-blank
// after trimming; the request itself carries the text as typed.

use crate::client::ApiClient;
use crate::flows::{FlowError, RequestState, ValidationError};
use crate::types::{AnalyzeResult, PromptRequest};
use tracing::{debug, info, warn};

// How a completed analysis should be presented.
//
// A safe verdict without an LLM response is an explicit informational
// state, not an error: the prompt cleared the safety check but stayed
// below the server's confidence threshold for downstream processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// The prompt was judged unsafe; nothing was forwarded to the LLM
    Unsafe,
    /// Safe verdict, but confidence stayed below the forwarding threshold
    SafeBelowThreshold,
    /// Safe verdict and an LLM response was produced
    SafeWithResponse,
}

/// Classifies a completed analysis for rendering.
pub fn outcome(result: &AnalyzeResult) -> AnalysisOutcome {
    if !result.protection_result.is_safe {
        AnalysisOutcome::Unsafe
    } else if result.llm_response.is_some() {
        AnalysisOutcome::SafeWithResponse
    } else {
        AnalysisOutcome::SafeBelowThreshold
    }
}

// Drives one prompt at a time through the protection API.
#[derive(Default)]
pub struct SinglePromptFlow {
    state: RequestState<AnalyzeResult>,
}

impl SinglePromptFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<AnalyzeResult> {
        &self.state
    }

    /// The result of the last completed submission, if any.
    pub fn result(&self) -> Option<&AnalyzeResult> {
        self.state.data()
    }

    // Validates and submits one prompt for analysis.
    //
    // A blank prompt is rejected without touching the flow state or the
    // network. On a transport/API failure the flow lands in its failed
    // state and stays re-triggerable.
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        text: &str,
        model_name: &str,
    ) -> Result<(), FlowError> {
        if text.trim().is_empty() {
            warn!("Rejected empty prompt before submission");
            return Err(ValidationError::EmptyPrompt.into());
        }

        let request = PromptRequest {
            text: text.to_string(),
            model_name: model_name.to_string(),
        };

        debug!("Submitting prompt for analysis with model {}", model_name);
        self.state = RequestState::Pending;

        match client.analyze(&request).await {
            Ok(result) => {
                if !result.protection_result.is_safe {
                    info!(
                        "Unsafe prompt detected (confidence {:.2}): {}",
                        result.protection_result.confidence, result.protection_result.reason
                    );
                }
                self.state = RequestState::Succeeded(result);
                Ok(())
            }
            Err(error) => {
                self.state = RequestState::Failed(error.clone());
                Err(error.into())
            }
        }
    }
}
