// Interactive flows of the console.
//
// Each flow owns the lifecycle of one request kind: single prompt
// analysis, batch analysis, and the analytics summary. Flows validate
// input before any network call, hold the request state machine, and
// expose the pure view computations (aggregation, filtering, reshaping)
// that tests exercise without a network.

use crate::client::ApiError;
use crate::types::MAX_BATCH_PROMPTS;

pub mod analytics;
pub mod batch;
pub mod single;

// Client-side rejections raised before any network call.
//
// These surface immediately as user-facing warnings and never reach the
// transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a prompt to test")]
    EmptyPrompt,

    #[error("Please enter at least one prompt to test")]
    EmptyBatch,

    #[error("The maximum number of prompts per batch is {MAX_BATCH_PROMPTS}. Please reduce the number of prompts.")]
    BatchTooLarge { count: usize },

    #[error("No valid prompts found after splitting the input")]
    EmptySplit,
}

// Failure of one flow submission: either the input never left the client,
// or the API call itself failed.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Lifecycle of one in-flow request: `Idle -> Pending -> {Succeeded, Failed}`.
///
/// Both terminal states are re-triggerable by a new submission. There is no
/// cancellation: the triggering control stays disabled while a request is
/// pending, so at most one request per flow is ever in flight.
#[derive(Debug, Clone)]
pub enum RequestState<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(ApiError),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Idle
    }
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    /// The held result, when the last submission succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            RequestState::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            RequestState::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    /// The held failure, when the last submission failed.
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            RequestState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_state_accessors_follow_the_machine() {
        let mut state: RequestState<u32> = RequestState::Idle;
        assert!(!state.is_pending());
        assert!(state.data().is_none());
        assert!(state.error().is_none());

        state = RequestState::Pending;
        assert!(state.is_pending());

        state = RequestState::Succeeded(7);
        assert_eq!(state.data(), Some(&7));
        assert!(state.error().is_none());

        state = RequestState::Failed(ApiError::new("boom"));
        assert!(state.data().is_none());
        assert_eq!(state.error().map(|e| e.message.as_str()), Some("boom"));
    }
}
