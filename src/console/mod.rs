// Text rendering and command entry points for the console.
//
// Each submodule drives one flow and prints its result. Rendering is
// deliberately plain: the behavioral weight lives in the flows and the
// API client, and these modules only turn their output into text.

use crate::client::ApiError;
use crate::flows::FlowError;

pub mod analytics;
pub mod analyze;
pub mod batch;
pub mod models;
pub mod status;

// Failure of one console command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Flow(#[from] FlowError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Badge text for a safety verdict.
pub fn verdict_badge(is_safe: bool) -> &'static str {
    if is_safe {
        "SAFE"
    } else {
        "UNSAFE"
    }
}

/// Truncates a prompt for one table cell, marking the cut with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}\u{2026}")
}

/// Formats a [0, 1] confidence as a percentage with one decimal.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}
