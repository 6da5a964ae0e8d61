// Single-prompt analysis command.

use crate::client::ApiClient;
use crate::console::{format_confidence, verdict_badge, CommandError};
use crate::flows::single::{outcome, AnalysisOutcome, SinglePromptFlow};
use crate::flows::FlowError;
use crate::types::AnalyzeResult;
use tracing::debug;

// Analyzes one prompt and prints the verdict card.
//
// Validation failures are surfaced as warnings without touching the
// network; API failures propagate to the caller.
pub async fn run(client: &ApiClient, prompt: &str, model_name: &str) -> Result<(), CommandError> {
    let mut flow = SinglePromptFlow::new();

    match flow.submit(client, prompt, model_name).await {
        Ok(()) => {}
        Err(FlowError::Validation(warning)) => {
            println!("Warning: {warning}");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    }

    if let Some(result) = flow.result() {
        render_result(result);
    }
    Ok(())
}

// Fetches and prints the server-curated example prompts.
pub async fn run_examples(client: &ApiClient) -> Result<(), CommandError> {
    let examples = client.example_prompts().await?;
    if examples.is_empty() {
        println!("No example prompts available.");
        return Ok(());
    }

    println!("Example prompts:");
    for (index, example) in examples.iter().enumerate() {
        println!("  [{index}] {example}");
    }
    Ok(())
}

// Looks up the example prompt at `index` for `analyze --example`.
pub async fn example_at(client: &ApiClient, index: usize) -> Result<String, CommandError> {
    let examples = client.example_prompts().await?;
    debug!("Fetched {} example prompts", examples.len());
    examples.into_iter().nth(index).ok_or_else(|| {
        CommandError::Api(crate::client::ApiError::new(format!(
            "No example prompt at index {index}"
        )))
    })
}

fn render_result(result: &AnalyzeResult) {
    let protection = &result.protection_result;

    println!();
    println!("Verdict:    {}", verdict_badge(protection.is_safe));
    println!("Confidence: {}", format_confidence(protection.confidence));
    println!("Reason:     {}", protection.reason);

    if let Some(details) = &protection.details {
        if let Some(patterns) = details
            .detected_patterns
            .as_deref()
            .filter(|p| !p.is_empty())
        {
            println!("Detected patterns:");
            for pattern in patterns {
                println!("  - {pattern}");
            }
        }
        if let Some(analysis_time) = details.analysis_time_ms {
            println!("Analysis time: {analysis_time:.0} ms");
        }
        if let Some(text_length) = details.text_length {
            println!("Text length:   {text_length} chars");
        }
    }

    match outcome(result) {
        AnalysisOutcome::SafeWithResponse => {
            if let Some(response) = &result.llm_response {
                println!();
                println!("LLM response ({}):", response.model_used);
                println!("{}", response.text);
            }
        }
        AnalysisOutcome::SafeBelowThreshold => {
            println!();
            println!(
                "The prompt was judged potentially safe, but with a confidence \
                 below the threshold for LLM processing."
            );
        }
        AnalysisOutcome::Unsafe => {}
    }

    println!();
    println!("Processing time: {:.2} ms", result.processing_time * 1000.0);
}
