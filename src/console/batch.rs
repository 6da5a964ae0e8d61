// Batch analysis command.

use crate::client::ApiClient;
use crate::console::{format_confidence, truncate, verdict_badge, CommandError};
use crate::flows::batch::{BatchFlow, BatchInput, BatchSession};
use crate::flows::FlowError;

/// View options applied to the result table after a successful batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOptions {
    pub only_safe: bool,
    pub only_unsafe: bool,
    pub expand_details: bool,
}

// Submits one batch and prints the summary, the (optionally filtered)
// result table, and any expanded detail panels.
pub async fn run(
    client: &ApiClient,
    input: &BatchInput,
    model_name: &str,
    view: ViewOptions,
) -> Result<(), CommandError> {
    let mut flow = BatchFlow::new();

    match flow.submit(client, input, model_name).await {
        Ok(()) => {}
        Err(FlowError::Validation(warning)) => {
            println!("Warning: {warning}");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    }

    if let Some(session) = flow.session_mut() {
        if view.only_safe {
            session.toggle_only_safe();
        }
        if view.only_unsafe {
            session.toggle_only_unsafe();
        }
        if view.expand_details {
            session.expand_all();
        }
        render_session(session);
    }
    Ok(())
}

fn render_session(session: &BatchSession) {
    let stats = session.stats();

    println!();
    println!("Batch summary:");
    println!("  Total prompts:      {}", stats.total);
    println!(
        "  Safe prompts:       {} ({:.0}%)",
        stats.safe,
        stats.safe_percent()
    );
    println!(
        "  Unsafe prompts:     {} ({:.0}%)",
        stats.unsafe_count,
        stats.unsafe_percent()
    );
    println!(
        "  Average confidence: {}",
        format_confidence(stats.average_confidence)
    );
    println!(
        "  Processing time:    {:.0} ms",
        session.processing_time_ms()
    );
    println!();

    let visible = session.visible_rows();
    if visible.is_empty() {
        println!("No results match the current filters.");
        return;
    }

    println!("{:<4} {:<50} {:<8} {:>10}", "#", "Prompt", "Safety", "Conf.");
    for (position, row) in visible.iter().enumerate() {
        println!(
            "{:<4} {:<50} {:<8} {:>10}",
            position + 1,
            truncate(&row.item.input, 50),
            verdict_badge(row.item.protection_result.is_safe),
            format_confidence(row.item.protection_result.confidence)
        );

        if session.is_expanded(row.id) {
            println!("     Reason: {}", row.item.protection_result.reason);

            if let Some(response) = &row.item.llm_response {
                println!("     LLM response ({}):", response.model_used);
                for line in response.text.lines() {
                    println!("       {line}");
                }
            }

            if let Some(patterns) = row
                .item
                .protection_result
                .details
                .as_ref()
                .and_then(|d| d.detected_patterns.as_deref())
                .filter(|p| !p.is_empty())
            {
                println!("     Detected patterns:");
                for pattern in patterns {
                    println!("       - {pattern}");
                }
            }
        }
    }
}
