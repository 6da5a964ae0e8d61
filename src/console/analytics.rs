// Analytics command.
//
// Fetches the usage summary once, renders it, and in watch mode keeps
// refreshing every five minutes until interrupted. Manual reruns and the
// periodic refresh share the same generation-guarded state, so a late
// response from an older fetch never replaces newer data.

use crate::client::ApiClient;
use crate::console::{format_confidence, CommandError};
use crate::flows::analytics::{
    daily_series, model_usage_series, safety_split, top_patterns, AnalyticsState, DateRange,
    REFRESH_INTERVAL,
};
use crate::types::AnalyticsSummary;
use chrono::Utc;
use tracing::{info, warn};

// Renders the analytics view once, or continuously in watch mode.
pub async fn run(
    client: &ApiClient,
    range: Option<DateRange>,
    watch: bool,
) -> Result<(), CommandError> {
    let mut state = AnalyticsState::new();

    refresh(client, &mut state, range).await;

    if !watch {
        // Single shot: a failed fetch propagates instead of rendering.
        if let Some(error) = state.last_error() {
            return Err(CommandError::Api(error.clone()));
        }
        render(&state);
        return Ok(());
    }

    render(&state);

    info!(
        "Watching analytics; refreshing every {} seconds",
        REFRESH_INTERVAL.as_secs()
    );
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    ticker.tick().await; // the first tick completes immediately

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh(client, &mut state, range).await;
                render(&state);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Stopping analytics watch");
                return Ok(());
            }
        }
    }
}

// One guarded fetch: reserve a generation, resolve the date range, apply
// or record the outcome.
async fn refresh(client: &ApiClient, state: &mut AnalyticsState, range: Option<DateRange>) {
    let generation = state.begin_fetch();
    let (start, end) = match range {
        Some(range) => range.bounds(Utc::now()),
        None => (None, None),
    };

    match client.analytics(start, end).await {
        Ok(summary) => {
            state.apply(generation, summary);
        }
        Err(error) => {
            warn!("Analytics fetch failed: {}", error);
            state.fail(generation, error);
        }
    }
}

fn render(state: &AnalyticsState) {
    if let Some(error) = state.last_error() {
        println!("Failed to load analytics: {error}");
        return;
    }

    let Some(summary) = state.summary() else {
        println!("No analytics data available.");
        return;
    };

    render_stat_cards(summary);
    render_daily(summary);
    render_safety(summary);
    render_models(summary);
    render_patterns(summary);
}

fn render_stat_cards(summary: &AnalyticsSummary) {
    let safe_percent = if summary.total_prompts == 0 {
        0.0
    } else {
        summary.safe_prompts as f64 / summary.total_prompts as f64 * 100.0
    };

    println!();
    println!("Total prompts tested:  {}", summary.total_prompts);
    println!(
        "Safe prompts:          {} ({safe_percent:.1}%)",
        summary.safe_prompts
    );
    println!(
        "Average confidence:    {}",
        format_confidence(summary.average_confidence)
    );
    println!(
        "Avg. processing time:  {:.0} ms",
        summary.average_processing_time * 1000.0
    );
}

fn render_daily(summary: &AnalyticsSummary) {
    println!();
    println!("Daily prompt testing activity:");
    let series = daily_series(summary);
    if series.is_empty() {
        println!("  No data available");
        return;
    }
    for point in series {
        println!("  {:<12} {}", point.date, point.count);
    }
}

fn render_safety(summary: &AnalyticsSummary) {
    let split = safety_split(summary);
    println!();
    println!("Safe vs. unsafe prompts:");
    println!("  Safe:   {}", split.safe);
    println!("  Unsafe: {}", split.unsafe_count);
}

fn render_models(summary: &AnalyticsSummary) {
    println!();
    println!("Model usage distribution:");
    let series = model_usage_series(summary);
    if series.is_empty() {
        println!("  No data available");
        return;
    }
    for point in series {
        println!("  {:<24} {}", point.model, point.count);
    }
}

fn render_patterns(summary: &AnalyticsSummary) {
    println!();
    println!("Top injection patterns detected:");
    let patterns = top_patterns(summary);
    if patterns.is_empty() {
        println!("  No data available");
        return;
    }
    for pattern in patterns {
        println!("  {:<40} {}", pattern.pattern, pattern.count);
    }
}
