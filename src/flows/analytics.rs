// Analytics flow.
//
// Fetches the precomputed usage summary and reshapes it into chart-ready
// series. The reshaping functions are pure and total: an empty or sparse
// summary degrades to empty series, never to an error. A generation guard
// keeps an overlapping periodic refresh and manual refresh from letting a
// late, older response clobber a newer one.

use crate::client::ApiError;
use crate::types::{AnalyticsSummary, PatternCount};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Automatic refresh cadence while the analytics view stays open.
pub const REFRESH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// How many patterns the top-patterns series keeps.
const TOP_PATTERN_LIMIT: usize = 5;

//------------------------------------------------------------------------------
// Date Ranges
//------------------------------------------------------------------------------

/// Preset reporting windows offered by the analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
}

impl DateRange {
    /// Resolves this preset to concrete bounds relative to `now`.
    ///
    /// Bounds are optional to match the API contract; a bound that cannot
    /// be represented (never the case for real calendar input) is simply
    /// omitted rather than panicking.
    pub fn bounds(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            DateRange::Last7Days => (Some(now - Duration::days(7)), Some(now)),
            DateRange::Last30Days => (Some(now - Duration::days(30)), Some(now)),
            DateRange::ThisMonth => (month_start(now.year(), now.month()), Some(now)),
            DateRange::LastMonth => {
                let (year, month) = previous_month(now.year(), now.month());
                (
                    month_start(year, month),
                    month_start(now.year(), now.month()),
                )
            }
        }
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

//------------------------------------------------------------------------------
// Reshaping
//------------------------------------------------------------------------------

/// One day of testing activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPoint {
    pub date: String,
    pub count: u64,
}

/// Two-category safe/unsafe split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetySplit {
    pub safe: u64,
    pub unsafe_count: u64,
}

/// Analysis volume for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUsagePoint {
    pub model: String,
    pub count: u64,
}

/// Daily activity as `{date, count}` pairs, ascending by date.
///
/// ISO date keys sort chronologically as strings, and the summary stores
/// them in an ordered map, so iteration order is already the display order.
pub fn daily_series(summary: &AnalyticsSummary) -> Vec<DailyPoint> {
    summary
        .daily_counts
        .iter()
        .map(|(date, count)| DailyPoint {
            date: date.clone(),
            count: *count,
        })
        .collect()
}

/// Safe/unsafe split with missing counts defaulting to zero.
pub fn safety_split(summary: &AnalyticsSummary) -> SafetySplit {
    SafetySplit {
        safe: summary.safe_prompts,
        unsafe_count: summary.unsafe_prompts,
    }
}

/// Per-model usage, descending by count.
///
/// Ties break on model name so the series is deterministic despite the
/// unordered source map.
pub fn model_usage_series(summary: &AnalyticsSummary) -> Vec<ModelUsagePoint> {
    let mut series: Vec<ModelUsagePoint> = summary
        .model_usage
        .iter()
        .map(|(model, count)| ModelUsagePoint {
            model: model.clone(),
            count: *count,
        })
        .collect();
    series.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.model.cmp(&b.model)));
    series
}

/// The top five injection patterns, descending by count.
///
/// The server already ranks the list; the first five are taken and then
/// re-sorted in case that ordering ever slips.
pub fn top_patterns(summary: &AnalyticsSummary) -> Vec<PatternCount> {
    let mut patterns: Vec<PatternCount> = summary
        .top_injection_patterns
        .iter()
        .take(TOP_PATTERN_LIMIT)
        .cloned()
        .collect();
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    patterns
}

//------------------------------------------------------------------------------
// Refresh State
//------------------------------------------------------------------------------

/// Displayed analytics state guarded against out-of-order responses.
///
/// Periodic and manual refreshes may overlap. Each fetch takes a
/// generation number before dispatch; a response is applied only when its
/// generation is at least as new as the one currently displayed, so a
/// slow response from an older fetch can never replace newer data.
#[derive(Debug, Default)]
pub struct AnalyticsState {
    next_generation: u64,
    applied_generation: Option<u64>,
    summary: Option<AnalyticsSummary>,
    last_error: Option<ApiError>,
}

impl AnalyticsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a generation number for a fetch about to be dispatched.
    pub fn begin_fetch(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Applies a fetched summary; returns whether it became the displayed
    /// state or was dropped as stale.
    pub fn apply(&mut self, generation: u64, summary: AnalyticsSummary) -> bool {
        if self.applied_generation.is_some_and(|g| generation < g) {
            return false;
        }
        self.applied_generation = Some(generation);
        self.summary = Some(summary);
        self.last_error = None;
        true
    }

    /// Records a fetch failure unless newer data already arrived.
    pub fn fail(&mut self, generation: u64, error: ApiError) -> bool {
        if self.applied_generation.is_some_and(|g| generation < g) {
            return false;
        }
        self.last_error = Some(error);
        true
    }

    pub fn summary(&self) -> Option<&AnalyticsSummary> {
        self.summary.as_ref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }
}
