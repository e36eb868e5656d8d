pub mod breakdown;
pub mod group;
pub mod predictions;
pub mod project_health;
pub mod summary;
pub mod team;
pub mod trends;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;

use chrono::{DateTime, Utc};

use crate::date_util::millis_to_days;
use crate::error::Result;
use crate::model::InsightRecord;
use crate::source::InsightSource;

/// Run every calculator over one record snapshot.
///
/// Pure and deterministic: the result depends only on `records` (as a
/// multiset) and `now`. Values outside the closed type/priority/status sets
/// pass through as their own buckets; unknown priorities weigh as medium.
pub fn compute_analytics(records: &[InsightRecord], now: DateTime<Utc>) -> AnalyticsResult {
    let summary = summary::compute_summary(records, now);
    let category_breakdown = breakdown::compute_breakdown(records);
    let trends = trends::compute_trends(records);
    let predictions = predictions::compute_predictions(records, now, &trends.weekly);
    let team_metrics = team::compute_team_metrics(records, now);
    let project_health = project_health::compute_project_health(records, now);

    AnalyticsResult {
        summary,
        category_breakdown,
        trends,
        predictions,
        team_metrics,
        project_health,
    }
}

/// Like [`compute_analytics`], but rejects the snapshot if any record carries
/// a type, priority, or status outside the known enumerations.
pub fn compute_analytics_strict(
    records: &[InsightRecord],
    now: DateTime<Utc>,
) -> Result<AnalyticsResult> {
    for record in records {
        record.validate()?;
    }
    Ok(compute_analytics(records, now))
}

/// Fetch the window once from `source` and analyze it. A failed fetch is
/// returned unchanged and nothing is computed.
pub async fn analyze<S: InsightSource + ?Sized>(
    source: &S,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    project: Option<&str>,
    now: DateTime<Utc>,
    strict: bool,
) -> Result<AnalyticsResult> {
    let records = source
        .fetch_insights(window_start, window_end, project)
        .await?;
    log::debug!(
        "Fetched {} insights for {} .. {}{}",
        records.len(),
        window_start,
        window_end,
        project.map(|p| format!(" (project {p})")).unwrap_or_default()
    );

    if strict {
        return compute_analytics_strict(&records, now);
    }

    for record in &records {
        if let Err(e) = record.validate() {
            log::warn!("{e}; counting it under its own bucket");
        }
        if record.updated_at < record.created_at {
            log::warn!("Insight {} was updated before it was created", record.id);
        }
    }
    Ok(compute_analytics(&records, now))
}

/// `part / whole * 100`, or 0 for an empty whole.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Mean of a summed millisecond span in days, or 0 for no samples.
pub(crate) fn mean_days(total_ms: i64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    millis_to_days(total_ms) / n as f64
}
