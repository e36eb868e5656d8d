use chrono::{DateTime, Duration, Utc};

use super::types::Summary;
use super::{mean_days, percentage};
use crate::model::InsightRecord;

pub const WEEKLY_GROWTH_DAYS: i64 = 7;
pub const MONTHLY_GROWTH_DAYS: i64 = 30;

pub fn compute_summary(records: &[InsightRecord], now: DateTime<Utc>) -> Summary {
    let total = records.len() as u64;
    let mut critical_items = 0u64;
    let mut overdue_items = 0u64;
    let mut completed = 0u64;
    let mut resolution_ms = 0i64;

    for record in records {
        if record.is_open_critical() {
            critical_items += 1;
        }
        if record.is_overdue(now) {
            overdue_items += 1;
        }
        if let Some(ms) = record.resolution_millis() {
            completed += 1;
            resolution_ms += ms;
        }
    }

    Summary {
        total_insights: total,
        critical_items,
        overdue_items,
        completion_rate: percentage(completed, total),
        avg_resolution_time: mean_days(resolution_ms, completed),
        weekly_growth: growth(records, now, WEEKLY_GROWTH_DAYS),
        monthly_growth: growth(records, now, MONTHLY_GROWTH_DAYS),
    }
}

/// Percentage change in creations between `(now - days, now]` and the
/// `days`-long period before it. Zero when the earlier period is empty.
fn growth(records: &[InsightRecord], now: DateTime<Utc>, days: i64) -> f64 {
    let span = Duration::days(days);
    let recent_start = now - span;
    let prior_start = recent_start - span;

    let mut recent = 0u64;
    let mut prior = 0u64;
    for record in records {
        let created = record.created_at;
        if created > recent_start && created <= now {
            recent += 1;
        } else if created > prior_start && created <= recent_start {
            prior += 1;
        }
    }

    if prior == 0 {
        return 0.0;
    }
    (recent as f64 - prior as f64) / prior as f64 * 100.0
}
