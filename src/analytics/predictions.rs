//! Heuristic forward-looking signals.
//!
//! The weights and thresholds here are product-tuned policy values, not
//! derived quantities. They are named so they can be recalibrated.

use chrono::{DateTime, Utc};

use super::group::group_by;
use super::types::{Predictions, VelocityTrend, WeeklyTrend};
use crate::model::InsightRecord;

/// Number of trailing weekly buckets considered for velocity and completion rate.
pub const VELOCITY_WINDOW_WEEKS: usize = 4;
/// Buckets on each side of the velocity comparison.
pub const VELOCITY_HALF_WINDOW: usize = 2;
/// Recent mean at or above 1.2x the previous mean is increasing (in tenths).
pub const INCREASING_RATIO_TENTHS: u64 = 12;
/// Recent mean at or below 0.8x the previous mean is decreasing (in tenths).
pub const DECREASING_RATIO_TENTHS: u64 = 8;

pub const RISK_CRITICAL_WEIGHT: u64 = 40;
pub const RISK_OVERDUE_WEIGHT: u64 = 40;
pub const RISK_BLOCKER_WEIGHT: u64 = 20;
pub const MAX_RISK_SCORE: f64 = 100.0;

/// A project with at least this many blocker insights is a bottleneck.
pub const PROJECT_BLOCKER_THRESHOLD: usize = 3;
/// An assignee with at least this many overdue items is a bottleneck.
pub const ASSIGNEE_OVERDUE_THRESHOLD: usize = 3;

pub fn compute_predictions(
    records: &[InsightRecord],
    now: DateTime<Utc>,
    weekly: &[WeeklyTrend],
) -> Predictions {
    Predictions {
        velocity_trend: velocity_trend(weekly),
        expected_completion_time: expected_completion_time(records, weekly),
        risk_score: risk_score(records, now),
        bottlenecks: bottlenecks(records, now),
    }
}

/// Compare the mean of the last two weekly buckets with the mean of the up to
/// two buckets before them. Fewer than two buckets, or nothing to compare
/// against, is `Stable`.
pub fn velocity_trend(weekly: &[WeeklyTrend]) -> VelocityTrend {
    if weekly.len() < VELOCITY_HALF_WINDOW {
        return VelocityTrend::Stable;
    }
    let window = trailing(weekly, VELOCITY_WINDOW_WEEKS);
    let (previous, recent) = window.split_at(window.len() - VELOCITY_HALF_WINDOW);
    if previous.is_empty() {
        return VelocityTrend::Stable;
    }

    // Cross-multiplied mean comparison keeps the thresholds exact:
    // recent_sum / recent_n >= k/10 * previous_sum / previous_n
    let recent_sum: u64 = recent.iter().map(|w| w.count).sum();
    let previous_sum: u64 = previous.iter().map(|w| w.count).sum();
    let lhs = recent_sum * previous.len() as u64 * 10;
    let rhs = previous_sum * recent.len() as u64;

    if lhs >= INCREASING_RATIO_TENTHS * rhs {
        VelocityTrend::Increasing
    } else if lhs <= DECREASING_RATIO_TENTHS * rhs {
        VelocityTrend::Decreasing
    } else {
        VelocityTrend::Stable
    }
}

/// Days to drain open work at the mean completion rate of the trailing
/// weekly buckets. Zero means no estimate is possible.
pub fn expected_completion_time(records: &[InsightRecord], weekly: &[WeeklyTrend]) -> f64 {
    let window = trailing(weekly, VELOCITY_WINDOW_WEEKS);
    if window.is_empty() {
        return 0.0;
    }
    let avg_rate = window.iter().map(|w| w.completion_rate).sum::<f64>() / window.len() as f64;
    if avg_rate <= 0.0 {
        return 0.0;
    }
    let open_items = records.iter().filter(|r| r.is_active()).count() as f64;
    open_items / (avg_rate / 100.0) * 7.0
}

/// Weighted blend of critical, overdue, and blocker ratios, capped at 100.
pub fn risk_score(records: &[InsightRecord], now: DateTime<Utc>) -> f64 {
    let total = records.len() as u64;
    if total == 0 {
        return 0.0;
    }
    let critical = records.iter().filter(|r| r.is_open_critical()).count() as u64;
    let overdue = records.iter().filter(|r| r.is_overdue(now)).count() as u64;
    let blockers = records.iter().filter(|r| r.is_blocker()).count() as u64;

    let weighted = critical * RISK_CRITICAL_WEIGHT
        + overdue * RISK_OVERDUE_WEIGHT
        + blockers * RISK_BLOCKER_WEIGHT;
    (weighted as f64 / total as f64 * 100.0).min(MAX_RISK_SCORE)
}

/// Projects with too many blockers, then assignees with too many overdue
/// items, each in name order.
pub fn bottlenecks(records: &[InsightRecord], now: DateTime<Utc>) -> Vec<String> {
    let mut flagged = Vec::new();

    let blockers_by_project = group_by(records, |r| r.project().filter(|_| r.is_blocker()));
    for (project, blockers) in blockers_by_project {
        if blockers.len() >= PROJECT_BLOCKER_THRESHOLD {
            flagged.push(format!("{project}: {} blockers", blockers.len()));
        }
    }

    let overdue_by_assignee = group_by(records, |r| r.assignee().filter(|_| r.is_overdue(now)));
    for (assignee, overdue) in overdue_by_assignee {
        if overdue.len() >= ASSIGNEE_OVERDUE_THRESHOLD {
            flagged.push(format!("{assignee}: {} overdue items", overdue.len()));
        }
    }

    flagged
}

fn trailing(weekly: &[WeeklyTrend], n: usize) -> &[WeeklyTrend] {
    &weekly[weekly.len().saturating_sub(n)..]
}
