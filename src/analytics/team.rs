use chrono::{DateTime, Utc};

use super::group::group_by;
use super::mean_days;
use super::types::TeamMemberMetrics;
use crate::model::{InsightRecord, Status};

/// Per-assignee metrics in assignee order. Unassigned records are skipped.
pub fn compute_team_metrics(records: &[InsightRecord], now: DateTime<Utc>) -> Vec<TeamMemberMetrics> {
    group_by(records, |r| r.assignee())
        .into_iter()
        .map(|(assignee, assigned)| {
            let total_assigned = assigned.len() as u64;
            let mut completed = 0u64;
            let mut in_progress = 0u64;
            let mut overdue = 0u64;
            let mut completion_ms = 0i64;

            for record in &assigned {
                if let Some(ms) = record.resolution_millis() {
                    completed += 1;
                    completion_ms += ms;
                }
                if record.status == Status::InProgress {
                    in_progress += 1;
                }
                if record.is_overdue(now) {
                    overdue += 1;
                }
            }

            TeamMemberMetrics {
                assignee: assignee.to_string(),
                total_assigned,
                completed,
                in_progress,
                overdue,
                avg_completion_time: mean_days(completion_ms, completed),
                efficiency: efficiency(completed, overdue, total_assigned),
            }
        })
        .collect()
}

/// `(completed - overdue) / total * 100`, floored at zero.
fn efficiency(completed: u64, overdue: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let net = completed as f64 - overdue as f64;
    (net / total as f64 * 100.0).max(0.0)
}
