//! Per-project health scoring.
//!
//! Penalties and risk thresholds are product-tuned policy values.

use chrono::{DateTime, Duration, Utc};

use super::group::group_by;
use super::percentage;
use super::types::{ProjectHealth, RiskLevel};
use crate::date_util::MILLIS_PER_DAY;
use crate::model::InsightRecord;

pub const BASE_HEALTH_SCORE: f64 = 100.0;
pub const BLOCKER_PENALTY: f64 = 10.0;
pub const CRITICAL_ISSUE_PENALTY: f64 = 15.0;
/// Penalty per percentage point of incomplete work.
pub const INCOMPLETE_WORK_PENALTY: f64 = 0.3;

pub const HIGH_RISK_HEALTH_BELOW: f64 = 40.0;
pub const HIGH_RISK_CRITICAL_ABOVE: u64 = 3;
pub const HIGH_RISK_BLOCKERS_ABOVE: u64 = 2;
pub const MEDIUM_RISK_HEALTH_BELOW: f64 = 70.0;
pub const MEDIUM_RISK_CRITICAL_ABOVE: u64 = 1;
pub const MEDIUM_RISK_BLOCKERS_ABOVE: u64 = 0;

/// Completions within this many days count toward recent velocity.
pub const RECENT_VELOCITY_DAYS: i64 = 7;

/// Per-project health in project order. Records without a project are skipped.
pub fn compute_project_health(records: &[InsightRecord], now: DateTime<Utc>) -> Vec<ProjectHealth> {
    let recent_since = now - Duration::days(RECENT_VELOCITY_DAYS);

    group_by(records, |r| r.project())
        .into_iter()
        .map(|(project, items)| {
            let total = items.len() as u64;
            let mut completed = 0u64;
            let mut blockers = 0u64;
            let mut critical_issues = 0u64;
            let mut open_items = 0u64;
            let mut recently_completed = 0u64;

            for record in &items {
                if record.is_completed() {
                    completed += 1;
                }
                if record.is_blocker() {
                    blockers += 1;
                }
                if record.is_open_critical() {
                    critical_issues += 1;
                }
                if record.is_active() {
                    open_items += 1;
                }
                if record.completed_between(recent_since, now) {
                    recently_completed += 1;
                }
            }

            let completion_percentage = percentage(completed, total);
            let health_score = health_score(blockers, critical_issues, completion_percentage);

            ProjectHealth {
                project_name: project.to_string(),
                total,
                completed,
                blockers,
                critical_issues,
                completion_percentage,
                health_score,
                risk_level: risk_level(health_score, critical_issues, blockers),
                estimated_completion_date: estimated_completion(open_items, recently_completed, now),
            }
        })
        .collect()
}

/// 100 minus blocker, critical, and incomplete-work penalties, clamped to 0..=100.
pub fn health_score(blockers: u64, critical_issues: u64, completion_percentage: f64) -> f64 {
    let score = BASE_HEALTH_SCORE
        - BLOCKER_PENALTY * blockers as f64
        - CRITICAL_ISSUE_PENALTY * critical_issues as f64
        - INCOMPLETE_WORK_PENALTY * (100.0 - completion_percentage);
    score.clamp(0.0, BASE_HEALTH_SCORE)
}

/// High conditions are checked before medium ones.
pub fn risk_level(health_score: f64, critical_issues: u64, blockers: u64) -> RiskLevel {
    if health_score < HIGH_RISK_HEALTH_BELOW
        || critical_issues > HIGH_RISK_CRITICAL_ABOVE
        || blockers > HIGH_RISK_BLOCKERS_ABOVE
    {
        RiskLevel::High
    } else if health_score < MEDIUM_RISK_HEALTH_BELOW
        || critical_issues > MEDIUM_RISK_CRITICAL_ABOVE
        || blockers > MEDIUM_RISK_BLOCKERS_ABOVE
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Project forward `open / recent` weeks. No estimate without recent
/// completions or without remaining work.
fn estimated_completion(
    open_items: u64,
    recently_completed: u64,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if open_items == 0 || recently_completed == 0 {
        return None;
    }
    let weeks = open_items as f64 / recently_completed as f64;
    let millis = (weeks * 7.0 * MILLIS_PER_DAY as f64).round() as i64;
    Some(now + Duration::milliseconds(millis))
}
