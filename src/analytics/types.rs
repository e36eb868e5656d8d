use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{InsightType, Priority, Status};

/// Scalar counts and rates over the whole record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_insights: u64,
    /// Critical priority, still open or in progress.
    pub critical_items: u64,
    /// Past due, still open or in progress.
    pub overdue_items: u64,
    /// Percentage of records completed.
    pub completion_rate: f64,
    /// Mean days from creation to completion.
    pub avg_resolution_time: f64,
    /// Percentage change in records created, last 7 days vs the 7 before.
    pub weekly_growth: f64,
    /// Percentage change in records created, last 30 days vs the 30 before.
    pub monthly_growth: f64,
}

/// Frequency mappings keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub by_type: BTreeMap<InsightType, u64>,
    pub by_priority: BTreeMap<Priority, u64>,
    pub by_status: BTreeMap<Status, u64>,
    pub by_project: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub count: u64,
    pub cumulative_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTrend {
    /// Monday of the bucket's week.
    pub week_start: NaiveDate,
    pub count: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month_start: NaiveDate,
    pub count: u64,
    pub avg_priority_weight: f64,
}

/// Sparse time series, ascending by period start.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trends {
    pub daily: Vec<DailyTrend>,
    pub weekly: Vec<WeeklyTrend>,
    pub monthly: Vec<MonthlyTrend>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    Increasing,
    #[default]
    Stable,
    Decreasing,
}

impl VelocityTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            VelocityTrend::Increasing => "increasing",
            VelocityTrend::Stable => "stable",
            VelocityTrend::Decreasing => "decreasing",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Predictions {
    pub velocity_trend: VelocityTrend,
    /// Days until open work drains at the recent completion rate; 0 when
    /// the rate is zero and no estimate is possible.
    pub expected_completion_time: f64,
    /// 0-100 blend of critical, overdue, and blocker ratios.
    pub risk_score: f64,
    pub bottlenecks: Vec<String>,
}

/// Per-assignee performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberMetrics {
    pub assignee: String,
    pub total_assigned: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub overdue: u64,
    pub avg_completion_time: f64,
    /// `(completed - overdue) / total * 100`, floored at 0.
    pub efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Per-project health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectHealth {
    pub project_name: String,
    pub total: u64,
    pub completed: u64,
    pub blockers: u64,
    pub critical_issues: u64,
    pub completion_percentage: f64,
    pub health_score: f64,
    pub risk_level: RiskLevel,
    pub estimated_completion_date: Option<DateTime<Utc>>,
}

/// Everything the engine derives from one record snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsResult {
    pub summary: Summary,
    pub category_breakdown: CategoryBreakdown,
    pub trends: Trends,
    pub predictions: Predictions,
    pub team_metrics: Vec<TeamMemberMetrics>,
    pub project_health: Vec<ProjectHealth>,
}
