use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Kind of insight extracted from a source document.
///
/// Values outside the known set are kept verbatim in `Other` so that they
/// still form their own breakdown bucket instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum InsightType {
    #[default]
    ActionItem,
    Decision,
    Risk,
    Milestone,
    Blocker,
    Dependency,
    BudgetUpdate,
    TimelineChange,
    StakeholderFeedback,
    TechnicalIssue,
    Opportunity,
    Concern,
    Other(String),
}

impl InsightType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "action_item" => Self::ActionItem,
            "decision" => Self::Decision,
            "risk" => Self::Risk,
            "milestone" => Self::Milestone,
            "blocker" => Self::Blocker,
            "dependency" => Self::Dependency,
            "budget_update" => Self::BudgetUpdate,
            "timeline_change" => Self::TimelineChange,
            "stakeholder_feedback" => Self::StakeholderFeedback,
            "technical_issue" => Self::TechnicalIssue,
            "opportunity" => Self::Opportunity,
            "concern" => Self::Concern,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ActionItem => "action_item",
            Self::Decision => "decision",
            Self::Risk => "risk",
            Self::Milestone => "milestone",
            Self::Blocker => "blocker",
            Self::Dependency => "dependency",
            Self::BudgetUpdate => "budget_update",
            Self::TimelineChange => "timeline_change",
            Self::StakeholderFeedback => "stakeholder_feedback",
            Self::TechnicalIssue => "technical_issue",
            Self::Opportunity => "opportunity",
            Self::Concern => "concern",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Ordinal priority: critical > high > medium > low.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Other(String),
}

impl Priority {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other(s) => s,
        }
    }

    /// Numeric weight used by trend scoring. Unrecognized priorities weigh
    /// the same as `Medium`.
    pub fn weight(&self) -> u64 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Other(_) => 2,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl Status {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "open" => Self::Open,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }

    /// Open or in progress. Cancelled and unknown statuses are never active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

macro_rules! impl_string_enum_traits {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::parse(&s))
            }
        }
    )*};
}

impl_string_enum_traits!(InsightType, Priority, Status);

/// A single insight as supplied by the record source. Never mutated by the
/// analytics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub id: String,
    #[serde(rename = "type", alias = "insight_type", default)]
    pub insight_type: InsightType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "severity")]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default, alias = "assignee")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InsightRecord {
    /// Project label, with blank labels treated as absent.
    pub fn project(&self) -> Option<&str> {
        non_blank(self.project_name.as_deref())
    }

    /// Assignee label, with blank labels treated as absent.
    pub fn assignee(&self) -> Option<&str> {
        non_blank(self.assigned_to.as_deref())
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Past its due date while still open or in progress.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date.is_some_and(|due| due < now)
    }

    /// Critical priority while still open or in progress.
    pub fn is_open_critical(&self) -> bool {
        self.is_active() && self.priority == Priority::Critical
    }

    pub fn is_blocker(&self) -> bool {
        self.insight_type == InsightType::Blocker
    }

    /// Milliseconds from creation to last status transition for completed
    /// records. A record whose `updated_at` precedes `created_at` resolves in 0.
    pub fn resolution_millis(&self) -> Option<i64> {
        if !self.is_completed() {
            return None;
        }
        Some((self.updated_at - self.created_at).num_milliseconds().max(0))
    }

    /// Whether this record completed in the half-open window `(since, now]`.
    pub fn completed_between(&self, since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.is_completed() && self.updated_at > since && self.updated_at <= now
    }

    /// Reject values outside the closed type/priority/status enumerations.
    pub fn validate(&self) -> Result<()> {
        if let InsightType::Other(value) = &self.insight_type {
            return Err(self.invalid("type", value));
        }
        if let Priority::Other(value) = &self.priority {
            return Err(self.invalid("priority", value));
        }
        if let Status::Other(value) = &self.status {
            return Err(self.invalid("status", value));
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, value: &str) -> Error {
        Error::InvalidRecord {
            id: self.id.clone(),
            field,
            value: value.to_string(),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}
