use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::model::{InsightRecord, InsightType, Priority, Status};

/// Fixed "now" shared by calculator tests: Sunday 2025-06-15 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

pub struct RecordBuilder(InsightRecord);

impl RecordBuilder {
    pub fn new(id: &str) -> Self {
        let created = at(2025, 6, 2);
        Self(InsightRecord {
            id: id.to_string(),
            insight_type: InsightType::ActionItem,
            title: format!("Insight {id}"),
            description: String::new(),
            priority: Priority::Medium,
            status: Status::Open,
            project_name: None,
            assigned_to: None,
            due_date: None,
            created_at: created,
            updated_at: created,
        })
    }

    pub fn kind(mut self, t: InsightType) -> Self {
        self.0.insight_type = t;
        self
    }

    pub fn priority(mut self, p: Priority) -> Self {
        self.0.priority = p;
        self
    }

    pub fn status(mut self, s: Status) -> Self {
        self.0.status = s;
        self
    }

    pub fn project(mut self, name: &str) -> Self {
        self.0.project_name = Some(name.to_string());
        self
    }

    pub fn assignee(mut self, name: &str) -> Self {
        self.0.assigned_to = Some(name.to_string());
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.0.due_date = Some(due);
        self
    }

    /// Set creation time; `updated_at` follows unless set later.
    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.0.created_at = created;
        self.0.updated_at = created;
        self
    }

    pub fn updated(mut self, updated: DateTime<Utc>) -> Self {
        self.0.updated_at = updated;
        self
    }

    /// Mark completed `days` after creation.
    pub fn completed_after(mut self, days: i64) -> Self {
        self.0.status = Status::Completed;
        self.0.updated_at = self.0.created_at + Duration::days(days);
        self
    }

    pub fn build(self) -> InsightRecord {
        self.0
    }
}
