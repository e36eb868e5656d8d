use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::InsightRecord;
use crate::query::builder::InsightQuery;
use crate::storage::Database;

/// Supplies insight records for an analytics window.
///
/// Implementations return every record with
/// `window_start <= created_at <= window_end`, restricted to `project` when
/// given. Retries and timeouts are the implementation's concern; errors are
/// propagated to the caller as-is.
pub trait InsightSource {
    fn fetch_insights(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        project: Option<&str>,
    ) -> impl Future<Output = Result<Vec<InsightRecord>>> + Send;
}

impl InsightSource for Database {
    async fn fetch_insights(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        project: Option<&str>,
    ) -> Result<Vec<InsightRecord>> {
        let mut query = InsightQuery::new()
            .created_between(window_start, window_end)
            .ascending();
        if let Some(name) = project {
            query = query.project(name);
        }
        query.records(self).await
    }
}

/// An in-memory snapshot, filtered the same way the database source is.
impl InsightSource for [InsightRecord] {
    async fn fetch_insights(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        project: Option<&str>,
    ) -> Result<Vec<InsightRecord>> {
        Ok(self
            .iter()
            .filter(|r| r.created_at >= window_start && r.created_at <= window_end)
            .filter(|r| project.is_none_or(|p| r.project_name.as_deref() == Some(p)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{at, RecordBuilder};

    #[tokio::test]
    async fn test_slice_source_filters_window_and_project() {
        let records = vec![
            RecordBuilder::new("1").created(at(2025, 5, 1)).project("A").build(),
            RecordBuilder::new("2").created(at(2025, 6, 1)).project("A").build(),
            RecordBuilder::new("3").created(at(2025, 6, 2)).project("B").build(),
            RecordBuilder::new("4").created(at(2025, 7, 1)).project("A").build(),
        ];

        let all = records
            .as_slice()
            .fetch_insights(at(2025, 5, 15), at(2025, 6, 30), None)
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        let only_a = records
            .as_slice()
            .fetch_insights(at(2025, 1, 1), at(2025, 12, 31), Some("A"))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 3);
    }
}
