pub mod analytics;
pub mod date_util;
pub mod error;
pub mod model;
pub mod query;
pub mod settings;
pub mod source;
pub mod storage;

pub use analytics::{
    analyze, compute_analytics, compute_analytics_strict, AnalyticsResult, CategoryBreakdown,
    Predictions, ProjectHealth, RiskLevel, Summary, TeamMemberMetrics, Trends, VelocityTrend,
};
pub use error::{Error, Result};
pub use model::{InsightRecord, InsightType, Priority, Status};
pub use query::builder::InsightQuery;
pub use query::period::Period;
pub use settings::Settings;
pub use source::InsightSource;
pub use storage::Database;

use std::io::Read;

use chrono::{DateTime, Utc};

use storage::repository;

/// Main entry point: a local insight store plus the analytics engine over it.
pub struct InsightDW {
    db: Database,
}

impl InsightDW {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Import ─────────────────────────────────────────────────────

    /// Upsert records in a single write transaction. Returns the number stored.
    pub async fn import_records(&self, records: Vec<InsightRecord>) -> Result<usize> {
        let imported_at = Utc::now();
        let count = records.len();
        self.db
            .writer()
            .call(move |conn| {
                let tx = conn.transaction()?;
                for record in &records {
                    repository::upsert_insight(&tx, record, imported_at)?;
                }
                tx.commit()?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        log::info!("Imported {count} insights");
        Ok(count)
    }

    /// Import a JSON array of insight records.
    pub async fn import_json(&self, mut reader: impl Read) -> Result<usize> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(|e| Error::Import(e.to_string()))?;
        let records: Vec<InsightRecord> = serde_json::from_str(&buf)?;
        for record in &records {
            if record.id.trim().is_empty() {
                return Err(Error::Import("insight with empty id".into()));
            }
        }
        self.import_records(records).await
    }

    pub async fn get_insight(&self, id: &str) -> Result<InsightRecord> {
        let found = self
            .db
            .reader()
            .call({
                let id = id.to_string();
                move |conn| repository::get_insight(conn, &id)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        found.ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub async fn delete_insight(&self, id: &str) -> Result<()> {
        let removed = self
            .db
            .writer()
            .call({
                let id = id.to_string();
                move |conn| repository::delete_insight(conn, &id)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        if removed {
            Ok(())
        } else {
            Err(Error::NotFound(id.to_string()))
        }
    }

    // ── Analytics ──────────────────────────────────────────────────

    /// Analyze the insights created within `period`, as of `now`.
    ///
    /// `project` falls back to the configured default project and `strict`
    /// is combined with the `strict_records` setting.
    pub async fn analyze(
        &self,
        period: &Period,
        project: Option<&str>,
        now: DateTime<Utc>,
        strict: bool,
    ) -> Result<AnalyticsResult> {
        let settings = self.settings().await?;
        let project = project.or(settings.default_project.as_deref());
        let strict = strict || settings.strict_records;
        let (start, end) = period.window()?;

        log::info!(
            "Analyzing {period}{} as of {now}",
            project.map(|p| format!(" for {p}")).unwrap_or_default()
        );
        analytics::analyze(&self.db, start, end, project, now, strict).await
    }

    // ── Status ─────────────────────────────────────────────────────

    pub async fn insight_count(&self) -> Result<u64> {
        self.db
            .reader()
            .call(|conn| repository::count_insights(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Earliest and latest creation timestamps in the store.
    pub async fn created_range(&self) -> Result<Option<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::created_range(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn last_imported_at(&self) -> Result<Option<String>> {
        self.db
            .reader()
            .call(|conn| repository::last_imported_at(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn projects(&self) -> Result<Vec<(String, u64)>> {
        self.db
            .reader()
            .call(|conn| repository::list_projects(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn settings(&self) -> Result<Settings> {
        let pairs = self.config_list().await?;
        Settings::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Store a config value after validating it for known keys.
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        settings::validate(key, value)?;
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
