use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{InsightRecord, InsightType, Priority, Status};
use crate::storage::repository::{format_timestamp, row_to_insight, INSIGHT_COLUMNS};
use crate::storage::Database;

#[derive(Debug, Clone, PartialEq)]
enum ProjectFilter {
    Exact(String),
    /// Case-insensitive substring.
    Contains(String),
}

/// Builder for insight listings with optional filters.
///
/// Results are ordered by `created_at` then `id`, newest first unless
/// [`InsightQuery::ascending`] is set.
#[derive(Debug, Clone, Default)]
pub struct InsightQuery {
    project: Option<ProjectFilter>,
    types: Vec<InsightType>,
    priorities: Vec<Priority>,
    statuses: Vec<Status>,
    assignee: Option<String>,
    created_after: Option<DateTime<Utc>>,
    created_before: Option<DateTime<Utc>>,
    limit: Option<u32>,
    offset: Option<u32>,
    ascending: bool,
}

impl InsightQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact project name.
    pub fn project(mut self, name: &str) -> Self {
        self.project = Some(ProjectFilter::Exact(name.to_string()));
        self
    }

    /// Project names containing `fragment`, ignoring case.
    pub fn project_contains(mut self, fragment: &str) -> Self {
        self.project = Some(ProjectFilter::Contains(fragment.to_string()));
        self
    }

    /// Restrict to these types. May be called repeatedly; values accumulate.
    pub fn insight_type(mut self, t: InsightType) -> Self {
        self.types.push(t);
        self
    }

    pub fn priority(mut self, p: Priority) -> Self {
        self.priorities.push(p);
        self
    }

    pub fn status(mut self, s: Status) -> Self {
        self.statuses.push(s);
        self
    }

    pub fn assignee(mut self, name: &str) -> Self {
        self.assignee = Some(name.to_string());
        self
    }

    /// Inclusive on both ends.
    pub fn created_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.created_after = Some(start);
        self.created_before = Some(end);
        self
    }

    pub fn created_after(mut self, start: DateTime<Utc>) -> Self {
        self.created_after = Some(start);
        self
    }

    pub fn created_before(mut self, end: DateTime<Utc>) -> Self {
        self.created_before = Some(end);
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip the first `n` matching rows.
    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn ascending(mut self) -> Self {
        self.ascending = true;
        self
    }

    /// Build and execute the query, returning insight records.
    pub async fn records(self, db: &Database) -> Result<Vec<InsightRecord>> {
        let builder = self;
        db.reader()
            .call(move |conn| {
                let (sql, params) = builder.build_sql();
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(param_refs.as_slice(), row_to_insight)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Build and execute the query, returning a count of matching insights.
    pub async fn count(self, db: &Database) -> Result<u64> {
        let builder = self;
        db.reader()
            .call(move |conn| {
                let (inner_sql, params) = builder.build_sql();
                let sql = format!("SELECT COUNT(*) FROM ({inner_sql})");
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
                Ok::<u64, rusqlite::Error>(count as u64)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Build and execute the query, returning results as JSON.
    pub async fn to_json(self, db: &Database) -> Result<String> {
        let rows = self.records(db).await?;
        serde_json::to_string_pretty(&rows).map_err(|e| Error::Other(e.to_string()))
    }

    /// Build and execute the query, returning results as CSV.
    pub async fn to_csv(self, db: &Database) -> Result<String> {
        let rows = self.records(db).await?;
        let mut out = String::new();
        out.push_str("id,type,title,priority,status,project_name,assigned_to,due_date,created_at,updated_at\n");
        for row in &rows {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                csv_escape(&row.id),
                csv_escape(row.insight_type.as_str()),
                csv_escape(&row.title),
                csv_escape(row.priority.as_str()),
                csv_escape(row.status.as_str()),
                csv_escape(row.project_name.as_deref().unwrap_or("")),
                csv_escape(row.assigned_to.as_deref().unwrap_or("")),
                row.due_date.map(format_timestamp).unwrap_or_default(),
                format_timestamp(row.created_at),
                format_timestamp(row.updated_at),
            ));
        }
        Ok(out)
    }

    fn build_sql(&self) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut wheres = Vec::new();

        match &self.project {
            Some(ProjectFilter::Exact(name)) => {
                params.push(Box::new(name.clone()));
                wheres.push(format!("project_name = ?{}", params.len()));
            }
            Some(ProjectFilter::Contains(fragment)) => {
                params.push(Box::new(fragment.to_lowercase()));
                wheres.push(format!("INSTR(LOWER(project_name), ?{}) > 0", params.len()));
            }
            None => {}
        }

        push_in(
            &mut wheres,
            &mut params,
            "insight_type",
            self.types.iter().map(|t| t.as_str()),
        );
        push_in(
            &mut wheres,
            &mut params,
            "priority",
            self.priorities.iter().map(|p| p.as_str()),
        );
        push_in(
            &mut wheres,
            &mut params,
            "status",
            self.statuses.iter().map(|s| s.as_str()),
        );

        if let Some(ref name) = self.assignee {
            params.push(Box::new(name.clone()));
            wheres.push(format!("assigned_to = ?{}", params.len()));
        }

        if let Some(start) = self.created_after {
            params.push(Box::new(format_timestamp(start)));
            wheres.push(format!("created_at >= ?{}", params.len()));
        }
        if let Some(end) = self.created_before {
            params.push(Box::new(format_timestamp(end)));
            wheres.push(format!("created_at <= ?{}", params.len()));
        }

        let mut sql = format!("SELECT {INSIGHT_COLUMNS} FROM insights");
        if !wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
        }

        let dir = if self.ascending { "ASC" } else { "DESC" };
        sql.push_str(&format!(" ORDER BY created_at {dir}, id {dir}"));

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                params.push(Box::new(limit));
                sql.push_str(&format!(" LIMIT ?{}", params.len()));
                if let Some(offset) = offset {
                    params.push(Box::new(offset));
                    sql.push_str(&format!(" OFFSET ?{}", params.len()));
                }
            }
            // SQLite only accepts OFFSET after a LIMIT; -1 means no limit.
            (None, Some(offset)) => {
                params.push(Box::new(offset));
                sql.push_str(&format!(" LIMIT -1 OFFSET ?{}", params.len()));
            }
            (None, None) => {}
        }

        (sql, params)
    }
}

/// Append `column IN (?n, ...)` for a non-empty value list.
fn push_in<'a>(
    wheres: &mut Vec<String>,
    params: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
    column: &str,
    values: impl Iterator<Item = &'a str>,
) {
    let mut placeholders = Vec::new();
    for value in values {
        params.push(Box::new(value.to_string()));
        placeholders.push(format!("?{}", params.len()));
    }
    if !placeholders.is_empty() {
        wheres.push(format!("{column} IN ({})", placeholders.join(", ")));
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
