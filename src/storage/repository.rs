use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::model::{InsightRecord, InsightType, Priority, Status};

/// Column list matching [`row_to_insight`].
pub const INSIGHT_COLUMNS: &str = "id, insight_type, title, description, priority, status, \
     project_name, assigned_to, due_date, created_at, updated_at";

// ── Insights ───────────────────────────────────────────────────────

/// Insert or replace an insight. `imported_at` is stamped by the caller so a
/// whole import shares one value.
pub fn upsert_insight(
    conn: &Connection,
    record: &InsightRecord,
    imported_at: DateTime<Utc>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO insights (
            id, insight_type, title, description, priority, status,
            project_name, assigned_to, due_date, created_at, updated_at, imported_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            insight_type=excluded.insight_type, title=excluded.title,
            description=excluded.description, priority=excluded.priority,
            status=excluded.status, project_name=excluded.project_name,
            assigned_to=excluded.assigned_to, due_date=excluded.due_date,
            created_at=excluded.created_at, updated_at=excluded.updated_at,
            imported_at=excluded.imported_at",
        params![
            record.id,
            record.insight_type.as_str(),
            record.title,
            record.description,
            record.priority.as_str(),
            record.status.as_str(),
            record.project_name,
            record.assigned_to,
            record.due_date.map(format_timestamp),
            format_timestamp(record.created_at),
            format_timestamp(record.updated_at),
            format_timestamp(imported_at),
        ],
    )?;
    Ok(())
}

pub fn get_insight(conn: &Connection, id: &str) -> Result<Option<InsightRecord>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {INSIGHT_COLUMNS} FROM insights WHERE id = ?1"),
        params![id],
        row_to_insight,
    )
    .optional()
}

/// Returns whether a row was removed.
pub fn delete_insight(conn: &Connection, id: &str) -> Result<bool, rusqlite::Error> {
    let n = conn.execute("DELETE FROM insights WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

pub fn count_insights(conn: &Connection) -> Result<u64, rusqlite::Error> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM insights", [], |row| row.get(0))?;
    Ok(n as u64)
}

/// Distinct non-blank project names with their insight counts, by name.
pub fn list_projects(conn: &Connection) -> Result<Vec<(String, u64)>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT project_name, COUNT(*) FROM insights
         WHERE project_name IS NOT NULL AND TRIM(project_name) != ''
         GROUP BY project_name ORDER BY project_name",
    )?;
    let rows = stmt.query_map([], |row| {
        let count: i64 = row.get(1)?;
        Ok((row.get(0)?, count as u64))
    })?;
    rows.collect()
}

/// Earliest and latest `created_at`, if anything is stored.
pub fn created_range(conn: &Connection) -> Result<Option<(String, String)>, rusqlite::Error> {
    let (min, max): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM insights",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(min.zip(max))
}

/// Most recent `imported_at`, if anything was imported.
pub fn last_imported_at(conn: &Connection) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row("SELECT MAX(imported_at) FROM insights", [], |row| row.get(0))
}

/// Map a row selected with [`INSIGHT_COLUMNS`].
pub fn row_to_insight(row: &Row<'_>) -> Result<InsightRecord, rusqlite::Error> {
    let due: Option<String> = row.get(8)?;
    Ok(InsightRecord {
        id: row.get(0)?,
        insight_type: InsightType::parse(&row.get::<_, String>(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        priority: Priority::parse(&row.get::<_, String>(4)?),
        status: Status::parse(&row.get::<_, String>(5)?),
        project_name: row.get(6)?,
        assigned_to: row.get(7)?,
        due_date: due.map(|s| parse_timestamp(8, &s)).transpose()?,
        created_at: parse_timestamp(9, &row.get::<_, String>(9)?)?,
        updated_at: parse_timestamp(10, &row.get::<_, String>(10)?)?,
    })
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Helpers ────────────────────────────────────────────────────────

/// RFC 3339 in UTC with fixed nanosecond precision. Stored timestamps
/// round-trip exactly and sort lexically in time order.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::{Duration, TimeZone};

    fn record(id: &str, project: Option<&str>) -> InsightRecord {
        let created = Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap();
        InsightRecord {
            id: id.to_string(),
            insight_type: InsightType::Risk,
            title: format!("Risk {id}"),
            description: "Vendor may slip".to_string(),
            priority: Priority::High,
            status: Status::InProgress,
            project_name: project.map(str::to_string),
            assigned_to: Some("dana".to_string()),
            due_date: Some(created + Duration::days(14)),
            created_at: created,
            updated_at: created + Duration::milliseconds(1500),
        }
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                set_config(conn, "default_period", "30d")?;
                let val = get_config(conn, "default_period")?;
                assert_eq!(val, Some("30d".to_string()));

                set_config(conn, "default_period", "7d")?;
                set_config(conn, "strict_records", "true")?;
                let all = list_config(conn)?;
                assert_eq!(
                    all,
                    vec![
                        ("default_period".to_string(), "7d".to_string()),
                        ("strict_records".to_string(), "true".to_string()),
                    ]
                );

                let missing = get_config(conn, "nonexistent")?;
                assert_eq!(missing, None);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insight_round_trip() {
        let db = Database::open_memory().await.unwrap();
        let original = record("r1", Some("Seminole"));
        let stored = original.clone();

        let loaded = db
            .writer()
            .call(move |conn| {
                upsert_insight(conn, &stored, Utc::now())?;
                get_insight(conn, "r1")
            })
            .await
            .unwrap();

        assert_eq!(loaded, Some(original));
    }

    #[tokio::test]
    async fn test_unknown_labels_survive_storage() {
        let db = Database::open_memory().await.unwrap();
        let mut odd = record("r1", None);
        odd.insight_type = InsightType::parse("technical_detail");
        odd.status = Status::parse("on_hold");
        odd.due_date = None;
        let stored = odd.clone();

        let loaded = db
            .writer()
            .call(move |conn| {
                upsert_insight(conn, &stored, Utc::now())?;
                get_insight(conn, "r1")
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.insight_type.as_str(), "technical_detail");
        assert_eq!(loaded.status.as_str(), "on_hold");
        assert_eq!(loaded.due_date, None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_delete() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                let mut r = record("r1", Some("Seminole"));
                upsert_insight(conn, &r, Utc::now())?;
                r.status = Status::Completed;
                upsert_insight(conn, &r, Utc::now())?;
                assert_eq!(count_insights(conn)?, 1);
                assert_eq!(get_insight(conn, "r1")?.unwrap().status, Status::Completed);

                let (first, last) = created_range(conn)?.unwrap();
                assert_eq!(first, "2025-03-04T09:30:00.000000000Z");
                assert_eq!(first, last);

                assert!(delete_insight(conn, "r1")?);
                assert!(!delete_insight(conn, "r1")?);
                assert_eq!(count_insights(conn)?, 0);
                assert_eq!(created_range(conn)?, None);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_projects_skips_blank() {
        let db = Database::open_memory().await.unwrap();

        let projects = db
            .writer()
            .call(|conn| {
                upsert_insight(conn, &record("1", Some("Osceola")), Utc::now())?;
                upsert_insight(conn, &record("2", Some("Apalachee")), Utc::now())?;
                upsert_insight(conn, &record("3", Some("Osceola")), Utc::now())?;
                upsert_insight(conn, &record("4", Some("  ")), Utc::now())?;
                upsert_insight(conn, &record("5", None), Utc::now())?;
                list_projects(conn)
            })
            .await
            .unwrap();

        assert_eq!(
            projects,
            vec![("Apalachee".to_string(), 1), ("Osceola".to_string(), 2)]
        );
    }

    #[test]
    fn test_format_timestamp_sorts_lexically() {
        let a = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        let b = a + Duration::nanoseconds(1);
        let (fa, fb) = (format_timestamp(a), format_timestamp(b));
        assert_eq!(fa, "2025-01-09T23:59:59.000000000Z");
        assert_eq!(fb, "2025-01-09T23:59:59.000000001Z");
        assert!(fa < fb);
    }

    #[tokio::test]
    async fn test_sub_millisecond_timestamps_round_trip() {
        let db = Database::open_memory().await.unwrap();
        let mut r = record("r1", Some("Seminole"));
        r.updated_at = r.created_at + Duration::microseconds(1100);
        r.due_date = Some(r.created_at + Duration::nanoseconds(7));
        let expected = r.clone();

        let stored = db
            .writer()
            .call(move |conn| {
                upsert_insight(conn, &r, Utc::now())?;
                get_insight(conn, "r1")
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, expected);
    }
}
