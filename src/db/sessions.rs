//! Session CRUD and maintenance operations.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::photos::insert_photo_rows;
use super::{lenses, placeholders, Database};
use crate::models::Session;
use crate::scanner::PhotoExif;
use crate::stats::{HitRateTally, Rollup, RollupStats};

/// Category with the `Uncategorized` sentinel applied, in SQL.
const CATEGORY_EXPR: &str = "COALESCE(NULLIF(TRIM(category), ''), 'Uncategorized')";
/// Group with the `Ungrouped` sentinel applied, in SQL.
const GROUP_EXPR: &str = "COALESCE(NULLIF(TRIM(group_name), ''), 'Ungrouped')";

const SESSION_COLUMNS: &str = "id, name, category, group_name, date, description, \
     folder_path, raw_folder_path, total_photos, total_raw_photos, hit_rate";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    let date: Option<String> = row.get(4)?;
    Ok(Session {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        group: row.get(3)?,
        date: date.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
        description: row.get(5)?,
        folder_path: row.get(6)?,
        raw_folder_path: row.get(7)?,
        total_photos: row.get(8)?,
        total_raw_photos: row.get(9)?,
        hit_rate: row.get(10)?,
    })
}

fn insert_session(conn: &Connection, session: &Session) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO sessions (
            name, category, group_name, date, description,
            folder_path, raw_folder_path,
            total_photos, total_raw_photos, hit_rate
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            session.name,
            session.category,
            session.group,
            session.date.map(|d| d.format(DATE_FORMAT).to_string()),
            session.description,
            session.folder_path,
            session.raw_folder_path,
            session.total_photos,
            session.total_raw_photos,
            session.compute_hit_rate(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Recount a session's photos and store the recomputed hit rate.
fn refresh_totals(conn: &Connection, id: i64) -> Result<Option<Session>> {
    let sql = format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS);
    let Some(mut session) = conn.query_row(&sql, [id], row_to_session).optional()? else {
        return Ok(None);
    };
    session.total_photos = conn.query_row(
        "SELECT COUNT(*) FROM photos WHERE session_id = ?",
        [id],
        |row| row.get(0),
    )?;
    session.hit_rate = session.compute_hit_rate();
    conn.execute(
        "UPDATE sessions SET total_photos = ?, hit_rate = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        params![session.total_photos, session.hit_rate, id],
    )?;
    Ok(Some(session))
}

/// Editable session fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub group: Option<String>,
    pub total_raw_photos: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteCounts {
    pub sessions: usize,
    pub photos: usize,
    pub lenses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseOverview {
    pub total_sessions: usize,
    pub total_photos: i64,
    /// RAW frames of sessions usable for hit-rate math.
    pub total_raw_photos: Option<i64>,
    pub hit_rate: Option<f64>,
    pub categories: BTreeMap<String, RollupStats>,
    pub groups: BTreeMap<String, RollupStats>,
    pub group_categories: BTreeMap<String, String>,
    pub sessions: Vec<Session>,
}

impl Database {
    /// Insert `session` (its `id` is ignored) and return the new id.
    pub fn create_session(&self, session: &Session) -> Result<i64> {
        insert_session(self.conn(), session)
    }

    /// Create a session, store its photos and refresh its totals as one
    /// transaction. Nothing is left behind when any step fails.
    pub fn create_session_with_photos(
        &self,
        session: &Session,
        photos: &[PhotoExif],
    ) -> Result<(Session, usize)> {
        let tx = self.conn().unchecked_transaction()?;
        let id = insert_session(&tx, session)?;
        let inserted = insert_photo_rows(&tx, id, photos)?;
        let session = refresh_totals(&tx, id)?
            .ok_or_else(|| anyhow::anyhow!("session {} vanished after insert", id))?;
        tx.commit()?;
        Ok((session, inserted))
    }

    pub fn get_session(&self, id: i64) -> Result<Option<Session>> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS);
        let session = self
            .conn()
            .query_row(&sql, [id], row_to_session)
            .optional()?;
        Ok(session)
    }

    /// Session with exactly this name, category and group, if any.
    pub fn find_session(
        &self,
        name: &str,
        category: Option<&str>,
        group: Option<&str>,
    ) -> Result<Option<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE name = ? AND {} = ? AND {} = ?",
            SESSION_COLUMNS, CATEGORY_EXPR, GROUP_EXPR
        );
        let category = crate::models::photo::effective_name(category, crate::models::UNCATEGORIZED);
        let group = crate::models::photo::effective_name(group, crate::models::UNGROUPED);
        let session = self
            .conn()
            .query_row(&sql, params![name, category, group], row_to_session)
            .optional()?;
        Ok(session)
    }

    /// Sessions newest first, optionally narrowed by (sentinel-aware)
    /// category and group.
    pub fn list_sessions(&self, category: Option<&str>, group: Option<&str>) -> Result<Vec<Session>> {
        let mut sql = format!("SELECT {} FROM sessions WHERE 1 = 1", SESSION_COLUMNS);
        let mut args: Vec<&str> = Vec::new();
        if let Some(category) = category {
            sql.push_str(&format!(" AND {} = ?", CATEGORY_EXPR));
            args.push(category);
        }
        if let Some(group) = group {
            sql.push_str(&format!(" AND {} = ?", GROUP_EXPR));
            args.push(group);
        }
        sql.push_str(" ORDER BY date DESC, name");

        let mut stmt = self.conn().prepare(&sql)?;
        let sessions = stmt
            .query_map(params_from_iter(args), row_to_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Apply `update` and recompute the hit rate. `None` when no such session.
    pub fn update_session(&self, id: i64, update: &SessionUpdate) -> Result<Option<Session>> {
        let Some(mut session) = self.get_session(id)? else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            session.name = name.trim().to_string();
        }
        if let Some(category) = &update.category {
            session.category = Some(category.trim().to_string()).filter(|c| !c.is_empty());
        }
        if let Some(group) = &update.group {
            session.group = Some(group.trim().to_string()).filter(|g| !g.is_empty());
        }
        if let Some(raw) = update.total_raw_photos {
            session.total_raw_photos = Some(raw);
        }
        session.hit_rate = session.compute_hit_rate();

        self.conn().execute(
            r#"
            UPDATE sessions
            SET name = ?, category = ?, group_name = ?, total_raw_photos = ?,
                hit_rate = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                session.name,
                session.category,
                session.group,
                session.total_raw_photos,
                session.hit_rate,
                id
            ],
        )?;
        Ok(Some(session))
    }

    /// Recount a session's photos and store the resulting hit rate.
    pub fn refresh_session_totals(&self, id: i64) -> Result<Option<Session>> {
        refresh_totals(self.conn(), id)
    }

    /// Delete one session and its photos. Returns whether it existed.
    pub fn delete_session(&self, id: i64) -> Result<bool> {
        let tx = self.conn().unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM sessions WHERE id = ?", [id])?;
        lenses::refresh_usage(&tx)?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    pub fn delete_sessions_by_categories(&self, categories: &[String]) -> Result<DeleteCounts> {
        self.delete_sessions_where(CATEGORY_EXPR, categories)
    }

    pub fn delete_sessions_by_groups(&self, groups: &[String]) -> Result<DeleteCounts> {
        self.delete_sessions_where(GROUP_EXPR, groups)
    }

    fn delete_sessions_where(&self, expr: &str, values: &[String]) -> Result<DeleteCounts> {
        if values.is_empty() {
            return Ok(DeleteCounts::default());
        }
        let condition = format!("{} IN ({})", expr, placeholders(values.len()));

        let tx = self.conn().unchecked_transaction()?;
        let photos: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM photos WHERE session_id IN (SELECT id FROM sessions WHERE {})",
                condition
            ),
            params_from_iter(values),
            |row| row.get(0),
        )?;
        let sessions = tx.execute(
            &format!("DELETE FROM sessions WHERE {}", condition),
            params_from_iter(values),
        )?;
        let lenses = lenses::refresh_usage(&tx)?;
        tx.commit()?;

        info!("Deleted {} sessions and {} photos", sessions, photos);
        Ok(DeleteCounts {
            sessions,
            photos: photos as usize,
            lenses,
        })
    }

    /// Remove every session, photo and lens.
    pub fn reset(&self) -> Result<DeleteCounts> {
        let tx = self.conn().unchecked_transaction()?;
        let photos = tx.execute("DELETE FROM photos", [])?;
        let sessions = tx.execute("DELETE FROM sessions", [])?;
        let lenses = tx.execute("DELETE FROM lenses", [])?;
        tx.commit()?;

        info!("Reset database: {} sessions, {} photos, {} lenses", sessions, photos, lenses);
        Ok(DeleteCounts {
            sessions,
            photos,
            lenses,
        })
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        self.distinct(&format!(
            "SELECT DISTINCT {} FROM sessions ORDER BY 1",
            CATEGORY_EXPR
        ))
    }

    pub fn groups(&self) -> Result<Vec<String>> {
        self.distinct(&format!("SELECT DISTINCT {} FROM sessions ORDER BY 1", GROUP_EXPR))
    }

    fn distinct(&self, sql: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(sql)?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Totals, rollups and the full session list.
    pub fn overview(&self) -> Result<DatabaseOverview> {
        let sessions = self.list_sessions(None, None)?;
        let rollup = Rollup::baseline(&sessions);

        let mut tally = HitRateTally::default();
        for session in &sessions {
            tally.merge(&HitRateTally::for_session(session, session.total_photos));
        }

        Ok(DatabaseOverview {
            total_sessions: sessions.len(),
            total_photos: sessions.iter().map(|s| s.total_photos).sum(),
            total_raw_photos: tally.raw_total(),
            hit_rate: tally.hit_rate(),
            categories: rollup.categories,
            groups: rollup.groups,
            group_categories: rollup.group_categories,
            sessions,
        })
    }
}
