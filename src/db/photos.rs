use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::{lenses, placeholders, Database};
use crate::models::photo::DATE_TAKEN_FORMAT;
use crate::models::PhotoRecord;
use crate::scanner::PhotoExif;

fn row_to_photo(row: &Row) -> rusqlite::Result<PhotoRecord> {
    let date_taken: Option<String> = row.get(12)?;
    Ok(PhotoRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        file_name: row.get(2)?,
        camera: row.get(3)?,
        lens: row.get(4)?,
        aperture: row.get(5)?,
        shutter_speed: row.get(6)?,
        iso: row.get(7)?,
        focal_length: row.get(8)?,
        exposure_program: row.get(9)?,
        exposure_bias: row.get(10)?,
        flash_mode: row.get(11)?,
        date_taken: date_taken
            .and_then(|d| NaiveDateTime::parse_from_str(&d, DATE_TAKEN_FORMAT).ok()),
        category: row.get(13)?,
        group: row.get(14)?,
    })
}

impl Database {
    /// Insert photos for a session in one transaction and record their lenses.
    /// Files already stored for the session are skipped. Returns how many
    /// rows were inserted.
    pub fn insert_photos(&self, session_id: i64, photos: &[PhotoExif]) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        let inserted = insert_photo_rows(&tx, session_id, photos)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Photos of the given sessions, joined with the owning session's
    /// category and group.
    pub fn get_photos_for_sessions(&self, session_ids: &[i64]) -> Result<Vec<PhotoRecord>> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT p.id, p.session_id, p.file_name,
                   p.camera, p.lens, p.aperture, p.shutter_speed, p.iso, p.focal_length,
                   p.exposure_program, p.exposure_bias, p.flash_mode, p.date_taken,
                   s.category, s.group_name
            FROM photos p
            JOIN sessions s ON p.session_id = s.id
            WHERE p.session_id IN ({})
            ORDER BY p.session_id, p.file_name
            "#,
            placeholders(session_ids.len())
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let photos = stmt
            .query_map(params_from_iter(session_ids), row_to_photo)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    pub fn photo_count(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Photo rows for a session on an open connection or transaction.
pub(super) fn insert_photo_rows(
    conn: &Connection,
    session_id: i64,
    photos: &[PhotoExif],
) -> Result<usize> {
    let mut inserted = 0;
    let mut stmt = conn.prepare(
        r#"
        INSERT OR IGNORE INTO photos (
            session_id, file_path, file_name,
            camera, lens, aperture, shutter_speed, shutter_speed_decimal,
            iso, focal_length, exposure_program, exposure_bias, flash_mode,
            date_taken, date_only, time_only, day_of_week, time_of_day
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )?;

    for photo in photos {
        // Derived columns come from the same code the engine uses.
        let record = PhotoRecord {
            shutter_speed: photo.shutter_speed.clone(),
            date_taken: photo.date_taken,
            ..Default::default()
        };
        let changed = stmt.execute(params![
            session_id,
            photo.file_path,
            photo.file_name,
            photo.camera,
            photo.lens,
            photo.aperture,
            photo.shutter_speed,
            record.shutter_speed_decimal(),
            photo.iso,
            photo.focal_length,
            photo.exposure_program,
            photo.exposure_bias,
            photo.flash_mode,
            photo.date_taken.map(|d| d.format(DATE_TAKEN_FORMAT).to_string()),
            record.date_only(),
            record.time_only(),
            record.day_of_week(),
            record.time_of_day_key(),
        ])?;
        if changed == 0 {
            continue;
        }
        inserted += 1;
        if let Some(lens) = photo.lens.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            lenses::record_usage(conn, lens, 1)?;
        }
    }
    Ok(inserted)
}
