use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::Database;
use crate::models::{LensInfo, LensType};
use crate::stats::LensUsageSummary;

/// A row of the lens registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LensRecord {
    pub id: i64,
    #[serde(flatten)]
    pub info: LensInfo,
    pub usage_count: u64,
}

/// Register `name` if new and add `count` uses.
pub(crate) fn record_usage(conn: &Connection, name: &str, count: u64) -> Result<()> {
    let info = LensInfo::from_name(name);
    conn.execute(
        r#"
        INSERT INTO lenses (
            name, lens_type, manufacturer,
            focal_length_min, focal_length_max, max_aperture, usage_count
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET usage_count = usage_count + excluded.usage_count
        "#,
        params![
            info.name,
            info.lens_type.as_str(),
            info.manufacturer,
            info.focal_length_min,
            info.focal_length_max,
            info.max_aperture,
            count as i64,
        ],
    )?;
    Ok(())
}

/// Recount usage from the photos table and drop lenses nothing uses any
/// more. Returns how many lenses were dropped.
pub(crate) fn refresh_usage(conn: &Connection) -> Result<usize> {
    conn.execute(
        "UPDATE lenses SET usage_count = (SELECT COUNT(*) FROM photos WHERE photos.lens = lenses.name)",
        [],
    )?;
    let dropped = conn.execute("DELETE FROM lenses WHERE usage_count = 0", [])?;
    Ok(dropped)
}

impl Database {
    /// Lenses by descending usage.
    pub fn list_lenses(&self) -> Result<Vec<LensRecord>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT id, name, lens_type, manufacturer,
                   focal_length_min, focal_length_max, max_aperture, usage_count
            FROM lenses
            ORDER BY usage_count DESC, name
            "#,
        )?;
        let lenses = stmt
            .query_map([], |row| {
                let lens_type: String = row.get(2)?;
                let manufacturer: Option<String> = row.get(3)?;
                let usage_count: i64 = row.get(7)?;
                Ok(LensRecord {
                    id: row.get(0)?,
                    info: LensInfo {
                        name: row.get(1)?,
                        lens_type: LensType::parse(&lens_type).unwrap_or(LensType::Unknown),
                        manufacturer: manufacturer.unwrap_or_else(|| "Unknown".to_string()),
                        focal_length_min: row.get(4)?,
                        focal_length_max: row.get(5)?,
                        max_aperture: row.get(6)?,
                    },
                    usage_count: usage_count.max(0) as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lenses)
    }

    pub fn get_lens(&self, name: &str) -> Result<Option<LensRecord>> {
        Ok(self.list_lenses()?.into_iter().find(|l| l.info.name == name))
    }

    /// Usage summary over the whole registry.
    pub fn lens_usage_summary(&self) -> Result<LensUsageSummary> {
        let lenses = self.list_lenses()?;
        Ok(LensUsageSummary::from_usage(
            lenses.iter().map(|l| (l.info.name.as_str(), l.usage_count)),
        ))
    }
}
