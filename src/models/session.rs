//! Photography sessions and the hit-rate validity rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::photo::{effective_name, UNCATEGORIZED, UNGROUPED};

/// One shoot: a folder of edited photos plus, optionally, the RAW frames it
/// was culled from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub group: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub folder_path: Option<String>,
    pub raw_folder_path: Option<String>,
    /// Edited photo count.
    pub total_photos: i64,
    /// `None` means no RAW folder was found, which is not the same as zero.
    pub total_raw_photos: Option<i64>,
    pub hit_rate: Option<f64>,
}

impl Session {
    pub fn effective_category(&self) -> &str {
        effective_name(self.category.as_deref(), UNCATEGORIZED)
    }

    pub fn effective_group(&self) -> &str {
        effective_name(self.group.as_deref(), UNGROUPED)
    }

    pub fn is_valid_for_hit_rate(&self) -> bool {
        is_valid_for_hit_rate(self.total_photos, self.total_raw_photos)
    }

    /// Hit rate for this session alone, `None` when the counts are not usable.
    pub fn compute_hit_rate(&self) -> Option<f64> {
        hit_rate(self.total_photos, self.total_raw_photos)
    }
}

/// Whether an edited/RAW pair may take part in hit-rate arithmetic.
///
/// RAW must be known and positive, and there cannot be more edited photos
/// than RAW frames. Failing pairs still count toward photo totals elsewhere.
pub fn is_valid_for_hit_rate(photos: i64, raw: Option<i64>) -> bool {
    match raw {
        Some(raw) => raw > 0 && photos >= 0 && photos <= raw,
        None => false,
    }
}

pub fn hit_rate(photos: i64, raw: Option<i64>) -> Option<f64> {
    if !is_valid_for_hit_rate(photos, raw) {
        return None;
    }
    raw.map(|raw| photos as f64 / raw as f64 * 100.0)
}
