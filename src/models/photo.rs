//! Per-photo EXIF facts as the statistics engine sees them.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp format used for `date_taken` in the store.
pub const DATE_TAKEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Category name used when a session has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Group name used when a session has no group.
pub const UNGROUPED: &str = "Ungrouped";

/// Coarse part of the day a photo was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }
}

/// Immutable EXIF record for one photo, joined with its owning session's
/// category and group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: i64,
    pub session_id: i64,
    pub file_name: String,
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub aperture: Option<f64>,
    pub shutter_speed: Option<String>,
    pub iso: Option<i64>,
    pub focal_length: Option<f64>,
    pub exposure_program: Option<String>,
    pub exposure_bias: Option<f64>,
    pub flash_mode: Option<String>,
    pub date_taken: Option<NaiveDateTime>,
    pub category: Option<String>,
    pub group: Option<String>,
}

impl PhotoRecord {
    pub fn date_only(&self) -> Option<String> {
        self.date_taken.map(|d| d.format("%Y-%m-%d").to_string())
    }

    pub fn time_only(&self) -> Option<String> {
        self.date_taken.map(|d| d.format("%H:%M:%S").to_string())
    }

    pub fn day_of_week(&self) -> Option<String> {
        self.date_taken.map(|d| d.format("%A").to_string())
    }

    pub fn time_of_day(&self) -> Option<TimeOfDay> {
        self.date_taken.map(|d| TimeOfDay::from_hour(d.hour()))
    }

    pub fn shutter_speed_decimal(&self) -> Option<f64> {
        self.shutter_speed.as_deref().and_then(parse_shutter_speed)
    }

    /// Category name with the `Uncategorized` sentinel applied.
    pub fn effective_category(&self) -> &str {
        effective_name(self.category.as_deref(), UNCATEGORIZED)
    }

    /// Group name with the `Ungrouped` sentinel applied.
    pub fn effective_group(&self) -> &str {
        effective_name(self.group.as_deref(), UNGROUPED)
    }

    pub fn camera_key(&self) -> Option<String> {
        non_empty(self.camera.as_deref())
    }

    pub fn lens_key(&self) -> Option<String> {
        non_empty(self.lens.as_deref())
    }

    pub fn shutter_speed_key(&self) -> Option<String> {
        non_empty(self.shutter_speed.as_deref())
    }

    pub fn exposure_program_key(&self) -> Option<String> {
        non_empty(self.exposure_program.as_deref())
    }

    pub fn flash_mode_key(&self) -> Option<String> {
        non_empty(self.flash_mode.as_deref())
    }

    pub fn aperture_key(&self) -> Option<String> {
        self.aperture.map(format_decimal)
    }

    pub fn iso_key(&self) -> Option<String> {
        self.iso.map(|iso| iso.to_string())
    }

    pub fn focal_length_key(&self) -> Option<String> {
        self.focal_length.map(format_decimal)
    }

    pub fn exposure_bias_key(&self) -> Option<String> {
        self.exposure_bias.map(format_decimal)
    }

    pub fn time_of_day_key(&self) -> Option<String> {
        self.time_of_day().map(|t| t.as_str().to_string())
    }
}

pub(crate) fn effective_name<'a>(name: Option<&'a str>, sentinel: &'a str) -> &'a str {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => sentinel,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Render a decimal the way counter keys and filters compare it:
/// whole numbers keep one decimal place (`2.0`), everything else uses the
/// shortest round-trip form (`1.4`, `84.97`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Parse `"1/125"` or `"2.5"` into seconds.
pub fn parse_shutter_speed(speed: &str) -> Option<f64> {
    let speed = speed.trim();
    if speed.is_empty() {
        return None;
    }
    if let Some((num, denom)) = speed.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let denom: f64 = denom.trim().parse().ok()?;
        if denom == 0.0 {
            return None;
        }
        Some(num / denom)
    } else {
        speed.parse().ok()
    }
}
