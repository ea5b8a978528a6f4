//! Session statistics: one pass over a photo set producing frequency tables,
//! per-lens breakdowns and the prime/zoom split.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::counter::FrequencyCounter;
use crate::models::lens::{classify, LensType};
use crate::models::{PhotoRecord, Session};

/// Usage of one lens: how often it was used and with which settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensBreakdown {
    pub count: u64,
    pub shutter_speed: FrequencyCounter,
    pub aperture: FrequencyCounter,
    pub iso: FrequencyCounter,
    pub exposure_program: FrequencyCounter,
    pub flash_mode: FrequencyCounter,
    pub focal_length: FrequencyCounter,
}

impl LensBreakdown {
    fn record(&mut self, photo: &PhotoRecord) {
        self.count += 1;
        self.shutter_speed.record(photo.shutter_speed_key());
        self.aperture.record(photo.aperture_key());
        self.iso.record(photo.iso_key());
        self.exposure_program.record(photo.exposure_program_key());
        self.flash_mode.record(photo.flash_mode_key());
        self.focal_length.record(photo.focal_length_key());
    }

    pub fn merge(&mut self, other: &LensBreakdown) {
        self.count += other.count;
        self.shutter_speed.merge(&other.shutter_speed);
        self.aperture.merge(&other.aperture);
        self.iso.merge(&other.iso);
        self.exposure_program.merge(&other.exposure_program);
        self.flash_mode.merge(&other.flash_mode);
        self.focal_length.merge(&other.focal_length);
    }
}

/// Running hit-rate totals over parts that pass the validity rule.
///
/// Keeping numerator and denominator separately (instead of averaging rates)
/// is what makes merges order independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRateTally {
    pub photos: i64,
    pub raw: i64,
}

impl HitRateTally {
    /// Tally for `photos` of a session's edits. The session itself must pass
    /// the validity rule; a filter narrowing an invalid session never makes
    /// it eligible.
    pub fn for_session(session: &Session, photos: i64) -> Self {
        match session.total_raw_photos {
            Some(raw) if session.is_valid_for_hit_rate() => Self { photos, raw },
            _ => Self::default(),
        }
    }

    pub fn merge(&mut self, other: &HitRateTally) {
        self.photos += other.photos;
        self.raw += other.raw;
    }

    pub fn hit_rate(&self) -> Option<f64> {
        if self.raw > 0 {
            Some(self.photos as f64 / self.raw as f64 * 100.0)
        } else {
            None
        }
    }

    pub fn raw_total(&self) -> Option<i64> {
        (self.raw > 0).then_some(self.raw)
    }
}

/// Frequency tables for one logical group of photos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub session_ids: BTreeSet<i64>,
    pub total_photos: u64,
    pub lens_freq: FrequencyCounter,
    pub camera_freq: FrequencyCounter,
    pub shutter_speed_freq: FrequencyCounter,
    pub aperture_freq: FrequencyCounter,
    pub iso_freq: FrequencyCounter,
    pub exposure_program_freq: FrequencyCounter,
    pub flash_mode_freq: FrequencyCounter,
    pub focal_length_freq: FrequencyCounter,
    pub exposure_bias_freq: FrequencyCounter,
    pub time_of_day_freq: FrequencyCounter,
    pub lens_breakdown: BTreeMap<String, LensBreakdown>,
    pub prime_count: u64,
    pub zoom_count: u64,
    #[serde(skip)]
    pub hit_rate_tally: HitRateTally,
}

impl Statistics {
    /// Statistics for one session's (possibly filtered) photos, carrying the
    /// session's RAW count into the hit-rate tally when the session is valid.
    pub fn for_session(session: &Session, photos: &[PhotoRecord]) -> Self {
        let mut stats = calculate(photos);
        stats.session_ids.insert(session.id);
        stats.hit_rate_tally = HitRateTally::for_session(session, stats.total_photos as i64);
        stats
    }

    /// Pointwise merge of every counter and breakdown.
    pub fn merge(&mut self, other: &Statistics) {
        self.session_ids.extend(other.session_ids.iter().copied());
        self.total_photos += other.total_photos;
        self.lens_freq.merge(&other.lens_freq);
        self.camera_freq.merge(&other.camera_freq);
        self.shutter_speed_freq.merge(&other.shutter_speed_freq);
        self.aperture_freq.merge(&other.aperture_freq);
        self.iso_freq.merge(&other.iso_freq);
        self.exposure_program_freq.merge(&other.exposure_program_freq);
        self.flash_mode_freq.merge(&other.flash_mode_freq);
        self.focal_length_freq.merge(&other.focal_length_freq);
        self.exposure_bias_freq.merge(&other.exposure_bias_freq);
        self.time_of_day_freq.merge(&other.time_of_day_freq);
        for (lens, breakdown) in &other.lens_breakdown {
            self.lens_breakdown
                .entry(lens.clone())
                .or_default()
                .merge(breakdown);
        }
        self.prime_count += other.prime_count;
        self.zoom_count += other.zoom_count;
        self.hit_rate_tally.merge(&other.hit_rate_tally);
    }

    pub fn hit_rate(&self) -> Option<f64> {
        self.hit_rate_tally.hit_rate()
    }
}

/// Compute statistics for a photo set. Absent attributes are skipped, never
/// counted under a placeholder.
pub fn calculate(photos: &[PhotoRecord]) -> Statistics {
    let mut stats = Statistics {
        total_photos: photos.len() as u64,
        ..Default::default()
    };

    for photo in photos {
        stats.camera_freq.record(photo.camera_key());
        stats.shutter_speed_freq.record(photo.shutter_speed_key());
        stats.aperture_freq.record(photo.aperture_key());
        stats.iso_freq.record(photo.iso_key());
        stats.exposure_program_freq.record(photo.exposure_program_key());
        stats.flash_mode_freq.record(photo.flash_mode_key());
        stats.focal_length_freq.record(photo.focal_length_key());
        stats.exposure_bias_freq.record(photo.exposure_bias_key());
        stats.time_of_day_freq.record(photo.time_of_day_key());

        if let Some(lens) = photo.lens_key() {
            match classify(&lens) {
                LensType::Prime => stats.prime_count += 1,
                LensType::Zoom => stats.zoom_count += 1,
                LensType::Unknown => {}
            }
            stats
                .lens_breakdown
                .entry(lens.clone())
                .or_default()
                .record(photo);
            stats.lens_freq.increment(lens);
        }
    }

    stats
}
