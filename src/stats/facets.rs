//! Drill-down facet counts.
//!
//! Each metadata dimension is recounted with every filter except its own, so
//! the UI can show how many photos each alternative value would give.
//! Category and group facets use the rollup overlay instead, so every known
//! option stays listed even when the current filter zeroes it.

use std::collections::BTreeMap;

use serde::Serialize;

use super::calculator::calculate;
use super::counter::FrequencyCounter;
use super::filter::{filter, FilterField, FilterSpec};
use super::rollup::{Rollup, RollupStats};
use crate::models::{PhotoRecord, Session};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub category: BTreeMap<String, RollupStats>,
    pub group: BTreeMap<String, RollupStats>,
    pub camera: FrequencyCounter,
    pub lens: FrequencyCounter,
    pub aperture: FrequencyCounter,
    pub shutter_speed: FrequencyCounter,
    pub iso: FrequencyCounter,
    pub focal_length: FrequencyCounter,
    pub time_of_day: FrequencyCounter,
}

/// Facet counts for `population` under `spec`.
///
/// Returns `None` when `spec` is empty: with nothing filtered the main
/// analysis already holds these counts, so the recomputation is skipped.
pub fn compute_facets(
    population: &[PhotoRecord],
    all_sessions: &[Session],
    spec: &FilterSpec,
) -> Option<Facets> {
    if spec.is_empty() {
        return None;
    }

    let relaxed = |field: FilterField| calculate(&filter(population, &spec.without(field)));

    let overlay = Rollup::overlay(all_sessions, &filter(population, spec));

    Some(Facets {
        category: overlay.categories,
        group: overlay.groups,
        camera: relaxed(FilterField::Camera).camera_freq,
        lens: relaxed(FilterField::Lens).lens_freq,
        aperture: relaxed(FilterField::Aperture).aperture_freq,
        shutter_speed: relaxed(FilterField::ShutterSpeed).shutter_speed_freq,
        iso: relaxed(FilterField::Iso).iso_freq,
        focal_length: relaxed(FilterField::FocalLength).focal_length_freq,
        time_of_day: relaxed(FilterField::TimeOfDay).time_of_day_freq,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: i64, category: &str) -> Session {
        Session {
            id,
            name: format!("{} shoot", category),
            category: Some(category.to_string()),
            total_photos: 2,
            total_raw_photos: Some(4),
            ..Default::default()
        }
    }

    fn photo(id: i64, session: &Session, lens: &str, aperture: f64) -> PhotoRecord {
        PhotoRecord {
            id,
            session_id: session.id,
            lens: Some(lens.to_string()),
            aperture: Some(aperture),
            category: session.category.clone(),
            ..Default::default()
        }
    }

    fn fixture() -> (Vec<Session>, Vec<PhotoRecord>) {
        let sessions = vec![session(1, "A"), session(2, "B"), session(3, "C")];
        let photos = vec![
            photo(1, &sessions[0], "FE 85mm F1.4 GM II", 1.4),
            photo(2, &sessions[0], "24-70mm F2.8 DG DN", 2.8),
            photo(3, &sessions[1], "FE 85mm F1.4 GM II", 1.8),
            photo(4, &sessions[1], "FE 85mm F1.4 GM II", 1.4),
            photo(5, &sessions[2], "24-70mm F2.8 DG DN", 4.0),
            photo(6, &sessions[2], "24-70mm F2.8 DG DN", 2.8),
        ];
        (sessions, photos)
    }

    #[test]
    fn test_skipped_without_filters() {
        let (sessions, photos) = fixture();
        assert!(compute_facets(&photos, &sessions, &FilterSpec::new()).is_none());
    }

    #[test]
    fn test_all_categories_stay_visible() {
        let (sessions, photos) = fixture();
        let spec = FilterSpec::new().with(FilterField::Category, &["A"]);
        let facets = compute_facets(&photos, &sessions, &spec).unwrap();

        assert_eq!(facets.category.len(), 3);
        assert_eq!(facets.category["A"].photos, 2);
        assert_eq!(facets.category["A"].sessions, 1);
        for other in ["B", "C"] {
            assert_eq!(facets.category[other].photos, 0);
            assert_eq!(facets.category[other].sessions, 0);
        }
    }

    #[test]
    fn test_own_filter_is_relaxed() {
        let (sessions, photos) = fixture();
        let spec = FilterSpec::new()
            .with(FilterField::Lens, &["FE 85mm F1.4 GM II"])
            .with(FilterField::Aperture, &["1.4"]);
        let facets = compute_facets(&photos, &sessions, &spec).unwrap();

        // lens facet: aperture=1.4 only
        assert_eq!(facets.lens.get("FE 85mm F1.4 GM II"), 2);
        assert_eq!(facets.lens.get("24-70mm F2.8 DG DN"), 0);

        // aperture facet: lens only
        assert_eq!(facets.aperture.get("1.4"), 2);
        assert_eq!(facets.aperture.get("1.8"), 1);
        assert_eq!(facets.aperture.get("2.8"), 0);
    }

    #[test]
    fn test_population_is_untouched() {
        let (sessions, photos) = fixture();
        let before = photos.clone();
        let spec = FilterSpec::new().with(FilterField::Lens, &["24-70mm F2.8 DG DN"]);
        let _ = compute_facets(&photos, &sessions, &spec);
        assert_eq!(photos, before);
    }
}
