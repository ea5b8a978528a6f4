//! Engine scenarios over an in-memory store: ingest → analyze → filter.

use chrono::NaiveDate;
use photowrapped::db::{Database, SessionUpdate};
use photowrapped::models::Session;
use photowrapped::scanner::PhotoExif;
use photowrapped::stats::{AnalysisRequest, Analyzer, FilterField, FilterSpec, Scope};
use photowrapped::error::AnalysisError;
use photowrapped::tasks::NoProgress;

const PRIME: &str = "FE 85mm F1.4 GM II";
const ZOOM: &str = "24-70mm F2.8 DG DN";

fn photo(name: &str, lens: &str, aperture: f64) -> PhotoExif {
    PhotoExif {
        file_path: format!("/shoots/{}", name),
        file_name: name.to_string(),
        camera: Some("SONY ILCE-7M4".to_string()),
        lens: Some(lens.to_string()),
        aperture: Some(aperture),
        shutter_speed: Some("1/500".to_string()),
        iso: Some(200),
        date_taken: NaiveDate::from_ymd_opt(2025, 4, 3).and_then(|d| d.and_hms_opt(9, 30, 0)),
        ..Default::default()
    }
}

fn session(name: &str, category: &str, raw: Option<i64>) -> Session {
    Session {
        name: name.to_string(),
        category: Some(category.to_string()),
        group: Some("thesole".to_string()),
        date: NaiveDate::from_ymd_opt(2025, 4, 3),
        total_raw_photos: raw,
        ..Default::default()
    }
}

/// Sessions A (two photos), B (one photo) and C (none).
fn fixture() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();

    let a = db.create_session(&session("A", "running", Some(4))).unwrap();
    db.insert_photos(a, &[photo("a1.jpg", PRIME, 1.4), photo("a2.jpg", ZOOM, 2.8)])
        .unwrap();
    db.refresh_session_totals(a).unwrap();

    let b = db.create_session(&session("B", "track", None)).unwrap();
    db.insert_photos(b, &[photo("b1.jpg", PRIME, 1.8)]).unwrap();
    db.refresh_session_totals(b).unwrap();

    db.create_session(&session("C", "portraits", Some(10))).unwrap();
    db
}

#[test]
fn test_aggregate_over_all_sessions() {
    let db = fixture();
    let analysis = Analyzer::new(&db)
        .analyze(&AnalysisRequest::new(Scope::All), &NoProgress)
        .unwrap();

    let stats = &analysis.statistics;
    assert_eq!(analysis.name, "All Sessions");
    assert_eq!(stats.total_photos, 3);
    assert_eq!(stats.lens_freq.get(PRIME), 2);
    assert_eq!(stats.lens_freq.get(ZOOM), 1);
    assert_eq!(stats.lens_freq.len(), 2);
    assert_eq!(stats.prime_count, 2);
    assert_eq!(stats.zoom_count, 1);

    // A is 2/4; B has no RAW count; C has RAW frames but no edits, 0/10
    assert_eq!(analysis.total_raw_photos, Some(14));
    let rate = analysis.hit_rate.unwrap();
    assert!((rate - 2.0 / 14.0 * 100.0).abs() < 1e-9);

    assert!(analysis.facets().is_none());
    let categories = analysis.category_rollup().unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(categories["running"].photos, 2);
}

#[test]
fn test_filter_by_lens() {
    let db = fixture();
    let spec = FilterSpec::new().with(FilterField::Lens, &[PRIME]);
    let analysis = Analyzer::new(&db)
        .analyze(&AnalysisRequest::new(Scope::All).with_filters(spec), &NoProgress)
        .unwrap();

    let stats = &analysis.statistics;
    assert_eq!(stats.total_photos, 2);
    assert_eq!(stats.aperture_freq.get("1.4"), 1);
    assert_eq!(stats.aperture_freq.get("1.8"), 1);
    assert_eq!(stats.aperture_freq.len(), 2);
    assert_eq!(stats.lens_freq.len(), 1);

    // Lens facet ignores the lens filter itself
    let facets = analysis.facets().unwrap();
    assert_eq!(facets.lens.get(ZOOM), 1);
    assert_eq!(facets.lens.get(PRIME), 2);

    // Only A's filtered photo takes part in the hit rate: 1/4
    assert_eq!(analysis.total_raw_photos, Some(4));
    assert_eq!(analysis.hit_rate, Some(25.0));
}

#[test]
fn test_category_facet_keeps_every_category() {
    let db = fixture();
    let spec = FilterSpec::new().with(FilterField::Category, &["running"]);
    let analysis = Analyzer::new(&db)
        .analyze(&AnalysisRequest::new(Scope::All).with_filters(spec), &NoProgress)
        .unwrap();

    assert_eq!(analysis.total_photos(), 2);
    let facets = analysis.facets().unwrap();
    assert_eq!(facets.category.len(), 3);
    assert_eq!(facets.category["running"].photos, 2);
    assert_eq!(facets.category["track"].photos, 0);
    assert_eq!(facets.category["track"].sessions, 0);
    assert_eq!(facets.category["portraits"].photos, 0);
}

#[test]
fn test_scoped_analyses() {
    let db = fixture();
    let analyzer = Analyzer::new(&db);

    let track = analyzer.analyze_category("track").unwrap();
    assert_eq!(track.name, "track - All");
    assert_eq!(track.total_photos(), 1);
    assert_eq!(track.hit_rate, None);

    let group = analyzer.analyze_group("thesole", Some("running")).unwrap();
    assert_eq!(group.name, "running - thesole");
    assert_eq!(group.total_photos(), 2);

    match analyzer.analyze_category("nope") {
        Err(AnalysisError::EmptyScope { .. }) => {}
        other => panic!("expected EmptyScope, got {:?}", other.map(|a| a.name)),
    }

    // A valid scope whose photos are all filtered out is not an error
    let spec = FilterSpec::new().with(FilterField::Aperture, &["16"]);
    let empty = analyzer
        .analyze(
            &AnalysisRequest::new(Scope::Category {
                name: "running".to_string(),
            })
            .with_filters(spec),
            &NoProgress,
        )
        .unwrap();
    assert_eq!(empty.total_photos(), 0);
    assert_eq!(empty.hit_rate, None);
}

#[test]
fn test_deleting_sessions_updates_lens_registry() {
    let db = fixture();
    let before = db.lens_usage_summary().unwrap();
    assert_eq!(before.total_lenses, 2);

    let deleted = db
        .delete_sessions_by_categories(&["running".to_string()])
        .unwrap();
    assert_eq!(deleted.sessions, 1);
    assert_eq!(deleted.photos, 2);

    let lenses = db.list_lenses().unwrap();
    assert_eq!(lenses.len(), 1);
    assert_eq!(lenses[0].info.name, PRIME);
    assert_eq!(lenses[0].usage_count, 1);
}

#[test]
fn test_filter_does_not_revive_invalid_session_hit_rate() {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();

    let id = db.create_session(&session("Overedited", "running", None)).unwrap();
    let photos: Vec<PhotoExif> = (0..10)
        .map(|i| {
            let lens = if i < 3 { PRIME } else { ZOOM };
            photo(&format!("p{}.jpg", i), lens, 1.4)
        })
        .collect();
    db.insert_photos(id, &photos).unwrap();
    db.refresh_session_totals(id).unwrap();

    // 10 edits against 5 RAW frames
    let update = SessionUpdate {
        total_raw_photos: Some(5),
        ..Default::default()
    };
    let stored = db.update_session(id, &update).unwrap().unwrap();
    assert_eq!(stored.hit_rate, None);

    let analyzer = Analyzer::new(&db);
    let unfiltered = analyzer
        .analyze(&AnalysisRequest::new(Scope::All), &NoProgress)
        .unwrap();
    assert_eq!(unfiltered.hit_rate, None);

    let spec = FilterSpec::new().with(FilterField::Lens, &[PRIME]);
    let filtered = analyzer
        .analyze(&AnalysisRequest::new(Scope::All).with_filters(spec), &NoProgress)
        .unwrap();
    assert_eq!(filtered.total_photos(), 3);
    assert_eq!(filtered.hit_rate, None);
    assert_eq!(filtered.total_raw_photos, None);
    assert_eq!(filtered.category_rollup().unwrap()["running"].hit_rate, None);
}
