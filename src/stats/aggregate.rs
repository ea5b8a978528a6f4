//! Aggregation of per-session statistics into one cumulative [`Analysis`].

use std::collections::BTreeMap;

use serde::Serialize;

use super::analyzer::Scope;
use super::calculator::Statistics;
use super::facets::Facets;
use super::filter::FilterSpec;
use super::rollup::RollupStats;

/// Optional, known report sections attached to an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum ReportSection {
    Scope {
        scope: Scope,
    },
    ActiveFilters {
        filters: FilterSpec,
    },
    CategoryRollup {
        categories: BTreeMap<String, RollupStats>,
    },
    GroupRollup {
        groups: BTreeMap<String, RollupStats>,
        group_categories: BTreeMap<String, String>,
    },
    Facets {
        facets: Facets,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub name: String,
    #[serde(flatten)]
    pub statistics: Statistics,
    /// Sum of RAW counts over parts that pass the validity rule.
    pub total_raw_photos: Option<i64>,
    pub hit_rate: Option<f64>,
    pub sections: Vec<ReportSection>,
}

impl Analysis {
    pub fn session_ids(&self) -> Vec<i64> {
        self.statistics.session_ids.iter().copied().collect()
    }

    pub fn total_photos(&self) -> u64 {
        self.statistics.total_photos
    }

    pub fn push_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn active_filters(&self) -> Option<&FilterSpec> {
        self.sections.iter().find_map(|s| match s {
            ReportSection::ActiveFilters { filters } => Some(filters),
            _ => None,
        })
    }

    pub fn category_rollup(&self) -> Option<&BTreeMap<String, RollupStats>> {
        self.sections.iter().find_map(|s| match s {
            ReportSection::CategoryRollup { categories } => Some(categories),
            _ => None,
        })
    }

    pub fn group_rollup(&self) -> Option<&BTreeMap<String, RollupStats>> {
        self.sections.iter().find_map(|s| match s {
            ReportSection::GroupRollup { groups, .. } => Some(groups),
            _ => None,
        })
    }

    pub fn facets(&self) -> Option<&Facets> {
        self.sections.iter().find_map(|s| match s {
            ReportSection::Facets { facets } => Some(facets),
            _ => None,
        })
    }
}

/// Merge `parts` into one analysis. Counters and lens breakdowns are summed
/// pointwise and the hit rate is recombined from the valid parts' totals, so
/// the result does not depend on part order or grouping.
pub fn aggregate(name: impl Into<String>, parts: &[Statistics]) -> Analysis {
    let mut statistics = Statistics::default();
    for part in parts {
        statistics.merge(part);
    }

    let tally = statistics.hit_rate_tally;
    Analysis {
        name: name.into(),
        total_raw_photos: tally.raw_total(),
        hit_rate: tally.hit_rate(),
        statistics,
        sections: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhotoRecord, Session};
    use crate::stats::calculator::calculate;

    fn photo(id: i64, session_id: i64, lens: &str, aperture: f64, iso: i64) -> PhotoRecord {
        PhotoRecord {
            id,
            session_id,
            lens: Some(lens.to_string()),
            aperture: Some(aperture),
            iso: Some(iso),
            camera: Some("ILCE-7M4".to_string()),
            ..Default::default()
        }
    }

    fn groups() -> (Vec<PhotoRecord>, Vec<PhotoRecord>, Vec<PhotoRecord>) {
        let g1 = vec![
            photo(1, 1, "FE 85mm F1.4 GM II", 1.4, 100),
            photo(2, 1, "24-70mm F2.8 DG DN", 2.8, 400),
        ];
        let g2 = vec![
            photo(3, 2, "FE 85mm F1.4 GM II", 1.8, 100),
            photo(4, 2, "Unknown Lens XYZ", 4.0, 6400),
        ];
        let g3 = vec![photo(5, 3, "24-70mm F2.8 DG DN", 2.8, 800)];
        (g1, g2, g3)
    }

    #[test]
    fn test_order_and_grouping_do_not_matter() {
        let (g1, g2, g3) = groups();
        let g12: Vec<PhotoRecord> = g1.iter().chain(g2.iter()).cloned().collect();

        let a = aggregate("x", &[calculate(&g1), calculate(&g2), calculate(&g3)]);
        let b = aggregate("x", &[calculate(&g12), calculate(&g3)]);
        let c = aggregate("x", &[calculate(&g3), calculate(&g1), calculate(&g2)]);

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.total_photos(), 5);
    }

    #[test]
    fn test_lens_breakdowns_union_sum() {
        let (g1, g2, g3) = groups();
        let merged = aggregate("x", &[calculate(&g1), calculate(&g2), calculate(&g3)]);

        let prime = &merged.statistics.lens_breakdown["FE 85mm F1.4 GM II"];
        assert_eq!(prime.count, 2);
        assert_eq!(prime.aperture.get("1.4"), 1);
        assert_eq!(prime.aperture.get("1.8"), 1);
        assert_eq!(prime.iso.get("100"), 2);

        let zoom = &merged.statistics.lens_breakdown["24-70mm F2.8 DG DN"];
        assert_eq!(zoom.count, 2);
        assert_eq!(zoom.aperture.get("2.8"), 2);

        for (lens, breakdown) in &merged.statistics.lens_breakdown {
            assert_eq!(breakdown.count, merged.statistics.lens_freq.get(lens));
        }
        assert_eq!(merged.statistics.prime_count, 2);
        assert_eq!(merged.statistics.zoom_count, 2);
    }

    #[test]
    fn test_hit_rate_ignores_invalid_parts() {
        let s1 = Session {
            id: 1,
            total_photos: 50,
            total_raw_photos: Some(100),
            ..Default::default()
        };
        let s2 = Session {
            id: 2,
            total_photos: 30,
            total_raw_photos: None,
            ..Default::default()
        };
        let s3 = Session {
            id: 3,
            total_photos: 10,
            total_raw_photos: Some(5),
            ..Default::default()
        };
        let parts: Vec<Statistics> = [&s1, &s2, &s3]
            .into_iter()
            .map(|s| {
                let photos = vec![PhotoRecord::default(); s.total_photos as usize];
                Statistics::for_session(s, &photos)
            })
            .collect();

        let analysis = aggregate("property", &parts);
        assert_eq!(analysis.total_photos(), 90);
        assert_eq!(analysis.hit_rate, Some(50.0));
        assert_eq!(analysis.total_raw_photos, Some(100));
        assert_eq!(analysis.session_ids(), vec![1, 2, 3]);

        let reversed: Vec<Statistics> = parts.iter().rev().cloned().collect();
        assert_eq!(aggregate("property", &reversed), analysis);
    }

    #[test]
    fn test_no_valid_parts_means_no_hit_rate() {
        let s = Session {
            id: 1,
            total_photos: 3,
            total_raw_photos: Some(0),
            ..Default::default()
        };
        let photos = vec![PhotoRecord::default(); 3];
        let analysis = aggregate("x", &[Statistics::for_session(&s, &photos)]);
        assert_eq!(analysis.hit_rate, None);
        assert_eq!(analysis.total_raw_photos, None);
        assert_eq!(analysis.total_photos(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let (g1, _, _) = groups();
        let mut analysis = aggregate("shape", &[calculate(&g1)]);
        analysis.push_section(ReportSection::ActiveFilters {
            filters: FilterSpec::new(),
        });

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["name"], "shape");
        assert_eq!(json["total_photos"], 2);
        assert_eq!(json["lens_freq"]["FE 85mm F1.4 GM II"], 1);
        assert_eq!(json["aperture_freq"]["2.8"], 1);
        assert_eq!(json["sections"][0]["section"], "active_filters");
        assert!(json.get("hit_rate_tally").is_none());
    }
}
