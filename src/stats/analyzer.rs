//! Analysis orchestration: resolve a scope against a [`PhotoSource`], filter,
//! compute per-session statistics, aggregate, and attach rollups and facets.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::aggregate::{aggregate, Analysis, ReportSection};
use super::calculator::Statistics;
use super::facets::compute_facets;
use super::filter::{filter, FilterSpec};
use super::rollup::Rollup;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{PhotoRecord, Session};
use crate::tasks::{NoProgress, ProgressSink};

/// Read access the engine needs from a store.
pub trait PhotoSource {
    fn all_sessions(&self) -> anyhow::Result<Vec<Session>>;

    /// Photos of the given sessions, each joined with its session's
    /// category and group.
    fn photos_for_sessions(&self, session_ids: &[i64]) -> anyhow::Result<Vec<PhotoRecord>>;

    fn sessions_in_scope(&self, scope: &Scope) -> anyhow::Result<Vec<Session>> {
        Ok(self
            .all_sessions()?
            .into_iter()
            .filter(|s| scope.matches(s))
            .collect())
    }
}

/// Which sessions an analysis covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    #[default]
    All,
    Category {
        name: String,
    },
    Group {
        name: String,
        #[serde(default)]
        category: Option<String>,
    },
    Sessions {
        ids: Vec<i64>,
    },
}

impl Scope {
    /// Category and group names compare against their sentinel-applied form.
    pub fn matches(&self, session: &Session) -> bool {
        match self {
            Scope::All => true,
            Scope::Category { name } => session.effective_category() == name,
            Scope::Group { name, category } => {
                session.effective_group() == name
                    && category
                        .as_deref()
                        .map_or(true, |c| session.effective_category() == c)
            }
            Scope::Sessions { ids } => ids.contains(&session.id),
        }
    }

    fn default_name(&self, sessions: &[Session]) -> String {
        match self {
            Scope::All => "All Sessions".to_string(),
            Scope::Category { name } => format!("{} - All", name),
            Scope::Group {
                name,
                category: Some(category),
            } => format!("{} - {}", category, name),
            Scope::Group { name, category: None } => name.clone(),
            Scope::Sessions { .. } => match sessions {
                [only] => only.name.clone(),
                _ => "Combined Analysis".to_string(),
            },
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all sessions"),
            Scope::Category { name } => write!(f, "category '{}'", name),
            Scope::Group {
                name,
                category: Some(category),
            } => write!(f, "group '{}' in category '{}'", name, category),
            Scope::Group { name, category: None } => write!(f, "group '{}'", name),
            Scope::Sessions { ids } => write!(f, "sessions {:?}", ids),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub filters: FilterSpec,
    /// Overrides the name derived from the scope.
    #[serde(default)]
    pub name: Option<String>,
}

impl AnalysisRequest {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }
}

const STAGES: usize = 5;

pub struct Analyzer<'a, S: PhotoSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: PhotoSource + ?Sized> Analyzer<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        progress: &dyn ProgressSink,
    ) -> AnalysisResult<Analysis> {
        progress.started(STAGES);
        let result = self.run(request, progress);
        match &result {
            Ok(analysis) => progress.completed(&format!(
                "Analyzed {} photos from {} sessions",
                analysis.total_photos(),
                analysis.statistics.session_ids.len()
            )),
            Err(e) => progress.failed(&e.to_string()),
        }
        result
    }

    fn run(&self, request: &AnalysisRequest, progress: &dyn ProgressSink) -> AnalysisResult<Analysis> {
        let scope = &request.scope;
        let filters = &request.filters;

        progress.progress(0, STAGES, "Resolving sessions");
        let sessions = self.source.sessions_in_scope(scope)?;
        if sessions.is_empty() {
            return Err(AnalysisError::EmptyScope {
                scope: scope.to_string(),
            });
        }

        progress.progress(1, STAGES, "Loading photos");
        let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let population = self.source.photos_for_sessions(&ids)?;

        progress.progress(2, STAGES, "Applying filters");
        let filtered = filter(&population, filters);
        debug!(
            "Scope {} has {} photos, {} after filters",
            scope,
            population.len(),
            filtered.len()
        );

        progress.progress(3, STAGES, "Calculating statistics");
        let mut by_session: HashMap<i64, Vec<PhotoRecord>> = HashMap::new();
        for photo in &filtered {
            by_session.entry(photo.session_id).or_default().push(photo.clone());
        }
        let parts: Vec<Statistics> = sessions
            .iter()
            .filter_map(|session| match by_session.get(&session.id) {
                Some(photos) => Some(Statistics::for_session(session, photos)),
                // Unfiltered, an empty session still contributes its RAW count.
                None if filters.is_empty() => Some(Statistics::for_session(session, &[])),
                None => None,
            })
            .collect();

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| scope.default_name(&sessions));
        let mut analysis = aggregate(name, &parts);

        progress.progress(4, STAGES, "Building rollups");
        let all_sessions = self.source.all_sessions()?;
        analysis.push_section(ReportSection::Scope {
            scope: scope.clone(),
        });
        let rollup = if filters.is_empty() {
            Rollup::baseline(&all_sessions)
        } else {
            analysis.push_section(ReportSection::ActiveFilters {
                filters: filters.clone(),
            });
            Rollup::overlay(&all_sessions, &filtered)
        };
        analysis.push_section(ReportSection::CategoryRollup {
            categories: rollup.categories,
        });
        analysis.push_section(ReportSection::GroupRollup {
            groups: rollup.groups,
            group_categories: rollup.group_categories,
        });
        if let Some(facets) = compute_facets(&population, &all_sessions, filters) {
            analysis.push_section(ReportSection::Facets { facets });
        }

        info!(
            "Analysis '{}': {} photos, hit rate {:?}",
            analysis.name,
            analysis.total_photos(),
            analysis.hit_rate
        );
        Ok(analysis)
    }

    pub fn analyze_session(&self, session_id: i64) -> AnalysisResult<Analysis> {
        self.analyze(
            &AnalysisRequest::new(Scope::Sessions {
                ids: vec![session_id],
            }),
            &NoProgress,
        )
    }

    pub fn analyze_category(&self, category: &str) -> AnalysisResult<Analysis> {
        self.analyze(
            &AnalysisRequest::new(Scope::Category {
                name: category.to_string(),
            }),
            &NoProgress,
        )
    }

    pub fn analyze_group(&self, group: &str, category: Option<&str>) -> AnalysisResult<Analysis> {
        self.analyze(
            &AnalysisRequest::new(Scope::Group {
                name: group.to_string(),
                category: category.map(str::to_string),
            }),
            &NoProgress,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::filter::FilterField;
    use std::sync::mpsc;

    struct MemorySource {
        sessions: Vec<Session>,
        photos: Vec<PhotoRecord>,
    }

    impl PhotoSource for MemorySource {
        fn all_sessions(&self) -> anyhow::Result<Vec<Session>> {
            Ok(self.sessions.clone())
        }

        fn photos_for_sessions(&self, ids: &[i64]) -> anyhow::Result<Vec<PhotoRecord>> {
            Ok(self
                .photos
                .iter()
                .filter(|p| ids.contains(&p.session_id))
                .cloned()
                .collect())
        }
    }

    struct BrokenSource;

    impl PhotoSource for BrokenSource {
        fn all_sessions(&self) -> anyhow::Result<Vec<Session>> {
            anyhow::bail!("disk on fire")
        }

        fn photos_for_sessions(&self, _ids: &[i64]) -> anyhow::Result<Vec<PhotoRecord>> {
            Ok(Vec::new())
        }
    }

    fn session(id: i64, name: &str, category: &str, group: &str, photos: i64, raw: Option<i64>) -> Session {
        Session {
            id,
            name: name.to_string(),
            category: Some(category.to_string()),
            group: Some(group.to_string()),
            total_photos: photos,
            total_raw_photos: raw,
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
            group: session.group.clone(),
            ..Default::default()
        }
    }

    fn source() -> MemorySource {
        let a = session(1, "A", "running", "thesole", 2, Some(4));
        let b = session(2, "B", "running", "parkrun", 1, None);
        let c = session(3, "C", "weddings", "smith", 1, Some(10));
        let photos = vec![
            photo(1, &a, "FE 85mm F1.4 GM II", 1.4),
            photo(2, &a, "24-70mm F2.8 DG DN", 2.8),
            photo(3, &b, "FE 85mm F1.4 GM II", 1.8),
            photo(4, &c, "24-70mm F2.8 DG DN", 4.0),
        ];
        MemorySource {
            sessions: vec![a, b, c],
            photos,
        }
    }

    #[test]
    fn test_named_analyses() {
        let source = source();
        let analyzer = Analyzer::new(&source);

        let category = analyzer.analyze_category("running").unwrap();
        assert_eq!(category.name, "running - All");
        assert_eq!(category.total_photos(), 3);
        assert_eq!(category.hit_rate, Some(50.0));

        let group = analyzer.analyze_group("thesole", Some("running")).unwrap();
        assert_eq!(group.name, "running - thesole");
        assert_eq!(group.session_ids(), vec![1]);

        let session = analyzer.analyze_session(3).unwrap();
        assert_eq!(session.name, "C");
        assert_eq!(session.hit_rate, Some(10.0));
    }

    #[test]
    fn test_empty_scope_is_not_found() {
        let source = source();
        let err = Analyzer::new(&source).analyze_category("portraits").unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyScope { .. }));
    }

    #[test]
    fn test_valid_scope_with_no_matches_is_ok() {
        let source = source();
        let request = AnalysisRequest::new(Scope::All)
            .with_filters(FilterSpec::new().with(FilterField::Camera, &["Hasselblad"]));
        let analysis = Analyzer::new(&source).analyze(&request, &NoProgress).unwrap();
        assert_eq!(analysis.total_photos(), 0);
        assert_eq!(analysis.hit_rate, None);
    }

    #[test]
    fn test_filtered_hit_rate_skips_invalid_sessions() {
        const PRIME: &str = "FE 85mm F1.4 GM II";
        const ZOOM: &str = "24-70mm F2.8 DG DN";

        let s1 = session(1, "S1", "running", "thesole", 50, Some(100));
        let s2 = session(2, "S2", "running", "thesole", 30, None);
        let s3 = session(3, "S3", "running", "thesole", 10, Some(5));
        let mut photos = Vec::new();
        let mut next_id = 0;
        for (s, prime, zoom) in [(&s1, 50, 0), (&s2, 30, 0), (&s3, 3, 7)] {
            for i in 0..prime + zoom {
                next_id += 1;
                let lens = if i < prime { PRIME } else { ZOOM };
                photos.push(photo(next_id, s, lens, 1.4));
            }
        }
        let source = MemorySource {
            sessions: vec![s1, s2, s3],
            photos,
        };
        let analyzer = Analyzer::new(&source);
        let primes = || FilterSpec::new().with(FilterField::Lens, &[PRIME]);

        let analysis = analyzer
            .analyze(&AnalysisRequest::new(Scope::All).with_filters(primes()), &NoProgress)
            .unwrap();
        assert_eq!(analysis.total_photos(), 83);
        assert_eq!(analysis.hit_rate, Some(50.0));
        assert_eq!(analysis.total_raw_photos, Some(100));
        let categories = analysis.category_rollup().unwrap();
        assert_eq!(categories["running"].hit_rate, analysis.hit_rate);
        assert_eq!(analysis.group_rollup().unwrap()["thesole"].hit_rate, analysis.hit_rate);

        // 3 of S3's 10 edits pass the filter, but S3 has only 5 RAW frames
        let only_s3 = analyzer
            .analyze(
                &AnalysisRequest::new(Scope::Sessions { ids: vec![3] }).with_filters(primes()),
                &NoProgress,
            )
            .unwrap();
        assert_eq!(only_s3.total_photos(), 3);
        assert_eq!(only_s3.hit_rate, None);
        assert_eq!(only_s3.total_raw_photos, None);
    }

    #[test]
    fn test_store_errors_pass_through() {
        let err = Analyzer::new(&BrokenSource)
            .analyze(&AnalysisRequest::default(), &NoProgress)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Store(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_sections_without_filters() {
        let source = source();
        let analysis = Analyzer::new(&source)
            .analyze(&AnalysisRequest::default(), &NoProgress)
            .unwrap();

        assert!(analysis.facets().is_none());
        assert!(analysis.active_filters().is_none());
        let categories = analysis.category_rollup().unwrap();
        assert_eq!(categories["running"].photos, 3);
        assert_eq!(categories["weddings"].sessions, 1);
    }

    #[test]
    fn test_sections_with_filters() {
        let source = source();
        let request = AnalysisRequest::new(Scope::All)
            .with_filters(FilterSpec::new().with(FilterField::Category, &["weddings"]));
        let analysis = Analyzer::new(&source).analyze(&request, &NoProgress).unwrap();

        assert_eq!(analysis.total_photos(), 1);
        assert_eq!(analysis.session_ids(), vec![3]);
        let categories = analysis.category_rollup().unwrap();
        assert_eq!(categories["running"].photos, 0);
        assert_eq!(categories["weddings"].photos, 1);

        let facets = analysis.facets().unwrap();
        assert_eq!(facets.category.len(), 2);
        assert_eq!(facets.lens.get("24-70mm F2.8 DG DN"), 1);
        assert!(analysis.active_filters().is_some());
    }

    #[test]
    fn test_progress_is_reported() {
        let source = source();
        let (tx, rx) = mpsc::channel();
        Analyzer::new(&source)
            .analyze(&AnalysisRequest::default(), &tx)
            .unwrap();

        let updates: Vec<_> = rx.try_iter().collect();
        assert!(matches!(updates.first(), Some(crate::tasks::TaskUpdate::Started { total: 5 })));
        assert!(matches!(
            updates.last(),
            Some(crate::tasks::TaskUpdate::Completed { .. })
        ));
    }

    #[test]
    fn test_scope_deserializes() {
        let request: AnalysisRequest = serde_json::from_value(serde_json::json!({
            "scope": {"type": "group", "name": "thesole"},
            "filters": {"lens": "FE 85mm F1.4 GM II"}
        }))
        .unwrap();
        assert_eq!(
            request.scope,
            Scope::Group {
                name: "thesole".to_string(),
                category: None
            }
        );
        assert!(!request.filters.is_empty());

        let default: AnalysisRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(default.scope, Scope::All);
    }
}
