//! Category and group rollups.
//!
//! The baseline walks every session once. The overlay keeps every baseline
//! key (and its hit rate) but recounts sessions and photos from a filtered
//! photo population, so options the filter excludes stay listed with zeros.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::calculator::HitRateTally;
use crate::models::{PhotoRecord, Session};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupStats {
    pub sessions: u64,
    pub photos: u64,
    pub hit_rate: Option<f64>,
    #[serde(skip)]
    tally: HitRateTally,
}

impl RollupStats {
    fn add_session(&mut self, session: &Session) {
        self.sessions += 1;
        self.photos += session.total_photos.max(0) as u64;
        self.tally
            .merge(&HitRateTally::for_session(session, session.total_photos));
        self.hit_rate = self.tally.hit_rate();
    }

    fn clear_counts(&mut self) {
        self.sessions = 0;
        self.photos = 0;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rollup {
    pub categories: BTreeMap<String, RollupStats>,
    pub groups: BTreeMap<String, RollupStats>,
    /// Which category each group belongs to. The first session seen for a
    /// group decides.
    pub group_categories: BTreeMap<String, String>,
}

impl Rollup {
    /// Baseline over all sessions.
    pub fn baseline(sessions: &[Session]) -> Self {
        let mut rollup = Rollup::default();
        for session in sessions {
            let category = session.effective_category();
            let group = session.effective_group();
            rollup
                .categories
                .entry(category.to_string())
                .or_default()
                .add_session(session);
            rollup
                .groups
                .entry(group.to_string())
                .or_default()
                .add_session(session);
            rollup
                .group_categories
                .entry(group.to_string())
                .or_insert_with(|| category.to_string());
        }
        rollup
    }

    /// Baseline keys with counts taken from `photos` instead.
    pub fn overlay(sessions: &[Session], photos: &[PhotoRecord]) -> Self {
        let mut rollup = Self::baseline(sessions);
        for stats in rollup
            .categories
            .values_mut()
            .chain(rollup.groups.values_mut())
        {
            stats.clear_counts();
        }

        let by_id: HashMap<i64, &Session> = sessions.iter().map(|s| (s.id, s)).collect();
        let mut seen_categories: BTreeSet<(String, i64)> = BTreeSet::new();
        let mut seen_groups: BTreeSet<(String, i64)> = BTreeSet::new();

        for photo in photos {
            let (category, group) = match by_id.get(&photo.session_id) {
                Some(session) => (session.effective_category(), session.effective_group()),
                None => (photo.effective_category(), photo.effective_group()),
            };

            let entry = rollup.categories.entry(category.to_string()).or_default();
            entry.photos += 1;
            if seen_categories.insert((category.to_string(), photo.session_id)) {
                entry.sessions += 1;
            }

            let entry = rollup.groups.entry(group.to_string()).or_default();
            entry.photos += 1;
            if seen_groups.insert((group.to_string(), photo.session_id)) {
                entry.sessions += 1;
            }

            rollup
                .group_categories
                .entry(group.to_string())
                .or_insert_with(|| category.to_string());
        }
        rollup
    }
}

/// Baseline when `photos` is `None`, overlay otherwise.
pub fn rollup(sessions: &[Session], photos: Option<&[PhotoRecord]>) -> Rollup {
    match photos {
        Some(photos) => Rollup::overlay(sessions, photos),
        None => Rollup::baseline(sessions),
    }
}
