//! Lens usage summary: prime and zoom lists, per-manufacturer totals and the
//! most used lenses.

use serde::Serialize;

use super::aggregate::Analysis;
use super::counter::FrequencyCounter;
use crate::models::{LensInfo, LensType};

const MOST_USED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LensUsage {
    pub name: String,
    pub usage_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LensUsageSummary {
    pub total_lenses: usize,
    pub prime_lenses: Vec<LensUsage>,
    pub zoom_lenses: Vec<LensUsage>,
    pub by_manufacturer: FrequencyCounter,
    pub most_used: Vec<LensUsage>,
}

impl LensUsageSummary {
    /// Build from `(lens name, usage count)` pairs. Names are classified
    /// afresh; unknown lenses appear only in totals and `most_used`.
    pub fn from_usage<I, S>(usage: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut summary = LensUsageSummary::default();
        let mut all = Vec::new();

        for (name, usage_count) in usage {
            let info = LensInfo::from_name(name.as_ref());
            let entry = LensUsage {
                name: info.name.clone(),
                usage_count,
            };
            match info.lens_type {
                LensType::Prime => summary.prime_lenses.push(entry.clone()),
                LensType::Zoom => summary.zoom_lenses.push(entry.clone()),
                LensType::Unknown => {}
            }
            summary.by_manufacturer.add(info.manufacturer, usage_count);
            all.push(entry);
        }

        summary.total_lenses = all.len();
        sort_by_usage(&mut summary.prime_lenses);
        sort_by_usage(&mut summary.zoom_lenses);
        sort_by_usage(&mut all);
        all.truncate(MOST_USED_LIMIT);
        summary.most_used = all;
        summary
    }

    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self::from_usage(analysis.statistics.lens_freq.iter())
    }
}

fn sort_by_usage(lenses: &mut [LensUsage]) {
    lenses.sort_by(|a, b| {
        b.usage_count
            .cmp(&a.usage_count)
            .then_with(|| a.name.cmp(&b.name))
    });
}
