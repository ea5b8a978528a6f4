//! Month-by-month trends for a set of sessions ("wrapped").

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::calculator::HitRateTally;
use super::counter::FrequencyCounter;
use crate::models::{PhotoRecord, Session};

/// ISO values at or above this are camera "unknown" sentinels.
pub const ISO_SENTINEL: i64 = 65535;

pub const HIGH_ISO: i64 = 3200;

static NAME_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub sessions: u64,
    pub photos: u64,
    pub hit_rate: Option<f64>,
    pub top_lens: Option<String>,
    /// Share of the month's photos taken with `top_lens`, in percent.
    pub top_lens_share: Option<f64>,
    pub top_shutter_speed: Option<String>,
    pub average_iso: Option<f64>,
    pub high_iso_share: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trends {
    pub total_sessions: u64,
    pub first_month: Option<String>,
    pub last_month: Option<String>,
    pub months: Vec<MonthlyTrend>,
    /// Sessions with no usable date.
    pub undated_sessions: Vec<String>,
}

#[derive(Default)]
struct MonthAccumulator {
    sessions: u64,
    photos: u64,
    tally: HitRateTally,
    lenses: FrequencyCounter,
    shutter_speeds: FrequencyCounter,
    iso_sum: i64,
    iso_count: u64,
    high_iso: u64,
}

/// Month a session belongs to: its date, or a `YYYY-MM-DD` inside its name.
pub fn session_month(session: &Session) -> Option<String> {
    if let Some(date) = session.date {
        return Some(date.format("%Y-%m").to_string());
    }
    let caps = NAME_DATE_RE.captures(&session.name)?;
    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    Some(date.format("%Y-%m").to_string())
}

pub fn monthly_trends(sessions: &[Session], photos: &[PhotoRecord]) -> Trends {
    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();
    let mut month_of: HashMap<i64, String> = HashMap::new();
    let mut undated_sessions = Vec::new();

    for session in sessions {
        let Some(month) = session_month(session) else {
            debug!("Session {:?} has no date, leaving it out of trends", session.name);
            undated_sessions.push(session.name.clone());
            continue;
        };
        let acc = months.entry(month.clone()).or_default();
        acc.sessions += 1;
        acc.tally
            .merge(&HitRateTally::for_session(session, session.total_photos));
        month_of.insert(session.id, month);
    }

    for photo in photos {
        let Some(acc) = month_of.get(&photo.session_id).and_then(|m| months.get_mut(m)) else {
            continue;
        };
        acc.photos += 1;
        acc.lenses.record(photo.lens_key());
        acc.shutter_speeds.record(photo.shutter_speed_key());
        if let Some(iso) = photo.iso.filter(|iso| *iso < ISO_SENTINEL) {
            acc.iso_sum += iso;
            acc.iso_count += 1;
            if iso >= HIGH_ISO {
                acc.high_iso += 1;
            }
        }
    }

    let months: Vec<MonthlyTrend> = months
        .into_iter()
        .map(|(month, acc)| {
            let top_lens = acc.lenses.most_common(Some(1)).into_iter().next();
            let top_shutter = acc.shutter_speeds.most_common(Some(1)).into_iter().next();
            MonthlyTrend {
                month,
                sessions: acc.sessions,
                photos: acc.photos,
                hit_rate: acc.tally.hit_rate(),
                top_lens_share: top_lens
                    .as_ref()
                    .filter(|_| acc.photos > 0)
                    .map(|(_, n)| *n as f64 / acc.photos as f64 * 100.0),
                top_lens: top_lens.map(|(name, _)| name),
                top_shutter_speed: top_shutter.map(|(speed, _)| speed),
                average_iso: (acc.iso_count > 0)
                    .then(|| acc.iso_sum as f64 / acc.iso_count as f64),
                high_iso_share: (acc.photos > 0)
                    .then(|| acc.high_iso as f64 / acc.photos as f64 * 100.0),
            }
        })
        .collect();

    Trends {
        total_sessions: sessions.len() as u64,
        first_month: months.first().map(|m| m.month.clone()),
        last_month: months.last().map(|m| m.month.clone()),
        months,
        undated_sessions,
    }
}
