//! Lens classification derived from the lens name.
//!
//! Nothing here is stored authoritatively: type, focal range, maximum
//! aperture and manufacturer are recomputed from the name whenever needed.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ZOOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)mm").expect("valid regex"));

static FOCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)mm").expect("valid regex"));

static APERTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Ff](\d+(?:\.\d+)?)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensType {
    Prime,
    Zoom,
    Unknown,
}

impl LensType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LensType::Prime => "prime",
            LensType::Zoom => "zoom",
            LensType::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prime" => Some(LensType::Prime),
            "zoom" => Some(LensType::Zoom),
            "unknown" => Some(LensType::Unknown),
            _ => None,
        }
    }
}

/// Classify a lens by name: `NN-NNmm` is a zoom, a lone `NNmm` is a prime,
/// anything else is unknown.
pub fn classify(name: &str) -> LensType {
    if ZOOM_RE.is_match(name) {
        LensType::Zoom
    } else if prime_focal_length(name).is_some() {
        LensType::Prime
    } else {
        LensType::Unknown
    }
}

/// Cheap zoom test used by the `lens_type` filter:
/// a hyphen and "mm" anywhere in the name. Everything else counts as prime.
pub fn looks_like_zoom(name: &str) -> bool {
    name.contains('-') && name.contains("mm")
}

/// First `NNmm` that is neither glued to a preceding digit nor followed by a
/// range hyphen.
fn prime_focal_length(name: &str) -> Option<f64> {
    for caps in FOCAL_RE.captures_iter(name) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let preceded_by_digit = name[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());
        let followed_by_range = name[whole.end()..].trim_start().starts_with('-');
        if preceded_by_digit || followed_by_range {
            continue;
        }
        if let Ok(focal) = value.as_str().parse() {
            return Some(focal);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensInfo {
    pub name: String,
    pub lens_type: LensType,
    pub manufacturer: String,
    pub focal_length_min: Option<f64>,
    pub focal_length_max: Option<f64>,
    pub max_aperture: Option<f64>,
}

impl LensInfo {
    pub fn from_name(name: &str) -> Self {
        let lens_type = classify(name);
        let (focal_length_min, focal_length_max) = match lens_type {
            LensType::Zoom => ZOOM_RE
                .captures(name)
                .map(|caps| {
                    let min = caps.get(1).and_then(|m| m.as_str().parse().ok());
                    let max = caps.get(2).and_then(|m| m.as_str().parse().ok());
                    (min, max)
                })
                .unwrap_or((None, None)),
            LensType::Prime => {
                let focal = prime_focal_length(name);
                (focal, focal)
            }
            LensType::Unknown => (None, None),
        };

        Self {
            name: name.to_string(),
            lens_type,
            manufacturer: manufacturer(name).to_string(),
            focal_length_min,
            focal_length_max,
            max_aperture: max_aperture(name),
        }
    }
}

/// Maximum aperture from an `F1.4` style token.
pub fn max_aperture(name: &str) -> Option<f64> {
    APERTURE_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Best-effort manufacturer from well-known naming conventions.
pub fn manufacturer(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let has_any = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

    if has_any(&["fe ", "gm", "g master", "zeiss"]) {
        "Sony"
    } else if has_any(&["dg dn", "art", "contemporary", "sports"]) {
        "Sigma"
    } else if has_any(&["ef ", "rf ", "canon"]) {
        "Canon"
    } else if has_any(&["nikkor", "nikon"]) {
        "Nikon"
    } else if lower.contains("tamron") {
        "Tamron"
    } else {
        "Unknown"
    }
}
