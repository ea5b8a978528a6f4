//! Filter engine: narrow a photo population by a [`FilterSpec`].
//!
//! Keys compose with AND, values within one key compose with OR. A photo
//! missing the attribute a key names never passes that key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::lens::looks_like_zoom;
use crate::models::photo::format_decimal;
use crate::models::PhotoRecord;

/// Focal lengths match when strictly closer than this many millimetres.
pub const FOCAL_LENGTH_TOLERANCE: f64 = 0.1;

/// A filterable photo attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Category,
    Group,
    Camera,
    Lens,
    Aperture,
    ShutterSpeed,
    Iso,
    FocalLength,
    TimeOfDay,
    LensType,
}

impl FilterField {
    pub const ALL: [FilterField; 10] = [
        FilterField::Category,
        FilterField::Group,
        FilterField::Camera,
        FilterField::Lens,
        FilterField::Aperture,
        FilterField::ShutterSpeed,
        FilterField::Iso,
        FilterField::FocalLength,
        FilterField::TimeOfDay,
        FilterField::LensType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Category => "category",
            FilterField::Group => "group",
            FilterField::Camera => "camera",
            FilterField::Lens => "lens",
            FilterField::Aperture => "aperture",
            FilterField::ShutterSpeed => "shutter_speed",
            FilterField::Iso => "iso",
            FilterField::FocalLength => "focal_length",
            FilterField::TimeOfDay => "time_of_day",
            FilterField::LensType => "lens_type",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name.trim())
    }

    /// Canonical form of a user-supplied value, so `"2"` and `"2.0"` both
    /// select an aperture stored as 2.0.
    fn canonical_value(&self, raw: &str) -> String {
        let raw = raw.trim();
        match self {
            FilterField::Aperture => match raw.parse::<f64>() {
                Ok(v) => format_decimal(v),
                Err(_) => raw.to_string(),
            },
            FilterField::Iso => match raw.parse::<f64>() {
                Ok(v) if v.fract() == 0.0 => format!("{}", v as i64),
                _ => raw.to_string(),
            },
            _ => raw.to_string(),
        }
    }

    fn matches(&self, photo: &PhotoRecord, accepted: &[String]) -> bool {
        match self {
            FilterField::Category => accepted.iter().any(|v| v == photo.effective_category()),
            FilterField::Group => accepted.iter().any(|v| v == photo.effective_group()),
            FilterField::Camera => contains_key(photo.camera_key(), accepted),
            FilterField::Lens => contains_key(photo.lens_key(), accepted),
            FilterField::Aperture => contains_key(photo.aperture_key(), accepted),
            FilterField::ShutterSpeed => contains_key(photo.shutter_speed_key(), accepted),
            FilterField::Iso => contains_key(photo.iso_key(), accepted),
            FilterField::FocalLength => match photo.focal_length {
                Some(focal) => accepted.iter().any(|v| {
                    v.parse::<f64>()
                        .is_ok_and(|target| (focal - target).abs() < FOCAL_LENGTH_TOLERANCE)
                }),
                None => false,
            },
            FilterField::TimeOfDay => match photo.time_of_day() {
                Some(bucket) => accepted
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(bucket.as_str())),
                None => false,
            },
            FilterField::LensType => match photo.lens_key() {
                Some(lens) => {
                    let zoom = looks_like_zoom(&lens);
                    accepted.iter().any(|v| match v.to_ascii_lowercase().as_str() {
                        "zoom" => zoom,
                        "prime" => !zoom,
                        _ => false,
                    })
                }
                None => false,
            },
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn contains_key(key: Option<String>, accepted: &[String]) -> bool {
    key.is_some_and(|key| accepted.iter().any(|v| *v == key))
}

/// Accepted values per attribute. Fields with no accepted values are not
/// stored, so an empty list never filters everything out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<FilterField, Vec<String>>"
)]
pub struct FilterSpec {
    criteria: BTreeMap<FilterField, Vec<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FilterField, values: &[&str]) -> Self {
        self.set(field, values.iter().map(|v| v.to_string()));
        self
    }

    /// Replace the accepted values for `field`. Blank values are discarded.
    pub fn set(&mut self, field: FilterField, values: impl IntoIterator<Item = String>) {
        let mut canonical: Vec<String> = values
            .into_iter()
            .map(|v| field.canonical_value(&v))
            .filter(|v| !v.is_empty())
            .collect();
        canonical.dedup();
        if canonical.is_empty() {
            self.criteria.remove(&field);
        } else {
            self.criteria.insert(field, canonical);
        }
    }

    /// Add one value to `field`, keeping existing ones.
    pub fn push(&mut self, field: FilterField, value: &str) {
        let mut values = self.criteria.get(&field).cloned().unwrap_or_default();
        values.push(value.to_string());
        self.set(field, values);
    }

    /// Parse a `key=value` pair as given on the command line.
    pub fn push_pair(&mut self, pair: &str) -> anyhow::Result<()> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("filter must look like key=value: {}", pair))?;
        let field = FilterField::parse(key)
            .ok_or_else(|| anyhow::anyhow!("unknown filter field: {}", key))?;
        self.push(field, value);
        Ok(())
    }

    pub fn get(&self, field: FilterField) -> Option<&[String]> {
        self.criteria.get(&field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = FilterField> + '_ {
        self.criteria.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &[String])> {
        self.criteria.iter().map(|(f, v)| (*f, v.as_slice()))
    }

    /// The same spec with `field`'s constraint removed.
    pub fn without(&self, field: FilterField) -> FilterSpec {
        let mut criteria = self.criteria.clone();
        criteria.remove(&field);
        FilterSpec { criteria }
    }

    pub fn matches(&self, photo: &PhotoRecord) -> bool {
        self.criteria
            .iter()
            .all(|(field, accepted)| field.matches(photo, accepted))
    }
}

impl From<BTreeMap<String, serde_json::Value>> for FilterSpec {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut spec = FilterSpec::new();
        for (key, value) in raw {
            let Some(field) = FilterField::parse(&key) else {
                debug!("Ignoring unknown filter field {:?}", key);
                continue;
            };
            spec.set(field, json_values(value));
        }
        spec
    }
}

impl From<FilterSpec> for BTreeMap<FilterField, Vec<String>> {
    fn from(spec: FilterSpec) -> Self {
        spec.criteria
    }
}

fn json_values(value: serde_json::Value) -> Vec<String> {
    use serde_json::Value;
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items.into_iter().flat_map(json_values).collect(),
        Value::Object(_) => Vec::new(),
    }
}

/// Photos passing every constraint of `spec`, in their original order.
pub fn filter(photos: &[PhotoRecord], spec: &FilterSpec) -> Vec<PhotoRecord> {
    if spec.is_empty() {
        return photos.to_vec();
    }
    photos
        .iter()
        .filter(|photo| spec.matches(photo))
        .cloned()
        .collect()
}
