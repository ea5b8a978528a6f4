//! Frequency counter: a mapping from value to occurrence count.
//!
//! Every aggregation invariant rests on [`FrequencyCounter::merge`] being a
//! pointwise sum over the union of keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyCounter {
    counts: BTreeMap<String, u64>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: impl Into<String>) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(key.into()).or_insert(0) += count;
    }

    /// Count only when the value is present.
    pub fn record(&mut self, key: Option<String>) {
        if let Some(key) = key {
            self.increment(key);
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Pointwise sum; keys are the union of both sides.
    pub fn merge(&mut self, other: &FrequencyCounter) {
        for (key, count) in &other.counts {
            *self.counts.entry(key.clone()).or_insert(0) += count;
        }
    }

    pub fn merged(a: &FrequencyCounter, b: &FrequencyCounter) -> FrequencyCounter {
        let mut out = a.clone();
        out.merge(b);
        out
    }

    /// Entries by descending count, ties broken by key.
    pub fn most_common(&self, limit: Option<usize>) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> =
            self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Entries ordered by the numeric value of the key where it parses,
    /// with non-numeric keys after them in lexical order.
    pub fn sorted_numerically(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> =
            self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| match (numeric_key(&a.0), numeric_key(&b.0)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });
        entries
    }
}

fn numeric_key(key: &str) -> Option<f64> {
    crate::models::photo::parse_shutter_speed(key)
}

impl<K: Into<String>> FromIterator<K> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        for key in iter {
            counter.increment(key);
        }
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_pointwise_sum() {
        let a: FrequencyCounter = ["1.4", "1.4", "2.8"].into_iter().collect();
        let b: FrequencyCounter = ["2.8", "4.0"].into_iter().collect();

        let c = FrequencyCounter::merged(&a, &b);
        assert_eq!(c.get("1.4"), 2);
        assert_eq!(c.get("2.8"), 2);
        assert_eq!(c.get("4.0"), 1);
        assert_eq!(c.len(), 3);
        assert_eq!(c.total(), a.total() + b.total());
    }

    #[test]
    fn test_merge_commutes() {
        let a: FrequencyCounter = ["x", "y", "y"].into_iter().collect();
        let b: FrequencyCounter = ["y", "z"].into_iter().collect();
        assert_eq!(FrequencyCounter::merged(&a, &b), FrequencyCounter::merged(&b, &a));
    }

    #[test]
    fn test_merge_with_empty() {
        let a: FrequencyCounter = ["x"].into_iter().collect();
        let empty = FrequencyCounter::new();
        assert_eq!(FrequencyCounter::merged(&a, &empty), a);
        assert_eq!(FrequencyCounter::merged(&empty, &a), a);
    }

    #[test]
    fn test_record_skips_absent() {
        let mut counter = FrequencyCounter::new();
        counter.record(None);
        counter.record(Some("100".to_string()));
        assert_eq!(counter.total(), 1);
        assert_eq!(counter.get("missing"), 0);
    }

    #[test]
    fn test_most_common_and_numeric_order() {
        let counter: FrequencyCounter = ["1/125", "1/250", "1/250", "2", "bulb"]
            .into_iter()
            .collect();

        let top = counter.most_common(Some(1));
        assert_eq!(top, vec![("1/250".to_string(), 2)]);

        let keys: Vec<String> = counter
            .sorted_numerically()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["1/250", "1/125", "2", "bulb"]);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let counter: FrequencyCounter = ["a", "a", "b"].into_iter().collect();
        let json = serde_json::to_value(&counter).unwrap();
        assert_eq!(json, serde_json::json!({"a": 2, "b": 1}));
    }
}
