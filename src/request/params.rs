use serde::Serialize;
use std::fmt;

/// Ordered multi-map of query parameters.
///
/// Keys may repeat; insertion order is preserved when the query string is
/// rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Appends a value, keeping any existing values for the key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Replaces every value for `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove(&key);
        self.pairs.push((key, value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct keys in first-seen order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (key, _) in &self.pairs {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }

    /// Overlays `other`: every key present in `other` replaces all of this
    /// map's values for that key.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged: Vec<(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| !other.contains_key(k))
            .cloned()
            .collect();
        merged.extend(other.pairs.iter().cloned());
        Self { pairs: merged }
    }

    /// Parses a raw (percent-encoded) query string.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    /// Renders the percent-encoded query string, without a leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), |s| s.into_owned())
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_replaces_keys_present_in_override() {
        let base: QueryParams = [("tag", "a"), ("tag", "b"), ("page", "1")]
            .into_iter()
            .collect();
        let over: QueryParams = [("tag", "c")].into_iter().collect();

        let merged = base.merge(&over);
        assert_eq!(merged.get_all("tag"), vec!["c"]);
        assert_eq!(merged.get("page"), Some("1"));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let base: QueryParams = [("q", "rust"), ("q", "http")].into_iter().collect();
        assert_eq!(base.merge(&QueryParams::new()), base);
    }

    #[test]
    fn test_query_string_round_trips_encoding() {
        let mut params = QueryParams::new();
        params.append("q", "a b&c");
        params.append("lang", "en");
        let rendered = params.to_query_string();
        assert_eq!(rendered, "q=a%20b%26c&lang=en");
        assert_eq!(QueryParams::parse(&rendered), params);
    }

    #[test]
    fn test_keys_are_distinct_in_order() {
        let params: QueryParams = [("b", "1"), ("a", "2"), ("b", "3")].into_iter().collect();
        assert_eq!(params.keys(), vec!["b", "a"]);
    }
}
