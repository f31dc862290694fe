//! Request header multimap.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use indexmap::{IndexMap, IndexSet};

use crate::{Error, Result};

/// Header name for the request body media type.
pub const CONTENT_TYPE: &str = "content-type";

/// Ordered header multimap.
///
/// Names are trimmed and lower-cased so `Accept` and `accept ` land on the
/// same entry. Values are kept per name in insertion order without
/// duplicates. Empty names and values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: IndexMap<String, IndexSet<String>>,
}

fn normalize_key(key: &str) -> Option<String> {
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_ascii_lowercase())
}

impl RequestHeaders {
    /// No headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` under `key`.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.add_values(key, [value]);
    }

    /// Add every value under `key`.
    pub fn add_values<I>(&mut self, key: &str, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let Some(key) = normalize_key(key) else {
            return;
        };
        let mut values = values
            .into_iter()
            .map(Into::into)
            .filter(|value: &String| !value.is_empty())
            .peekable();
        if values.peek().is_none() {
            return;
        }
        self.entries.entry(key).or_default().extend(values);
    }

    /// Add `value` under `key` only if `key` has no values yet.
    ///
    /// Returns `true` if the value was added.
    pub fn try_add(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match normalize_key(key) {
            Some(key) if !value.is_empty() && !self.entries.contains_key(&key) => {
                self.entries.entry(key).or_default().insert(value);
                true
            }
            _ => false,
        }
    }

    /// Values stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IndexSet<String>> {
        self.entries.get(&normalize_key(key)?)
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get(key)?.first().map(String::as_str)
    }

    /// Remove `key` and its values.
    pub fn remove(&mut self, key: &str) -> Option<IndexSet<String>> {
        self.entries.shift_remove(&normalize_key(key)?)
    }

    /// Remove one value; `key` goes away with its last value.
    pub fn remove_value(&mut self, key: &str, value: &str) -> bool {
        let Some(key) = normalize_key(key) else {
            return false;
        };
        if value.is_empty() {
            return false;
        }
        let Some(values) = self.entries.get_mut(&key) else {
            return false;
        };
        let removed = values.shift_remove(value);
        if values.is_empty() {
            self.entries.shift_remove(&key);
        }
        removed
    }

    /// Returns `true` if `key` has at least one value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        normalize_key(key).is_some_and(|key| self.entries.contains_key(&key))
    }

    /// Normalized names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merge every entry of `other`.
    pub fn add_all(&mut self, other: &Self) {
        for (key, values) in &other.entries {
            self.add_values(key, values.iter().cloned());
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, values)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.entries.iter().map(|(key, values)| (key.as_str(), values))
    }

    /// Convert to an [`http::HeaderMap`], one entry per value.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (key, values) in &self.entries {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|err| Error::InvalidHeader(format!("{key}: {err}")))?;
            for value in values {
                let value = HeaderValue::from_str(value)
                    .map_err(|err| Error::InvalidHeader(format!("{key}: {err}")))?;
                map.append(name.clone(), value);
            }
        }
        Ok(map)
    }
}

impl<'a> IntoIterator for &'a RequestHeaders {
    type Item = (&'a String, &'a IndexSet<String>);
    type IntoIter = indexmap::map::Iter<'a, String, IndexSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn ignores_empty_keys_and_values() {
        let mut headers = RequestHeaders::new();
        headers.add("", "");
        check!(!headers.contains_key(""));
        headers.add("key", "");
        check!(!headers.contains_key("key"));
        check!(headers.remove("").is_none());
        check!(!headers.remove_value("", ""));
        check!(!headers.remove_value("key", ""));
        headers.add_all(&RequestHeaders::new());
        check!(headers.is_empty());
    }

    #[test]
    fn adds_and_gets() {
        let mut headers = RequestHeaders::new();
        headers.add("Key", "value");
        check!(headers.contains_key("key"));
        check!(headers.contains_key(" KEY "));
        check!(headers.get_first("key") == Some("value"));
    }

    #[test]
    fn deduplicates_values() {
        let mut headers = RequestHeaders::new();
        headers.add_values("Accept", ["application/json", "text/plain"]);
        headers.add("accept", "application/json");
        let_assert!(Some(values) = headers.get("accept"));
        check!(values.iter().collect::<Vec<_>>() == ["application/json", "text/plain"]);
    }

    #[test]
    fn removes() {
        let mut headers = RequestHeaders::new();
        headers.add("key", "value");
        check!(headers.remove("key").is_some());
        check!(!headers.contains_key("key"));
    }

    #[test]
    fn removes_values() {
        let mut headers = RequestHeaders::new();
        headers.add_values("key", ["value", "value2"]);
        check!(headers.remove_value("key", "value"));
        check!(headers.get_first("key") == Some("value2"));
        check!(headers.remove_value("key", "value2"));
        check!(!headers.contains_key("key"));
    }

    #[test]
    fn try_add_keeps_existing() {
        let mut headers = RequestHeaders::new();
        check!(headers.try_add("Content-Type", "application/json"));
        check!(!headers.try_add("content-type", "text/plain"));
        check!(headers.get_first(CONTENT_TYPE) == Some("application/json"));
    }

    #[test]
    fn clears_and_merges() {
        let mut headers = RequestHeaders::new();
        let mut other = RequestHeaders::new();
        other.add("key", "value");
        headers.add_all(&other);
        check!(headers.get_first("key") == Some("value"));
        check!(headers.keys().collect::<Vec<_>>() == ["key"]);
        headers.clear();
        check!(!headers.contains_key("key"));
    }

    #[test]
    fn converts_to_header_map() {
        let mut headers = RequestHeaders::new();
        headers.add_values("X-Multi", ["a", "b"]);
        headers.add("Accept", "application/json");
        let_assert!(Ok(map) = headers.to_header_map());
        check!(map.get_all("x-multi").iter().count() == 2);
        check!(map["accept"] == "application/json");

        headers.add("bad header", "value");
        let_assert!(Err(Error::InvalidHeader(_)) = headers.to_header_map());
    }
}
