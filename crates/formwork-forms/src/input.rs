//! Raw form input.
//!
//! A submission maps field names to either one raw string or an ordered
//! list of raw strings (repeated keys, multi-selects). [`FormData`] keeps
//! that distinction because it changes how array fields are parsed: a single
//! string is split on the separator, a list is taken element by element.

use std::collections::HashMap;

use formwork_core::utils::MultiValueDict;

/// The raw value submitted for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// One string, as submitted.
    Single(String),
    /// Several strings, in submission order.
    Multi(Vec<String>),
}

impl RawValue {
    /// Returns `true` if nothing usable was submitted.
    ///
    /// An empty string and an empty list both count as "not supplied".
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Single(s) => s.is_empty(),
            Self::Multi(list) => list.is_empty(),
        }
    }

    /// The value a scalar field reads: the string itself, or the last list element.
    pub fn last(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multi(list) => list.last().map(String::as_str),
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<Vec<String>> for RawValue {
    fn from(list: Vec<String>) -> Self {
        Self::Multi(list)
    }
}

/// A submission: field name to raw value, in insertion order.
///
/// # Examples
///
/// ```
/// use formwork_forms::input::{FormData, RawValue};
///
/// let data = FormData::parse("name=Ann+Lee&tag=a&tag=b");
/// assert_eq!(data.get("name"), Some(&RawValue::Single("Ann Lee".into())));
/// assert_eq!(
///     data.get("tag"),
///     Some(&RawValue::Multi(vec!["a".into(), "b".into()]))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    order: Vec<String>,
    values: HashMap<String, RawValue>,
}

impl FormData {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body or query string.
    ///
    /// `+` decodes to a space and percent sequences are decoded lossily.
    /// Keys that appear more than once become [`RawValue::Multi`].
    pub fn parse(query_string: &str) -> Self {
        let mut dict = MultiValueDict::new();
        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .unwrap_or((pair, ""));
            dict.append(percent_decode(key), percent_decode(value));
        }
        Self::from(&dict)
    }

    /// Sets a single raw string, replacing anything stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key.into(), RawValue::Single(value.into()));
    }

    /// Sets a list of raw strings, replacing anything stored under `key`.
    pub fn insert_list<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = values.into_iter().map(Into::into).collect();
        self.put(key.into(), RawValue::Multi(list));
    }

    fn put(&mut self, key: String, value: RawValue) {
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.insert(key, value);
    }

    /// Returns the raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    /// Returns `true` if `key` was submitted (even if empty).
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates `(key, raw value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.order
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

impl From<HashMap<String, String>> for FormData {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HashMap<String, Vec<String>>> for FormData {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        let mut data = Self::new();
        for (k, v) in map {
            data.insert_list(k, v);
        }
        data
    }
}

impl From<&MultiValueDict<String, String>> for FormData {
    fn from(dict: &MultiValueDict<String, String>) -> Self {
        let mut data = Self::new();
        for (key, values) in dict.iter() {
            match values.as_slice() {
                [single] => data.insert(key.clone(), single.clone()),
                many => data.insert_list(key.clone(), many.iter().cloned()),
            }
        }
        data
    }
}

fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
