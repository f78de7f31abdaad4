//! A dictionary that can hold multiple values per key.
//!
//! Submitted form data repeats keys (checkbox groups, multi-selects), so a
//! plain map loses information. [`MultiValueDict`] keeps every value and
//! remembers the order in which keys first appeared.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// A dictionary that maps keys to lists of values, in key insertion order.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all of them.
///
/// # Examples
///
/// ```
/// use formwork_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get("color"), Some(&"blue"));
/// assert_eq!(d.get_list("color"), Some(&vec!["red", "blue"]));
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash, V> {
    order: Vec<K>,
    inner: HashMap<K, Vec<V>>,
}

impl<K: Eq + Hash, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Sets the value for a key, replacing any existing values.
    pub fn set(&mut self, key: K, value: V) {
        if !self.inner.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.inner.insert(key, vec![value]);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        if let Some(values) = self.inner.get_mut(&key) {
            values.push(value);
        } else {
            self.order.push(key.clone());
            self.inner.insert(key, vec![value]);
        }
    }

    /// Removes a key and returns its values.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Vec<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.inner.remove(key)?;
        self.order.retain(|k| <K as Borrow<Q>>::borrow(k) != key);
        Some(removed)
    }
}

impl<K: Eq + Hash, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            inner: HashMap::new(),
        }
    }

    /// Returns the **last** value associated with the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key).and_then(|v| v.last())
    }

    /// Returns all values associated with the key.
    pub fn get_list<Q>(&self, key: &Q) -> Option<&Vec<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    /// Returns the keys in the order they were first inserted.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Returns `(key, values)` pairs in key insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Vec<V>)> {
        self.order
            .iter()
            .filter_map(|k| self.inner.get(k).map(|v| (k, v)))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut d = Self::new();
        for (k, v) in iter {
            d.append(k, v);
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get(&"color"), Some(&"green"));
        assert_eq!(d.get_list(&"color"), Some(&vec!["red", "blue", "green"]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("k", "b");
        d.set("k", "c");
        assert_eq!(d.get_list(&"k"), Some(&vec!["c"]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut d = MultiValueDict::new();
        d.append("z", 1);
        d.append("a", 2);
        d.append("z", 3);
        d.set("m", 4);
        let keys: Vec<_> = d.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_remove() {
        let mut d: MultiValueDict<&str, i32> = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(d.remove(&"a"), Some(vec![1, 3]));
        assert!(!d.contains_key(&"a"));
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(d.remove(&"missing"), None);
    }

    #[test]
    fn test_iter_pairs() {
        let d: MultiValueDict<&str, i32> = [("a", 1), ("a", 2), ("b", 3)].into_iter().collect();
        let items: Vec<_> = d.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(items, vec![("a", vec![1, 2]), ("b", vec![3])]);
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::default();
        assert_eq!(d.get(&"missing"), None);
        assert_eq!(d.get_list(&"missing"), None);
    }
}
