//! Path parameters captured while matching a route.
//!
//! Parameters keep the order in which their placeholders appear in the winning
//! pattern, so `/a/:x/:y` against `/a/1/2` always yields `[(x, 1), (y, 2)]`.

use std::slice;

/// A single captured key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    key: String,
    value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered path parameters of one matched request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: Vec<Param>,
}

impl Params {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer able to hold `capacity` params without reallocating
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: Vec::with_capacity(capacity) }
    }

    #[inline]
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.push(Param::new(key, value));
    }

    /// Gets the value of the first param named `key`
    ///
    /// Duplicate names are kept as captured, the linear scan returns the earliest one.
    pub fn by_name(&self, key: &str) -> Option<&str> {
        self.inner.iter().find(|param| param.key == key).map(Param::value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drops every captured param but keeps the allocation for the next match attempt
    #[inline]
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> slice::Iter<'_, Param> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(key, value)| Param::new(key, value)).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::Params;

    #[test]
    fn test_by_name() {
        let params: Params = [("id", "7"), ("name", "josh")].into_iter().collect();

        assert_eq!(params.len(), 2);
        assert_eq!(params.by_name("id"), Some("7"));
        assert_eq!(params.by_name("name"), Some("josh"));
        assert_eq!(params.by_name("missing"), None);
    }

    #[test]
    fn test_duplicate_names_return_first() {
        let mut params = Params::with_capacity(2);
        params.push("id", "first");
        params.push("id", "second");

        assert_eq!(params.by_name("id"), Some("first"));
        assert_eq!(params.iter().last().map(|p| p.value()), Some("second"));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut params = Params::with_capacity(4);
        params.push("a", "1");
        params.clear();

        assert!(params.is_empty());
        assert!(params.inner.capacity() >= 4);
    }
}
