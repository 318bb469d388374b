//! Ordered header list with case-insensitive lookup.

use std::collections::HashSet;
use std::fmt;

/// Placeholder written in place of sensitive header values.
pub const REDACTED: &str = "[REDACTED]";

/// Header names that are always treated as sensitive.
const DEFAULT_SENSITIVE: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
];

/// An ordered list of headers.
///
/// Insertion order is kept for wire emission. Names compare case-insensitively and
/// inserting an existing name replaces its value in place; [`HeaderList::append`]
/// keeps repeated names instead.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Insert or replace a header, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Add a header without replacing existing values of the same name.
    ///
    /// Used for received headers, where names such as `Set-Cookie` repeat.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Every value of `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// Apply every header of `other` on top of this list (last write wins).
    pub fn merge(&mut self, other: &HeaderList) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Copy of this list with sensitive values replaced by [`REDACTED`].
    pub fn redacted(&self, sensitive: &SensitiveHeaders) -> HeaderList {
        HeaderList {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| {
                    if sensitive.contains(k) {
                        (k.clone(), REDACTED.to_string())
                    } else {
                        (k.clone(), v.clone())
                    }
                })
                .collect(),
        }
    }
}

impl fmt::Debug for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Display for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = HeaderList::new();
        list.extend(iter);
        list
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for HeaderList {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Set of header names whose values must never reach the logs.
#[derive(Debug, Clone)]
pub struct SensitiveHeaders {
    names: HashSet<String>,
}

impl SensitiveHeaders {
    /// The default set: credentials and cookies.
    pub fn new() -> Self {
        Self {
            names: DEFAULT_SENSITIVE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// An empty set, nothing is redacted.
    pub fn none() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_ascii_lowercase());
    }

    pub fn with(mut self, name: &str) -> Self {
        self.insert(name);
        self
    }

    pub fn extend<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.insert(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }
}

impl Default for SensitiveHeaders {
    fn default() -> Self {
        Self::new()
    }
}
