use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered set of cookie name/value pairs.
///
/// The stored form is the request header form: `n1=v1; n2=v2`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieSet {
    pairs: Vec<(String, String)>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.insert(name, value);
        }
        set
    }

    /// Insert or replace a cookie, keeping the position of an existing name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Keep only the named cookies, in their current order
    pub fn retain_names(&self, names: &[&str]) -> Self {
        Self {
            pairs: self
                .pairs
                .iter()
                .filter(|(n, _)| names.contains(&n.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Value for a `Cookie:` request header
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }

    fn sorted_pairs(&self) -> Vec<&(String, String)> {
        let mut pairs: Vec<_> = self.pairs.iter().collect();
        pairs.sort();
        pairs
    }
}

/// Equality ignores order
impl PartialEq for CookieSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_pairs() == other.sorted_pairs()
    }
}

impl Eq for CookieSet {}

impl fmt::Display for CookieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for CookieSet {
    type Err = std::convert::Infallible;

    /// Split on `"; "`, then on the first `=`. Fragments without `=` are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::new();
        for fragment in s.split("; ") {
            if let Some((name, value)) = fragment.split_once('=') {
                set.insert(name, value);
            }
        }
        Ok(set)
    }
}
