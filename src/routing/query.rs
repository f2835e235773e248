//! Query string parameters.
//!
//! Captures from `:name` segments land here next to the parameters the client
//! sent. Order is preserved and keys may repeat.

use url::form_urlencoded;

/// Ordered multimap of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw (`a=1&b=2`) query string. `None` or an empty string yield
    /// an empty set.
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// Append a value; existing values for the key are kept.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Serialize as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        encode_pairs(self.iter())
    }
}

impl Extend<(String, String)> for QueryParams {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.pairs.extend(iter);
    }
}

pub(crate) fn encode_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Append `extra` pairs to a raw query string.
///
/// The existing query is kept byte-for-byte; the new pairs follow after `&`,
/// or become the whole query when there was none.
pub fn append_to_raw(raw: Option<&str>, extra: &[(String, String)]) -> Option<String> {
    if extra.is_empty() {
        return raw.map(str::to_string);
    }

    let encoded = encode_pairs(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    match raw {
        Some(q) if !q.is_empty() => Some(format!("{}&{}", q, encoded)),
        _ => Some(encoded),
    }
}
