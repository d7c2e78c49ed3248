use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header names sent with every store request
pub mod header {
    pub const STORE: &str = "Snap-Device-Store";
    pub const SERIES: &str = "Snap-Device-Series";
    pub const CHANNEL: &str = "Snap-Device-Channel";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const ACCEPT: &str = "Accept";

    /// Keys added to a session summary from the cached record's metadata
    pub const CREATED: &str = "Created";
    pub const MODIFIED: &str = "Modified";

    pub const JSON: &str = "application/json";
}

/// Complete outbound request context for the store
///
/// Serializes as a flat JSON object of header name to value. Header sets
/// carrying an `Authorization` value are only built by
/// [`assemble`](crate::headers::assemble).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the set carries a composed authorization value
    pub fn is_authenticated(&self) -> bool {
        self.get(header::AUTHORIZATION).is_some_and(|v| !v.is_empty())
    }

    pub(crate) fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub(crate) fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl std::fmt::Debug for HeaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| {
                if k.eq_ignore_ascii_case(header::AUTHORIZATION) {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            }))
            .finish()
    }
}

/// Display-only view of a cached session, free of secret material
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionSummary(BTreeMap<String, String>);

impl SessionSummary {
    pub(crate) fn from_map(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}
