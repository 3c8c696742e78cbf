//! HTTP request and response types exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `JPushClient` builds `HttpRequest`
//! values, a `Transport` executes them, and the decoder consumes the
//! resulting `HttpResponse`. Keeping the wire exchange as values makes every
//! operation testable without a network.
//!
//! Header merging happens here rather than in each transport: the request
//! constructors start from a small set of defaults and lay the caller's
//! headers on top, reading (never mutating) the caller's `Headers`.

use std::fmt;

use serde::Serialize;

use crate::error::ApiError;

const ACCEPT_JSON: (&str, &str) = ("Accept", "application/json");
const CONTENT_TYPE_JSON: (&str, &str) = ("Content-Type", "application/json");

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// An ordered header mapping with case-insensitive names.
///
/// Inserting a name that is already present replaces its value in place, so
/// iteration order is the order in which names were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lay these headers over `defaults`, returning the merged list.
    fn merged_onto(&self, defaults: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut merged: Headers = defaults.iter().copied().collect();
        for (name, value) in self.iter() {
            merged.insert(name, value);
        }
        merged.entries
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A GET request with query parameters and no body.
    pub fn get(url: &str, query: &[(&str, String)], headers: &Headers) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            headers: headers.merged_onto(&[ACCEPT_JSON]),
            body: None,
        }
    }

    /// A POST request carrying `body` serialized as JSON.
    pub fn post_json<B: Serialize + ?Sized>(
        url: &str,
        body: &B,
        headers: &Headers,
    ) -> Result<Self, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self {
            method: HttpMethod::Post,
            url: url.to_string(),
            query: Vec::new(),
            headers: headers.merged_onto(&[ACCEPT_JSON, CONTENT_TYPE_JSON]),
            body: Some(body),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Quota information reported by the service, when all three headers
    /// are present and numeric.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        let read = |name: &str| -> Option<u32> { self.header(name)?.trim().parse().ok() };
        Some(RateLimit {
            limit: read("X-Rate-Limit-Limit")?,
            remaining: read("X-Rate-Limit-Remaining")?,
            reset: read("X-Rate-Limit-Reset")?,
        })
    }
}

/// Per-app request quota returned alongside push responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed in the current window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Seconds until the window resets.
    pub reset: u32,
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
