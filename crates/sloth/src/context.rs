//! Per-request context and chain outcomes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use axum::response::Response;
use serde_json::Value;

use sloth_router::RouteParams;

use crate::collections::CollectionsMap;

/// Whether the app is serving a development or production build.
/// Threaded through explicitly; there is no process-wide flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Production,
}

impl RuntimeMode {
    pub fn is_dev(self) -> bool {
        matches!(self, RuntimeMode::Development)
    }
}

/// The request as seen by middleware and loaders.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub raw_query: Option<String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl RequestInfo {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query_string: Option<&str>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            raw_query: query_string.map(str::to_string),
            query: parse_query(query_string.unwrap_or_default()),
            headers,
        }
    }

    /// Path plus query string, as the client should see it.
    pub fn url(&self) -> String {
        match &self.raw_query {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        }
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }
}

fn parse_query(query_string: &str) -> HashMap<String, String> {
    query_string
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Everything a middleware or loader gets to look at.
///
/// `state` is an arbitrary JSON object that middleware threads down
/// the chain; loaders see the state accumulated so far.
#[derive(Clone)]
pub struct RequestScope {
    pub req: Arc<RequestInfo>,
    pub params: Arc<RouteParams>,
    pub state: Value,
    pub collections: Arc<CollectionsMap>,
    pub mode: RuntimeMode,
}

/// What a middleware decided. Exactly one of these per invocation;
/// producing a response and continuing are mutually exclusive by
/// construction.
pub enum MiddlewareOutcome {
    /// Keep going with (possibly updated) state.
    Next(Value),
    /// Short-circuit the chain with a finished response.
    Respond(Response),
    /// Short-circuit with the standard 404.
    NotFound,
}

/// What a loader decided.
pub enum LoaderOutcome {
    /// Provide data for the component and keep going.
    Render(Value),
    /// Short-circuit the chain with a finished response.
    Respond(Response),
    /// Short-circuit with the standard 404.
    NotFound,
    /// Provide no data. Fine for a layout loader (its data entry
    /// simply stays absent); an error for the page loader, which is
    /// the end of the chain and must resolve the request.
    Continue,
}
