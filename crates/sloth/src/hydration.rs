//! The hydration contract.
//!
//! The server inlines one marker script per page carrying everything
//! the client bundle needs to re-render: shared request props plus a
//! map of loader data keyed by module hash. The client looks the
//! script up by its MIME type and `data-role` attribute, parses the
//! JSON, and hydrates.

use maud::{html, Markup, PreEscaped};
use serde::Serialize;
use serde_json::{json, Map, Value};

use sloth_router::RouteParams;

/// MIME type of the inline hydration payload script.
pub const HYDRATION_SCRIPT_TYPE: &str = "application/vnd.sloth+json";

/// `data-role` value distinguishing the payload from other inline
/// scripts of the same type.
pub const HYDRATION_DATA_ROLE: &str = "main";

/// Loader data keyed by module hash, in chain order.
pub type HydrationDataMap = Map<String, Value>;

/// Request-level props shared with the client verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedProps {
    pub url: String,
    pub params: RouteParams,
    pub page_config: SharedPageConfig,
}

/// The slice of page config the client needs to see.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedPageConfig {
    pub ssr_only: bool,
}

/// The full payload: a two-element array of shared props and the
/// data map.
pub fn hydration_payload(shared: &SharedProps, data: &HydrationDataMap) -> Value {
    json!([shared, data])
}

/// The inline marker script element.
pub fn hydration_script(payload: &Value, nonce: Option<&str>) -> Markup {
    // "</" never appears outside string values in serialized JSON, so
    // escaping it keeps the payload from terminating the script tag.
    let text = payload.to_string().replace("</", "<\\/");
    html! {
        script type=(HYDRATION_SCRIPT_TYPE) data-role=(HYDRATION_DATA_ROLE) nonce=[nonce] {
            (PreEscaped(text))
        }
    }
}

/// The client bundle URL for a route hash.
pub fn bundle_url(route_hash: &str) -> String {
    format!("/static/{route_hash}.js")
}

/// Preload link plus module script for the route's client bundle.
pub fn bundle_markup(route_hash: &str, nonce: Option<&str>) -> Markup {
    let url = bundle_url(route_hash);
    html! {
        link rel="modulepreload" href=(url) nonce=[nonce];
        script type="module" src=(url) nonce=[nonce] {}
    }
}
