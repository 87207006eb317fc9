//! Page metadata.
//!
//! Only `title` and `description` are honored. Anything else in a
//! metadata object is logged once and dropped rather than rendered,
//! so typos never leak into the document head.

use maud::{html, Markup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Metadata {
    /// Interpret a loader- or module-provided metadata value.
    pub fn from_value(value: &Value) -> Self {
        let mut metadata = Metadata::default();

        let Some(object) = value.as_object() else {
            if !value.is_null() {
                warn!("metadata must be an object, got {value}");
            }
            return metadata;
        };

        for (key, entry) in object {
            match (key.as_str(), entry.as_str()) {
                ("title", Some(text)) => metadata.title = Some(text.to_string()),
                ("description", Some(text)) => metadata.description = Some(text.to_string()),
                ("title" | "description", None) => {
                    warn!("metadata key {key} must be a string, got {entry}");
                }
                _ => warn!("unsupported metadata key {key}, dropping it"),
            }
        }

        metadata
    }

    /// The `<head>` fragment for this metadata.
    pub fn head_markup(&self) -> Markup {
        html! {
            @if let Some(title) = &self.title {
                title { (title) }
            }
            @if let Some(description) = &self.description {
                meta name="description" content=(description);
            }
        }
    }
}
