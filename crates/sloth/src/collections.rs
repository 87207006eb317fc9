//! Content collections.
//!
//! A collection is a named, ordered set of pre-rendered entries
//! (typically compiled content files) that loaders read at request
//! time. Collections are registered on the app and handed to loaders
//! through the request scope; nothing here is process-global.

use std::collections::HashMap;

use maud::Markup;
use serde_json::Value;
use thiserror::Error;

/// Lookup failures. The top-level request handler maps these to 404
/// instead of 500: a missing collection entry is a client-addressable
/// absence, not a server fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Collection with name \"{0}\" not found")]
    CollectionNotFound(String),
    #[error("Entry \"{slug}\" not found in collection \"{collection}\"")]
    EntryNotFound { collection: String, slug: String },
}

/// One heading of an entry's table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub content: String,
    pub deep: usize,
    pub hash: String,
}

/// One entry of a collection.
#[derive(Clone)]
pub struct CollectionEntry {
    pub slug: String,
    pub metadata: Value,
    pub content: Markup,
    pub toc: Vec<TocEntry>,
}

impl CollectionEntry {
    pub fn new(slug: impl Into<String>, metadata: Value, content: Markup) -> Self {
        Self {
            slug: slug.into(),
            metadata,
            content,
            toc: Vec::new(),
        }
    }

    pub fn with_toc(mut self, toc: Vec<TocEntry>) -> Self {
        self.toc = toc;
        self
    }
}

/// A named set of entries, iteration in insertion order.
pub struct Collection {
    name: String,
    entries: Vec<CollectionEntry>,
    by_slug: HashMap<String, usize>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            by_slug: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(mut self, entry: CollectionEntry) -> Self {
        self.by_slug.insert(entry.slug.clone(), self.entries.len());
        self.entries.push(entry);
        self
    }

    pub fn has(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn get(&self, slug: &str) -> Result<&CollectionEntry, CollectionError> {
        self.by_slug
            .get(slug)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| CollectionError::EntryNotFound {
                collection: self.name.clone(),
                slug: slug.to_string(),
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.slug.as_str())
    }

    pub fn all(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries.iter()
    }

    /// Render every entry through an item renderer, in order. The
    /// listing-page counterpart of [`Collection::all`].
    pub fn render_all<F>(&self, mut item: F) -> Markup
    where
        F: FnMut(&CollectionEntry) -> Markup,
    {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&item(entry).into_string());
        }
        maud::PreEscaped(out)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All collections registered on the app.
#[derive(Default)]
pub struct CollectionsMap {
    by_name: HashMap<String, Collection>,
}

impl CollectionsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: Collection) {
        self.by_name.insert(collection.name().to_string(), collection);
    }

    pub fn collection(&self, name: &str) -> Result<&Collection, CollectionError> {
        self.by_name
            .get(name)
            .ok_or_else(|| CollectionError::CollectionNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
