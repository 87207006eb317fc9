//! Module registration.
//!
//! Pages keep their registration order: the route table's sort is
//! stable, so discovery order is the tiebreak between patterns of
//! equal depth. Layouts and middleware are keyed by their
//! route-relative file path, which is how interceptor chain entries
//! resolve back to handles.

use std::collections::HashMap;

use crate::module::{LayoutModule, MiddlewareModule, PageModule};

fn normalize(path: &str) -> String {
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

#[derive(Default)]
pub struct ModuleMap {
    pages: Vec<(String, PageModule)>,
    layouts: HashMap<String, LayoutModule>,
    middlewares: HashMap<String, MiddlewareModule>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, route_path: &str, module: PageModule) {
        self.pages.push((normalize(route_path), module));
    }

    pub fn add_layout(&mut self, route_path: &str, module: LayoutModule) {
        self.layouts.insert(normalize(route_path), module);
    }

    pub fn add_middleware(&mut self, route_path: &str, module: MiddlewareModule) {
        self.middlewares.insert(normalize(route_path), module);
    }

    pub fn pages(&self) -> &[(String, PageModule)] {
        &self.pages
    }

    pub fn layout(&self, route_path: &str) -> Option<&LayoutModule> {
        self.layouts.get(route_path)
    }

    pub fn middleware(&self, route_path: &str) -> Option<&MiddlewareModule> {
        self.middlewares.get(route_path)
    }

    /// Every registered file path; the interceptor index scans these.
    pub fn file_paths(&self) -> Vec<String> {
        self.pages
            .iter()
            .map(|(path, _)| path.clone())
            .chain(self.layouts.keys().cloned())
            .chain(self.middlewares.keys().cloned())
            .collect()
    }
}
