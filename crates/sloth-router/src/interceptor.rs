//! Well-known interceptor files and the per-directory index.
//!
//! A directory may carry a `_layout` and/or a `_middleware` file.
//! Neither is routable on its own; they attach to every route at or
//! below their directory. The index is keyed by the containing
//! directory, with `"."` standing for the routes root.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::path;

pub const LAYOUT_FILE_STEM: &str = "_layout";
pub const MIDDLEWARE_FILE_STEM: &str = "_middleware";

/// Whether a route file is one of the well-known interceptor files,
/// regardless of extension.
pub fn is_well_known(file_path: &str) -> bool {
    let stem = path::file_stem(file_path);
    stem == LAYOUT_FILE_STEM || stem == MIDDLEWARE_FILE_STEM
}

/// Stable identity hash for a route-relative path.
///
/// Truncated hex SHA-256. Used to key hydration data entries and to
/// name client bundles, so it must be deterministic across builds.
pub fn stable_hash(input: &str) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// A resolved module reference: the route-relative source path plus
/// its identity hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub hash: String,
    pub path: String,
}

impl ModuleRef {
    pub fn new(route_relative_path: &str) -> Self {
        let normalized = route_relative_path
            .trim_start_matches("./")
            .trim_start_matches('/')
            .to_string();
        Self {
            hash: stable_hash(&normalized),
            path: normalized,
        }
    }
}

/// The interceptors attached to one directory. Never stored empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interceptor {
    pub middleware: Option<ModuleRef>,
    pub layout: Option<ModuleRef>,
}

impl Interceptor {
    pub fn is_empty(&self) -> bool {
        self.middleware.is_none() && self.layout.is_none()
    }
}

/// Index of interceptor files keyed by containing directory.
#[derive(Debug, Default)]
pub struct InterceptorIndex {
    by_dir: HashMap<String, Interceptor>,
}

impl InterceptorIndex {
    /// Scan route-relative file paths and index the well-known ones.
    /// Everything else is ignored.
    pub fn build<I, S>(route_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_dir: HashMap<String, Interceptor> = HashMap::new();

        for file in route_files {
            let file = file.as_ref();
            let stem = path::file_stem(file);
            if stem != LAYOUT_FILE_STEM && stem != MIDDLEWARE_FILE_STEM {
                continue;
            }
            let dir = path::parent_dir(file);
            let entry = by_dir.entry(dir).or_default();
            let module = ModuleRef::new(file);
            if stem == LAYOUT_FILE_STEM {
                entry.layout = Some(module);
            } else {
                entry.middleware = Some(module);
            }
        }

        Self { by_dir }
    }

    pub fn get(&self, dir: &str) -> Option<&Interceptor> {
        self.by_dir.get(path::normalize_dir(dir).as_str())
    }

    /// The interceptor chain for a route directory, root first.
    ///
    /// Walks from the routes root down to the route's own directory,
    /// collecting each directory that carries interceptors.
    pub fn find_chain(&self, route_dir: &str) -> Vec<&Interceptor> {
        path::ancestor_dirs(route_dir)
            .iter()
            .filter_map(|dir| self.by_dir.get(dir))
            .collect()
    }
}
