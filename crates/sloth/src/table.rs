//! Route table construction and matching.
//!
//! Built once at startup from the registered modules. Each entry
//! carries its compiled pattern, its fully resolved interceptor
//! chain, and the page handle, so a request only ever walks this
//! table.

use axum::http::Method;
use thiserror::Error;

use sloth_router::{
    compile_route_pattern, is_well_known, path, stable_hash, InterceptorIndex, ModuleRef,
    PatternError, RouteParams, RoutePattern,
};

use crate::module::{LayoutModule, MiddlewareModule, PageModule};
use crate::registry::ModuleMap;

/// Startup-fatal table construction failures, tagged with the file
/// that caused them.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid route pattern in \"{path}\": {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: PatternError,
    },
    #[error("interceptor file \"{path}\" has no registered module")]
    UnresolvedInterceptor { path: String },
}

/// A layout resolved to its handle, keyed by the hash its loader data
/// is stored under.
#[derive(Clone)]
pub struct ResolvedLayout {
    pub hash: String,
    pub path: String,
    pub module: LayoutModule,
}

#[derive(Clone)]
pub struct ResolvedMiddleware {
    pub path: String,
    pub module: MiddlewareModule,
}

/// One directory's interceptors, resolved. Chain order is root first.
#[derive(Clone, Default)]
pub struct ChainLink {
    pub middleware: Option<ResolvedMiddleware>,
    pub layout: Option<ResolvedLayout>,
}

/// One routable page.
#[derive(Clone)]
pub struct RouteEntry {
    pub pattern: RoutePattern,
    pub methods: Vec<Method>,
    pub chain: Vec<ChainLink>,
    pub page: PageModule,
    /// Stable identity hash; keys the page's hydration data and names
    /// its client bundle.
    pub hash: String,
    pub source_path: String,
}

impl RouteEntry {
    fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl RouteTable {
    /// Compile every registered page and resolve its chain.
    ///
    /// Well-known files never become routes. Entries are ordered
    /// deepest pattern first; the sort is stable, so registration
    /// order decides between patterns of equal depth.
    pub fn build(modules: &ModuleMap) -> Result<Self, BuildError> {
        let index = InterceptorIndex::build(modules.file_paths());

        let mut entries = Vec::new();
        for (source_path, page) in modules.pages() {
            if is_well_known(source_path) {
                continue;
            }

            let pattern =
                compile_route_pattern(source_path).map_err(|source| BuildError::InvalidPattern {
                    path: source_path.clone(),
                    source,
                })?;

            let dir = path::parent_dir(source_path);
            let chain = index
                .find_chain(&dir)
                .into_iter()
                .map(|interceptor| {
                    Ok(ChainLink {
                        middleware: interceptor
                            .middleware
                            .as_ref()
                            .map(|m| resolve_middleware(modules, m))
                            .transpose()?,
                        layout: interceptor
                            .layout
                            .as_ref()
                            .map(|m| resolve_layout(modules, m))
                            .transpose()?,
                    })
                })
                .collect::<Result<Vec<_>, BuildError>>()?;

            entries.push(RouteEntry {
                pattern,
                methods: page.config.allowed_methods.clone(),
                chain,
                page: page.clone(),
                hash: stable_hash(source_path),
                source_path: source_path.clone(),
            });
        }

        entries.sort_by(|a, b| b.pattern.deep.cmp(&a.pattern.deep));

        Ok(Self { entries })
    }

    /// First entry whose pattern matches and whose method list allows
    /// the request. HEAD is probed as GET.
    pub fn match_route(&self, url_path: &str, method: &Method) -> Option<(&RouteEntry, RouteParams)> {
        let probe = if *method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };

        self.entries.iter().find_map(|entry| {
            if !entry.allows(&probe) {
                return None;
            }
            entry.pattern.matches(url_path).map(|params| (entry, params))
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

fn resolve_layout(modules: &ModuleMap, module_ref: &ModuleRef) -> Result<ResolvedLayout, BuildError> {
    let module = modules
        .layout(&module_ref.path)
        .ok_or_else(|| BuildError::UnresolvedInterceptor {
            path: module_ref.path.clone(),
        })?;
    Ok(ResolvedLayout {
        hash: module_ref.hash.clone(),
        path: module_ref.path.clone(),
        module: module.clone(),
    })
}

fn resolve_middleware(
    modules: &ModuleMap,
    module_ref: &ModuleRef,
) -> Result<ResolvedMiddleware, BuildError> {
    let module = modules
        .middleware(&module_ref.path)
        .ok_or_else(|| BuildError::UnresolvedInterceptor {
            path: module_ref.path.clone(),
        })?;
    Ok(ResolvedMiddleware {
        path: module_ref.path.clone(),
        module: module.clone(),
    })
}
