//! Typed route module handles.
//!
//! Every route file the app registers becomes one of these structs.
//! The route table holds them directly, so dispatch is a lookup into
//! prebuilt handles rather than any form of dynamic loading.

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use futures::future::BoxFuture;
use maud::Markup;
use serde_json::Value;

use sloth_router::RouteParams;

use crate::context::{LoaderOutcome, MiddlewareOutcome, RequestInfo, RequestScope};

// ============================================================================
// Function handle types
// ============================================================================

pub type LoaderFn =
    Arc<dyn Fn(RequestScope) -> BoxFuture<'static, anyhow::Result<LoaderOutcome>> + Send + Sync>;

pub type MiddlewareFn = Arc<
    dyn Fn(RequestScope) -> BoxFuture<'static, anyhow::Result<MiddlewareOutcome>> + Send + Sync,
>;

pub type PageRenderFn = Arc<dyn Fn(&PageProps) -> Markup + Send + Sync>;

pub type LayoutRenderFn = Arc<dyn Fn(&LayoutProps) -> Markup + Send + Sync>;

pub type RootRenderFn = Arc<dyn Fn(&RootProps) -> Markup + Send + Sync>;

pub type MetadataFn = Arc<dyn Fn(&MetadataArgs) -> Value + Send + Sync>;

/// Validates captured params before the chain runs. `Err` becomes a
/// 400 response with the given message logged.
pub type ParamsValidator = Arc<dyn Fn(&RouteParams) -> Result<(), String> + Send + Sync>;

/// Box an async closure into a [`LoaderFn`].
pub fn loader<F, Fut>(f: F) -> LoaderFn
where
    F: Fn(RequestScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<LoaderOutcome>> + Send + 'static,
{
    Arc::new(move |scope| Box::pin(f(scope)))
}

/// Box an async closure into a [`MiddlewareFn`].
pub fn middleware<F, Fut>(f: F) -> MiddlewareFn
where
    F: Fn(RequestScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<MiddlewareOutcome>> + Send + 'static,
{
    Arc::new(move |scope| Box::pin(f(scope)))
}

// ============================================================================
// Render props
// ============================================================================

/// Props passed to a page render function.
pub struct PageProps {
    /// Whatever the page loader produced, or `Value::Null`.
    pub data: Value,
    pub params: Arc<RouteParams>,
    pub url: String,
}

/// Props passed to a layout render function.
pub struct LayoutProps {
    /// Whatever this layout's loader produced, or `Value::Null`.
    pub data: Value,
    pub params: Arc<RouteParams>,
    /// The already-rendered inner content to wrap.
    pub children: Markup,
}

/// Props passed to the document shell.
pub struct RootProps {
    /// Must be emitted inside `<head>`; carries metadata and the
    /// hydration scripts.
    pub head: Markup,
    pub content: Markup,
}

/// Inputs available to a metadata generator.
pub struct MetadataArgs {
    pub params: Arc<RouteParams>,
    pub req: Arc<RequestInfo>,
    pub state: Value,
}

// ============================================================================
// Modules
// ============================================================================

/// Where a page's metadata comes from.
#[derive(Clone)]
pub enum MetadataSource {
    Static(Value),
    Generator(MetadataFn),
}

/// Per-page behavior switches.
#[derive(Clone)]
pub struct PageConfig {
    /// Methods this route answers. HEAD always rides on GET.
    pub allowed_methods: Vec<Method>,
    /// Render on the server only: no hydration payload, no client
    /// bundle script.
    pub ssr_only: bool,
    /// Render the page without wrapping it in the chain's layouts
    /// (their loaders are skipped too).
    pub skip_inherited_layouts: bool,
    pub params_schema: Option<ParamsValidator>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec![Method::GET, Method::HEAD],
            ssr_only: false,
            skip_inherited_layouts: false,
            params_schema: None,
        }
    }
}

/// A routable page.
#[derive(Clone)]
pub struct PageModule {
    pub render: PageRenderFn,
    pub loader: Option<LoaderFn>,
    pub metadata: Option<MetadataSource>,
    pub config: PageConfig,
}

impl PageModule {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&PageProps) -> Markup + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            loader: None,
            metadata: None,
            config: PageConfig::default(),
        }
    }

    pub fn with_loader(mut self, loader: LoaderFn) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(MetadataSource::Static(metadata));
        self
    }

    pub fn with_metadata_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&MetadataArgs) -> Value + Send + Sync + 'static,
    {
        self.metadata = Some(MetadataSource::Generator(Arc::new(f)));
        self
    }

    pub fn with_config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }
}

/// A `_layout` module: wraps inner content, optionally loads data.
#[derive(Clone)]
pub struct LayoutModule {
    pub render: LayoutRenderFn,
    pub loader: Option<LoaderFn>,
}

impl LayoutModule {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&LayoutProps) -> Markup + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: LoaderFn) -> Self {
        self.loader = Some(loader);
        self
    }
}

/// A `_middleware` module.
#[derive(Clone)]
pub struct MiddlewareModule {
    pub handler: MiddlewareFn,
}

impl MiddlewareModule {
    pub fn new(handler: MiddlewareFn) -> Self {
        Self { handler }
    }
}

/// The document shell shared by every page.
#[derive(Clone)]
pub struct RootModule {
    pub render: RootRenderFn,
}

impl RootModule {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&RootProps) -> Markup + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }
}
