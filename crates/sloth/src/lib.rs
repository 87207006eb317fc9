//! 🦥 Sloth: a file-system-driven SSR web framework.
//!
//! Route files map to URL patterns (`blog/[slug].rs` serves
//! `/blog/:slug`); `_layout` and `_middleware` files attach to every
//! route below their directory. A request runs its interceptor chain
//! root to leaf, collects loader data into a hydration payload, wraps
//! the page in its layouts, and renders the document shell around the
//! result.
//!
//! ```no_run
//! use maud::html;
//! use sloth::{App, PageModule, RuntimeMode};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let app = App::builder(RuntimeMode::Development)
//!     .page("index.rs", PageModule::new(|_| html! { h1 { "hello" } }))
//!     .build()?;
//! app.serve().await
//! # }
//! ```

pub mod collections;
pub mod config;
pub mod context;
pub mod hydration;
pub mod metadata;
pub mod module;
pub mod registry;
pub mod renderer;
pub mod response;
pub mod server;
pub mod table;

pub use collections::{Collection, CollectionEntry, CollectionError, CollectionsMap, TocEntry};
pub use config::Config;
pub use context::{
    LoaderOutcome, MiddlewareOutcome, RequestInfo, RequestScope, RuntimeMode,
};
pub use hydration::{
    HydrationDataMap, SharedPageConfig, SharedProps, HYDRATION_DATA_ROLE, HYDRATION_SCRIPT_TYPE,
};
pub use metadata::Metadata;
pub use module::{
    loader, middleware, LayoutModule, LayoutProps, MetadataArgs, MetadataSource, MiddlewareModule,
    PageConfig, PageModule, PageProps, RootModule, RootProps,
};
pub use registry::ModuleMap;
pub use server::{App, AppBuilder};
pub use table::{BuildError, RouteEntry, RouteTable};

pub use sloth_router::{RouteParams, RoutePattern};
