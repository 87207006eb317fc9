//! File-system routing primitives.
//!
//! This crate is the pure core of the framework: it compiles
//! route-relative file paths into URL patterns, matches request paths
//! against them, and indexes the well-known `_layout` / `_middleware`
//! files into per-directory interceptor chains. It knows nothing
//! about HTTP or rendering.

pub mod interceptor;
pub mod matcher;
pub mod path;
pub mod pattern;

pub use interceptor::{
    is_well_known, stable_hash, Interceptor, InterceptorIndex, ModuleRef, LAYOUT_FILE_STEM,
    MIDDLEWARE_FILE_STEM,
};
pub use matcher::RouteParams;
pub use pattern::{compile_route_pattern, PatternError, RoutePattern, Segment, SegmentPart};
