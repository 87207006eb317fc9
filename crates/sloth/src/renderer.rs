//! The request rendering pipeline.
//!
//! One matched route runs as a sequence: middleware and layout
//! loaders root to leaf, then the page loader, then the render pass.
//! Any link may short-circuit with a finished response or a 404;
//! failures funnel through a single chokepoint that logs and maps
//! them to a status.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::response::Response;
use maud::PreEscaped;
use serde_json::{json, Value};
use tracing::{error, warn};

use sloth_router::RouteParams;

use crate::collections::{CollectionError, CollectionsMap};
use crate::context::{
    LoaderOutcome, MiddlewareOutcome, RequestInfo, RequestScope, RuntimeMode,
};
use crate::hydration::{
    bundle_markup, hydration_payload, hydration_script, HydrationDataMap, SharedPageConfig,
    SharedProps,
};
use crate::metadata::Metadata;
use crate::module::{LayoutProps, MetadataArgs, MetadataSource, PageProps, RootModule, RootProps};
use crate::response;
use crate::table::{ResolvedLayout, RouteEntry};

/// App-level inputs the renderer needs besides the route itself.
pub struct RenderOptions<'a> {
    pub root: &'a RootModule,
    pub collections: Arc<CollectionsMap>,
    pub mode: RuntimeMode,
    pub csp: bool,
}

/// Render one matched route to a full HTML response.
pub async fn render_route(
    entry: &RouteEntry,
    params: RouteParams,
    req: RequestInfo,
    opts: &RenderOptions<'_>,
) -> Response {
    if let Some(validate) = &entry.page.config.params_schema {
        if let Err(message) = validate(&params) {
            warn!(path = %req.path, %message, "route params failed validation");
            return response::bad_request();
        }
    }

    let req = Arc::new(req);
    let params = Arc::new(params);
    let mut state = json!({});
    let mut data_map = HydrationDataMap::new();
    let mut layouts: Vec<&ResolvedLayout> = Vec::new();
    let skip_layouts = entry.page.config.skip_inherited_layouts;

    let scope = |state: &Value| RequestScope {
        req: Arc::clone(&req),
        params: Arc::clone(&params),
        state: state.clone(),
        collections: Arc::clone(&opts.collections),
        mode: opts.mode,
    };

    for link in &entry.chain {
        if let Some(mw) = &link.middleware {
            match (mw.module.handler)(scope(&state)).await {
                Ok(MiddlewareOutcome::Next(next_state)) => state = next_state,
                Ok(MiddlewareOutcome::Respond(res)) => return res,
                Ok(MiddlewareOutcome::NotFound) => return response::not_found(),
                Err(err) => return chain_error(&req.path, err),
            }
        }

        let Some(layout) = &link.layout else { continue };
        if skip_layouts {
            continue;
        }
        if let Some(loader) = &layout.module.loader {
            match loader(scope(&state)).await {
                Ok(LoaderOutcome::Render(data)) => {
                    data_map.insert(layout.hash.clone(), data);
                }
                Ok(LoaderOutcome::Continue) => {
                    // The layout still renders; its data entry just
                    // stays absent.
                    warn!(layout = %layout.path, "layout loader finished without providing data");
                }
                Ok(LoaderOutcome::Respond(res)) => return res,
                Ok(LoaderOutcome::NotFound) => return response::not_found(),
                Err(err) => return chain_error(&req.path, err),
            }
        }
        layouts.push(layout);
    }

    let page_data = match &entry.page.loader {
        Some(loader) => match loader(scope(&state)).await {
            Ok(LoaderOutcome::Render(data)) => {
                data_map.insert(entry.hash.clone(), data.clone());
                data
            }
            Ok(LoaderOutcome::Respond(res)) => return res,
            Ok(LoaderOutcome::NotFound) => return response::not_found(),
            Ok(LoaderOutcome::Continue) => {
                // Nothing after the page loader can resolve the
                // request.
                error!(route = %entry.source_path, "page loader finished without resolving the request");
                return response::internal_server_error();
            }
            Err(err) => return chain_error(&req.path, err),
        },
        None => {
            // A loaderless page still renders null data keyed under
            // its hash, same as a loader that produced null.
            data_map.insert(entry.hash.clone(), Value::Null);
            Value::Null
        }
    };

    let metadata = match &entry.page.metadata {
        Some(MetadataSource::Static(value)) => Metadata::from_value(value),
        Some(MetadataSource::Generator(generate)) => {
            Metadata::from_value(&generate(&MetadataArgs {
                params: Arc::clone(&params),
                req: Arc::clone(&req),
                state: state.clone(),
            }))
        }
        None => Metadata::default(),
    };

    let url = req.url();
    let mut content = (entry.page.render)(&PageProps {
        data: page_data,
        params: Arc::clone(&params),
        url: url.clone(),
    });

    // Wrap leaf to root so the outermost layout ends up outermost.
    for layout in layouts.iter().rev() {
        content = (layout.module.render)(&LayoutProps {
            data: data_map.get(&layout.hash).cloned().unwrap_or(Value::Null),
            params: Arc::clone(&params),
            children: content,
        });
    }

    let nonce = opts.csp.then(|| random_token(32));
    // The shell renders before the head contents are known; it gets a
    // placeholder token that is substituted exactly once afterwards.
    let head_token = format!("@@{}@@", random_token(8));

    let document = (opts.root.render)(&RootProps {
        head: PreEscaped(head_token.clone()),
        content,
    });

    let mut head = metadata.head_markup().into_string();
    if !entry.page.config.ssr_only {
        let shared = SharedProps {
            url,
            params: params.as_ref().clone(),
            page_config: SharedPageConfig { ssr_only: false },
        };
        let payload = hydration_payload(&shared, &data_map);
        head.push_str(&hydration_script(&payload, nonce.as_deref()).into_string());
        head.push_str(&bundle_markup(&entry.hash, nonce.as_deref()).into_string());
    }

    let body = format!(
        "<!DOCTYPE html>{}",
        document.into_string().replacen(&head_token, &head, 1)
    );

    let mut res = response::ok_html(body);
    if let Some(nonce) = nonce {
        if let Ok(value) = HeaderValue::from_str(&csp_header(&nonce)) {
            res.headers_mut()
                .insert(header::CONTENT_SECURITY_POLICY, value);
        }
    }
    res
}

/// Single chokepoint for chain failures. Collection misses are
/// client-addressable and become 404s; everything else is logged as a
/// server fault.
fn chain_error(path: &str, err: anyhow::Error) -> Response {
    if err.downcast_ref::<CollectionError>().is_some() {
        warn!(%path, error = %err, "collection lookup failed");
        return response::not_found();
    }
    error!(%path, error = %err, "request chain failed");
    response::internal_server_error()
}

fn csp_header(nonce: &str) -> String {
    format!("script-src 'self' 'nonce-{nonce}'; base-uri 'self'; object-src 'none';")
}

fn random_token(len: usize) -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(len);
    hex
}
