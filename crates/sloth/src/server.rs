//! App assembly and the HTTP surface.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use maud::html;
use tower_http::services::ServeDir;
use tracing::info;

use crate::collections::{Collection, CollectionsMap};
use crate::config::Config;
use crate::context::{RequestInfo, RuntimeMode};
use crate::module::{LayoutModule, MiddlewareModule, PageModule, RootModule};
use crate::registry::ModuleMap;
use crate::renderer::{render_route, RenderOptions};
use crate::response;
use crate::table::{BuildError, RouteTable};

/// Collects modules and settings, then builds the route table once.
pub struct AppBuilder {
    modules: ModuleMap,
    root: Option<RootModule>,
    collections: CollectionsMap,
    mode: RuntimeMode,
    config: Config,
}

impl AppBuilder {
    pub fn new(mode: RuntimeMode) -> Self {
        Self {
            modules: ModuleMap::new(),
            root: None,
            collections: CollectionsMap::new(),
            mode,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// The document shell. A minimal default is used if none is set.
    pub fn root(mut self, root: RootModule) -> Self {
        self.root = Some(root);
        self
    }

    /// Register a routable page under its route-relative file path.
    pub fn page(mut self, route_path: &str, module: PageModule) -> Self {
        self.modules.add_page(route_path, module);
        self
    }

    /// Register a `_layout` file.
    pub fn layout(mut self, route_path: &str, module: LayoutModule) -> Self {
        self.modules.add_layout(route_path, module);
        self
    }

    /// Register a `_middleware` file.
    pub fn middleware(mut self, route_path: &str, module: MiddlewareModule) -> Self {
        self.modules.add_middleware(route_path, module);
        self
    }

    pub fn collection(mut self, collection: Collection) -> Self {
        self.collections.insert(collection);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let table = RouteTable::build(&self.modules)?;
        Ok(App {
            inner: Arc::new(AppInner {
                table,
                root: self.root.unwrap_or_else(default_root),
                collections: Arc::new(self.collections),
                mode: self.mode,
                config: self.config,
            }),
        })
    }
}

struct AppInner {
    table: RouteTable,
    root: RootModule,
    collections: Arc<CollectionsMap>,
    mode: RuntimeMode,
    config: Config,
}

#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    pub fn builder(mode: RuntimeMode) -> AppBuilder {
        AppBuilder::new(mode)
    }

    /// The axum router: static assets, the dev route table listing,
    /// and the page dispatch fallback.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .nest_service(
                "/static",
                ServeDir::new(&self.inner.config.render.static_dir),
            );

        if self.inner.mode.is_dev() {
            router = router.route("/__debug", get(debug_routes));
        }

        router.fallback(dispatch).with_state(Arc::clone(&self.inner))
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!(
            "{}:{}",
            self.inner.config.server.host, self.inner.config.server.port
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("🦥 Sloth Server running at http://{addr}");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

fn default_root() -> RootModule {
    RootModule::new(|props| {
        html! {
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    (props.head)
                }
                body {
                    (props.content)
                }
            }
        }
    })
}

async fn dispatch(State(app): State<Arc<AppInner>>, req: Request<Body>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Canonicalize before matching; 307 keeps the method on replay.
    if path.len() > 1 && path.ends_with('/') {
        return response::temporary_redirect(&path[..path.len() - 1]);
    }

    let Some((entry, params)) = app.table.match_route(&path, &method) else {
        return response::with_head_support(&method, response::not_found());
    };

    let info = RequestInfo::new(
        method.clone(),
        path,
        req.uri().query(),
        req.headers().clone(),
    );
    let opts = RenderOptions {
        root: &app.root,
        collections: Arc::clone(&app.collections),
        mode: app.mode,
        csp: app.config.render.csp,
    };

    let res = render_route(entry, params, info, &opts).await;
    response::with_head_support(&method, res)
}

async fn debug_routes(State(app): State<Arc<AppInner>>) -> Response {
    let markup = html! {
        table {
            thead {
                tr {
                    th { "#" }
                    th { "Methods" }
                    th { "Pattern" }
                    th { "Source" }
                }
            }
            tbody {
                @for (index, entry) in app.table.entries().iter().enumerate() {
                    tr {
                        td { (index + 1) }
                        td {
                            (entry.methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", "))
                        }
                        td { (entry.pattern.pattern) }
                        td { (entry.source_path) }
                    }
                }
            }
        }
    };
    response::ok_html(markup.into_string())
}
