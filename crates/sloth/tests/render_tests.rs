use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use maud::html;
use serde_json::{json, Value};
use tower::ServiceExt;

use sloth::{
    loader, middleware, App, Collection, CollectionEntry, LayoutModule, LoaderOutcome,
    MiddlewareModule, MiddlewareOutcome, PageConfig, PageModule, RootModule, RuntimeMode,
};

async fn send(app: &App, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router().oneshot(request).await.unwrap()
}

async fn get(app: &App, uri: &str) -> Response {
    send(app, Method::GET, uri).await
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Pull the hydration payload back out of a rendered document.
fn hydration_json(body: &str) -> Value {
    let marker = body
        .find("application/vnd.sloth+json")
        .expect("hydration script missing");
    let open = body[marker..].find('>').unwrap() + marker + 1;
    let close = body[open..].find("</script>").unwrap() + open;
    serde_json::from_str(&body[open..close]).unwrap()
}

/// Collects log output so tests can assert on emitted warnings.
#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl CaptureWriter {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn shell() -> RootModule {
    RootModule::new(|props| {
        html! {
            html {
                head { (props.head) }
                body { (props.content) }
            }
        }
    })
}

fn posts() -> Collection {
    Collection::new("posts")
        .insert(CollectionEntry::new(
            "first",
            json!({"title": "First Post"}),
            html! { p { "the first post" } },
        ))
        .insert(CollectionEntry::new(
            "second",
            json!({"title": "Second Post"}),
            html! { p { "the second post" } },
        ))
}

fn blog_app(mode: RuntimeMode) -> App {
    App::builder(mode)
        .root(shell())
        .collection(posts())
        .layout(
            "_layout.rs",
            LayoutModule::new(|props| html! { div #site { (props.children) } }).with_loader(
                loader(|_scope| async move { Ok(LoaderOutcome::Render(json!({"nav": ["blog"]}))) }),
            ),
        )
        .page(
            "index.rs",
            PageModule::new(|_| html! { h1 { "home" } })
                .with_metadata(json!({"title": "Home", "description": "front page"})),
        )
        .page(
            "blog/index.rs",
            PageModule::new(|props| {
                html! {
                    ul {
                        @for slug in props.data["slugs"].as_array().into_iter().flatten() {
                            li { (slug.as_str().unwrap_or("")) }
                        }
                    }
                }
            })
            .with_loader(loader(|scope| async move {
                let posts = scope.collections.collection("posts")?;
                let slugs: Vec<&str> = posts.keys().collect();
                Ok(LoaderOutcome::Render(json!({ "slugs": slugs })))
            })),
        )
        .page(
            "blog/[slug].rs",
            PageModule::new(|props| {
                html! { article { h1 { (props.data["title"].as_str().unwrap_or("")) } } }
            })
            .with_loader(loader(|scope| async move {
                let slug = scope.params.get("slug").cloned().unwrap_or_default();
                let posts = scope.collections.collection("posts")?;
                let entry = posts.get(&slug)?;
                Ok(LoaderOutcome::Render(json!({"title": entry.metadata["title"]})))
            })),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn renders_a_full_document() {
    let app = blog_app(RuntimeMode::Production);
    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("<title>Home</title>"));
    assert!(body.contains(r#"<meta name="description" content="front page">"#));
    // Layout wraps the page content.
    assert!(body.contains(r#"<div id="site">"#));
    assert!(body.contains("<h1>home</h1>"));
    // The head placeholder was substituted away.
    assert!(!body.contains("@@"));
}

#[tokio::test]
async fn csp_header_nonce_matches_scripts() {
    let app = blog_app(RuntimeMode::Production);
    let response = get(&app, "/").await;

    let csp = response.headers()[header::CONTENT_SECURITY_POLICY]
        .to_str()
        .unwrap()
        .to_string();
    assert!(csp.starts_with("script-src 'self' 'nonce-"));
    assert!(csp.contains("base-uri 'self'"));
    assert!(csp.contains("object-src 'none'"));

    let nonce = csp
        .split("'nonce-")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .unwrap()
        .to_string();
    let body = body_text(response).await;
    assert!(body.contains(&format!(r#"nonce="{nonce}""#)));
}

#[tokio::test]
async fn hydration_payload_round_trips() {
    let app = blog_app(RuntimeMode::Production);
    let body = body_text(get(&app, "/blog/first?ref=home").await).await;

    let payload = hydration_json(&body);
    let array = payload.as_array().unwrap();
    assert_eq!(array.len(), 2);

    let shared = &array[0];
    assert_eq!(shared["url"], "/blog/first?ref=home");
    assert_eq!(shared["params"]["slug"], "first");
    assert_eq!(shared["pageConfig"]["ssrOnly"], false);

    let data = array[1].as_object().unwrap();
    // Layout data plus page data, each under its own hash.
    assert_eq!(data.len(), 2);
    assert!(data.values().any(|v| v["nav"] == json!(["blog"])));
    assert!(data.values().any(|v| v["title"] == "First Post"));

    // The page's client bundle is referenced under its hash.
    let page_hash = data
        .iter()
        .find(|(_, v)| v["title"] == "First Post")
        .map(|(k, _)| k.clone())
        .unwrap();
    assert!(body.contains(&format!(r#"src="/static/{page_hash}.js""#)));
    assert!(body.contains(r#"rel="modulepreload""#));
}

#[tokio::test]
async fn literal_route_beats_param_at_same_depth() {
    let app = blog_app(RuntimeMode::Production);

    let listing = body_text(get(&app, "/blog").await).await;
    assert!(listing.contains("<li>first</li>"));
    assert!(listing.contains("<li>second</li>"));

    let post = body_text(get(&app, "/blog/second").await).await;
    assert!(post.contains("<h1>Second Post</h1>"));
}

#[tokio::test]
async fn missing_collection_entry_is_a_404() {
    let app = blog_app(RuntimeMode::Production);
    let response = get(&app, "/blog/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unmatched_path_is_a_404() {
    let app = blog_app(RuntimeMode::Production);
    let response = get(&app, "/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trailing_slash_redirects_to_canonical_path() {
    let app = blog_app(RuntimeMode::Production);
    let response = get(&app, "/blog/").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/blog");

    // The root path keeps its slash.
    assert_eq!(get(&app, "/").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn head_reuses_get_with_an_empty_body() {
    let app = blog_app(RuntimeMode::Production);
    let response = send(&app, Method::HEAD, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::CONTENT_TYPE));
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn disallowed_method_does_not_match() {
    let app = blog_app(RuntimeMode::Production);
    let response = send(&app, Method::POST, "/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn middleware_short_circuit_skips_the_rest_of_the_chain() {
    let later_calls = Arc::new(AtomicUsize::new(0));

    let inner_counter = Arc::clone(&later_calls);
    let loader_counter = Arc::clone(&later_calls);

    let app = App::builder(RuntimeMode::Production)
        .middleware(
            "_middleware.rs",
            MiddlewareModule::new(middleware(|_scope| async move {
                Ok(MiddlewareOutcome::Respond(
                    axum::response::IntoResponse::into_response((
                        StatusCode::FORBIDDEN,
                        "blocked",
                    )),
                ))
            })),
        )
        .middleware(
            "admin/_middleware.rs",
            MiddlewareModule::new(middleware(move |scope| {
                let counter = Arc::clone(&inner_counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(MiddlewareOutcome::Next(scope.state))
                }
            })),
        )
        .page(
            "admin/index.rs",
            PageModule::new(|_| html! { p { "admin" } }).with_loader(loader(move |_scope| {
                let counter = Arc::clone(&loader_counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(LoaderOutcome::Render(json!({})))
                }
            })),
        )
        .build()
        .unwrap();

    let response = get(&app, "/admin").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "blocked");
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn middleware_state_reaches_loaders() {
    let app = App::builder(RuntimeMode::Production)
        .middleware(
            "_middleware.rs",
            MiddlewareModule::new(middleware(|_scope| async move {
                Ok(MiddlewareOutcome::Next(json!({"user": "ada"})))
            })),
        )
        .page(
            "index.rs",
            PageModule::new(|props| {
                html! { p { (props.data["user"].as_str().unwrap_or("anonymous")) } }
            })
            .with_loader(loader(|scope| async move {
                Ok(LoaderOutcome::Render(json!({"user": scope.state["user"]})))
            })),
        )
        .build()
        .unwrap();

    let body = body_text(get(&app, "/").await).await;
    assert!(body.contains("<p>ada</p>"));
}

#[tokio::test]
async fn middleware_not_found_is_terminal() {
    let app = App::builder(RuntimeMode::Production)
        .middleware(
            "_middleware.rs",
            MiddlewareModule::new(middleware(|_scope| async move {
                Ok(MiddlewareOutcome::NotFound)
            })),
        )
        .page("index.rs", PageModule::new(|_| html! { p { "home" } }))
        .build()
        .unwrap();

    assert_eq!(get(&app, "/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn layout_loader_without_data_still_renders_and_warns_once() {
    let log = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = App::builder(RuntimeMode::Production)
        .layout(
            "_layout.rs",
            LayoutModule::new(|props| html! { main { (props.children) } })
                .with_loader(loader(|_scope| async move { Ok(LoaderOutcome::Continue) })),
        )
        .page("index.rs", PageModule::new(|_| html! { p { "home" } }))
        .build()
        .unwrap();

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("<main><p>home</p></main>"));

    // Only the page's null entry; the layout's hash stays absent.
    let payload = hydration_json(&body);
    let data = payload[1].as_object().unwrap();
    assert_eq!(data.len(), 1);
    assert!(data.values().all(|v| v.is_null()));

    let output = log.contents();
    assert_eq!(
        output
            .matches("layout loader finished without providing data")
            .count(),
        1
    );
}

#[tokio::test]
async fn loaderless_page_keys_null_data_under_its_hash() {
    let app = App::builder(RuntimeMode::Production)
        .page("index.rs", PageModule::new(|_| html! { p { "home" } }))
        .build()
        .unwrap();

    let body = body_text(get(&app, "/").await).await;
    let payload = hydration_json(&body);
    let data = payload[1].as_object().unwrap();
    assert_eq!(data.len(), 1);

    let (hash, value) = data.iter().next().unwrap();
    assert!(value.is_null());
    // The null entry is keyed by the same hash that names the bundle.
    assert!(body.contains(&format!(r#"src="/static/{hash}.js""#)));
}

#[tokio::test]
async fn page_loader_without_outcome_is_a_500() {
    let app = App::builder(RuntimeMode::Production)
        .page(
            "index.rs",
            PageModule::new(|_| html! { p { "home" } })
                .with_loader(loader(|_scope| async move { Ok(LoaderOutcome::Continue) })),
        )
        .build()
        .unwrap();

    assert_eq!(
        get(&app, "/").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn loader_errors_become_500s() {
    let app = App::builder(RuntimeMode::Production)
        .page(
            "index.rs",
            PageModule::new(|_| html! { p { "home" } }).with_loader(loader(|_scope| async move {
                Err(anyhow::anyhow!("backing store unavailable"))
            })),
        )
        .build()
        .unwrap();

    assert_eq!(
        get(&app, "/").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn params_validation_failure_is_a_400() {
    let app = App::builder(RuntimeMode::Production)
        .page(
            "posts/[id].rs",
            PageModule::new(|_| html! { p { "post" } }).with_config(PageConfig {
                params_schema: Some(Arc::new(|params| {
                    params
                        .get("id")
                        .filter(|id| id.chars().all(|c| c.is_ascii_digit()))
                        .map(|_| ())
                        .ok_or_else(|| "id must be numeric".to_string())
                })),
                ..PageConfig::default()
            }),
        )
        .build()
        .unwrap();

    assert_eq!(get(&app, "/posts/42").await.status(), StatusCode::OK);
    assert_eq!(
        get(&app, "/posts/abc").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn ssr_only_pages_skip_hydration() {
    let app = App::builder(RuntimeMode::Production)
        .page(
            "about.rs",
            PageModule::new(|_| html! { p { "about" } }).with_config(PageConfig {
                ssr_only: true,
                ..PageConfig::default()
            }),
        )
        .build()
        .unwrap();

    let body = body_text(get(&app, "/about").await).await;
    assert!(body.contains("<p>about</p>"));
    assert!(!body.contains("application/vnd.sloth+json"));
    assert!(!body.contains("/static/"));
}

#[tokio::test]
async fn skip_inherited_layouts_renders_the_page_bare() {
    let app = App::builder(RuntimeMode::Production)
        .layout(
            "_layout.rs",
            LayoutModule::new(|props| html! { div #site { (props.children) } }),
        )
        .page(
            "bare.rs",
            PageModule::new(|_| html! { p { "bare" } }).with_config(PageConfig {
                skip_inherited_layouts: true,
                ..PageConfig::default()
            }),
        )
        .page("framed.rs", PageModule::new(|_| html! { p { "framed" } }))
        .build()
        .unwrap();

    let bare = body_text(get(&app, "/bare").await).await;
    assert!(!bare.contains(r#"<div id="site">"#));

    let framed = body_text(get(&app, "/framed").await).await;
    assert!(framed.contains(r#"<div id="site">"#));
}

#[tokio::test]
async fn catch_all_routes_capture_the_tail() {
    let app = App::builder(RuntimeMode::Production)
        .page(
            "docs/[...path].rs",
            PageModule::new(|props| {
                html! { p { (props.params.get("path").map(String::as_str).unwrap_or("")) } }
            }),
        )
        .build()
        .unwrap();

    let body = body_text(get(&app, "/docs/guide/install").await).await;
    assert!(body.contains("<p>guide/install</p>"));

    let body = body_text(get(&app, "/docs").await).await;
    assert!(body.contains("<p></p>"));
}

#[tokio::test]
async fn composite_segments_route_and_capture() {
    let app = App::builder(RuntimeMode::Production)
        .page(
            "@[user].rs",
            PageModule::new(|props| {
                html! { p { "profile of " (props.params.get("user").map(String::as_str).unwrap_or("")) } }
            }),
        )
        .build()
        .unwrap();

    let body = body_text(get(&app, "/@ada").await).await;
    assert!(body.contains("<p>profile of ada</p>"));
    assert_eq!(get(&app, "/ada").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn debug_listing_is_development_only() {
    let dev = blog_app(RuntimeMode::Development);
    let response = get(&dev, "/__debug").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("/blog/:slug"));
    assert!(body.contains("blog/[slug].rs"));

    let prod = blog_app(RuntimeMode::Production);
    assert_eq!(get(&prod, "/__debug").await.status(), StatusCode::NOT_FOUND);
}
