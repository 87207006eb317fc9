//! Demo site: a small blog with layouts, middleware, and a content
//! collection.

use anyhow::Result;
use maud::html;
use serde_json::json;
use sloth::{
    loader, middleware, App, Collection, CollectionEntry, Config, LayoutModule, LoaderOutcome,
    MiddlewareModule, MiddlewareOutcome, PageConfig, PageModule, RootModule, RuntimeMode, TocEntry,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load_default()?;
    let mode = if std::env::var_os("SLOTH_DEV").is_some() {
        RuntimeMode::Development
    } else {
        RuntimeMode::Production
    };

    let app = App::builder(mode)
        .with_config(config)
        .root(shell())
        .collection(posts())
        .middleware("_middleware.rs", request_logger())
        .layout("_layout.rs", site_layout())
        .page("index.rs", home_page())
        .page("about.rs", about_page())
        .page("blog/index.rs", blog_listing())
        .page("blog/[slug].rs", blog_post())
        .page("@[user].rs", profile_page())
        .build()?;

    app.serve().await
}

fn shell() -> RootModule {
    RootModule::new(|props| {
        html! {
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    link rel="stylesheet" href="/static/site.css";
                    (props.head)
                }
                body {
                    (props.content)
                }
            }
        }
    })
}

fn request_logger() -> MiddlewareModule {
    MiddlewareModule::new(middleware(|scope| async move {
        tracing::info!(method = %scope.req.method, path = %scope.req.path, "request");
        Ok(MiddlewareOutcome::Next(scope.state))
    }))
}

fn site_layout() -> LayoutModule {
    LayoutModule::new(|props| {
        html! {
            header {
                nav {
                    a href="/" { "Home" }
                    a href="/blog" { "Blog" }
                    a href="/about" { "About" }
                }
            }
            main { (props.children) }
            footer { small { "built with 🦥" } }
        }
    })
}

fn home_page() -> PageModule {
    PageModule::new(|_| {
        html! {
            h1 { "Welcome" }
            p { "A file-system-routed site, rendered on the server." }
        }
    })
    .with_metadata(json!({
        "title": "Home",
        "description": "A sloth-powered demo site",
    }))
}

fn about_page() -> PageModule {
    PageModule::new(|_| {
        html! {
            h1 { "About" }
            p { "This page is server-rendered only; no client bundle ships." }
        }
    })
    .with_metadata(json!({"title": "About"}))
    .with_config(PageConfig {
        ssr_only: true,
        ..PageConfig::default()
    })
}

fn blog_listing() -> PageModule {
    PageModule::new(|props| {
        html! {
            h1 { "Blog" }
            ul {
                @for post in props.data["posts"].as_array().into_iter().flatten() {
                    li {
                        a href=(format!("/blog/{}", post["slug"].as_str().unwrap_or(""))) {
                            (post["title"].as_str().unwrap_or(""))
                        }
                    }
                }
            }
        }
    })
    .with_loader(loader(|scope| async move {
        let posts = scope.collections.collection("posts")?;
        let listing: Vec<_> = posts
            .all()
            .map(|entry| json!({"slug": entry.slug, "title": entry.metadata["title"]}))
            .collect();
        Ok(LoaderOutcome::Render(json!({ "posts": listing })))
    }))
    .with_metadata(json!({"title": "Blog"}))
}

fn blog_post() -> PageModule {
    PageModule::new(|props| {
        html! {
            article {
                h1 { (props.data["title"].as_str().unwrap_or("Untitled")) }
                @if let Some(toc) = props.data["toc"].as_array().filter(|t| !t.is_empty()) {
                    nav .toc {
                        ul {
                            @for item in toc {
                                li {
                                    a href=(format!("#{}", item["hash"].as_str().unwrap_or(""))) {
                                        (item["content"].as_str().unwrap_or(""))
                                    }
                                }
                            }
                        }
                    }
                }
                (maud::PreEscaped(props.data["content"].as_str().unwrap_or("").to_string()))
            }
        }
    })
    .with_loader(loader(|scope| async move {
        let slug = scope.params.get("slug").cloned().unwrap_or_default();
        let posts = scope.collections.collection("posts")?;
        let entry = posts.get(&slug)?;
        let toc: Vec<_> = entry
            .toc
            .iter()
            .map(|item| json!({"content": item.content, "deep": item.deep, "hash": item.hash}))
            .collect();
        Ok(LoaderOutcome::Render(json!({
            "title": entry.metadata["title"],
            "content": entry.content.0,
            "toc": toc,
        })))
    }))
    .with_metadata_fn(|args| json!({"title": args.params.get("slug").cloned().unwrap_or_default()}))
}

fn profile_page() -> PageModule {
    PageModule::new(|props| {
        let user = props.params.get("user").map(String::as_str).unwrap_or("");
        html! {
            h1 { "@" (user) }
            p { "Profile page for " (user) "." }
        }
    })
}

fn posts() -> Collection {
    Collection::new("posts")
        .insert(
            CollectionEntry::new(
                "hello-world",
                json!({"title": "Hello, World"}),
                html! {
                    h2 id="why" { "Why a sloth?" }
                    p { "The obligatory first post." }
                    h2 id="what-next" { "What next?" }
                    p { "More posts, naturally." }
                },
            )
            .with_toc(vec![
                TocEntry {
                    content: "Why a sloth?".into(),
                    deep: 2,
                    hash: "why".into(),
                },
                TocEntry {
                    content: "What next?".into(),
                    deep: 2,
                    hash: "what-next".into(),
                },
            ]),
        )
        .insert(CollectionEntry::new(
            "second-post",
            json!({"title": "A Second Post"}),
            html! {
                p { "Routing, layouts, and loaders, all from file paths." }
            },
        ))
}
