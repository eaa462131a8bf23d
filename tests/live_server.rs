//! End-to-end tests over a real listener.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use staged_router::chain::body::ParsedBody;
use staged_router::chain::stage::{handler, plain_response};
use staged_router::chain::AppChain;
use staged_router::config::RouterConfig;
use staged_router::engine::RouterEngine;
use staged_router::lifecycle::{Hook, Hooks, LifecycleCoordinator};
use staged_router::registry::entry::Verb;
use staged_router::session::{memory_store_factory, Session, MEMORY_STORE_NAME};
use axum::http::StatusCode;

mod common;
use common::{failing, respond_with};

struct TestApp {
    hooks: Hooks,
    engine: Arc<Mutex<RouterEngine>>,
    port: u16,
}

impl TestApp {
    fn new(mut config: RouterConfig, port: u16) -> Self {
        config.port = port;
        let chain = Arc::new(AppChain::new());
        let engine = Arc::new(Mutex::new(RouterEngine::new(config.clone(), chain.clone())));
        let hooks = Hooks::new();
        let coordinator = LifecycleCoordinator::new(engine.clone(), chain, config);
        coordinator.install(&hooks);
        Self { hooks, engine, port }
    }

    async fn launch(&self) {
        self.hooks.emit(Hook::BeforeLaunch).await.unwrap();
        self.hooks.emit(Hook::AfterLaunch).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    async fn stop(&self) {
        self.hooks.emit(Hook::Stop).await.unwrap();
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn last_registered_route_wins_ties() {
    let app = TestApp::new(RouterConfig::default(), 28701);
    {
        let mut engine = app.engine.lock().await;
        engine.route(None, "/page", respond_with("framework default")).unwrap();
        engine.route(None, "/other", respond_with("other")).unwrap();
        engine.route(None, "/page", respond_with("application override")).unwrap();
    }
    app.launch().await;

    let body = client()
        .get(app.url("/page"))
        .send()
        .await
        .expect("server unreachable")
        .text()
        .await
        .unwrap();
    assert_eq!(body, "application override");

    let other = client().get(app.url("/other")).send().await.unwrap();
    assert_eq!(other.status(), 200);

    app.stop().await;
}

#[tokio::test]
async fn unmatched_requests_answer_404() {
    let app = TestApp::new(RouterConfig::default(), 28702);
    {
        let mut engine = app.engine.lock().await;
        engine.route(None, "/exists", respond_with("yes")).unwrap();
    }
    app.launch().await;

    let resp = client().get(app.url("/missing")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    // Method must match too.
    let resp = client().post(app.url("/exists")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    app.stop().await;
}

#[tokio::test]
async fn static_files_serve_under_their_prefix() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style.css"), b"body{}").unwrap();

    let app = TestApp::new(RouterConfig::default(), 28703);
    {
        let mut engine = app.engine.lock().await;
        engine.static_route("/assets", dir.path()).unwrap();
        engine.route(None, "/assets/style.css", respond_with("shadowed")).unwrap();
    }
    app.launch().await;

    // The static mount is applied ahead of routes, so it wins.
    let resp = client().get(app.url("/assets/style.css")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "body{}");

    // Misses fall through the chain; the shadow route never matches a
    // different file name, so this is a 404.
    let resp = client().get(app.url("/assets/missing.css")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    app.stop().await;
}

#[tokio::test]
async fn trailing_slash_static_mounts_still_serve() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style.css"), b"body{}").unwrap();

    let app = TestApp::new(RouterConfig::default(), 28710);
    {
        let mut engine = app.engine.lock().await;
        engine.static_route("/assets/", dir.path()).unwrap();
    }
    app.launch().await;

    let resp = client().get(app.url("/assets/style.css")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "body{}");

    app.stop().await;
}

#[tokio::test]
async fn raw_routes_bypass_json_parsing() {
    let mut config = RouterConfig::default();
    config.body_parser.raw_routes = vec!["/hook".to_string()];

    let app = TestApp::new(config, 28704);
    {
        let mut engine = app.engine.lock().await;
        engine
            .route(
                Some(Verb::Post),
                "/hook",
                handler(|req, _next| async move {
                    match req.extensions().get::<ParsedBody>() {
                        Some(ParsedBody::Raw(bytes)) => Ok(plain_response(
                            StatusCode::OK,
                            format!("raw:{}", bytes.len()),
                        )),
                        other => Ok(plain_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            format!("unexpected body: {other:?}"),
                        )),
                    }
                }),
            )
            .unwrap();
        engine
            .route(
                Some(Verb::Post),
                "/json",
                handler(|req, _next| async move {
                    match req.extensions().get::<ParsedBody>() {
                        Some(ParsedBody::Json(value)) => Ok(plain_response(
                            StatusCode::OK,
                            format!("json:{}", value["n"]),
                        )),
                        other => Ok(plain_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            format!("unexpected body: {other:?}"),
                        )),
                    }
                }),
            )
            .unwrap();
    }
    app.launch().await;

    let resp = client()
        .post(app.url("/hook"))
        .header("content-type", "application/json")
        .body(r#"{"n":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "raw:7");

    let resp = client()
        .post(app.url("/json"))
        .header("content-type", "application/json")
        .body(r#"{"n":7}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.text().await.unwrap(), "json:7");

    // Malformed JSON outside the raw list is rejected before any stage.
    let resp = client()
        .post(app.url("/json"))
        .header("content-type", "application/json")
        .body("{nope")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    app.stop().await;
}

#[tokio::test]
async fn production_fallback_logs_and_redirects() {
    let mut config = RouterConfig::default();
    config.production = true;

    let app = TestApp::new(config, 28705);
    {
        let mut engine = app.engine.lock().await;
        engine.route(None, "/boom", failing()).unwrap();
        engine.route(None, "/fine", respond_with("ok")).unwrap();
    }
    app.launch().await;

    let resp = client().get(app.url("/boom")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.headers().get("location").unwrap(), "/error");

    // Errors are isolated per request; the listener keeps serving.
    let resp = client().get(app.url("/fine")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    app.stop().await;
}

#[tokio::test]
async fn dev_mode_shows_the_error() {
    let app = TestApp::new(RouterConfig::default(), 28706);
    {
        let mut engine = app.engine.lock().await;
        engine.route(None, "/boom", failing()).unwrap();
    }
    app.launch().await;

    let resp = client().get(app.url("/boom")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    assert!(resp.headers().get("location").is_none());
    assert!(resp.text().await.unwrap().contains("handler blew up"));

    app.stop().await;
}

#[tokio::test]
async fn sessions_persist_across_requests() {
    let mut config = RouterConfig::default();
    config.session_store_name = MEMORY_STORE_NAME.to_string();

    let app = TestApp::new(config.clone(), 28707);
    {
        let mut engine = app.engine.lock().await;
        engine
            .session_middleware(MEMORY_STORE_NAME, memory_store_factory(config.session))
            .unwrap();
        engine
            .route(
                None,
                "/count",
                handler(|req, _next| async move {
                    let session = req
                        .extensions()
                        .get::<Session>()
                        .cloned()
                        .ok_or("session middleware did not run")?;
                    let hits = session.get("hits").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
                    session.insert("hits", hits.into());
                    Ok(plain_response(StatusCode::OK, hits.to_string()))
                }),
            )
            .unwrap();
    }
    app.launch().await;

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .no_proxy()
        .build()
        .unwrap();

    let first = client.get(app.url("/count")).send().await.unwrap();
    assert_eq!(first.text().await.unwrap(), "1");
    let second = client.get(app.url("/count")).send().await.unwrap();
    assert_eq!(second.text().await.unwrap(), "2");

    app.stop().await;
}

#[tokio::test]
async fn routes_added_after_launch_serve_immediately() {
    let app = TestApp::new(RouterConfig::default(), 28708);
    app.launch().await;

    let resp = client().get(app.url("/late")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    app.engine
        .lock()
        .await
        .route(None, "/late", respond_with("late arrival"))
        .unwrap();

    let resp = client().get(app.url("/late")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "late arrival");

    app.stop().await;
}

#[tokio::test]
async fn stop_releases_the_listener() {
    let app = TestApp::new(RouterConfig::default(), 28709);
    {
        let mut engine = app.engine.lock().await;
        engine.route(None, "/ping", respond_with("pong")).unwrap();
    }
    app.launch().await;

    assert_eq!(
        client().get(app.url("/ping")).send().await.unwrap().status(),
        200
    );

    app.stop().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(client().get(app.url("/ping")).send().await.is_err());

    // Stop is idempotent.
    app.stop().await;
}
