//! `NewswireServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::dispatcher::{DeliveryLimits, Dispatcher};
use crate::health::{self, HealthResponse};
use crate::providers::ProviderSet;
use crate::routes;
use crate::sessions::SessionStore;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: Arc<ServerConfig>,
    /// Open channel connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Per-connection search results.
    pub sessions: Arc<SessionStore>,
    /// Command handling for dispatch mode.
    pub dispatcher: Arc<Dispatcher>,
    /// Content providers.
    pub providers: ProviderSet,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The newswire server.
pub struct NewswireServer {
    state: AppState,
}

impl NewswireServer {
    /// Create a new server.
    pub fn new(
        config: ServerConfig,
        providers: ProviderSet,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let dispatcher = Dispatcher::new(
            providers.search.clone(),
            providers.articles.clone(),
            sessions.clone(),
            DeliveryLimits {
                chunk_threshold: config.chunk_threshold,
                max_chunk_size: config.max_chunk_size,
            },
            config.provider_timeout,
        );
        Self {
            state: AppState {
                registry: Arc::new(ConnectionRegistry::new(config.max_send_queue)),
                config: Arc::new(config),
                sessions,
                dispatcher: Arc::new(dispatcher),
                providers,
                shutdown: Arc::new(ShutdownCoordinator::new()),
                start_time: Instant::now(),
                metrics,
            },
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let config = &self.state.config;
        let router = Router::new()
            .route("/health", get(health_handler))
            .route(&config.ws_path, get(ws_handler))
            .route("/api/news", get(routes::news))
            .route("/api/news/categories", get(routes::categories))
            .route("/api/search", get(routes::search_link))
            .route("/api/search/google", get(routes::google_search))
            .route("/api/music/search", get(routes::music_search_link))
            .route("/api/article", get(routes::article))
            .route("/api/radio/check", get(routes::radio_check))
            .route("/metrics", get(routes::render_metrics))
            .with_state(self.state.clone());

        let router = match &config.public_dir {
            Some(dir) => router.fallback_service(ServeDir::new(dir)),
            None => router,
        };

        router
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address and the serving task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(self.state.config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        let router = self.router();
        let token = self.state.shutdown.token();

        info!(
            addr = %local_addr,
            ws_path = %self.state.config.ws_path,
            mode = self.state.config.mode.as_str(),
            "newswire server started"
        );

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server terminated");
            }
        });
        Ok((local_addr, handle))
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.state.registry
    }

    /// Get the session store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.state.sessions
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.registry.count(),
        state.sessions.len(),
        state.config.mode,
    ))
}

/// GET on the channel path: upgrade to a WebSocket session.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_ws_session(socket, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use newswire_core::{
        Article, ArticleExtractor, Feed, FeedFetcher, FeedItem, ProviderError, ProviderResult,
        SearchProvider, SearchResult, StreamProbe, StreamStatus,
    };
    use newswire_providers::FeedCatalog;
    use newswire_settings::ChannelMode;
    use tower::ServiceExt;

    struct StubFeeds;

    #[async_trait]
    impl FeedFetcher for StubFeeds {
        async fn fetch(&self, url: &str) -> ProviderResult<Feed> {
            if url.contains("the-gioi") {
                return Err(ProviderError::fetch("Failed to fetch feed: 500"));
            }
            Ok(Feed {
                title: "Thanh Niên".into(),
                items: vec![FeedItem {
                    title: "Headline".into(),
                    link: url.into(),
                    ..FeedItem::default()
                }],
            })
        }
    }

    struct StubSearch {
        configured: bool,
    }

    #[async_trait]
    impl SearchProvider for StubSearch {
        async fn search(&self, query: &str, top_k: usize) -> ProviderResult<Vec<SearchResult>> {
            if !self.configured {
                return Err(ProviderError::Configuration {
                    message: "Google search is not configured".into(),
                });
            }
            Ok((0..10)
                .map(|i| SearchResult {
                    title: format!("{query} {i}"),
                    link: format!("https://example.com/{i}"),
                    ..SearchResult::default()
                })
                .take(top_k)
                .collect())
        }
    }

    struct StubArticles;

    #[async_trait]
    impl ArticleExtractor for StubArticles {
        async fn extract(&self, url: &str) -> ProviderResult<Article> {
            if !url.starts_with("http") {
                return Err(ProviderError::invalid_url("Invalid URL format"));
            }
            Ok(Article {
                title: "Story".into(),
                body_text: "Body.".into(),
            })
        }
    }

    struct StubStreams;

    #[async_trait]
    impl StreamProbe for StubStreams {
        async fn probe(&self, url: &str) -> ProviderResult<StreamStatus> {
            if url.contains("down") {
                return Err(ProviderError::fetch("connection refused"));
            }
            Ok(StreamStatus {
                reachable: true,
                status: Some(200),
                content_type: Some("audio/mpeg".into()),
            })
        }
    }

    fn providers(configured: bool) -> ProviderSet {
        ProviderSet {
            feeds: Arc::new(StubFeeds),
            search: Arc::new(StubSearch { configured }),
            articles: Arc::new(StubArticles),
            streams: Arc::new(StubStreams),
            catalog: FeedCatalog::default(),
        }
    }

    fn make_server() -> NewswireServer {
        NewswireServer::new(ServerConfig::default(), providers(true), None)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000)
            .await
            .unwrap();
        let parsed = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }

    #[test]
    fn server_with_default_config() {
        let server = make_server();
        assert_eq!(server.config().host, "127.0.0.1");
        assert_eq!(server.config().port, 0);
        assert_eq!(server.registry().count(), 0);
        assert!(server.sessions().is_empty());
        assert!(!server.shutdown().is_shutting_down());
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, body) = get_json(make_server().router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
        assert_eq!(body["sessions"], 0);
        assert_eq!(body["mode"], "dispatch");
        assert!(body["uptimeSecs"].is_number());
    }

    #[tokio::test]
    async fn health_reports_broadcast_mode() {
        let config = ServerConfig {
            mode: ChannelMode::Broadcast,
            ..ServerConfig::default()
        };
        let server = NewswireServer::new(config, providers(true), None);
        let (_, body) = get_json(server.router(), "/health").await;
        assert_eq!(body["mode"], "broadcast");
    }

    #[tokio::test]
    async fn ws_path_without_upgrade_is_rejected() {
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let resp = make_server().router().oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = make_server().router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn news_uses_default_category() {
        let (status, body) = get_json(make_server().router(), "/api/news").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "thoisu");
        assert_eq!(body["title"], "Thanh Niên");
        assert_eq!(body["items"][0]["title"], "Headline");
    }

    #[tokio::test]
    async fn news_unknown_category_is_400() {
        let (status, body) = get_json(make_server().router(), "/api/news?category=nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn news_fetch_failure_is_502() {
        let (status, body) = get_json(make_server().router(), "/api/news?category=thegioi").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to fetch feed: 500");
    }

    #[tokio::test]
    async fn categories_lists_every_feed() {
        let (status, body) = get_json(make_server().router(), "/api/news/categories").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 9);
        assert!(list.iter().any(|c| c["key"] == "doi-song"));
    }

    #[tokio::test]
    async fn search_link_encodes_query() {
        let (status, body) = get_json(make_server().router(), "/api/search?q=tin%20moi").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "tin moi");
        assert!(body["searchUrl"].as_str().unwrap().contains("tin%20moi"));
    }

    #[tokio::test]
    async fn empty_search_queries_are_400() {
        let (status, body) = get_json(make_server().router(), "/api/search?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing search query parameter q");

        let (status, body) = get_json(make_server().router(), "/api/music/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing music search query parameter q");
    }

    #[tokio::test]
    async fn music_search_points_at_youtube() {
        let (status, body) = get_json(make_server().router(), "/api/music/search?q=lofi").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["searchUrl"].as_str().unwrap().contains("youtube.com"));
    }

    #[tokio::test]
    async fn google_search_clamps_top_k() {
        let app = make_server().router();
        let (status, body) = get_json(app.clone(), "/api/search/google?q=rust&topK=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 3);

        let (_, body) = get_json(app.clone(), "/api/search/google?q=rust&topK=0").await;
        assert_eq!(body["results"].as_array().unwrap().len(), 1);

        let (_, body) = get_json(app, "/api/search/google?q=rust&topK=abc").await;
        assert_eq!(body["results"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn google_search_without_credentials_is_503() {
        let server = NewswireServer::new(ServerConfig::default(), providers(false), None);
        let (status, body) = get_json(server.router(), "/api/search/google?q=rust").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn article_route_shapes_reply() {
        let (status, body) = get_json(
            make_server().router(),
            "/api/article?url=https%3A%2F%2Fexample.com%2Fa",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Story");
        assert_eq!(body["bodyText"], "Body.");
        assert_eq!(body["sourceUrl"], "https://example.com/a");
    }

    #[tokio::test]
    async fn article_invalid_url_is_400() {
        let (status, _) = get_json(make_server().router(), "/api/article?url=ftp-thing").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_json(make_server().router(), "/api/article").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn radio_check_reports_reachability() {
        let app = make_server().router();
        let (status, body) =
            get_json(app.clone(), "/api/radio/check?url=https%3A%2F%2Fradio.example%2Flive").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reachable"], true);
        assert_eq!(body["status"], 200);
        assert_eq!(body["contentType"], "audio/mpeg");

        let (status, body) =
            get_json(app.clone(), "/api/radio/check?url=https%3A%2F%2Fdown.example%2F").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reachable"], false);
        assert_eq!(body["error"], "connection refused");

        let (status, _) = get_json(app, "/api/radio/check?url=not-a-url").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = make_server().router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn public_dir_is_served_as_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>newswire</h1>").unwrap();
        let config = ServerConfig {
            public_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let server = NewswireServer::new(config, providers(true), None);

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        assert_eq!(&body[..], b"<h1>newswire</h1>");
    }

    #[tokio::test]
    async fn listen_binds_and_stops_on_shutdown() {
        let server = make_server();
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);
        server.shutdown().shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
