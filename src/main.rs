mod config;
mod errors;
mod fetcher;
mod models;
mod report;
mod risk;
mod routes;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, get_service},
    Router,
};
use clap::Parser;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, AppConfig};
use crate::errors::{ApiError, ConfigError};
use crate::routes::{
    analysis_page, blockchain_attacks_page, get_blockchain_attacks, get_settings, health,
    index_page, post_settings, recommendations_page, risks_page, AppState,
};

/// CLI arguments
#[derive(Parser)]
#[command(
    name = "chainrisk-monitor",
    about = "Blockchain security risk pages and live Bitcoin attack-risk estimates"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// IP address to bind the server to
    #[arg(long)]
    listen_ip: Option<String>,

    /// Port to bind the server to
    #[arg(long)]
    port: Option<u16>,
}

const DEFAULT_LOG_FILTER: &str = "info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Turns a handler panic into the JSON failure envelope.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown internal error".to_string()
    };
    error!(%message, "Request handler panicked");
    ApiError::Internal(message).into_response()
}

fn app(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/risks", get(risks_page))
        .route("/analysis", get(analysis_page))
        .route("/recommendations", get(recommendations_page))
        .route("/blockchain-attacks", get(blockchain_attacks_page))
        .route("/api/blockchain-attacks", get(get_blockchain_attacks))
        .route("/api/settings", get(get_settings).post(post_settings))
        .route("/health", get(health))
        .nest_service("/static", get_service(ServeDir::new(static_dir)))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn write_static_assets(dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(format!("{}/styles.css", dir), include_str!("static/styles.css"))?;
    std::fs::write(format!("{}/settings.js", dir), include_str!("static/settings.js"))?;
    std::fs::write(format!("{}/attacks.js", dir), include_str!("static/attacks.js"))?;
    std::fs::write(format!("{}/matrix.js", dir), include_str!("static/matrix.js"))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(err = %e, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Cli::parse();
    let mut config: AppConfig = load_config(&args.config)?;

    // Override TOML config with CLI arguments
    if let Some(ip) = args.listen_ip {
        config.server.listen_ip = Some(ip);
    }
    if let Some(port) = args.port {
        config.server.port = Some(port);
    }

    let static_dir = config
        .server
        .static_dir
        .clone()
        .unwrap_or_else(|| "static".to_string());
    write_static_assets(&static_dir)?;

    let state = Arc::new(AppState {
        upstream: config.upstream.clone(),
    });
    let app = app(state, &static_dir);

    let ip = config
        .server
        .listen_ip
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = config.server.port.unwrap_or(5000);
    let addr_str = format!("{}:{}", ip, port);

    let addr: SocketAddr = addr_str.parse().map_err(ConfigError::from)?;
    info!(%addr, "Server running");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::fetcher::tests::{config_for, spawn_upstream};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Json,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app(upstream: UpstreamConfig) -> Router {
        app(Arc::new(AppState { upstream }), "static")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn attacks_endpoint_degrades_to_fallback_data() {
        let response = test_app(config_for("http://127.0.0.1:1"))
            .oneshot(get_request("/api/blockchain-attacks"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["bitcoin_data"]["usd"], json!(45000.0));
        assert_eq!(body["top_pools_combined"], json!(50.8));
        assert_eq!(body["attack_51_probability"], json!(0.4));
        assert_eq!(body["attacks"].as_array().unwrap().len(), 6);
        assert_eq!(body["network_hash_rate"], json!("~500 EH/s (estimated)"));
    }

    #[tokio::test]
    async fn attacks_endpoint_uses_live_data() {
        let base = spawn_upstream(
            Router::new()
                .route(
                    "/price",
                    get(|| async {
                        Json(json!({
                            "bitcoin": { "usd": 70000.0, "usd_market_cap": 1.4e12, "usd_24h_change": 0.8 }
                        }))
                    }),
                )
                .route(
                    "/pools",
                    get(|| async {
                        Json(json!({
                            "pools": [
                                { "name": "Small", "blockCount": 40, "rank": 2 },
                                { "name": "Large", "blockCount": 60, "rank": 1 }
                            ],
                            "blockCount": 100,
                            "lastEstimatedHashrate": 5e20
                        }))
                    }),
                ),
        );

        let response = test_app(config_for(&base))
            .oneshot(get_request("/api/blockchain-attacks"))
            .await
            .unwrap();
        let body = body_json(response).await;

        assert_eq!(body["bitcoin_data"]["usd"], json!(70000.0));
        assert_eq!(body["mining_pools"][0]["name"], json!("Large"));
        assert_eq!(body["mining_pools"][0]["hash_rate_percent"], json!(60.0));
        assert_eq!(body["mining_pools"][1]["hash_rate_percent"], json!(40.0));
        assert_eq!(body["top_pools_combined"], json!(100.0));
        assert_eq!(body["total_blocks_24h"], json!(100));
        assert_eq!(body["attacks"][0]["probability"], json!(5.0));
        assert_eq!(body["attacks"][0]["status"], json!("High Risk"));
        assert_eq!(body["total_risk_score"], json!(9.1));
        assert_eq!(body["risk_level"], json!("Medium"));
        assert_eq!(body["network_hash_rate"], json!("~500.0 EH/s"));
    }

    #[tokio::test]
    async fn settings_get_returns_defaults() {
        let response = test_app(UpstreamConfig::default())
            .oneshot(get_request("/api/settings"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["font_size"], json!("16px"));
        assert_eq!(body["secondary_color"], json!("#3498db"));
    }

    #[tokio::test]
    async fn settings_post_echoes_body() {
        let submitted = json!({ "fontSize": "18px", "primaryColor": "#000000" });
        let request = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(submitted.to_string()))
            .unwrap();

        let response = test_app(UpstreamConfig::default())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "status": "success", "settings": submitted }));
    }

    #[tokio::test]
    async fn settings_post_rejects_invalid_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        let response = test_app(UpstreamConfig::default())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pages_render_html() {
        for uri in ["/", "/risks", "/analysis", "/recommendations", "/blockchain-attacks"] {
            let response = test_app(UpstreamConfig::default())
                .oneshot(get_request(uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
            assert!(content_type.starts_with("text/html"), "{}", uri);
        }
    }

    async fn exploding_handler() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn panics_become_failure_envelope() {
        let router = Router::new()
            .route("/boom", get(exploding_handler))
            .layer(CatchPanicLayer::custom(handle_panic));
        let response = router.oneshot(get_request("/boom")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "handler exploded" }));
    }

    #[test]
    fn default_log_level_is_info() {
        use tracing_subscriber::filter::LevelFilter;
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[tokio::test]
    async fn written_assets_are_served() {
        let dir = std::env::temp_dir().join("chainrisk-static-assets");
        let dir = dir.to_str().unwrap().to_string();
        write_static_assets(&dir).unwrap();

        let app = app(
            Arc::new(AppState {
                upstream: UpstreamConfig::default(),
            }),
            &dir,
        );
        for asset in ["styles.css", "settings.js", "attacks.js", "matrix.js"] {
            let response = app
                .clone()
                .oneshot(get_request(&format!("/static/{}", asset)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", asset);
        }

        let response = app.oneshot(get_request("/analysis")).await.unwrap();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("/static/matrix.js"));
        assert!(page.contains("risk-matrix"));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = test_app(UpstreamConfig::default())
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
