//! # Company-Discovery API Server
//!
//! HTTP server for the natural-language company-discovery service, built
//! with Axum. The server exposes the query pipeline (classification,
//! thesis expansion, filter extraction/merging, hybrid search, batched
//! explanation) behind a single `POST /api/submit-query` endpoint, plus the
//! ambient stack every deployable service in this codebase family carries:
//! structured logging, health/readiness probes, Prometheus metrics,
//! security headers, request-id propagation, and Swagger-documented
//! OpenAPI output.
//!
//! ## Middleware Stack
//!
//! Requests flow through middleware in this order:
//! 1. **Security Headers**: HSTS, CSP, X-Frame-Options
//! 2. **Request ID**: Unique tracking for request tracing
//! 3. **Tracing**: Structured logging
//! 4. **Compression**: Gzip/Brotli response compression
//! 5. **CORS**: Cross-origin resource sharing policies
//! 6. **Timeout**: Overall per-request deadline (§5 "Request-level timeout and cancellation")
//!
//! ## Usage
//!
//! Start the server:
//! ```bash
//! cargo run --bin discovery-server
//! ```

use axum::{http::StatusCode, response::IntoResponse, routing::get, routing::post, Json, Router};
use discovery_core::config::CorsConfig;
use discovery_core::{Config, DatabasePool, MetricsRegistry, PipelineMetrics};
use discovery_domain::{
    EmbeddingClient, ExplanationCache, ExplanationEngine, LlmClient, PostgresCompanyRepository,
    PostgresUnknownExtractionLog, PostgresVocabularyRepository, SearchClient, SearchOrchestrator,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use axum::http::{HeaderName, HeaderValue, Method};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api_middleware;
mod error;
mod error_handler;
mod handlers;
mod health;
mod state;

use crate::{handlers::{admin, filter_options, query, research}, state::AppState};

/// Builds a CORS layer from configuration settings.
fn build_cors_layer(cors_config: &CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            cors_config.allowed_origins.iter().map(|origin| origin.parse()).collect();
        cors = cors.allow_origin(origins?);
    }

    if cors_config.allowed_methods.contains(&"*".to_string()) {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Result<Vec<Method>, _> =
            cors_config.allowed_methods.iter().map(|method| method.parse()).collect();
        cors = cors.allow_methods(methods?);
    }

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Result<Vec<HeaderName>, _> =
            cors_config.allowed_headers.iter().map(|header| header.parse()).collect();
        cors = cors.allow_headers(headers?);
    }

    if !cors_config.expose_headers.is_empty() {
        let expose_headers: Result<Vec<HeaderName>, _> =
            cors_config.expose_headers.iter().map(|header| header.parse()).collect();
        cors = cors.expose_headers(expose_headers?);
    }

    cors = cors.allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting discovery server...");

    let config = Config::load()?;
    info!("Configuration loaded successfully");

    let db = DatabasePool::new(config.database.clone()).await?;
    info!("Database pool initialized");

    run_migrations(&db).await?;
    info!("Database migrations completed");

    let metrics_registry = MetricsRegistry::new(config.metrics.clone());
    let pipeline_metrics = if config.metrics.enabled {
        let metrics = PipelineMetrics::new(&config.metrics.namespace)?;
        metrics.register_all(&metrics_registry)?;
        Some(metrics)
    } else {
        None
    };
    info!("Metrics registry initialized");

    let app_state = build_app_state(config.clone(), db, metrics_registry, pipeline_metrics);
    info!("Query pipeline assembled");

    let app = create_app(app_state, &config)?;

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>().unwrap_or(std::net::Ipv4Addr::UNSPECIFIED.into()),
        config.server.port,
    ));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Assembles the query pipeline's collaborators (language model, search
/// engine, embedding model, relational repositories) into a single
/// `SearchOrchestrator`, mirroring §4.9's constructor wiring.
fn build_app_state(
    config: Config,
    db: DatabasePool,
    metrics_registry: MetricsRegistry,
    pipeline_metrics: Option<PipelineMetrics>,
) -> AppState {
    let llm = LlmClient::new(&config.llm);
    let search_client = SearchClient::new(&config.search_engine);
    let embedding = EmbeddingClient::new(&config.embedding);

    let unknown_log = Arc::new(PostgresUnknownExtractionLog::new(&db));
    let vocabulary_repository = Arc::new(PostgresVocabularyRepository::new(&db));
    let company_repository = Arc::new(PostgresCompanyRepository::new(&db));

    let cache = ExplanationCache::new(
        config.cache.max_entries,
        Duration::from_secs(config.cache.ttl_seconds),
        pipeline_metrics.clone(),
    );
    let explanation_engine = ExplanationEngine::new(llm.clone(), cache, config.cache.enabled);

    let orchestrator = SearchOrchestrator::new(
        llm,
        search_client,
        embedding,
        unknown_log,
        vocabulary_repository.clone(),
        company_repository,
        explanation_engine,
        config.llm.enable_conceptual_expansion,
        pipeline_metrics.clone(),
    );

    AppState {
        config,
        db,
        metrics: metrics_registry,
        pipeline_metrics,
        orchestrator: Arc::new(orchestrator),
        vocabulary_repository,
    }
}

fn create_app(state: AppState, config: &Config) -> Result<Router, Box<dyn std::error::Error>> {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            health::health_check,
            health::readiness_check,
            query::submit_query,
            filter_options::filter_options,
            admin::analytics,
            admin::unknown_extractions,
            research::research,
        ),
        components(schemas()),
        tags(
            (name = "health", description = "Health check endpoints"),
            (name = "query", description = "Company-discovery query pipeline"),
            (name = "admin", description = "Administrative collaborator surfaces (out of scope)"),
            (name = "research", description = "Per-result research fan-out (collaborator)"),
        )
    )]
    struct ApiDoc;

    let router = Router::new()
        .nest("/api", create_api_routes())
        .merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(api_middleware::security_headers::security_headers_middleware))
                .layer(axum::middleware::from_fn(api_middleware::request_id::request_id_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(build_cors_layer(&config.cors)?)
                .layer(TimeoutLayer::new(Duration::from_millis(config.server.request_timeout_ms))),
        )
        .with_state(state)
        .fallback(handler_404);

    Ok(router)
}

fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/submit-query", post(query::submit_query))
        .route("/filter-options", get(filter_options::filter_options))
        .route("/admin/analytics", get(admin::analytics))
        .route("/admin/unknown-extractions", get(admin::unknown_extractions))
        .route("/research", post(research::research))
}

async fn metrics_endpoint(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.metrics_text())
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Resource not found"
        })),
    )
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "discovery_api=debug,discovery_domain=debug,discovery_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_migrations(db: &DatabasePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    let migrator = sqlx::migrate!("../../migrations");
    migrator.run(db.pool()).await?;

    info!("Migrations completed successfully");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
