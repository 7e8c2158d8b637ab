//! HTTP gateway for roomrelay.
//!
//! Exposes the flat route surface the web client calls: token issuance,
//! room CRUD, participant operations, join-with-greeting, and chat.
//!
//! Built on Axum. Status contract: 400 for missing required fields (with a
//! field-naming message), 429 for rate-limit rejection, 500 for upstream
//! and internal failures, 200 otherwise.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use roomrelay_config::AppConfig;
use roomrelay_core::RoomControl;
use roomrelay_session::{
    ChatService, ContextAssembler, ContextPolicy, GenerationParams, GreetingSelector, MemoryWriter,
};

/// Shared application state. Clients are constructed once at startup and
/// shared read-only thereafter.
pub struct GatewayState {
    pub config: AppConfig,
    pub rooms: Arc<dyn RoomControl>,
    pub chat: ChatService,
    pub greeter: GreetingSelector,
}

pub type SharedState = Arc<GatewayState>;

/// Wire up all subsystems from configuration and build the shared state.
pub fn build_state(config: AppConfig) -> SharedState {
    let rooms = roomrelay_rooms::build_from_config(&config.rooms);
    let provider = roomrelay_providers::build_from_config(&config.completion);
    let store = roomrelay_memory::build_from_config(&config.memory);

    let assembler = ContextAssembler::new(
        store.clone(),
        ContextPolicy::from_config(&config.memory, &config.chat),
    );
    let writer = MemoryWriter::spawn(store.clone(), config.memory.write_queue_capacity);
    let chat = ChatService::new(
        assembler,
        provider,
        writer,
        GenerationParams {
            model: config.completion.model.clone(),
            temperature: config.completion.temperature,
            max_tokens: Some(config.completion.max_tokens),
        },
    );
    let greeter = GreetingSelector::new(store);

    Arc::new(GatewayState {
        config,
        rooms,
        chat,
        greeter,
    })
}

/// Build the full router: API routes plus health, CORS, body limit, rate
/// limiting, and trace logging.
pub fn build_router(state: SharedState) -> Router {
    // Config validation catches malformed origins at startup; if one slips
    // through anyway, fail closed rather than panic.
    let allowed_origin = match state.config.gateway.allowed_origin.parse() {
        Ok(origin) => tower_http::cors::AllowOrigin::exact(origin),
        Err(_) => {
            warn!(origin = %state.config.gateway.allowed_origin, "Unparseable allowed origin, disabling cross-origin access");
            tower_http::cors::AllowOrigin::list(std::iter::empty::<axum::http::HeaderValue>())
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    let limiter = Arc::new(RateLimiter::new(
        state.config.gateway.rate_limit_per_minute,
        std::time::Duration::from_secs(60),
    ));

    api::api_router(state)
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = build_state(config);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Rate Limiter ---

/// Fixed-window in-memory rate limiter.
///
/// Counts requests per client key within the current window; the counter
/// resets when a new window starts. Thread-safe via `std::sync::Mutex`
/// (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: std::time::Duration,
    started: std::time::Instant,
    counts: std::sync::Mutex<(u64, HashMap<String, usize>)>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: std::time::Duration) -> Self {
        Self {
            max_requests,
            window,
            started: std::time::Instant::now(),
            counts: std::sync::Mutex::new((0, HashMap::new())),
        }
    }

    /// Check whether the client is within the limit. Returns `true` if
    /// allowed.
    fn check(&self, client_key: &str) -> bool {
        let current_window = self.started.elapsed().as_secs() / self.window.as_secs().max(1);
        let mut guard = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let (window, counts) = &mut *guard;

        if *window != current_window {
            *window = current_window;
            counts.clear();
        }

        let count = counts.entry(client_key.to_string()).or_insert(0);
        if *count >= self.max_requests {
            return false;
        }
        *count += 1;
        true
    }
}

/// Rate limiting middleware — keys on the client IP forwarded by the proxy,
/// falling back to "anonymous". The /health endpoint is exempt so
/// monitoring can poll it freely.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(40).collect::<String>(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

// --- Health ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
