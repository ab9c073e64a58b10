//! HTTP surface of the contact directory: router, handlers and startup.

pub mod config;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, Method, header},
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use application::{ApplicationError, PersonService, PersonSource, PersonsQuery};
use infrastructure::{DirectoryPersonSource, InMemoryPersonRepository};

pub use config::ServerConfig;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub person_service: Arc<PersonService>,
}

impl AppState {
    /// Wires the service layer on top of an already populated store.
    pub fn new(repository: InMemoryPersonRepository) -> Self {
        Self {
            person_service: Arc::new(PersonService::new(Arc::new(repository))),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load initial data: {0}")]
    Load(#[from] ApplicationError),
    #[error("Failed to bind to address {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Builds the router with its middleware stack.
pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/persons", get(list_persons_handler))
        .with_state(state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Loads the data directory, publishes the store and serves until the listener fails.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    // 1. Load person data; everything is in place before the store is shared.
    let source = DirectoryPersonSource::new(config.data_dir.clone());
    let persons = source.load().await?;
    info!(count = persons.len(), dir = %config.data_dir.display(), "Initial data loaded.");

    // 2. Create the store and services
    let repository = InMemoryPersonRepository::new(persons);
    let app = build_app(AppState::new(repository), &config);
    info!("API routes configured.");

    // 3. Serve
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let mut header_values = Vec::with_capacity(origins.len());
    for origin in origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => header_values.push(value),
            Err(_) => warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    // No usable origin: emit no CORS headers at all.
    if header_values.is_empty() {
        return CorsLayer::new();
    }

    // Credentials cannot be combined with a literal wildcard.
    let allow_origin = if header_values.iter().any(|value| value == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(header_values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

// --- API Handlers ---

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.person_service.health().await)
}

/// `GET /persons?query=&birthdayFrom=&birthdayTo=&page=&pageSize=`
///
/// Never rejects a request: the query string is read as raw pairs and each
/// parameter falls back to its own default, with the first value of a
/// repeated key winning.
async fn list_persons_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let request = PersonsQuery::from_pairs(pairs);
    Json(state.person_service.search_persons(&request).await)
}
