use axum::{
    Router,
    routing::{delete, get, post, put},
};
use time::Duration;
use tower_http::cors::CorsLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};
use tracing_subscriber::EnvFilter;

use huddle_server::{
    AppState, ExpenseStore, LedgerService, MembershipOracle, auth, config::Config, constants::*,
    database, expenses, projects,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load and validate configuration
    let config = Config::from_env().map_err(|e| format!("Configuration error: {}", e))?;

    // Initialize database
    let db = database::init_db(&config.data_path)
        .await
        .map_err(|e| format!("Failed to initialize database: {}", e))?;

    // Wire the ledger service with its collaborators
    let store = ExpenseStore::new(db.clone());
    let members = MembershipOracle::new(db.clone());
    let ledger = LedgerService::new(store, members)
        .with_restricted_paid_toggle(config.restrict_paid_toggle_to_self);

    let app_state = AppState { db, ledger };

    // Create session store
    let store = MemoryStore::default();

    // Create session key with proper error handling
    let session_key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| format!("Invalid session secret: {}", e))?;

    // Only use secure cookies when explicitly in production with HTTPS
    let is_production = std::env::var("PRODUCTION")
        .map(|val| val.to_lowercase() == "true")
        .unwrap_or(false);

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(is_production)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    // Configure CORS to allow frontend requests
    let frontend_origin =
        std::env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let frontend_origin_header = frontend_origin
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| format!("Invalid FRONTEND_ORIGIN '{}': {}", frontend_origin, e))?;

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin_header)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::COOKIE,
        ])
        .allow_credentials(true);

    // Build application router
    let app = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route(
            "/projects/{id}/members",
            post(projects::add_project_member),
        )
        .route(
            "/projects/{id}/expenses",
            post(expenses::create_expense).get(expenses::list_expenses),
        )
        .route(
            "/projects/{id}/expenses/{expense_id}",
            delete(expenses::delete_expense),
        )
        .route(
            "/projects/{id}/expenses/{expense_id}/paid",
            put(expenses::mark_split_paid),
        )
        .layer(cors)
        .layer(session_layer)
        .with_state(app_state);

    // Create TCP listener with proper error handling
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_address, e))?;

    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
