use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use huddle_server::{
    AppState, ExpenseStore, LedgerService, MembershipOracle, auth, constants::*, database,
};
use time::Duration;
use tower::util::ServiceExt;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};
use uuid::Uuid;

#[derive(Clone)]
pub struct TestConfig {
    pub temp_dir_path: String,
}

impl TestConfig {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let temp_dir_path = temp_dir.path().to_string_lossy().to_string();
        std::mem::forget(temp_dir);
        Ok(Self { temp_dir_path })
    }

    pub fn data_path(&self) -> String {
        self.temp_dir_path.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    setup_test_app_with_restricted_toggle(false).await
}

pub async fn setup_test_app_with_restricted_toggle(restrict: bool) -> anyhow::Result<TestApp> {
    let test_config = TestConfig::new()?;

    let data_path = test_config.data_path();
    std::fs::create_dir_all(&data_path)?;

    let db = database::init_db(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))?;

    let store = ExpenseStore::new(db.clone());
    let members = MembershipOracle::new(db.clone());
    let ledger = LedgerService::new(store, members).with_restricted_paid_toggle(restrict);

    let app_state = AppState { db, ledger };

    let store = MemoryStore::default();

    let session_secret = "test_secret_key_at_least_64_chars_long_test_secret_key_at_least_64_";
    let session_key = Key::try_from(session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {}", e))?;

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(false)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    let router = Router::new()
        .route("/auth/register", axum::routing::post(auth::register))
        .route("/auth/login", axum::routing::post(auth::login))
        .route("/auth/me", axum::routing::get(auth::me))
        .route("/auth/logout", axum::routing::post(auth::logout))
        .route(
            "/projects",
            axum::routing::post(huddle_server::projects::create_project)
                .get(huddle_server::projects::list_projects),
        )
        .route(
            "/projects/{id}/members",
            axum::routing::post(huddle_server::projects::add_project_member),
        )
        .route(
            "/projects/{id}/expenses",
            axum::routing::post(huddle_server::expenses::create_expense)
                .get(huddle_server::expenses::list_expenses),
        )
        .route(
            "/projects/{id}/expenses/{expense_id}",
            axum::routing::delete(huddle_server::expenses::delete_expense),
        )
        .route(
            "/projects/{id}/expenses/{expense_id}/paid",
            axum::routing::put(huddle_server::expenses::mark_split_paid),
        )
        .layer(session_layer)
        .with_state(app_state.clone());

    Ok(TestApp {
        router,
        state: app_state,
    })
}

pub async fn create_test_user(
    app_state: &AppState,
    username: &str,
    password: &str,
) -> anyhow::Result<String> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString},
    };
    use password_hash::rand_core::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4().to_string();

    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO users (id, name, password_hash) VALUES (?, ?, ?)",
        (user_id.as_str(), username, hash.as_str()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create test user: {}", e))?;

    Ok(user_id)
}

pub async fn create_test_project(
    app_state: &AppState,
    owner_id: &str,
    name: &str,
) -> anyhow::Result<String> {
    let project_id = Uuid::new_v4().to_string();
    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)?;

    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO projects (id, name, owner_user_id, created_at) VALUES (?, ?, ?, ?)",
        (project_id.as_str(), name, owner_id, now.as_str()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create test project: {}", e))?;

    Ok(project_id)
}

pub async fn add_test_member(
    app_state: &AppState,
    project_id: &str,
    user_id: &str,
) -> anyhow::Result<()> {
    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)?;

    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO project_members (project_id, user_id, added_at) VALUES (?, ?, ?)",
        (project_id, user_id, now.as_str()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to add test member: {}", e))?;

    Ok(())
}

pub async fn login_user(app: &Router, username: &str, password: &str) -> anyhow::Result<String> {
    let payload = serde_json::json!({
        "username": username,
        "password": password
    });

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v: &axum::http::HeaderValue| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("No session cookie in response"))?;

    Ok(set_cookie.to_string())
}

#[allow(dead_code)]
pub async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
    payload: serde_json::Value,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("cookie", cookie)
        .body(Body::from(payload.to_string()))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;

    let json = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(String::from_utf8(body.to_vec())?),
    };

    Ok((status, json))
}

#[allow(dead_code)]
pub async fn empty_request(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;

    let json = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(String::from_utf8(body.to_vec())?),
    };

    Ok((status, json))
}
