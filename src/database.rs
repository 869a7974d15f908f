use anyhow::Result;
use libsql::{Builder, Connection};
use std::future::Future;
use std::pin::Pin;
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    owner_user_id TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    FOREIGN KEY (owner_user_id) REFERENCES users(id)
);
"#;

const CREATE_PROJECT_MEMBERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS project_members (
    project_id TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    added_at   TEXT NOT NULL,
    PRIMARY KEY (project_id, user_id),
    FOREIGN KEY (project_id) REFERENCES projects(id)
);
"#;

const CREATE_EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id          TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT,
    amount      REAL NOT NULL,
    status      TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects(id)
);
"#;

const CREATE_EXPENSE_SPLITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expense_splits (
    expense_id TEXT    NOT NULL,
    user_id    TEXT    NOT NULL,
    amount     REAL    NOT NULL,
    is_paid    BOOLEAN NOT NULL DEFAULT FALSE,
    position   INTEGER NOT NULL,
    PRIMARY KEY (expense_id, user_id),
    FOREIGN KEY (expense_id) REFERENCES expenses(id)
);
"#;

const CREATE_EXPENSES_PROJECT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_expenses_project ON expenses(project_id, created_at);
"#;

const CREATE_PROJECT_MEMBERS_USER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_project_members_user ON project_members(user_id);
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Opens (or creates) the single shared database file and ensures the
/// schema exists.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join("huddle.db");
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_PROJECTS_TABLE, ()).await?;
    conn.execute(CREATE_PROJECT_MEMBERS_TABLE, ()).await?;
    conn.execute(CREATE_EXPENSES_TABLE, ()).await?;
    conn.execute(CREATE_EXPENSE_SPLITS_TABLE, ()).await?;
    conn.execute(CREATE_EXPENSES_PROJECT_INDEX, ()).await?;
    conn.execute(CREATE_PROJECT_MEMBERS_USER_INDEX, ()).await?;

    Ok(Arc::new(RwLock::new(conn)))
}

/// Execute a function within a database transaction, returning handler-compatible errors.
///
/// The connection write lock is held for the whole transaction, so callers
/// observe the expense row set before or after the closure, never between.
/// The closure must return a boxed future to handle lifetime issues with
/// async closures.
pub async fn with_transaction<F, T, E>(db_conn: &Db, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a Connection) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    E: From<TransactionError>,
{
    // Acquire write lock for exclusive access during transaction
    let conn = db_conn.write().await;

    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|_| TransactionError::Begin)?;

    match f(&*conn).await {
        Ok(result) => {
            conn.execute("COMMIT", ())
                .await
                .map_err(|_| TransactionError::Commit)?;
            Ok(result)
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            Err(e)
        }
    }
}

/// Errors that can occur during transaction management
#[derive(Debug)]
pub enum TransactionError {
    Begin,
    Commit,
}
