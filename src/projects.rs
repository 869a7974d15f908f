use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{AddProjectMemberPayload, CreateProjectPayload, GetProjectsResponse, Project};
use crate::utils::{db_error, db_error_with_context, now_rfc3339, validate_string_length};

pub fn validate_project_name(name: &str) -> Result<(), (StatusCode, String)> {
    validate_string_length(name, "Project name", MAX_PROJECT_NAME_LENGTH)
}

fn extract_project_from_row(row: libsql::Row) -> Result<Project, (StatusCode, String)> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid project data"))?;
    let name: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid project data"))?;
    let owner_user_id: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid project data"))?;
    let created_at: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid project data"))?;

    Ok(Project {
        id,
        name,
        owner_user_id,
        created_at,
    })
}

pub async fn create_project(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    validate_project_name(&payload.name)?;

    let project = Project {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        owner_user_id: user.id,
        created_at: now_rfc3339()?,
    };

    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO projects (id, name, owner_user_id, created_at) VALUES (?, ?, ?, ?)",
        (
            project.id.as_str(),
            project.name.as_str(),
            project.owner_user_id.as_str(),
            project.created_at.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("project creation failed"))?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn add_project_member(
    State(app_state): State<AppState>,
    session: Session,
    Path(project_id): Path<String>,
    Json(payload): Json<AddProjectMemberPayload>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.write().await;

    let mut rows = conn
        .query(
            "SELECT owner_user_id FROM projects WHERE id = ?",
            [project_id.as_str()],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query project"))?;

    let owner_user_id: String = match rows.next().await.map_err(|_| db_error())? {
        Some(row) => row.get(0).map_err(|_| db_error())?,
        None => return Err((StatusCode::NOT_FOUND, "Project not found".to_string())),
    };

    // Only the owner manages membership
    if owner_user_id != user.id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only the project owner can add members".to_string(),
        ));
    }

    if payload.user_id == owner_user_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "Owner is already part of the project".to_string(),
        ));
    }

    let mut user_rows = conn
        .query("SELECT id FROM users WHERE id = ?", [payload.user_id.as_str()])
        .await
        .map_err(|_| db_error_with_context("failed to query user"))?;

    if user_rows.next().await.map_err(|_| db_error())?.is_none() {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }

    let mut member_rows = conn
        .query(
            "SELECT user_id FROM project_members WHERE project_id = ? AND user_id = ?",
            (project_id.as_str(), payload.user_id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query project members"))?;

    if member_rows.next().await.map_err(|_| db_error())?.is_some() {
        return Err((
            StatusCode::CONFLICT,
            "User is already a project member".to_string(),
        ));
    }

    let added_at = now_rfc3339()?;
    conn.execute(
        "INSERT INTO project_members (project_id, user_id, added_at) VALUES (?, ?, ?)",
        (
            project_id.as_str(),
            payload.user_id.as_str(),
            added_at.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("failed to add project member"))?;

    Ok(StatusCode::CREATED)
}

pub async fn list_projects(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<GetProjectsResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, name, owner_user_id, created_at FROM projects WHERE owner_user_id = ? OR id IN (SELECT project_id FROM project_members WHERE user_id = ?) ORDER BY created_at DESC",
            (user.id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query projects"))?;

    let mut projects = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        projects.push(extract_project_from_row(row)?);
    }

    Ok((StatusCode::OK, Json(GetProjectsResponse { projects })))
}
