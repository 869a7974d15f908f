use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::get_current_user;
use crate::models::{
    CreateExpensePayload, Expense, GetExpensesResponse, MarkSplitPaidPayload,
};

pub async fn create_expense(
    State(app_state): State<AppState>,
    session: Session,
    Path(project_id): Path<String>,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let expense = app_state
        .ledger
        .create_expense(&project_id, &user.id, payload)
        .await
        .map_err(<(StatusCode, String)>::from)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn list_expenses(
    State(app_state): State<AppState>,
    session: Session,
    Path(project_id): Path<String>,
) -> Result<(StatusCode, Json<GetExpensesResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let expenses = app_state
        .ledger
        .list_expenses(&project_id, &user.id)
        .await
        .map_err(<(StatusCode, String)>::from)?;

    Ok((StatusCode::OK, Json(GetExpensesResponse { expenses })))
}

pub async fn mark_split_paid(
    State(app_state): State<AppState>,
    session: Session,
    Path((project_id, expense_id)): Path<(String, String)>,
    Json(payload): Json<MarkSplitPaidPayload>,
) -> Result<(StatusCode, Json<Expense>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let expense = app_state
        .ledger
        .mark_split_paid(
            &project_id,
            &expense_id,
            &user.id,
            &payload.user_id,
            payload.is_paid,
        )
        .await
        .map_err(<(StatusCode, String)>::from)?;

    Ok((StatusCode::OK, Json(expense)))
}

pub async fn delete_expense(
    State(app_state): State<AppState>,
    session: Session,
    Path((project_id, expense_id)): Path<(String, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    app_state
        .ledger
        .delete_expense(&project_id, &expense_id, &user.id)
        .await
        .map_err(<(StatusCode, String)>::from)?;

    Ok(StatusCode::NO_CONTENT)
}
