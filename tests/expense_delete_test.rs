mod common;

use axum::http::StatusCode;
use common::{
    add_test_member, create_test_project, create_test_user, empty_request, json_request,
    login_user, setup_test_app,
};
use serde_json::json;
use uuid::Uuid;

struct Scenario {
    app: common::TestApp,
    project_id: String,
    expense_id: String,
    alice_cookie: String,
    bob_cookie: String,
    carol_cookie: String,
}

/// Alice owns the project; bob records the expense; carol is a bystander
/// member.
async fn setup_scenario() -> anyhow::Result<Scenario> {
    let app = setup_test_app().await?;

    let alice_id = create_test_user(&app.state, "alice", "password123").await?;
    let bob_id = create_test_user(&app.state, "bob", "password123").await?;
    let carol_id = create_test_user(&app.state, "carol", "password123").await?;

    let project_id = create_test_project(&app.state, &alice_id, "Ski Trip").await?;
    add_test_member(&app.state, &project_id, &bob_id).await?;
    add_test_member(&app.state, &project_id, &carol_id).await?;

    let alice_cookie = login_user(&app.router, "alice", "password123").await?;
    let bob_cookie = login_user(&app.router, "bob", "password123").await?;
    let carol_cookie = login_user(&app.router, "carol", "password123").await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/projects/{}/expenses", project_id),
        &bob_cookie,
        json!({
            "title": "Firewood",
            "amount": 30.0,
            "split_user_ids": [alice_id, bob_id, carol_id]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let expense_id = body["id"].as_str().expect("expense id").to_string();

    Ok(Scenario {
        app,
        project_id,
        expense_id,
        alice_cookie,
        bob_cookie,
        carol_cookie,
    })
}

fn expense_uri(s: &Scenario) -> String {
    format!("/projects/{}/expenses/{}", s.project_id, s.expense_id)
}

async fn count_expenses(s: &Scenario) -> anyhow::Result<usize> {
    let (_, body) = empty_request(
        &s.app.router,
        "GET",
        &format!("/projects/{}/expenses", s.project_id),
        &s.alice_cookie,
    )
    .await?;
    Ok(body["expenses"].as_array().expect("expenses").len())
}

#[tokio::test]
async fn test_creator_can_delete_own_expense() -> anyhow::Result<()> {
    let s = setup_scenario().await?;

    let (status, _) = empty_request(&s.app.router, "DELETE", &expense_uri(&s), &s.bob_cookie).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(count_expenses(&s).await?, 0, "expense is gone for good");

    Ok(())
}

#[tokio::test]
async fn test_project_owner_can_delete_any_expense() -> anyhow::Result<()> {
    let s = setup_scenario().await?;

    // Alice did not record the expense but owns the project
    let (status, _) =
        empty_request(&s.app.router, "DELETE", &expense_uri(&s), &s.alice_cookie).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(count_expenses(&s).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_plain_member_cannot_delete() -> anyhow::Result<()> {
    let s = setup_scenario().await?;

    // Carol is a member but neither creator nor owner
    let (status, _) =
        empty_request(&s.app.router, "DELETE", &expense_uri(&s), &s.carol_cookie).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The expense is still retrievable afterwards
    assert_eq!(count_expenses(&s).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_delete_missing_expense_not_found() -> anyhow::Result<()> {
    let s = setup_scenario().await?;

    let (status, _) = empty_request(
        &s.app.router,
        "DELETE",
        &format!("/projects/{}/expenses/{}", s.project_id, Uuid::new_v4()),
        &s.bob_cookie,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_delete_is_permanent() -> anyhow::Result<()> {
    let s = setup_scenario().await?;

    let (status, _) = empty_request(&s.app.router, "DELETE", &expense_uri(&s), &s.bob_cookie).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // A second delete finds nothing; there is no tombstone to resurrect
    let (status, _) = empty_request(&s.app.router, "DELETE", &expense_uri(&s), &s.bob_cookie).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Split rows went with the expense
    let conn = s.app.state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM expense_splits WHERE expense_id = ?",
            [s.expense_id.as_str()],
        )
        .await?;
    let row = rows.next().await?.expect("count row");
    let count: u32 = row.get(0)?;
    assert_eq!(count, 0, "splits must be removed with the expense");

    Ok(())
}
