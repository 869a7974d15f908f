use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub owner_user_id: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateProjectPayload {
    pub name: String,
}

#[derive(Deserialize)]
pub struct AddProjectMemberPayload {
    pub user_id: String,
}

/// Owner plus members of a project, as seen at one point in time. Split
/// validation runs against this snapshot.
#[derive(Debug, Clone)]
pub struct ProjectMembership {
    pub owner_id: String,
    pub member_ids: Vec<String>,
}

impl ProjectMembership {
    pub fn contains(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.member_ids.iter().any(|id| id == user_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Split {
    pub user_id: String,
    pub amount: f64,
    pub is_paid: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Expense {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub created_by: String,
    pub splits: Vec<Split>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateExpensePayload {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub split_user_ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct MarkSplitPaidPayload {
    pub user_id: String,
    pub is_paid: bool,
}

#[derive(Serialize)]
pub struct GetExpensesResponse {
    pub expenses: Vec<Expense>,
}

#[derive(Serialize)]
pub struct GetProjectsResponse {
    pub projects: Vec<Project>,
}
