use crate::database::Db;
use crate::error::LedgerError;
use crate::models::ProjectMembership;

/// Answers membership questions for project authorization. The projects
/// and project_members tables are shared with the project handlers; the
/// oracle never assumes exclusive access to them.
#[derive(Clone)]
pub struct MembershipOracle {
    db: Db,
}

impl MembershipOracle {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Full membership snapshot (owner + members), or `None` when the
    /// project does not exist.
    pub async fn membership(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectMembership>, LedgerError> {
        let conn = self.db.read().await;

        let mut rows = conn
            .query(
                "SELECT owner_user_id FROM projects WHERE id = ?",
                [project_id],
            )
            .await
            .map_err(|_| LedgerError::StoreUnavailable("failed to query project"))?;

        let owner_id: String = match rows
            .next()
            .await
            .map_err(|_| LedgerError::StoreUnavailable("failed to read project row"))?
        {
            Some(row) => row
                .get(0)
                .map_err(|_| LedgerError::StoreUnavailable("invalid project owner"))?,
            None => return Ok(None),
        };

        let mut member_rows = conn
            .query(
                "SELECT user_id FROM project_members WHERE project_id = ? ORDER BY added_at",
                [project_id],
            )
            .await
            .map_err(|_| LedgerError::StoreUnavailable("failed to query project members"))?;

        let mut member_ids = Vec::new();
        while let Some(row) = member_rows
            .next()
            .await
            .map_err(|_| LedgerError::StoreUnavailable("failed to read project member row"))?
        {
            let user_id: String = row
                .get(0)
                .map_err(|_| LedgerError::StoreUnavailable("invalid project member"))?;
            member_ids.push(user_id);
        }

        Ok(Some(ProjectMembership {
            owner_id,
            member_ids,
        }))
    }

    pub async fn is_member_or_owner(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<bool, LedgerError> {
        match self.membership(project_id).await? {
            Some(membership) => Ok(membership.contains(user_id)),
            None => Ok(false),
        }
    }

    pub async fn is_owner(&self, project_id: &str, user_id: &str) -> Result<bool, LedgerError> {
        match self.membership(project_id).await? {
            Some(membership) => Ok(membership.owner_id == user_id),
            None => Ok(false),
        }
    }
}
