use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::EXPENSE_STATUS_PENDING;
use crate::error::LedgerError;
use crate::membership::MembershipOracle;
use crate::models::{CreateExpensePayload, Expense};
use crate::store::ExpenseStore;
use crate::utils::{compute_equal_splits, validate_expense_input};

/// The four authorized ledger operations. Owns the sequencing of
/// authorization, split computation, persistence and status derivation;
/// validation and authorization all run before the first write, so a
/// failed call leaves no partial state behind.
#[derive(Clone)]
pub struct LedgerService {
    store: ExpenseStore,
    members: MembershipOracle,
    restrict_paid_toggle_to_self: bool,
}

impl LedgerService {
    pub fn new(store: ExpenseStore, members: MembershipOracle) -> Self {
        Self {
            store,
            members,
            restrict_paid_toggle_to_self: false,
        }
    }

    /// Restricts `mark_split_paid` so members may only toggle their own
    /// split. The default is permissive: any project member may mark any
    /// split, which lets the payer record who has settled up.
    pub fn with_restricted_paid_toggle(mut self, restrict: bool) -> Self {
        self.restrict_paid_toggle_to_self = restrict;
        self
    }

    pub async fn create_expense(
        &self,
        project_id: &str,
        actor_id: &str,
        payload: CreateExpensePayload,
    ) -> Result<Expense, LedgerError> {
        let membership = self
            .members
            .membership(project_id)
            .await?
            .filter(|membership| membership.contains(actor_id))
            .ok_or(LedgerError::Unauthorized)
            .inspect_err(|_| {
                warn!(project_id, actor_id, "expense creation denied");
            })?;

        let title = payload.title.trim().to_string();
        let description = payload
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        validate_expense_input(
            &title,
            description.as_deref(),
            payload.amount,
            &payload.split_user_ids,
        )?;

        let splits = compute_equal_splits(payload.amount, &payload.split_user_ids, &membership)?;

        let now = now_rfc3339()?;
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            title,
            description,
            amount: payload.amount,
            created_by: actor_id.to_string(),
            splits,
            status: EXPENSE_STATUS_PENDING.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.store.insert_expense(&expense).await?;

        info!(
            project_id,
            expense_id = expense.id.as_str(),
            participants = expense.splits.len(),
            "expense created"
        );

        Ok(expense)
    }

    pub async fn list_expenses(
        &self,
        project_id: &str,
        actor_id: &str,
    ) -> Result<Vec<Expense>, LedgerError> {
        if !self.members.is_member_or_owner(project_id, actor_id).await? {
            warn!(project_id, actor_id, "expense listing denied");
            return Err(LedgerError::Unauthorized);
        }

        self.store.find_by_project(project_id).await
    }

    pub async fn mark_split_paid(
        &self,
        project_id: &str,
        expense_id: &str,
        actor_id: &str,
        target_user_id: &str,
        is_paid: bool,
    ) -> Result<Expense, LedgerError> {
        if !self.members.is_member_or_owner(project_id, actor_id).await? {
            warn!(project_id, actor_id, expense_id, "split toggle denied");
            return Err(LedgerError::Unauthorized);
        }

        if self.restrict_paid_toggle_to_self && actor_id != target_user_id {
            warn!(project_id, actor_id, expense_id, "split toggle denied");
            return Err(LedgerError::Unauthorized);
        }

        let expense = self
            .store
            .find_by_id(expense_id)
            .await?
            .filter(|expense| expense.project_id == project_id)
            .ok_or(LedgerError::ExpenseNotFound)?;

        if !expense
            .splits
            .iter()
            .any(|split| split.user_id == target_user_id)
        {
            return Err(LedgerError::SplitNotFound);
        }

        let now = now_rfc3339()?;
        let updated = self
            .store
            .update_split(expense_id, target_user_id, is_paid, &now)
            .await?
            // The expense can disappear between the lookup and the update;
            // a vanished row reads the same as a missing expense.
            .ok_or(LedgerError::ExpenseNotFound)?;

        info!(
            project_id,
            expense_id,
            target_user_id,
            is_paid,
            status = updated.status.as_str(),
            "split paid flag updated"
        );

        Ok(updated)
    }

    pub async fn delete_expense(
        &self,
        project_id: &str,
        expense_id: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let expense = self
            .store
            .find_by_id(expense_id)
            .await?
            .filter(|expense| expense.project_id == project_id)
            .ok_or(LedgerError::ExpenseNotFound)?;

        // Deletion is narrower than the other operations: only the
        // recording member or the project owner may remove an expense.
        let is_owner = self.members.is_owner(project_id, actor_id).await?;
        if expense.created_by != actor_id && !is_owner {
            warn!(project_id, actor_id, expense_id, "expense deletion denied");
            return Err(LedgerError::Unauthorized);
        }

        self.store.remove(expense_id).await?;

        info!(project_id, expense_id, actor_id, "expense deleted");

        Ok(())
    }
}

fn now_rfc3339() -> Result<String, LedgerError> {
    crate::utils::now_rfc3339()
        .map_err(|_| LedgerError::StoreUnavailable("failed to format timestamp"))
}
