use libsql::Connection;

use crate::database::{Db, with_transaction};
use crate::error::LedgerError;
use crate::models::{Expense, Split};
use crate::utils::settlement_status;

/// Persistence for expenses and their splits. Each mutation runs inside a
/// single transaction under the connection write lock, so concurrent
/// callers always observe a complete expense, never a half-written one.
#[derive(Clone)]
pub struct ExpenseStore {
    db: Db,
}

impl ExpenseStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Persists a fully-built expense and its split rows.
    pub async fn insert_expense(&self, expense: &Expense) -> Result<(), LedgerError> {
        with_transaction(&self.db, |conn| {
            let expense = expense.clone();
            Box::pin(async move {
                conn.execute(
                    "INSERT INTO expenses (id, project_id, title, description, amount, status, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        expense.id.as_str(),
                        expense.project_id.as_str(),
                        expense.title.as_str(),
                        expense.description.as_deref(),
                        expense.amount,
                        expense.status.as_str(),
                        expense.created_by.as_str(),
                        expense.created_at.as_str(),
                        expense.updated_at.as_str(),
                    ),
                )
                .await
                .map_err(|_| LedgerError::StoreUnavailable("expense creation failed"))?;

                for (position, split) in expense.splits.iter().enumerate() {
                    conn.execute(
                        "INSERT INTO expense_splits (expense_id, user_id, amount, is_paid, position) VALUES (?, ?, ?, ?, ?)",
                        (
                            expense.id.as_str(),
                            split.user_id.as_str(),
                            split.amount,
                            split.is_paid,
                            position as i64,
                        ),
                    )
                    .await
                    .map_err(|_| LedgerError::StoreUnavailable("split creation failed"))?;
                }

                Ok(())
            })
        })
        .await
    }

    pub async fn find_by_id(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let conn = self.db.read().await;
        read_expense(&conn, expense_id).await
    }

    /// All expenses of a project, newest first.
    pub async fn find_by_project(&self, project_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let conn = self.db.read().await;

        let mut rows = conn
            .query(
                "SELECT id FROM expenses WHERE project_id = ? ORDER BY created_at DESC",
                [project_id],
            )
            .await
            .map_err(|_| LedgerError::StoreUnavailable("failed to query project expenses"))?;

        let mut expense_ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|_| LedgerError::StoreUnavailable("failed to read expense row"))?
        {
            let id: String = row
                .get(0)
                .map_err(|_| LedgerError::StoreUnavailable("invalid expense id"))?;
            expense_ids.push(id);
        }

        let mut expenses = Vec::with_capacity(expense_ids.len());
        for id in expense_ids {
            if let Some(expense) = read_expense(&conn, &id).await? {
                expenses.push(expense);
            }
        }

        Ok(expenses)
    }

    /// Sets one split's paid flag and rederives the expense status from the
    /// post-update split state, all inside one transaction.
    ///
    /// The recompute MUST read the splits back after the flag write: two
    /// concurrent calls against different splits of the same expense
    /// serialize on the write lock, and whichever commits second derives
    /// the status from the union of both changes. Deriving from any state
    /// captured before the write would let a stale `pending`/`fully_paid`
    /// overwrite the other call's effect.
    ///
    /// Returns the re-read expense, or `None` when no split row matched.
    pub async fn update_split(
        &self,
        expense_id: &str,
        user_id: &str,
        is_paid: bool,
        now: &str,
    ) -> Result<Option<Expense>, LedgerError> {
        with_transaction(&self.db, |conn| {
            let expense_id = expense_id.to_string();
            let user_id = user_id.to_string();
            let now = now.to_string();
            Box::pin(async move {
                let affected_rows = conn
                    .execute(
                        "UPDATE expense_splits SET is_paid = ? WHERE expense_id = ? AND user_id = ?",
                        (is_paid, expense_id.as_str(), user_id.as_str()),
                    )
                    .await
                    .map_err(|_| LedgerError::StoreUnavailable("failed to update split"))?;

                if affected_rows == 0 {
                    return Ok(None);
                }

                // Read-after-write: the flag just written is part of the
                // state the status is derived from.
                let splits = read_splits(conn, &expense_id).await?;
                let status = settlement_status(&splits);

                conn.execute(
                    "UPDATE expenses SET status = ?, updated_at = ? WHERE id = ?",
                    (status, now.as_str(), expense_id.as_str()),
                )
                .await
                .map_err(|_| LedgerError::StoreUnavailable("failed to update expense status"))?;

                read_expense(conn, &expense_id).await
            })
        })
        .await
    }

    /// Permanently removes an expense and its splits. No tombstone.
    pub async fn remove(&self, expense_id: &str) -> Result<(), LedgerError> {
        with_transaction(&self.db, |conn| {
            let expense_id = expense_id.to_string();
            Box::pin(async move {
                conn.execute(
                    "DELETE FROM expense_splits WHERE expense_id = ?",
                    [expense_id.as_str()],
                )
                .await
                .map_err(|_| LedgerError::StoreUnavailable("failed to delete splits"))?;

                conn.execute("DELETE FROM expenses WHERE id = ?", [expense_id.as_str()])
                    .await
                    .map_err(|_| LedgerError::StoreUnavailable("failed to delete expense"))?;

                Ok(())
            })
        })
        .await
    }
}

async fn read_splits(conn: &Connection, expense_id: &str) -> Result<Vec<Split>, LedgerError> {
    let mut rows = conn
        .query(
            "SELECT user_id, amount, is_paid FROM expense_splits WHERE expense_id = ? ORDER BY position",
            [expense_id],
        )
        .await
        .map_err(|_| LedgerError::StoreUnavailable("failed to query splits"))?;

    let mut splits = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|_| LedgerError::StoreUnavailable("failed to read split row"))?
    {
        let user_id: String = row
            .get(0)
            .map_err(|_| LedgerError::StoreUnavailable("invalid split data"))?;
        let amount: f64 = row
            .get(1)
            .map_err(|_| LedgerError::StoreUnavailable("invalid split data"))?;
        let is_paid: bool = row
            .get(2)
            .map_err(|_| LedgerError::StoreUnavailable("invalid split data"))?;
        splits.push(Split {
            user_id,
            amount,
            is_paid,
        });
    }

    Ok(splits)
}

async fn read_expense(conn: &Connection, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
    let mut rows = conn
        .query(
            "SELECT id, project_id, title, description, amount, status, created_by, created_at, updated_at FROM expenses WHERE id = ?",
            [expense_id],
        )
        .await
        .map_err(|_| LedgerError::StoreUnavailable("failed to query expense"))?;

    let row = match rows
        .next()
        .await
        .map_err(|_| LedgerError::StoreUnavailable("failed to read expense row"))?
    {
        Some(row) => row,
        None => return Ok(None),
    };

    let id: String = row
        .get(0)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let project_id: String = row
        .get(1)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let title: String = row
        .get(2)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let description: Option<String> = row
        .get(3)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let amount: f64 = row
        .get(4)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let status: String = row
        .get(5)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let created_by: String = row
        .get(6)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let created_at: String = row
        .get(7)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;
    let updated_at: String = row
        .get(8)
        .map_err(|_| LedgerError::StoreUnavailable("invalid expense data"))?;

    let splits = read_splits(conn, expense_id).await?;

    Ok(Some(Expense {
        id,
        project_id,
        title,
        description,
        amount,
        created_by,
        splits,
        status,
        created_at,
        updated_at,
    }))
}
