use axum::http::StatusCode;

use crate::constants::*;
use crate::error::LedgerError;
use crate::models::{ProjectMembership, Split};

pub fn db_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ERR_DATABASE_OPERATION.to_string(),
    )
}

pub fn db_error_with_context(context: &str) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {}", context),
    )
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} cannot be empty", field_name),
        ));
    }
    if value.len() > max_length {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} must be less than {} characters", field_name, max_length),
        ));
    }
    Ok(())
}

pub fn now_rfc3339() -> Result<String, (StatusCode, String)> {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Validates the expense fields that need no database access.
///
/// Checks:
/// - Title is non-empty and within length bounds
/// - Description, when present, is within length bounds
/// - Amount is finite and at least the configured minimum
/// - The participant list is non-empty and has no duplicates
pub fn validate_expense_input(
    title: &str,
    description: Option<&str>,
    amount: f64,
    split_user_ids: &[String],
) -> Result<(), LedgerError> {
    if title.trim().is_empty() {
        return Err(LedgerError::Validation("Title cannot be empty".to_string()));
    }
    if title.len() > MAX_EXPENSE_TITLE_LENGTH {
        return Err(LedgerError::Validation(format!(
            "Title must be less than {} characters",
            MAX_EXPENSE_TITLE_LENGTH
        )));
    }

    if let Some(description) = description {
        if description.len() > MAX_EXPENSE_DESCRIPTION_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Description must be less than {} characters",
                MAX_EXPENSE_DESCRIPTION_LENGTH
            )));
        }
    }

    if !amount.is_finite() || amount < MIN_EXPENSE_AMOUNT {
        return Err(LedgerError::Validation(format!(
            "Amount must be a finite number of at least {}",
            MIN_EXPENSE_AMOUNT
        )));
    }

    if split_user_ids.is_empty() {
        return Err(LedgerError::Validation(
            "At least one split participant is required".to_string(),
        ));
    }

    let mut seen_ids = std::collections::HashSet::new();
    for user_id in split_user_ids {
        if !seen_ids.insert(user_id.as_str()) {
            return Err(LedgerError::Validation(format!(
                "Duplicate participant: {}",
                user_id
            )));
        }
    }

    Ok(())
}

/// Turns `(amount, participants)` into the split rows for a new expense.
///
/// Every participant must appear in the membership snapshot (owner or
/// member); otherwise the whole operation fails with `InvalidParticipant`
/// naming every offending id. Each participant receives an equal share of
/// `amount / n` computed with plain floating-point division. The sum of the
/// shares can differ from `amount` by a rounding error for counts that do
/// not divide evenly; no remainder is reassigned.
pub fn compute_equal_splits(
    amount: f64,
    split_user_ids: &[String],
    membership: &ProjectMembership,
) -> Result<Vec<Split>, LedgerError> {
    let outsiders: Vec<String> = split_user_ids
        .iter()
        .filter(|user_id| !membership.contains(user_id))
        .cloned()
        .collect();

    if !outsiders.is_empty() {
        return Err(LedgerError::InvalidParticipant {
            user_ids: outsiders,
        });
    }

    let per_share = amount / split_user_ids.len() as f64;

    Ok(split_user_ids
        .iter()
        .map(|user_id| Split {
            user_id: user_id.clone(),
            amount: per_share,
            is_paid: false,
        })
        .collect())
}

/// Derives the aggregate settlement status from the per-split paid flags.
///
/// `fully_paid` iff every split is paid, else `pending`. Callers must apply
/// this to the latest split state after every paid-flag mutation; a status
/// derived from a stale read reintroduces the concurrent-update race.
pub fn settlement_status(splits: &[Split]) -> &'static str {
    if splits.iter().all(|split| split.is_paid) {
        EXPENSE_STATUS_FULLY_PAID
    } else {
        EXPENSE_STATUS_PENDING
    }
}
