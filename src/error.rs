use axum::http::StatusCode;
use thiserror::Error;

use crate::database::TransactionError;

/// Failure kinds surfaced by the ledger operations. All of them are
/// terminal for the call that produced them; `StoreUnavailable` is the only
/// kind an outer layer might reasonably retry.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("actor is not authorized for this operation")]
    Unauthorized,

    #[error("participants are not project members: {}", .user_ids.join(", "))]
    InvalidParticipant { user_ids: Vec<String> },

    #[error("expense not found")]
    ExpenseNotFound,

    #[error("no split for the given user in this expense")]
    SplitNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(&'static str),
}

impl From<TransactionError> for LedgerError {
    fn from(value: TransactionError) -> Self {
        match value {
            TransactionError::Begin => LedgerError::StoreUnavailable("failed to begin transaction"),
            TransactionError::Commit => {
                LedgerError::StoreUnavailable("failed to commit transaction")
            }
        }
    }
}

impl From<LedgerError> for (StatusCode, String) {
    fn from(value: LedgerError) -> Self {
        let status = match &value {
            LedgerError::Unauthorized => StatusCode::FORBIDDEN,
            LedgerError::InvalidParticipant { .. } | LedgerError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::ExpenseNotFound | LedgerError::SplitNotFound => StatusCode::NOT_FOUND,
            LedgerError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, value.to_string())
    }
}
