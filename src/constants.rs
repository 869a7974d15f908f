// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";

// Session configuration
pub const SESSION_NAME: &str = "huddle_session";
pub const SESSION_USER_KEY: &str = "current_user";
pub const SESSION_EXPIRY_DAYS: i64 = 30;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;

// Validation limits
pub const MAX_PROJECT_NAME_LENGTH: usize = 100;
pub const MAX_EXPENSE_TITLE_LENGTH: usize = 200;
pub const MAX_EXPENSE_DESCRIPTION_LENGTH: usize = 1000;
pub const MIN_EXPENSE_AMOUNT: f64 = 0.01;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Expense settlement status. `cancelled` is declared but no operation
// currently transitions an expense into it.
pub const EXPENSE_STATUS_PENDING: &str = "pending";
pub const EXPENSE_STATUS_FULLY_PAID: &str = "fully_paid";
pub const EXPENSE_STATUS_CANCELLED: &str = "cancelled";

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_INVALID_SESSION: &str = "Invalid session";
pub const ERR_UNAUTHORIZED: &str = "Not logged in";
