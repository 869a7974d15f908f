use crate::constants::*;

/// Server configuration loaded from the environment.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub session_secret: String,
    /// When set, a member may only toggle their own split's paid flag.
    /// Off by default: the payer marking other members as settled is the
    /// expected flow.
    pub restrict_paid_toggle_to_self: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

        let session_secret = std::env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET environment variable is required".to_string())?;

        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(format!(
                "SESSION_SECRET must be at least {} characters",
                MIN_SESSION_SECRET_LENGTH
            ));
        }

        let restrict_paid_toggle_to_self = std::env::var("RESTRICT_PAID_TOGGLE_TO_SELF")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            data_path,
            session_secret,
            restrict_paid_toggle_to_self,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
