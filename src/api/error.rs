use thiserror::Error;

/// Message used when a failed response carries no usable error body.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is what the backend said, or
    /// [`GENERIC_FAILURE`].
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("File error: {0}")]
    File(String),

    #[error("Missing required IDs")]
    MissingScope,
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::File(err.to_string())
    }
}

impl ApiError {
    /// Build the error for a non-2xx response from its raw body, preferring
    /// the `message` field, then `error`, then the generic message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error"].iter().find_map(|key| {
                    value
                        .get(key)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        ApiError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
