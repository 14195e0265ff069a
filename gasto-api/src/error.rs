//! Failure taxonomy for backend calls and the user-facing messages they map to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Request rejected, refused or timed out before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 401
    #[error("not authenticated")]
    Unauthenticated,

    /// Any other non-success status, with the detail the server sent (may be empty)
    #[error("server error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response arrived but did not have the shape we expect
    #[error("unexpected response shape: {0}")]
    DataShape(String),

    /// The backend answered but declined the action (e.g. apply not confirmed)
    #[error("action rejected: {0}")]
    Rejected(String),
}

/// Texts shown to the user when a fetch fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub not_authenticated: String,
    pub generic_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            not_authenticated: "No has iniciado sesión. Inicia sesión para ver tus datos.".to_string(),
            generic_error: "No se pudieron cargar los datos. Intenta de nuevo.".to_string(),
        }
    }
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }

    /// Message to display: server detail when there is one, otherwise the generic text
    pub fn user_message(&self, messages: &Messages) -> String {
        match self {
            ApiError::Unauthenticated => messages.not_authenticated.clone(),
            ApiError::Status { message, .. } | ApiError::Rejected(message)
                if !message.trim().is_empty() =>
            {
                message.trim().to_string()
            }
            _ => messages.generic_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let m = Messages::default();
        assert_eq!(ApiError::Unauthenticated.user_message(&m), m.not_authenticated);
        assert_eq!(ApiError::Network("timed out".into()).user_message(&m), m.generic_error);
        assert_eq!(ApiError::DataShape("x".into()).user_message(&m), m.generic_error);

        let with_detail = ApiError::Status {
            status: 500,
            message: "Base de datos no disponible".into(),
        };
        assert_eq!(with_detail.user_message(&m), "Base de datos no disponible");

        let empty = ApiError::Status {
            status: 502,
            message: "  ".into(),
        };
        assert_eq!(empty.user_message(&m), m.generic_error);
    }
}
