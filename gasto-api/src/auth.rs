use reqwest::header::{HeaderValue, InvalidHeaderValue};

/// Credentials passed explicitly into the client. Nothing reads tokens ambiently.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Blank tokens are treated as no token
    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn authorization(&self) -> Option<Result<HeaderValue, InvalidHeaderValue>> {
        self.token
            .as_ref()
            .map(|t| HeaderValue::from_str(&format!("Bearer {t}")))
    }
}

// Keep the token out of logs
impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_anonymous() {
        assert!(!AuthContext::bearer("   ").is_authenticated());
        assert!(AuthContext::anonymous().authorization().is_none());
    }

    #[test]
    fn test_bearer_header_and_redacted_debug() {
        let auth = AuthContext::bearer(" abc123 ");
        let header = auth.authorization().unwrap().unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer abc123");
        assert!(!format!("{auth:?}").contains("abc123"));
    }
}
