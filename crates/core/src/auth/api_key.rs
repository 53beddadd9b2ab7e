//! Static API key checks.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Compares a presented key against the one from the config. The key travels
/// as `Authorization: Bearer <key>` or, for clients that cannot set an
/// authorization header, as a bare `X-API-Key` header.
pub struct ApiKeyAuthenticator {
    expected: String,
}

impl ApiKeyAuthenticator {
    pub fn new(expected: String) -> Self {
        Self { expected }
    }

    fn presented_key(request: &AuthRequest) -> Option<&str> {
        request
            .headers
            .get("authorization")
            .and_then(|value| value.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, key)| key.trim())
            .or_else(|| request.headers.get("x-api-key").map(String::as_str))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let presented = Self::presented_key(request).ok_or(AuthError::MissingCredentials)?;

        // Comparison time must not depend on where the first mismatch sits
        if constant_time_eq(presented.as_bytes(), self.expected.as_bytes()) {
            Ok(Identity::operator("api_key"))
        } else {
            Err(AuthError::Rejected("API key does not match".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(name: &str, value: &str) -> AuthRequest {
        AuthRequest::from_headers([(name.to_string(), value.to_string())])
    }

    #[tokio::test]
    async fn test_accepts_bearer_key() {
        let auth = ApiKeyAuthenticator::new("secret-key-123".to_string());
        let identity = auth
            .authenticate(&request_with("Authorization", "Bearer secret-key-123"))
            .await
            .unwrap();
        assert_eq!(identity.subject, "operator");
        assert_eq!(identity.method, "api_key");
    }

    #[tokio::test]
    async fn test_accepts_x_api_key_header() {
        let auth = ApiKeyAuthenticator::new("secret-key-123".to_string());
        let identity = auth
            .authenticate(&request_with("X-API-Key", "secret-key-123"))
            .await
            .unwrap();
        assert_eq!(identity.method, "api_key");
    }

    #[tokio::test]
    async fn test_bearer_scheme_is_case_insensitive() {
        let auth = ApiKeyAuthenticator::new("secret-key-123".to_string());
        let result = auth
            .authenticate(&request_with("Authorization", "bearer secret-key-123"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected() {
        let auth = ApiKeyAuthenticator::new("secret-key-123".to_string());
        let result = auth
            .authenticate(&request_with("Authorization", "Bearer wrong-key"))
            .await;
        assert!(matches!(result, Err(AuthError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let auth = ApiKeyAuthenticator::new("secret-key-123".to_string());
        let result = auth.authenticate(&AuthRequest::default()).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_key_comparison_handles_length_mismatch() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
