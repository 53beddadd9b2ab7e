//! Request authentication for the HTTP surface.
//!
//! Mutating endpoints (curation, production, artifact deletion) pass through
//! an [`Authenticator`] chosen at startup from the `[auth]` config section.
//! Two methods exist: open access for deployments that never leave the
//! operator's machine, and a static API key for anything reachable from
//! outside.

mod api_key;

pub use api_key::ApiKeyAuthenticator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No credentials presented")]
    MissingCredentials,

    #[error("Credentials rejected: {0}")]
    Rejected(String),

    #[error("Auth misconfigured: {0}")]
    Misconfigured(String),
}

/// The slice of an HTTP request that authentication looks at.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Header names lowercased by the constructor
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn from_headers(headers: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect(),
        }
    }
}

/// Who a request acts as once authentication has passed. Attached to the
/// request extensions so handlers can log the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }

    /// The single operator a shared credential stands for.
    pub fn operator(method: &str) -> Self {
        Self {
            subject: "operator".to_string(),
            method: method.to_string(),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Config-facing name of the method, e.g. "api_key".
    fn method_name(&self) -> &'static str;
}

/// Open access. Only ever active when the config says `method = "none"`;
/// there is no silent fallback to it.
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

/// Builds the authenticator the `[auth]` section asks for.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::ApiKey => match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                Ok(Box::new(ApiKeyAuthenticator::new(key.to_string())))
            }
            _ => Err(AuthError::Misconfigured(
                "auth.api_key is required when method = \"api_key\"".to_string(),
            )),
        },
    }
}
