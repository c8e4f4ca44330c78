//! Upload authentication
//!
//! The directory does not run an identity provider. It only needs to know
//! whether the caller is signed in, and where to send them if not. A
//! fronting proxy (SSO gateway, oauth2-proxy, ...) authenticates the user and
//! forwards their identity in a request header.

use axum::http::{HeaderMap, HeaderName};
use thiserror::Error;

/// Authentication configuration and redirect errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid user header name: {0}")]
    InvalidHeader(String),

    #[error("Invalid login URL: {0}")]
    InvalidLoginUrl(String),
}

/// Caller identity check plus login redirect
pub trait Authenticator: Send + Sync {
    /// Signed-in user for this request, if any
    fn current_user(&self, headers: &HeaderMap) -> Option<String>;

    /// Login URL that returns the user to `return_to` afterwards
    fn login_url(&self, return_to: &str) -> Result<String, AuthError>;
}

/// Trusts a user header set by an authenticating proxy
#[derive(Debug, Clone)]
pub struct HeaderAuthenticator {
    user_header: HeaderName,
    login_url: String,
}

impl HeaderAuthenticator {
    /// `login_url` must be absolute (`https://...`) or a rooted path (`/login`)
    pub fn new(user_header: &str, login_url: &str) -> Result<Self, AuthError> {
        let user_header = HeaderName::from_bytes(user_header.trim().as_bytes())
            .map_err(|_| AuthError::InvalidHeader(user_header.to_string()))?;

        if !login_url.starts_with('/') {
            url::Url::parse(login_url)
                .map_err(|e| AuthError::InvalidLoginUrl(format!("{}: {}", login_url, e)))?;
        }

        Ok(Self {
            user_header,
            login_url: login_url.to_string(),
        })
    }
}

impl Authenticator for HeaderAuthenticator {
    fn current_user(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.user_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string)
    }

    fn login_url(&self, return_to: &str) -> Result<String, AuthError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("continue", return_to)
            .finish();
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.login_url, separator, query))
    }
}

/// Every caller is signed in as `anonymous`. Development only.
#[derive(Debug, Clone, Default)]
pub struct DisabledAuthenticator;

impl Authenticator for DisabledAuthenticator {
    fn current_user(&self, _headers: &HeaderMap) -> Option<String> {
        Some("anonymous".to_string())
    }

    fn login_url(&self, return_to: &str) -> Result<String, AuthError> {
        Ok(return_to.to_string())
    }
}
