//! Identity boundary for SmartMarks.
//!
//! Builds OAuth authorize redirects against the hosted auth endpoint and tracks
//! the user reported by the callback. The provider exchange itself happens in the
//! browser and on the auth server.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;

use crate::types::errors::AuthError;
use crate::types::session::{LoginRedirect, User};
use crate::types::settings::DEFAULT_SITE_URL;

/// Path the identity provider sends the browser back to.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Supported single sign-on providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::GitHub),
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Resolves the public site URL: the configured value if non-blank, otherwise the
/// localhost fallback. Trailing slashes are dropped.
pub fn resolve_site_url(configured: Option<&str>) -> String {
    let base = configured
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SITE_URL);
    base.trim_end_matches('/').to_string()
}

/// Builds OAuth login redirects.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    authorize_url: Url,
    site_url: String,
}

impl IdentityClient {
    /// `auth_base` is the backend base URL; the authorize endpoint is
    /// `{auth_base}/auth/v1/authorize`.
    pub fn new(auth_base: &str, site_url: &str) -> Result<Self, AuthError> {
        let endpoint = format!("{}/auth/v1/authorize", auth_base.trim_end_matches('/'));
        let authorize_url = Url::parse(&endpoint)
            .map_err(|e| AuthError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        Ok(Self {
            authorize_url,
            site_url: resolve_site_url(Some(site_url)),
        })
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Default redirect target: `{site_url}/auth/callback`.
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.site_url, CALLBACK_PATH)
    }

    /// Returns the URL the caller must redirect the browser to.
    pub fn begin_oauth_login(
        &self,
        provider: OAuthProvider,
        redirect_target: Option<&str>,
    ) -> Result<LoginRedirect, AuthError> {
        let redirect_to = match redirect_target {
            Some(target) => target.to_string(),
            None => self.callback_url(),
        };
        Url::parse(&redirect_to)
            .map_err(|e| AuthError::InvalidUrl(format!("{}: {}", redirect_to, e)))?;

        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", &redirect_to);

        tracing::info!(%provider, "starting OAuth login");
        Ok(LoginRedirect { url: url.to_string() })
    }
}

/// The current user of this session, if any.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    user: Option<User>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Records the user reported by the OAuth callback.
    pub fn complete_login(&mut self, user: User) {
        tracing::info!(user_id = %user.id, "user signed in");
        self.user = Some(user);
    }

    /// Signs the user out. Returns the user that was signed in.
    pub fn sign_out(&mut self) -> Option<User> {
        let previous = self.user.take();
        if let Some(user) = &previous {
            tracing::info!(user_id = %user.id, "user signed out");
        }
        previous
    }
}
