use serde::{Deserialize, Serialize};

/// The signed-in user, as reported by the identity provider after the OAuth callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

/// Redirect returned by the identity boundary; the caller must send the browser there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRedirect {
    pub url: String,
}
