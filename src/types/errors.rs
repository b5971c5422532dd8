use thiserror::Error;

// === RemoteError ===

/// Failures of a record store or change stream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Http { status: u16, message: String },
    /// The local database rejected the operation.
    #[error("Database error: {0}")]
    Database(String),
    /// A response or payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The targeted record does not exist.
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    /// A backend URL could not be built.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl From<rusqlite::Error> for RemoteError {
    fn from(e: rusqlite::Error) -> Self {
        RemoteError::Database(e.to_string())
    }
}

// === CommandError ===

/// Errors surfaced by user-issued mutation commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No current user; the caller should redirect to the login route.
    #[error("Not authenticated")]
    Unauthenticated,
    /// Input rejected before any remote call was made.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The remote call failed. Never retried.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

// === SubscriptionError ===

/// Errors related to change feed subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The requested feed is malformed (empty channel or table).
    #[error("Invalid change feed: {0}")]
    InvalidFeed(String),
    /// The change stream is no longer accepting subscribers.
    #[error("Change stream closed")]
    Closed,
}

// === SessionError ===

/// Errors raised while activating or refreshing a sync session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Snapshot fetch failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("Subscription failed: {0}")]
    Subscription(#[from] SubscriptionError),
}

// === AuthError ===

/// Errors related to the identity boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Unsupported OAuth provider: {0}")]
    UnsupportedProvider(String),
    #[error("Invalid auth URL: {0}")]
    InvalidUrl(String),
}

// === SettingsError ===

/// Errors related to loading and validating settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(String),
    #[error("Settings serialization error: {0}")]
    Serialization(String),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Startup failures of the application wiring.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Database initialization failed: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("HTTP client initialization failed: {0}")]
    Http(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
