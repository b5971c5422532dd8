use smartmarks::types::errors::*;

// === RemoteError Tests ===

#[test]
fn remote_error_display_variants() {
    assert_eq!(
        RemoteError::Network("connection refused".to_string()).to_string(),
        "Network error: connection refused"
    );
    assert_eq!(
        RemoteError::Http {
            status: 403,
            message: "permission denied".to_string()
        }
        .to_string(),
        "Backend returned 403: permission denied"
    );
    assert_eq!(
        RemoteError::Database("disk I/O error".to_string()).to_string(),
        "Database error: disk I/O error"
    );
    assert_eq!(
        RemoteError::NotFound("bm-1".to_string()).to_string(),
        "Bookmark not found: bm-1"
    );
}

#[test]
fn remote_error_from_rusqlite() {
    let err: RemoteError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, RemoteError::Database(_)));
}

// === CommandError Tests ===

#[test]
fn command_error_remote_is_transparent() {
    let err: CommandError = RemoteError::Network("timeout".to_string()).into();
    assert_eq!(err.to_string(), "Network error: timeout");
}

#[test]
fn command_error_unauthenticated_redirects_to_login() {
    assert_eq!(CommandError::Unauthenticated.redirect(), Some("/login"));
    assert_eq!(CommandError::Validation("x".to_string()).redirect(), None);
}

#[test]
fn command_error_user_messages() {
    assert_eq!(
        CommandError::Validation("empty".to_string()).create_message(),
        "Title and URL are required."
    );
    assert_eq!(
        CommandError::Unauthenticated.create_message(),
        "You must be logged in to add a bookmark."
    );
    assert_eq!(
        CommandError::Remote(RemoteError::Network("offline".to_string())).create_message(),
        "Network error: offline"
    );
    assert_eq!(
        CommandError::Remote(RemoteError::Network("offline".to_string())).delete_message(),
        "Failed to delete bookmark"
    );
}

// === SubscriptionError / SessionError Tests ===

#[test]
fn subscription_error_display_variants() {
    assert_eq!(SubscriptionError::Closed.to_string(), "Change stream closed");
    assert_eq!(
        SubscriptionError::InvalidFeed("table name is empty".to_string()).to_string(),
        "Invalid change feed: table name is empty"
    );
}

#[test]
fn session_error_wraps_sources() {
    let err: SessionError = SubscriptionError::Closed.into();
    assert_eq!(err.to_string(), "Subscription failed: Change stream closed");

    let err: SessionError = RemoteError::Decode("bad json".to_string()).into();
    assert_eq!(err.to_string(), "Snapshot fetch failed: Decode error: bad json");
}

// === AuthError / SettingsError Tests ===

#[test]
fn auth_and_settings_error_display() {
    assert_eq!(
        AuthError::UnsupportedProvider("myspace".to_string()).to_string(),
        "Unsupported OAuth provider: myspace"
    );
    assert_eq!(
        SettingsError::InvalidValue("realtime.buffer must be at least 1".to_string()).to_string(),
        "Invalid settings value: realtime.buffer must be at least 1"
    );
}

#[test]
fn errors_implement_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(RemoteError::NotFound("id".to_string()));
    assert!(err.source().is_none());
}
