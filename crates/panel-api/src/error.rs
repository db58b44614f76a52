use thiserror::Error;

/// Top-level error type for the `panel-api` crate.
///
/// Covers every failure mode of the panel's JSON API: session expiry,
/// transport, non-success HTTP responses, and malformed bodies.
/// `panel-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The panel answered `401` -- the session cookie is missing, expired,
    /// or revoked. Never handled locally; callers must re-authenticate.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Panel API ───────────────────────────────────────────────────
    /// Non-success HTTP status. `message` comes from the `{"error": ...}`
    /// body when the panel sent one, otherwise a body preview.
    #[error("Panel API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the panel rejected the session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Gateway errors count as transient: the panel sits behind a reverse
    /// proxy on some installs and restarts during a layer switch.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}
