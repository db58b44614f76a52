// ── Runtime connection configuration ──
//
// Describes how to reach a panel. Carries the session credential and
// connection tuning but never touches disk; the CLI builds a `PanelConfig`
// from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Switch progress is polled at this cadence unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs). Default for freshly installed panels.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single panel.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Panel URL (e.g., `https://203.0.113.7:8443`).
    pub url: Url,
    /// Value of the panel's `session` cookie.
    pub session: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Interval between switch status polls.
    pub poll_interval: Duration,
}

impl PanelConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            session: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_session(mut self, session: SecretString) -> Self {
        self.session = Some(session);
        self
    }
}
