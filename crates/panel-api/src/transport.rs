// Shared transport configuration for building reqwest::Client instances.
//
// TLS mode, timeout, and the default panel headers (CSRF marker + session
// cookie) live here so the client module only deals with URLs and bodies.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;

use crate::auth::Session;
use crate::error::Error;

/// The panel rejects state-changing requests without this header.
pub const REQUESTED_WITH: &str = "XMLHttpRequest";

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (panels ship with self-signed certs).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub session: Option<Session>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            session: None,
        }
    }
}

impl TransportConfig {
    /// Attach a session cookie to every request built from this config.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("panelctl/", env!("CARGO_PKG_VERSION")))
            .default_headers(self.default_headers()?);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert("X-Requested-With", HeaderValue::from_static(REQUESTED_WITH));

        if let Some(ref session) = self.session {
            let cookie = format!("{}={}", Session::COOKIE_NAME, session.token().expose_secret());
            let mut value = HeaderValue::from_str(&cookie).map_err(|_| Error::Api {
                status: 0,
                message: "session token contains characters not allowed in a cookie".into(),
            })?;
            value.set_sensitive(true);
            headers.insert(header::COOKIE, value);
        }

        Ok(headers)
    }
}
