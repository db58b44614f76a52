//! CLI configuration -- thin wrapper around `panel_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --session, etc.).

use std::time::Duration;

use secrecy::SecretString;

use panel_core::{PanelConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use panel_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Translate a `Profile` + global flags into a `PanelConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<PanelConfig, CliError> {
    // 1. URL (flag > env > profile)
    let url = panel_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    // 2. Session (flag > env > session_env > keyring > plaintext)
    let session = match global.session {
        Some(ref token) => SecretString::from(token.clone()),
        None => panel_config::resolve_session(profile, profile_name)?,
    };

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        panel_config::profile_tls(profile, defaults)
    };

    // 4. Timing
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);
    let poll_interval = profile.poll_interval.unwrap_or(defaults.poll_interval);

    Ok(PanelConfig {
        url,
        session: Some(session),
        tls,
        timeout: Duration::from_secs(timeout),
        poll_interval: Duration::from_secs(poll_interval),
    })
}

/// Build a `PanelConfig` from flags alone when no profile matches.
pub fn resolve_flags_only(
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<PanelConfig, CliError> {
    let raw_url = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = panel_config::parse_url(raw_url)?;

    let session = global
        .session
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| CliError::NoSession {
            profile: profile_name.into(),
        })?;

    let tls = if global.insecure || defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(PanelConfig {
        url,
        session: Some(session),
        tls,
        timeout: Duration::from_secs(global.timeout.unwrap_or(defaults.timeout)),
        poll_interval: Duration::from_secs(defaults.poll_interval),
    })
}
