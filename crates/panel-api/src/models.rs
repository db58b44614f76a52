// Panel API wire types
//
// Models for the panel's JSON API. Fields use `#[serde(default)]` liberally:
// the panel fills system probes best effort and omits keys whose probe failed,
// and the switch status record is absent entirely when no switch has run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// `{"error": "..."}` body the panel sends alongside non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ── System ───────────────────────────────────────────────────────────

/// `GET /api/system/info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub ip: String,
    /// Preformatted by the panel, e.g. `"3d 4h 12m"`.
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub memory: Usage,
    #[serde(default)]
    pub disk: Usage,
    /// Identifier of the installed proxy layer.
    #[serde(default)]
    pub layer: String,
    /// systemd unit backing the installed layer.
    #[serde(default)]
    pub service: String,
}

/// Memory or disk usage. `total` and `used` are in GB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub used: f64,
    #[serde(default)]
    pub percent: f64,
}

/// `GET /api/system/status`: unit name to `systemctl is-active` output.
pub type ServiceStatusMap = BTreeMap<String, String>;

// ── Bandwidth ────────────────────────────────────────────────────────

/// Received/transmitted byte counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxTx {
    #[serde(default)]
    pub rx: u64,
    #[serde(default)]
    pub tx: u64,
}

/// `GET /api/bandwidth/system`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemBandwidth {
    #[serde(default)]
    pub today: RxTx,
    #[serde(default)]
    pub month: RxTx,
    #[serde(default)]
    pub total: RxTx,
}

/// One entry of `GET /api/bandwidth/users`.
///
/// `uplink`/`downlink` include counters persisted across proxy restarts;
/// the `_session` variants only cover the current proxy process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBandwidth {
    #[serde(default)]
    pub uplink: Option<u64>,
    #[serde(default)]
    pub downlink: Option<u64>,
    #[serde(default)]
    pub uplink_session: Option<u64>,
    #[serde(default)]
    pub downlink_session: Option<u64>,
}

// ── Connections ──────────────────────────────────────────────────────

/// One row of `GET /api/connections` (parsed `ss -tnp` output).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub remote: String,
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub process: String,
}

// ── Service ──────────────────────────────────────────────────────────

/// Generic `{success, error?}` acknowledgement used by action endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

/// `GET /api/service/logs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLogs {
    #[serde(default)]
    pub logs: String,
    #[serde(default)]
    pub service: String,
}

// ── Layers ───────────────────────────────────────────────────────────

/// One installable proxy layer, as advertised by the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Switching to this layer requires `domain` and `email` (TLS issuance).
    #[serde(default)]
    pub needs_domain: bool,
    /// The layer can optionally register a DuckDNS hostname.
    #[serde(default)]
    pub needs_duckdns: bool,
}

/// `GET /api/layers`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCatalog {
    /// Id of the currently installed layer.
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub layers: Vec<LayerDescriptor>,
}

impl LayerCatalog {
    pub fn find(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }
}

/// `POST /api/layers/switch` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub layer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duckdns_token: Option<String>,
}

impl SwitchRequest {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>, email: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self.email = Some(email.into());
        self
    }

    pub fn with_duckdns_token(mut self, token: impl Into<String>) -> Self {
        self.duckdns_token = Some(token.into());
        self
    }
}

/// Phase of a server-side layer switch.
///
/// Anything the client does not recognise (including the empty string the
/// panel reports when idle) decodes to `Unknown`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Starting,
    Uninstalling,
    Installing,
    ReinstallingPanel,
    Finalizing,
    Done,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Phase {
    /// `done` and `error` end a switch; every other phase is transitional.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Human-readable badge text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Starting => "Starting",
            Self::Uninstalling => "Uninstalling",
            Self::Installing => "Installing",
            Self::ReinstallingPanel => "Reinstalling panel",
            Self::Finalizing => "Finalizing",
            Self::Done => "Done",
            Self::Error => "Error",
            Self::Unknown => "Waiting",
        }
    }
}

/// `GET /api/layers/switch/status`
///
/// Fetched fresh on every poll and never mutated locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchStatus {
    #[serde(default)]
    pub in_progress: bool,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default, alias = "progress")]
    pub progress_pct: f64,
    #[serde(default, alias = "log", alias = "logs")]
    pub log_lines: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SwitchStatus {
    /// The server finished (successfully or not) and is no longer working.
    pub fn is_finished(&self) -> bool {
        !self.in_progress && self.phase.is_terminal()
    }

    /// A switch is running or left a terminal record behind.
    pub fn is_active(&self) -> bool {
        self.in_progress || self.phase.is_terminal()
    }
}
