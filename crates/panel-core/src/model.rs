// ── Domain model ──
//
// Canonical views over the panel's system, bandwidth, and connection data.
// Built from `panel_api` wire types by `convert`; consumed by the CLI.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

pub use panel_api::{
    Connection, LayerCatalog, LayerDescriptor, Phase, SwitchRequest, SwitchStatus,
};

// ── Usage ────────────────────────────────────────────────────────────

/// Severity bucket for a usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UsageLevel {
    Normal,
    /// Above 60 %.
    Warn,
    /// Above 80 %.
    Danger,
}

impl UsageLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 80.0 {
            Self::Danger
        } else if percent > 60.0 {
            Self::Warn
        } else {
            Self::Normal
        }
    }
}

/// A resource meter (CPU, memory, disk). `used`/`total` are GB, absent for CPU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Meter {
    pub percent: f64,
    pub used_gb: Option<f64>,
    pub total_gb: Option<f64>,
    pub level: UsageLevel,
}

impl Meter {
    pub fn percent_only(percent: f64) -> Self {
        Self {
            percent,
            used_gb: None,
            total_gb: None,
            level: UsageLevel::from_percent(percent),
        }
    }

    pub fn with_capacity(percent: f64, used_gb: f64, total_gb: f64) -> Self {
        Self {
            used_gb: Some(used_gb),
            total_gb: Some(total_gb),
            ..Self::percent_only(percent)
        }
    }
}

// ── Services ─────────────────────────────────────────────────────────

/// Parsed `systemctl is-active` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Active,
    Inactive,
    /// Anything else (`failed`, `activating`, ...), kept verbatim.
    Other(String),
}

impl ServiceState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
            Self::Other(s) if s.is_empty() => f.write_str("unknown"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    pub state: ServiceState,
}

// ── Overview ─────────────────────────────────────────────────────────

/// Dashboard summary: host facts, resource meters, and unit states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub ip: String,
    pub hostname: String,
    pub os: String,
    pub uptime: String,
    pub layer: String,
    pub service: String,
    pub cpu: Meter,
    pub memory: Meter,
    pub disk: Meter,
    pub services: Vec<ServiceEntry>,
    pub fetched_at: DateTime<Utc>,
}

// ── Bandwidth ────────────────────────────────────────────────────────

/// Byte counters for one time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Traffic {
    pub rx: u64,
    pub tx: u64,
}

impl Traffic {
    pub fn total(self) -> u64 {
        self.rx.saturating_add(self.tx)
    }
}

/// Per-user proxy traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTraffic {
    pub username: String,
    pub uplink: u64,
    pub downlink: u64,
}

impl UserTraffic {
    pub fn total(&self) -> u64 {
        self.uplink.saturating_add(self.downlink)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandwidthReport {
    pub today: Traffic,
    pub month: Traffic,
    pub all_time: Traffic,
    /// Sorted by username.
    pub users: Vec<UserTraffic>,
}
