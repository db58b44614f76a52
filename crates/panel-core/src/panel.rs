// ── Panel facade ──
//
// Entry point for consumers: owns the HTTP client built from a
// `PanelConfig` and exposes the dashboard reads, service actions, and the
// layer-switch monitor.

use tracing::{debug, info};

use panel_api::transport::{TlsMode, TransportConfig};
use panel_api::{Connection, LayerCatalog, PanelClient, Session};

use crate::config::{PanelConfig, TlsVerification};
use crate::convert;
use crate::error::CoreError;
use crate::model::{BandwidthReport, Overview};
use crate::switch::{SwitchMonitor, SwitchView};

/// Placeholder shown when the service has not logged anything yet.
pub const NO_LOGS: &str = "No logs available";

/// Cheaply cloneable handle to one panel.
#[derive(Clone)]
pub struct Panel {
    client: PanelClient,
    config: PanelConfig,
}

impl Panel {
    pub fn new(config: PanelConfig) -> Result<Self, CoreError> {
        let client = PanelClient::new(config.url.clone(), &build_transport(&config))?;
        Ok(Self { client, config })
    }

    /// Use a pre-built client (tests, custom transports).
    pub fn with_client(client: PanelClient, config: PanelConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn client(&self) -> &PanelClient {
        &self.client
    }

    // ── Dashboard ────────────────────────────────────────────────

    /// Host facts and unit states, fetched in parallel.
    pub async fn overview(&self) -> Result<Overview, CoreError> {
        let (info, status) = tokio::join!(self.client.system_info(), self.client.service_status());
        let overview = convert::overview(info?, status?);
        debug!(layer = %overview.layer, "overview refreshed");
        Ok(overview)
    }

    /// System and per-user traffic, fetched in parallel.
    pub async fn bandwidth(&self) -> Result<BandwidthReport, CoreError> {
        let (system, users) =
            tokio::join!(self.client.system_bandwidth(), self.client.user_bandwidth());
        Ok(convert::bandwidth_report(system?, users?))
    }

    pub async fn connections(&self) -> Result<Vec<Connection>, CoreError> {
        Ok(self.client.connections().await?)
    }

    // ── Service ──────────────────────────────────────────────────

    /// Restart the proxy service. Returns the unit name the panel restarted.
    pub async fn restart_service(&self) -> Result<String, CoreError> {
        let ack = self.client.restart_service().await?;
        if !ack.success {
            return Err(CoreError::Rejected {
                message: ack
                    .error
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "service restart failed".into()),
            });
        }
        let service = ack.service.unwrap_or_default();
        info!(service = %service, "proxy service restarted");
        Ok(service)
    }

    /// Recent service log text, or [`NO_LOGS`] when there is none.
    pub async fn service_logs(&self) -> Result<String, CoreError> {
        let logs = self.client.service_logs().await?;
        if logs.logs.trim().is_empty() {
            Ok(NO_LOGS.to_owned())
        } else {
            Ok(logs.logs)
        }
    }

    // ── Layers ───────────────────────────────────────────────────

    pub async fn layers(&self) -> Result<LayerCatalog, CoreError> {
        Ok(self.client.list_layers().await?)
    }

    /// Build a switch monitor rendering into `view`.
    pub fn switch_monitor<V: SwitchView>(&self, view: V) -> SwitchMonitor<PanelClient, V> {
        SwitchMonitor::new(self.client.clone(), view, self.config.poll_interval)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &PanelConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        session: config.session.clone().map(Session::new),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
