// System endpoints
//
// Host probes and systemd unit states reported by the panel.

use tracing::debug;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::{ServiceStatusMap, SystemInfo};

impl PanelClient {
    /// Get host information (address, uptime, CPU, memory, disk, layer).
    ///
    /// `GET /api/system/info`
    pub async fn system_info(&self) -> Result<SystemInfo, Error> {
        let url = self.api_url("system/info")?;
        debug!("fetching system info");
        self.get(url).await
    }

    /// Get the `systemctl is-active` state of the panel's known units.
    ///
    /// `GET /api/system/status`
    pub async fn service_status(&self) -> Result<ServiceStatusMap, Error> {
        let url = self.api_url("system/status")?;
        debug!("fetching service status");
        self.get(url).await
    }
}
