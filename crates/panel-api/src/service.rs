// Service control endpoints

use serde_json::json;
use tracing::debug;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::{ActionResponse, ServiceLogs};

impl PanelClient {
    /// Restart the proxy service for the installed layer.
    ///
    /// `POST /api/service/restart`
    ///
    /// The panel answers `200` with `success: false` when systemctl fails;
    /// callers inspect the returned acknowledgement.
    pub async fn restart_service(&self) -> Result<ActionResponse, Error> {
        let url = self.api_url("service/restart")?;
        debug!("restarting proxy service");
        self.post(url, &json!({})).await
    }

    /// Recent journal lines of the proxy service.
    ///
    /// `GET /api/service/logs`
    pub async fn service_logs(&self) -> Result<ServiceLogs, Error> {
        let url = self.api_url("service/logs")?;
        debug!("fetching service logs");
        self.get(url).await
    }
}
