// Layer catalog and layer-switch endpoints
//
// A switch runs server side (uninstall, install, panel reinstall, finalize)
// and is observed by polling `switch_status`. The panel keeps the terminal
// record until `clear_switch` is called.

use serde_json::json;
use tracing::debug;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::{ActionResponse, LayerCatalog, SwitchRequest, SwitchStatus};

impl PanelClient {
    /// List installable layers and the currently installed one.
    ///
    /// `GET /api/layers`
    pub async fn list_layers(&self) -> Result<LayerCatalog, Error> {
        let url = self.api_url("layers")?;
        debug!("fetching layer catalog");
        self.get(url).await
    }

    /// Ask the panel to start a layer switch.
    ///
    /// `POST /api/layers/switch`
    ///
    /// A refused switch (another one running, unknown layer, bad input) comes
    /// back as `success: false` with a message, not as an HTTP error.
    pub async fn start_switch(&self, request: &SwitchRequest) -> Result<ActionResponse, Error> {
        let url = self.api_url("layers/switch")?;
        debug!(layer = %request.layer_id, "starting layer switch");
        self.post(url, request).await
    }

    /// Current switch progress.
    ///
    /// `GET /api/layers/switch/status`
    pub async fn switch_status(&self) -> Result<SwitchStatus, Error> {
        let url = self.api_url("layers/switch/status")?;
        self.get(url).await
    }

    /// Drop the terminal switch record so the next status read reports idle.
    ///
    /// `POST /api/layers/switch/clear`
    pub async fn clear_switch(&self) -> Result<(), Error> {
        let url = self.api_url("layers/switch/clear")?;
        debug!("clearing layer switch record");
        self.post_discard(url, &json!({})).await
    }
}
