use std::future::Future;

use panel_api::{ActionResponse, LayerCatalog, PanelClient, SwitchRequest, SwitchStatus};

use crate::error::CoreError;

/// The four panel endpoints a layer switch needs.
///
/// Implemented by [`PanelClient`]; tests substitute a scripted fake.
pub trait SwitchBackend: Send + Sync + 'static {
    fn list_layers(&self) -> impl Future<Output = Result<LayerCatalog, CoreError>> + Send;

    fn start_switch(
        &self,
        request: &SwitchRequest,
    ) -> impl Future<Output = Result<ActionResponse, CoreError>> + Send;

    fn switch_status(&self) -> impl Future<Output = Result<SwitchStatus, CoreError>> + Send;

    fn clear_switch(&self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl SwitchBackend for PanelClient {
    async fn list_layers(&self) -> Result<LayerCatalog, CoreError> {
        Ok(PanelClient::list_layers(self).await?)
    }

    async fn start_switch(&self, request: &SwitchRequest) -> Result<ActionResponse, CoreError> {
        Ok(PanelClient::start_switch(self, request).await?)
    }

    async fn switch_status(&self) -> Result<SwitchStatus, CoreError> {
        Ok(PanelClient::switch_status(self).await?)
    }

    async fn clear_switch(&self) -> Result<(), CoreError> {
        Ok(PanelClient::clear_switch(self).await?)
    }
}
