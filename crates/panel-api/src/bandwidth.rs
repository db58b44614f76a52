// Bandwidth and connection endpoints

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::{Connection, SystemBandwidth, UserBandwidth};

impl PanelClient {
    /// `GET /api/bandwidth/system`
    pub async fn system_bandwidth(&self) -> Result<SystemBandwidth, Error> {
        let url = self.api_url("bandwidth/system")?;
        debug!("fetching system bandwidth");
        self.get(url).await
    }

    /// Per-user proxy traffic, keyed by username.
    ///
    /// `GET /api/bandwidth/users`
    pub async fn user_bandwidth(&self) -> Result<BTreeMap<String, UserBandwidth>, Error> {
        let url = self.api_url("bandwidth/users")?;
        debug!("fetching user bandwidth");
        self.get(url).await
    }

    /// Established TCP connections on the proxy ports.
    ///
    /// `GET /api/connections`
    pub async fn connections(&self) -> Result<Vec<Connection>, Error> {
        let url = self.api_url("connections")?;
        debug!("fetching connections");
        self.get(url).await
    }
}
