// panel-api: Async Rust client for the proxy management panel's JSON API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod bandwidth;
mod layers;
mod service;
mod system;

pub use auth::Session;
pub use client::PanelClient;
pub use error::Error;
pub use models::{
    ActionResponse, Connection, LayerCatalog, LayerDescriptor, Phase, RxTx, ServiceLogs,
    ServiceStatusMap, SwitchRequest, SwitchStatus, SystemBandwidth, SystemInfo, Usage,
    UserBandwidth,
};
pub use transport::{TlsMode, TransportConfig};
