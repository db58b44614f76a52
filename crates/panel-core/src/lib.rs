// panel-core: Domain layer between panel-api and the CLI.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod panel;
pub mod switch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{PanelConfig, TlsVerification, DEFAULT_POLL_INTERVAL};
pub use error::CoreError;
pub use panel::{Panel, NO_LOGS};
pub use switch::{
    Indicator, MonitorState, PollOutcome, ProgressFrame, SwitchBackend, SwitchMonitor,
    SwitchView, validate_request,
};

pub use model::{
    BandwidthReport, Connection, LayerCatalog, LayerDescriptor, Meter, Overview, Phase,
    ServiceEntry, ServiceState, SwitchRequest, SwitchStatus, Traffic, UsageLevel, UserTraffic,
};
