// ── Layer switch ──
//
// A layer switch runs on the server and is observed by polling. Data access
// (`SwitchBackend`) and presentation (`SwitchView`) are traits so the
// `SwitchMonitor` state machine can be driven by fakes under a paused clock.

mod backend;
mod monitor;
mod request;
mod view;

pub use backend::SwitchBackend;
pub use monitor::{MonitorState, PollOutcome, SwitchMonitor};
pub use request::validate_request;
pub use view::{Indicator, ProgressFrame, SwitchView};
