use panel_api::{LayerCatalog, Phase, SwitchStatus};

use crate::error::CoreError;

/// Rendering surface for the layer-switch flow.
///
/// Only the monitor writes to it. Implementations must tolerate `render`
/// being called with the same frame more than once.
pub trait SwitchView: Send + Sync + 'static {
    /// Show the layer picker.
    fn show_catalog(&self, catalog: &LayerCatalog);

    /// Replace the picker with the progress view: 0 %, empty log,
    /// no done or error indicator.
    fn show_progress(&self);

    /// Render one snapshot. Replaces everything previously rendered.
    fn render(&self, frame: &ProgressFrame);

    /// Inline error next to the picker (validation, rejection, transport).
    fn show_error(&self, error: &CoreError);

    /// The panel returned 401; the user has to log in again.
    fn session_expired(&self);
}

/// Terminal marker shown under the progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    None,
    Done,
    Failed(String),
}

/// Everything the progress view shows for one status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressFrame {
    /// 0..=100
    pub percent: u8,
    pub phase: Phase,
    pub phase_label: &'static str,
    pub log: Vec<String>,
    pub indicator: Indicator,
    /// The control leading back to the picker.
    pub back_visible: bool,
}

impl ProgressFrame {
    /// Frame shown right after the panel accepted a switch.
    pub fn initial() -> Self {
        Self {
            percent: 0,
            phase: Phase::Starting,
            phase_label: Phase::Starting.label(),
            log: Vec::new(),
            indicator: Indicator::None,
            back_visible: false,
        }
    }

    pub fn from_status(status: &SwitchStatus) -> Self {
        let indicator = if status.in_progress {
            Indicator::None
        } else {
            match status.phase {
                Phase::Done => Indicator::Done,
                Phase::Error => Indicator::Failed(
                    status
                        .error
                        .clone()
                        .filter(|e| !e.is_empty())
                        .unwrap_or_else(|| "Layer switch failed".to_owned()),
                ),
                _ => Indicator::None,
            }
        };

        Self {
            percent: clamp_percent(status.progress_pct),
            phase: status.phase,
            phase_label: status.phase.label(),
            log: status.log_lines.clone(),
            back_visible: indicator != Indicator::None,
            indicator,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.indicator != Indicator::None
    }
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn clamp_percent(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}
