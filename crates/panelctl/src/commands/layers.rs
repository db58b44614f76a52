//! Layer command handlers and the terminal rendering of a layer switch.

use std::io::IsTerminal;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;
use tokio::sync::watch;
use tracing::{debug, warn};

use panel_core::{
    CoreError, Indicator, LayerCatalog, LayerDescriptor, MonitorState, Panel, Phase,
    ProgressFrame, SwitchBackend, SwitchMonitor, SwitchRequest, SwitchStatus, SwitchView,
};

use crate::cli::{GlobalOpts, LayersArgs, LayersCommand, OutputFormat, SwitchArgs};
use crate::error::CliError;
use crate::output;

// ── Terminal view ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Animated bar on an interactive stderr; log lines print above it.
    Live,
    /// Plain lines on a redirected stderr.
    Lines,
    /// Structured output or `--quiet`: draw nothing.
    Hidden,
}

#[derive(Default)]
struct ViewState {
    bar: Option<ProgressBar>,
    printed: usize,
    phase: Option<Phase>,
}

/// Renders switch progress on stderr so stdout stays free for `--output`.
pub struct TerminalSwitchView {
    mode: Mode,
    color: bool,
    state: Mutex<ViewState>,
}

impl TerminalSwitchView {
    fn for_opts(global: &GlobalOpts) -> Self {
        let mode = if global.quiet || global.output != OutputFormat::Table {
            Mode::Hidden
        } else if std::io::stderr().is_terminal() {
            Mode::Live
        } else {
            Mode::Lines
        };
        Self {
            mode,
            color: output::should_color(global.color),
            state: Mutex::new(ViewState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().expect("switch view lock poisoned")
    }

    /// Leave whatever the bar shows on screen and stop animating it.
    fn close(&self) {
        if let Some(bar) = self.state().bar.take() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }

    fn line(&self, bar: Option<&ProgressBar>, text: String) {
        match (self.mode, bar) {
            (Mode::Live, Some(bar)) => bar.println(text),
            (Mode::Hidden, _) => {}
            _ => eprintln!("{text}"),
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Log lines of `log` not yet printed. The panel may restart its log
/// mid-switch, in which case everything is new again.
fn unseen(log: &[String], printed: usize) -> &[String] {
    log.get(printed..).unwrap_or(log)
}

impl SwitchView for TerminalSwitchView {
    fn show_catalog(&self, catalog: &LayerCatalog) {
        debug!(current = %catalog.current, layers = catalog.layers.len(), "layer catalog loaded");
    }

    fn show_progress(&self) {
        let mut state = self.state();
        if let Some(old) = state.bar.take() {
            old.finish_and_clear();
        }
        if self.mode == Mode::Live {
            let bar = ProgressBar::new(100);
            bar.set_style(bar_style());
            bar.set_message(Phase::Starting.label());
            bar.enable_steady_tick(Duration::from_millis(120));
            state.bar = Some(bar);
        }
        state.printed = 0;
        state.phase = None;
    }

    fn render(&self, frame: &ProgressFrame) {
        let mut state = self.state();
        let bar = state.bar.clone();

        for entry in unseen(&frame.log, state.printed) {
            self.line(bar.as_ref(), format!("  {entry}"));
        }
        state.printed = frame.log.len();

        match bar {
            Some(ref bar) => {
                bar.set_position(u64::from(frame.percent));
                bar.set_message(frame.phase_label);
            }
            None if state.phase != Some(frame.phase) && !frame.is_terminal() => {
                self.line(None, format!("[{:>3}%] {}", frame.percent, frame.phase_label));
            }
            None => {}
        }
        state.phase = Some(frame.phase);

        let done = output::paint_ok("✓ Done", true, self.color);
        match (&frame.indicator, bar) {
            (Indicator::None, _) => {}
            (Indicator::Done, Some(bar)) => bar.finish_with_message(done),
            (Indicator::Failed(message), Some(bar)) => bar.abandon_with_message(
                output::paint_ok(&format!("✗ {message}"), false, self.color),
            ),
            (Indicator::Done, None) => self.line(None, done),
            (Indicator::Failed(message), None) => {
                self.line(None, output::paint_ok(&format!("✗ {message}"), false, self.color));
            }
        }
    }

    fn show_error(&self, error: &CoreError) {
        // Reported by the command's error return.
        debug!(error = %error, "layer switch error");
        self.close();
    }

    fn session_expired(&self) {
        self.close();
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = " ")]
    current: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Requires")]
    requires: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl LayerRow {
    fn new(layer: &LayerDescriptor, current: &str) -> Self {
        let mut requires = Vec::new();
        if layer.needs_domain {
            requires.push("domain, email");
        }
        if layer.needs_duckdns {
            requires.push("duckdns token (optional)");
        }
        Self {
            current: if layer.id == current { "*" } else { "" },
            id: layer.id.clone(),
            name: layer.name.clone(),
            requires: if requires.is_empty() {
                "-".into()
            } else {
                requires.join(", ")
            },
            description: layer.description.clone(),
        }
    }
}

fn catalog_table(catalog: &LayerCatalog) -> String {
    let rows: Vec<LayerRow> = catalog
        .layers
        .iter()
        .map(|l| LayerRow::new(l, &catalog.current))
        .collect();
    output::render_table(&rows)
}

fn catalog_ids(catalog: &LayerCatalog) -> String {
    catalog
        .layers
        .iter()
        .map(|l| l.id.clone())
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_name(layer: &LayerDescriptor) -> &str {
    if layer.name.is_empty() {
        &layer.id
    } else {
        &layer.name
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(panel: &Panel, args: LayersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        LayersCommand::List => {
            let catalog = panel.layers().await?;
            let out = output::render_single(global.output, &catalog, catalog_table, catalog_ids);
            output::print_output(&out, global.quiet);
            Ok(())
        }
        LayersCommand::Switch(args) => switch(panel, args, global).await,
        LayersCommand::Status { follow } => status(panel, follow, global).await,
        LayersCommand::Ack => {
            let monitor = panel.switch_monitor(TerminalSwitchView::for_opts(global));
            acknowledge(&monitor, global).await
        }
    }
}

async fn switch(panel: &Panel, args: SwitchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = panel.switch_monitor(TerminalSwitchView::for_opts(global));

    let catalog = monitor.show_catalog().await?;
    let layer = catalog
        .find(&args.layer)
        .cloned()
        .ok_or_else(|| CoreError::LayerNotFound {
            id: args.layer.clone(),
        })?;

    let request = SwitchRequest {
        layer_id: layer.id.clone(),
        domain: args.domain,
        email: args.email,
        duckdns_token: args.duckdns_token,
    };

    if !global.quiet {
        eprintln!("Switching to {}", display_name(&layer));
    }

    let mut state = monitor.state();
    monitor.initiate(request, &layer).await?;

    if args.no_wait {
        monitor.stop();
        monitor.view().close();
        if !global.quiet {
            eprintln!("Follow it with: panelctl layers status --follow");
        }
        return Ok(());
    }

    match follow(&monitor, &mut state).await {
        Some(settled) => finish(&monitor, &settled, !args.no_ack, global).await,
        None => Ok(()),
    }
}

async fn status(panel: &Panel, follow_on: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = panel.switch_monitor(TerminalSwitchView::for_opts(global));
    let mut state = monitor.state();

    if !monitor.resume_if_active().await? {
        match global.output {
            OutputFormat::Table | OutputFormat::Plain => {
                output::print_output("No layer switch in progress", global.quiet);
            }
            format => {
                let idle = SwitchStatus::default();
                let out = output::render_single(format, &idle, |_| String::new(), |_| String::new());
                output::print_output(&out, global.quiet);
            }
        }
        return Ok(());
    }

    if !follow_on {
        monitor.stop();
        monitor.view().close();
        print_status(&monitor, global);
        return Ok(());
    }

    match follow(&monitor, &mut state).await {
        Some(settled) => finish(&monitor, &settled, false, global).await,
        None => Ok(()),
    }
}

/// Wait until the monitor settles or the user presses Ctrl-C.
///
/// Returns `None` when interrupted; polling stops but the server-side
/// switch keeps running.
async fn follow<B: SwitchBackend>(
    monitor: &SwitchMonitor<B, TerminalSwitchView>,
    state: &mut watch::Receiver<MonitorState>,
) -> Option<MonitorState> {
    loop {
        let current = state.borrow_and_update().clone();
        if current != MonitorState::Polling {
            return Some(current);
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                monitor.stop();
                monitor.view().close();
                eprintln!(
                    "\nStopped following; the switch continues on the panel.\n\
                     Resume with: panelctl layers status --follow"
                );
                return None;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    return Some(state.borrow().clone());
                }
            }
        }
    }
}

/// Report a settled switch, acknowledge it if asked, and map failure to
/// a non-zero exit.
async fn finish<B: SwitchBackend>(
    monitor: &SwitchMonitor<B, TerminalSwitchView>,
    settled: &MonitorState,
    ack: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    monitor.view().close();
    print_status(monitor, global);

    let failure = settled.failure();
    if ack && matches!(settled, MonitorState::Finished { .. }) {
        acknowledge(monitor, global).await?;
    }
    failure.map_or(Ok(()), |e| Err(e.into()))
}

/// Structured formats get the last snapshot on stdout; the table view
/// already drew it on stderr.
fn print_status<B: SwitchBackend>(monitor: &SwitchMonitor<B, TerminalSwitchView>, global: &GlobalOpts) {
    if global.output == OutputFormat::Table {
        return;
    }
    if let Some(status) = monitor.last_status() {
        let out = output::render_single(global.output, &status, |_| String::new(), |s| {
            s.phase.to_string()
        });
        output::print_output(&out, global.quiet);
    }
}

/// Clear the terminal switch record and report the installed layer.
async fn acknowledge<B: SwitchBackend>(
    monitor: &SwitchMonitor<B, TerminalSwitchView>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match monitor.reset().await {
        Ok(catalog) => {
            if !global.quiet {
                eprintln!("Current layer: {}", catalog.current);
            }
            Ok(())
        }
        Err(e) if e.is_session_expired() => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "could not reload layers after acknowledging");
            Ok(())
        }
    }
}
