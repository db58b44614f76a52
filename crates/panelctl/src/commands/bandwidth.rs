//! Bandwidth command handler.

use tabled::Tabled;

use panel_core::{BandwidthReport, Panel, Traffic, UserTraffic};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util::fmt_bytes;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct WindowRow {
    #[tabled(rename = "Window")]
    window: &'static str,
    #[tabled(rename = "Received")]
    rx: String,
    #[tabled(rename = "Sent")]
    tx: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl WindowRow {
    fn new(window: &'static str, t: Traffic) -> Self {
        Self {
            window,
            rx: fmt_bytes(t.rx),
            tx: fmt_bytes(t.tx),
            total: fmt_bytes(t.total()),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Upload")]
    uplink: String,
    #[tabled(rename = "Download")]
    downlink: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl From<&UserTraffic> for UserRow {
    fn from(u: &UserTraffic) -> Self {
        Self {
            username: u.username.clone(),
            uplink: fmt_bytes(u.uplink),
            downlink: fmt_bytes(u.downlink),
            total: fmt_bytes(u.total()),
        }
    }
}

fn detail(report: &BandwidthReport) -> String {
    let windows = [
        WindowRow::new("Today", report.today),
        WindowRow::new("This month", report.month),
        WindowRow::new("All time", report.all_time),
    ];
    let mut out = output::render_table(&windows);

    out.push_str("\n\n");
    if report.users.is_empty() {
        out.push_str("No per-user traffic recorded");
    } else {
        let users: Vec<UserRow> = report.users.iter().map(UserRow::from).collect();
        out.push_str(&output::render_table(&users));
    }
    out
}

fn plain(report: &BandwidthReport) -> String {
    report
        .users
        .iter()
        .map(|u| format!("{}\t{}", u.username, u.total()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn handle(panel: &Panel, global: &GlobalOpts) -> Result<(), CliError> {
    let report = panel.bandwidth().await?;
    let out = output::render_single(global.output, &report, detail, plain);
    output::print_output(&out, global.quiet);
    Ok(())
}
