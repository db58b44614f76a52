//! Overview command handler.

use std::time::Duration;

use chrono::Local;
use tracing::warn;

use panel_core::{Meter, Overview, Panel};

use crate::cli::{GlobalOpts, OutputFormat, OverviewArgs};
use crate::error::CliError;
use crate::output;

use super::util::fmt_percent;

fn meter(m: &Meter, color: bool) -> String {
    let pct = output::paint_level(&fmt_percent(m.percent), m.level, color);
    match (m.used_gb, m.total_gb) {
        (Some(used), Some(total)) => format!("{pct} ({used:.1} / {total:.1} GB)"),
        _ => pct,
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn detail(o: &Overview, color: bool) -> String {
    let mut lines = vec![
        format!("Host:     {}", or_dash(&o.hostname)),
        format!("IP:       {}", or_dash(&o.ip)),
        format!("OS:       {}", or_dash(&o.os)),
        format!("Uptime:   {}", or_dash(&o.uptime)),
        format!("Layer:    {}", or_dash(&o.layer)),
        format!("Service:  {}", or_dash(&o.service)),
        format!("CPU:      {}", meter(&o.cpu, color)),
        format!("Memory:   {}", meter(&o.memory, color)),
        format!("Disk:     {}", meter(&o.disk, color)),
    ];

    if !o.services.is_empty() {
        lines.push(String::new());
        lines.push("Services:".into());
        for svc in &o.services {
            let state = output::paint_ok(&svc.state.to_string(), svc.state.is_active(), color);
            lines.push(format!("  {:<16} {state}", svc.name));
        }
    }

    lines.push(String::new());
    lines.push(output::paint_dim(
        &format!(
            "Updated {}",
            o.fetched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
        color,
    ));
    lines.join("\n")
}

fn render(o: &Overview, global: &GlobalOpts) -> String {
    let color = output::should_color(global.color);
    output::render_single(global.output, o, |o| detail(o, color), |o| o.layer.clone())
}

pub async fn handle(panel: &Panel, args: &OverviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !args.watch {
        let overview = panel.overview().await?;
        output::print_output(&render(&overview, global), global.quiet);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = ticker.tick() => {}
        }

        match panel.overview().await {
            Ok(overview) => {
                if global.output == OutputFormat::Table {
                    // Clear screen, cursor home
                    print!("\x1b[2J\x1b[H");
                }
                output::print_output(&render(&overview, global), global.quiet);
            }
            Err(e) if e.is_session_expired() => return Err(e.into()),
            Err(e) => warn!(error = %e, "overview refresh failed"),
        }
    }
}
