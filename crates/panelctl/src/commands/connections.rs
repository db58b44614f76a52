//! Connections command handler.

use tabled::Tabled;

use panel_core::{Connection, Panel};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "Remote")]
    remote: String,
    #[tabled(rename = "Local")]
    local: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Process")]
    process: String,
}

impl From<&Connection> for ConnectionRow {
    fn from(c: &Connection) -> Self {
        Self {
            remote: c.remote.clone(),
            local: c.local.clone(),
            state: c.state.clone(),
            process: if c.process.is_empty() {
                "-".into()
            } else {
                c.process.clone()
            },
        }
    }
}

pub async fn handle(panel: &Panel, global: &GlobalOpts) -> Result<(), CliError> {
    let conns = panel.connections().await?;

    if global.output == OutputFormat::Table && conns.is_empty() {
        output::print_output("No active connections", global.quiet);
        return Ok(());
    }

    let out = output::render_list(global.output, &conns, |c| ConnectionRow::from(c), |c| {
        c.remote.clone()
    });
    output::print_output(&out, global.quiet);

    if global.output == OutputFormat::Table {
        output::print_output(&format!("{} connection(s)", conns.len()), global.quiet);
    }
    Ok(())
}
