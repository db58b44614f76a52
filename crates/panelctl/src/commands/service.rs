//! Service command handlers.

use panel_core::Panel;

use crate::cli::{GlobalOpts, ServiceArgs, ServiceCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(panel: &Panel, args: ServiceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ServiceCommand::Restart => {
            if !util::confirm(
                "Restart the proxy service? Active connections will drop.",
                "service restart",
                global.yes,
            )? {
                return Ok(());
            }
            let service = panel.restart_service().await?;
            let name = if service.is_empty() { "proxy service" } else { &service };
            if !global.quiet {
                eprintln!("✓ Restarted {name}");
            }
            Ok(())
        }

        ServiceCommand::Logs => {
            let logs = panel.service_logs().await?;
            output::print_output(&logs, global.quiet);
            Ok(())
        }
    }
}
