//! Command dispatch: bridges CLI args -> `Panel` calls -> output formatting.

pub mod bandwidth;
pub mod config_cmd;
pub mod connections;
pub mod layers;
pub mod overview;
pub mod service;
pub mod util;

use panel_core::Panel;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a panel-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, panel: &Panel, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Overview(args) => overview::handle(panel, &args, global).await,
        Command::Bandwidth => bandwidth::handle(panel, global).await,
        Command::Connections => connections::handle(panel, global).await,
        Command::Service(args) => service::handle(panel, args, global).await,
        Command::Layers(args) => layers::handle(panel, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
