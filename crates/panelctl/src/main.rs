mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use panel_core::{Panel, PanelConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a panel connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "panelctl", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let panel = Panel::new(build_panel_config(&cli.global)?)?;

            tracing::debug!(command = ?cmd, url = %panel.config().url, "dispatching command");
            commands::dispatch(cmd, &panel, &cli.global).await
        }
    }
}

/// Build a `PanelConfig` from the config file, profile, and CLI overrides.
fn build_panel_config(global: &cli::GlobalOpts) -> Result<PanelConfig, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return config::resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.url.is_none() {
        return Err(CliError::ProfileNotFound {
            available: config::available_profiles(&cfg),
            name: profile_name,
        });
    }

    config::resolve_flags_only(&profile_name, &cfg.defaults, global)
}
