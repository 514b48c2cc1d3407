//! Mnemos CLI entry point.
//!
//! Binary name: `mnemos`
//!
//! Parses CLI arguments, sets up tracing, opens the data directory and
//! dispatches to the command handlers.

mod cli;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ProfileCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.otel {
        mnemos_observe::tracing_setup::init_tracing(true)
            .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;
    } else {
        let filter = match cli.verbose {
            0 => "warn",
            1 => "info,mnemos=debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(false)
            .init();
    }

    let result = run(cli).await;
    mnemos_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Listing operations needs neither the database nor an API key.
    // Neither does previewing the classification prompt.
    match &cli.command {
        Commands::Operations => return cli::invoke::list_operations(cli.json),
        Commands::Classify {
            text,
            show_prompt: true,
        } => return cli::adapter::show_classify_prompt(text, cli.json),
        _ => {}
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Profile { action } => match action {
            ProfileCommand::Show { owner } => {
                cli::profile::show_profile(&state, &owner, cli.json).await?;
            }
            ProfileCommand::Extend {
                owner,
                attributes,
                capabilities,
            } => {
                cli::profile::extend_profile(&state, &owner, &attributes, &capabilities, cli.json)
                    .await?;
            }
        },

        Commands::Invoke {
            owner,
            entity,
            namespace,
            capability,
            args,
            grant,
        } => {
            cli::invoke::invoke(
                &state,
                &owner,
                &entity,
                &namespace,
                &capability,
                &args,
                grant,
                cli.json,
            )
            .await?;
        }

        Commands::Operations => unreachable!("handled above"),

        Commands::Classify { text, .. } => {
            cli::adapter::classify(&state, &text, cli.json).await?;
        }

        Commands::Transcribe { path } => {
            cli::adapter::transcribe(&state, &path, cli.json).await?;
        }

        Commands::DescribeImage { path } => {
            cli::adapter::describe_image(&state, &path, cli.json).await?;
        }
    }

    Ok(())
}
