use tracing::{debug, info};

use fairroll::{Config, Result};

mod app_config;
mod commands;

use app_config::{Cli, Commands};
use commands::commands as cmd;

#[tokio::main]
async fn main() -> Result<()> {
    use clap::Parser;

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    fairroll::logging::init(&config.logging, cli.verbose)?;
    debug!(command = cli.command.name(), variant = %config.protocol.variant, "starting");

    let verified = match cli.command {
        Commands::Nonce => cmd::nonce_command().map(|_| true)?,

        Commands::Commit { nonce } => cmd::commit_command(&nonce).map(|_| true)?,

        Commands::Roll { count } => cmd::roll_command(&config, count).map(|_| true)?,

        Commands::Derive {
            server_nonce,
            client_nonce,
        } => cmd::derive_command(&server_nonce, &client_nonce).map(|_| true)?,

        Commands::VerifyDerived {
            server_nonce,
            server_nonce_hash,
            client_nonce,
            server_roll,
            client_roll,
            outcome,
        } => cmd::verify_derived_command(
            &server_nonce,
            &server_nonce_hash,
            &client_nonce,
            server_roll,
            client_roll,
            outcome.as_deref(),
        )?,

        Commands::VerifyGuess {
            server_roll,
            server_nonce,
            client_nonce,
            commitment,
        } => cmd::verify_guess_command(server_roll, &server_nonce, &client_nonce, &commitment)?,

        Commands::Play { variant, rounds } => {
            info!(rounds, "playing against local house");
            cmd::play_command(&config, variant, rounds).await?
        }
    };

    if !verified {
        std::process::exit(1);
    }
    Ok(())
}
