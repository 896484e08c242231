//! Application configuration and CLI argument parsing
//!
//! This module handles all command-line interface definitions and
//! argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fairroll::Variant;

/// Command-line interface definition for Fairroll
#[derive(Parser)]
#[command(name = "fairroll")]
#[command(about = "Provably fair commit-reveal dice: play, derive and verify rounds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands for the Fairroll CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fresh nonce and print it with its commitment
    Nonce,

    /// Print the commitment (SHA-256 of the hex text) of a nonce
    Commit { nonce: String },

    /// Sample a fair die
    Roll {
        #[arg(long, default_value = "1")]
        count: u32,
    },

    /// Derive both rolls from a pair of revealed nonces
    Derive {
        #[arg(long)]
        server_nonce: String,
        #[arg(long)]
        client_nonce: String,
    },

    /// Verify a derived-variant reveal against the server's nonce commitment
    VerifyDerived {
        #[arg(long)]
        server_nonce: String,
        #[arg(long)]
        server_nonce_hash: String,
        #[arg(long)]
        client_nonce: String,
        #[arg(long)]
        server_roll: u8,
        #[arg(long)]
        client_roll: u8,
        /// Outcome label the server reported
        #[arg(long)]
        outcome: Option<String>,
    },

    /// Verify a guess-variant reveal against the server's roll commitment
    VerifyGuess {
        #[arg(long)]
        server_roll: u8,
        #[arg(long)]
        server_nonce: String,
        #[arg(long)]
        client_nonce: String,
        #[arg(long)]
        commitment: String,
    },

    /// Play rounds against an in-process house
    Play {
        /// Overrides the configured protocol variant
        #[arg(long)]
        variant: Option<Variant>,
        #[arg(long, default_value = "1")]
        rounds: u32,
    },
}

impl Commands {
    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Nonce => "nonce",
            Commands::Commit { .. } => "commit",
            Commands::Roll { .. } => "roll",
            Commands::Derive { .. } => "derive",
            Commands::VerifyDerived { .. } => "verify-derived",
            Commands::VerifyGuess { .. } => "verify-guess",
            Commands::Play { .. } => "play",
        }
    }
}
