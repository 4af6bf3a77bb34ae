//! VetSync CLI
//!
//! Offline inspection and maintenance of a VetSync data directory. Nothing
//! here talks to the remote service.
//!
//! # Commands
//!
//! - `users` - List users with local state
//! - `snapshot` - Print a user's portal snapshot
//! - `queue` - List a user's queued operations
//! - `retry` - Return failed operations to pending
//! - `reset` - Delete a user's local state

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vetsync_sync_protocol::UserId;

/// VetSync local data tools.
#[derive(Parser)]
#[command(name = "vetsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users with local state
    Users {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a user's portal snapshot
    Snapshot {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List a user's queued operations
    Queue {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Only show failed operations
        #[arg(long)]
        failed: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Return failed operations to pending
    Retry {
        /// User id
        #[arg(short, long)]
        user: String,
    },

    /// Delete a user's local state, queued operations included
    Reset {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Users { format } => {
            let path = cli.path.ok_or("Data directory required for users")?;
            commands::users::run(&path, &format)?;
        }
        Commands::Snapshot { user, format } => {
            let path = cli.path.ok_or("Data directory required for snapshot")?;
            commands::snapshot::run(&path, &UserId::new(user), &format)?;
        }
        Commands::Queue {
            user,
            failed,
            format,
        } => {
            let path = cli.path.ok_or("Data directory required for queue")?;
            commands::queue::run(&path, &UserId::new(user), failed, &format)?;
        }
        Commands::Retry { user } => {
            let path = cli.path.ok_or("Data directory required for retry")?;
            commands::retry::run(&path, &UserId::new(user))?;
        }
        Commands::Reset { user, yes } => {
            let path = cli.path.ok_or("Data directory required for reset")?;
            if !yes {
                return Err("Refusing to reset without --yes".into());
            }
            commands::reset::run(&path, &UserId::new(user))?;
        }
        Commands::Version => {
            println!("VetSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("VetSync Core v{}", vetsync_core::VERSION);
        }
    }

    Ok(())
}
