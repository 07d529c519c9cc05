//! The `mdnsd-cli` demo binary's command-line surface.
//!
//! Grounded in the teacher's `Cli`/`Commands`/`SharedOpts` shape: a
//! `clap`-derived top-level `Cli` wrapping a `Commands` enum, with shared
//! options flattened into each variant.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Clone)]
pub struct SharedOpts {
    #[clap(short, long, help = "Configuration file")]
    pub config: Option<PathBuf>,
    #[clap(short, long)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish the configured service and keep announcing it.
    Announce {
        #[clap(flatten)]
        sopt: SharedOpts,
    },
    /// Browse for other instances of the configured service type.
    Browse {
        #[clap(flatten)]
        sopt: SharedOpts,
    },
    /// Load the configuration and print it back out, without starting.
    ConfigCheck {
        #[clap(flatten)]
        sopt: SharedOpts,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Announce {
            sopt: SharedOpts {
                config: None,
                debug: false,
            },
        }
    }
}

#[derive(Parser)]
#[command(arg_required_else_help(false))]
/// A demo binary driving the mDNS engine over a blocking UDP socket.
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> Option<PathBuf> {
        match &self.command {
            Commands::Announce { sopt } | Commands::Browse { sopt } | Commands::ConfigCheck { sopt } => {
                sopt.config.clone()
            }
        }
    }

    pub fn debug(&self) -> bool {
        match &self.command {
            Commands::Announce { sopt } | Commands::Browse { sopt } | Commands::ConfigCheck { sopt } => {
                sopt.debug
            }
        }
    }
}
