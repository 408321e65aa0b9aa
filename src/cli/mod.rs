// cli/mod.rs
//! Defines clap commands

macro_rules! command_boilerplate {
    ( $( $Variant:ident ),* $(,)? ) => {
        paste::paste! {
            $(
                pub mod [<$Variant:lower>];
            )*

            #[derive(Debug, clap::Subcommand)]
            #[non_exhaustive]
            pub enum Command {
                $(
                    $Variant([<$Variant:lower>]::Command),
                )*
            }

            impl Cli {
                pub async fn run(&self) -> Result<(), CommandError> {
                    match &self.command {
                        $(
                            | Command::$Variant(x) => x.run().await,
                        )*
                    }
                }
            }
        }
    };
}

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::{
    config::CONFIG,
    server::core::ServeError,
};

#[derive(Debug, Parser)]
#[command(name = "qtupload", version, author, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to run server: {0}")]
    ServeError(#[from] ServeError),

    #[error("Site directory {0:?} failed {1} health check(s)")]
    Unhealthy(PathBuf, u8),
}

command_boilerplate! {
    Serve,
    Health,
}

/// Resolves the site directory from an optional override, falling back to the config
fn site_dir(site_dir: Option<&PathBuf>) -> PathBuf {
    site_dir.cloned().unwrap_or_else(|| PathBuf::from(&CONFIG.site_dir))
}
