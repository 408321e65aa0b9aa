use std::path::PathBuf;

use clap::Args;

use super::CommandError;
use crate::utils::health::check_health;

/// Check that the site directory is ready to serve
#[derive(Args, Debug)]
pub struct Command {
    /// Directory to check instead of the configured one
    #[arg(long, short)]
    pub site_dir: Option<PathBuf>,
}

impl Command {
    pub async fn run(&self) -> Result<(), CommandError> {
        let site_dir = super::site_dir(self.site_dir.as_ref());
        match check_health(&site_dir) {
            | 0 => Ok(()),
            | n => Err(CommandError::Unhealthy(site_dir, n)),
        }
    }
}
