use std::path::PathBuf;

use clap::Args;

use super::CommandError;
use crate::{
    config::CONFIG,
    server::{
        self,
        core::ServeOpts,
        decode::Decoder,
    },
};

/// Serve the upload form and accept uploads
#[derive(Args, Debug)]
pub struct Command {
    /// Address to listen on
    #[arg(long, short)]
    pub address: Option<String>,

    /// How to decode POST bodies
    #[arg(long, short, value_enum)]
    pub decoder: Option<Decoder>,

    /// Directory holding the assets and receiving uploads
    #[arg(long, short)]
    pub site_dir: Option<PathBuf>,
}

impl Command {
    fn opts(&self) -> ServeOpts {
        ServeOpts {
            address:         self.address.clone().unwrap_or_else(|| CONFIG.server_address.clone()),
            site_dir:        super::site_dir(self.site_dir.as_ref()),
            decoder:         self.decoder.unwrap_or(CONFIG.decoder),
            upload_field:    CONFIG.upload_field.clone(),
            max_upload_size: CONFIG.max_upload_size,
        }
    }

    pub async fn run(&self) -> Result<(), CommandError> { Ok(server::core::serve(self.opts()).await?) }
}
