// config.rs
//! Config code

use std::{
    fs,
    sync::LazyLock,
};

use serde::Deserialize;

use crate::server::decode::Decoder;

pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::load);

const CONFIG_PATH: &str = "qtupload.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (from trace to off, case insensitive)
    pub log_level:       String,
    /// Whether to log to the console
    pub log_to_console:  bool,
    /// Path of the log file
    pub log_file:        String,
    /// Max log size in bytes
    pub log_max_size:    u64,
    /// Address to listen on
    pub server_address:  String,
    /// Directory holding index.html, qtfaststart.js, and the uploaded file
    pub site_dir:        String,
    /// How POST bodies are turned into file contents
    pub decoder:         Decoder,
    /// Form field carrying the file when using the multipart decoder
    pub upload_field:    String,
    /// Max request body size in bytes
    pub max_upload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level:       "debug".to_string(),
            log_to_console:  true,
            log_file:        "qtupload.log".to_string(),
            log_max_size:    16 * 1024 * 1024, // 16 MiB
            server_address:  "0.0.0.0:8080".to_string(),
            site_dir:        "site".to_string(),
            decoder:         Decoder::Base64,
            upload_field:    "file".to_string(),
            max_upload_size: 1024 * 1024 * 1024, // 1 GiB
        }
    }
}

impl Config {
    pub fn load() -> Self {
        // Logging isn't up yet since it depends on the config
        let config_str = match fs::read_to_string(CONFIG_PATH) {
            | Ok(c) => c,
            | Err(e) => {
                eprintln!("Failed to read config file at {CONFIG_PATH}: {e}");
                eprintln!("The default config will be used");
                return Self::default()
            },
        };

        Self::parse(&config_str).unwrap_or_else(|e| {
            eprintln!("\x1b[31;1mInvalid config: {e}\x1b[0m");
            eprintln!("\x1b[31;1mThe default config will be used\x1b[0m");
            Self::default()
        })
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> { toml::de::from_str(s) }
}
