// server/decode.rs
//! Ways of turning a POST body into file contents

use std::fmt;

use axum::extract::{
    Multipart,
    multipart::MultipartError,
};
use base64::{
    Engine,
    engine::general_purpose::STANDARD,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Decoder {
    /// The body is base64 text
    Base64,
    /// The body is multipart/form-data and the file is one of its fields
    Multipart,
    /// The body is the file
    Raw,
}

impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            | Self::Base64 => "base64",
            | Self::Multipart => "multipart",
            | Self::Raw => "raw",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("No form field named '{0}'")]
    MissingField(String),
}

/// # Decodes a base64 body
///
/// ASCII whitespace is ignored, since encoders commonly wrap their output. Anything else outside
/// the standard alphabet, or bad padding, is an error.
pub fn decode_base64(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let compact: Vec<u8> = body.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// # Reads the first multipart field named `name`
///
/// Fields before it are skipped, fields after it are never read.
pub async fn decode_multipart(mut multipart: Multipart, name: &str) -> Result<Vec<u8>, DecodeError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(name) {
            debug!("Found field '{name}' (filename: {:?})", field.file_name());
            return Ok(field.bytes().await?.to_vec())
        }
    }

    Err(DecodeError::MissingField(name.to_owned()))
}
