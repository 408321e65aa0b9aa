// server/assets.rs
//! The static files served over GET

use std::{
    io,
    path::{
        Path,
        PathBuf,
    },
};

use axum::{
    body::Bytes,
    http::{
        HeaderMap,
        HeaderValue,
        header,
    },
    response::{
        IntoResponse,
        Response,
    },
};
use thiserror::Error;
use tracing::{
    debug,
    warn,
};

pub const INDEX: &str = "index.html";
pub const SCRIPT: &str = "qtfaststart.js";

#[derive(Debug, Error)]
#[error("Failed to read asset {path:?}: {source}")]
pub struct AssetError {
    path:   PathBuf,
    #[source]
    source: io::Error,
}

#[derive(Debug, Clone)]
pub struct Asset {
    content:       Bytes,
    mime:          HeaderValue,
    last_modified: Option<HeaderValue>,
}

/// Everything served over GET, read once at startup
#[derive(Debug, Clone)]
pub struct Assets {
    pub index:  Asset,
    pub script: Asset,
}

impl Assets {
    pub fn load<P: AsRef<Path>>(site_dir: P) -> Result<Self, AssetError> {
        let site_dir = site_dir.as_ref();
        Ok(Self {
            index:  Asset::load(site_dir.join(INDEX))?,
            script: Asset::load(site_dir.join(SCRIPT))?,
        })
    }
}

impl Asset {
    pub fn load(path: PathBuf) -> Result<Self, AssetError> {
        let content = match std::fs::read(&path) {
            | Ok(c) => c,
            | Err(source) => return Err(AssetError { path, source }),
        };

        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        let mime = HeaderValue::from_str(mime.as_ref())
            .unwrap_or(HeaderValue::from_static("application/octet-stream"));

        let last_modified = match last_modified(&path) {
            | Ok(v) => Some(v),
            | Err(e) => {
                warn!("No modification time for {path:?}: {e}");
                None
            },
        };

        debug!("Loaded {path:?} ({} bytes)", content.len());
        Ok(Self {
            content: Bytes::from(content),
            mime,
            last_modified,
        })
    }
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, self.mime);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.content.len()));
        if let Some(modtime) = self.last_modified {
            headers.insert(header::LAST_MODIFIED, modtime);
        }

        (headers, self.content).into_response()
    }
}

fn last_modified(path: &Path) -> io::Result<HeaderValue> {
    let modtime = std::fs::metadata(path)?.modified()?;
    let datetime = httpdate::fmt_http_date(modtime);
    HeaderValue::from_str(&datetime).map_err(|_| io::ErrorKind::InvalidData.into())
}
