// server/core.rs

use std::{
    io,
    path::{
        Path,
        PathBuf,
    },
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use thiserror::Error;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{
    error,
    info,
};

use super::{
    assets::{
        AssetError,
        Assets,
    },
    decode::Decoder,
    endpoints::*,
};

/// Name of the file every upload overwrites, relative to the site directory
pub const UPLOAD_FILE: &str = "uploaded.mp4";

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("{0}")]
    Assets(#[from] AssetError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr:   String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct ServeOpts {
    pub address:         String,
    pub site_dir:        PathBuf,
    pub decoder:         Decoder,
    pub upload_field:    String,
    pub max_upload_size: usize,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub assets:       Arc<Assets>,
    pub decoder:      Decoder,
    pub upload_field: Arc<str>,
    pub upload_path:  Arc<Path>,
}

impl AppState {
    pub fn new<P: AsRef<Path>>(site_dir: P, decoder: Decoder, upload_field: &str) -> Result<Self, AssetError> {
        let site_dir = site_dir.as_ref();
        Ok(Self {
            assets: Arc::new(Assets::load(site_dir)?),
            decoder,
            upload_field: upload_field.into(),
            upload_path: site_dir.join(UPLOAD_FILE).into(),
        })
    }
}

pub fn router(state: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/", get(index).post(upload))
        .route("/qtfaststart.js", get(script))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
        .with_state(state)
}

pub async fn serve(opts: ServeOpts) -> Result<(), ServeError> {
    info!("Starting qtupload {}", env!("QTUPLOAD_VERSION"));
    let state = AppState::new(&opts.site_dir, opts.decoder, &opts.upload_field)?;
    let router = router(state, opts.max_upload_size);

    let addr = &opts.address;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|source| ServeError::Bind {
        addr: addr.clone(),
        source,
    })?;

    info!("Listening on {} (decoder: {})", listener.local_addr()?, opts.decoder);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod test {
    use std::fs;

    use axum::{
        body::{
            Body,
            to_bytes,
        },
        http::{
            Request,
            StatusCode,
            header,
        },
        response::Response,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::server::assets::{
        INDEX,
        SCRIPT,
    };

    const HTML: &str = "<!DOCTYPE html>\n<form method=\"post\"></form>\n";
    const JS: &str = "var QtFastStart = {};\n";
    const LIMIT: usize = 1024 * 1024;

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX), HTML).unwrap();
        fs::write(dir.path().join(SCRIPT), JS).unwrap();
        dir
    }

    fn app(dir: &TempDir, decoder: Decoder) -> Router {
        let state = AppState::new(dir.path(), decoder, "file").unwrap();
        router(state, LIMIT)
    }

    async fn post(app: Router, content_type: &str, body: impl Into<Body>) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn get(app: Router, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap()
    }

    fn multipart_body(boundary: &str, field: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nclip\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"clip.mp4\"\r\nContent-Type: video/mp4\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    fn assert_redirects_home(response: &Response) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_index_is_served_verbatim() {
        let dir = site();
        let response = get(app(&dir, Decoder::Base64), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert!(response.headers().contains_key(header::LAST_MODIFIED));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], fs::read(dir.path().join(INDEX)).unwrap());
    }

    #[tokio::test]
    async fn test_script_is_served_verbatim() {
        let dir = site();
        let response = get(app(&dir, Decoder::Raw), "/qtfaststart.js").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], fs::read(dir.path().join(SCRIPT)).unwrap());
    }

    #[tokio::test]
    async fn test_assets_are_read_at_startup() {
        let dir = site();
        let app = app(&dir, Decoder::Base64);
        fs::write(dir.path().join(INDEX), "changed").unwrap();

        let response = get(app, "/").await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], HTML.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_assets_fail_startup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX), HTML).unwrap();
        assert!(AppState::new(dir.path(), Decoder::Base64, "file").is_err());
    }

    #[tokio::test]
    async fn test_base64_upload() {
        let dir = site();
        let response = post(app(&dir, Decoder::Base64), "text/plain", "AAECA/7/\n").await;

        assert_redirects_home(&response);
        assert_eq!(fs::read(dir.path().join(UPLOAD_FILE)).unwrap(), [0, 1, 2, 3, 254, 255]);
    }

    #[tokio::test]
    async fn test_malformed_base64_is_a_server_error() {
        let dir = site();
        let response = post(app(&dir, Decoder::Base64), "text/plain", "@@not base64@@").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!dir.path().join(UPLOAD_FILE).exists());
    }

    #[tokio::test]
    async fn test_malformed_base64_keeps_previous_upload() {
        let dir = site();
        fs::write(dir.path().join(UPLOAD_FILE), b"previous upload").unwrap();
        let response = post(app(&dir, Decoder::Base64), "text/plain", "aGVsbG8").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fs::read(dir.path().join(UPLOAD_FILE)).unwrap(), b"previous upload");
    }

    #[tokio::test]
    async fn test_raw_upload() {
        let dir = site();
        let payload: Vec<u8> = (0..=255).collect();
        let response = post(app(&dir, Decoder::Raw), "video/mp4", payload.clone()).await;

        assert_redirects_home(&response);
        assert_eq!(fs::read(dir.path().join(UPLOAD_FILE)).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let dir = site();
        let payload = b"\x00\x00\x00\x18ftypmp42\r\n--not-a-boundary";
        let body = multipart_body("XBOUNDARYX", "file", payload);
        let response = post(
            app(&dir, Decoder::Multipart),
            "multipart/form-data; boundary=XBOUNDARYX",
            body,
        )
        .await;

        assert_redirects_home(&response);
        assert_eq!(fs::read(dir.path().join(UPLOAD_FILE)).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_multipart_missing_field_is_a_server_error() {
        let dir = site();
        let body = multipart_body("XBOUNDARYX", "video", b"data");
        let response = post(
            app(&dir, Decoder::Multipart),
            "multipart/form-data; boundary=XBOUNDARYX",
            body,
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!dir.path().join(UPLOAD_FILE).exists());
    }

    #[tokio::test]
    async fn test_upload_truncates_previous() {
        let dir = site();
        post(app(&dir, Decoder::Raw), "video/mp4", vec![7u8; 64]).await;
        let response = post(app(&dir, Decoder::Raw), "video/mp4", vec![1u8, 2, 3]).await;

        assert_redirects_home(&response);
        assert_eq!(fs::read(dir.path().join(UPLOAD_FILE)).unwrap(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let dir = site();
        let state = AppState::new(dir.path(), Decoder::Raw, "file").unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_LENGTH, "32")
            .body(Body::from(vec![0u8; 32]))
            .unwrap();

        let response = router(state, 16).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!dir.path().join(UPLOAD_FILE).exists());
    }

    #[tokio::test]
    async fn test_multipart_over_limit_without_length_is_rejected() {
        let dir = site();
        let state = AppState::new(dir.path(), Decoder::Multipart, "file").unwrap();
        let body = multipart_body("XBOUNDARYX", "file", &[0x42u8; 400]);
        // No Content-Length, so the limit only trips while the field is read
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARYX")
            .body(Body::from(body))
            .unwrap();

        let response = router(state, 64).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!dir.path().join(UPLOAD_FILE).exists());
    }

    #[tokio::test]
    async fn test_large_upload_beats_default_limit() {
        let dir = site();
        let payload = vec![0x42u8; 4 * 1024 * 1024];
        let state = AppState::new(dir.path(), Decoder::Raw, "file").unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(payload.clone()))
            .unwrap();

        let response = router(state, 8 * 1024 * 1024).oneshot(request).await.unwrap();
        assert_redirects_home(&response);
        assert_eq!(fs::read(dir.path().join(UPLOAD_FILE)).unwrap().len(), payload.len());
    }

    #[tokio::test]
    async fn test_script_rejects_post() {
        let dir = site();
        let request = Request::builder()
            .method("POST")
            .uri("/qtfaststart.js")
            .body(Body::from("x"))
            .unwrap();
        let response = app(&dir, Decoder::Raw).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
