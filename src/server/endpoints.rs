// server/endpoints.rs

use std::io;

use axum::{
    body::Bytes,
    extract::{
        FromRequest,
        Multipart,
        Request,
        State,
        multipart::MultipartRejection,
        rejection::BytesRejection,
    },
    http::StatusCode,
    response::{
        IntoResponse,
        Redirect,
        Response,
    },
};
use thiserror::Error;
use tracing::{
    debug,
    error,
    info,
};

use super::{
    core::AppState,
    decode::{
        DecodeError,
        Decoder,
        decode_base64,
        decode_multipart,
    },
};
use crate::unravel;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read body: {0}")]
    Body(#[from] BytesRejection),

    #[error("Failed to read form: {0}")]
    Form(#[from] MultipartRejection),

    #[error("Failed to decode upload: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to write upload: {0}")]
    Write(#[from] io::Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        error!("{self}");
        unravel!(self);
        match self {
            // Extractor rejections already know their status
            | Self::Body(r) => r.into_response(),
            | Self::Form(r) => r.into_response(),
            // So does a multipart stream cut off by the body limit
            | Self::Decode(DecodeError::Multipart(e)) => e.into_response(),
            | Self::Decode(_) | Self::Write(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse { state.assets.index.clone() }

pub async fn script(State(state): State<AppState>) -> impl IntoResponse { state.assets.script.clone() }

pub async fn upload(State(state): State<AppState>, request: Request) -> Result<Redirect, UploadError> {
    let filedata = match state.decoder {
        | Decoder::Base64 => {
            let body = Bytes::from_request(request, &state).await?;
            decode_base64(&body)?
        },
        | Decoder::Multipart => {
            let multipart = Multipart::from_request(request, &state).await?;
            decode_multipart(multipart, &state.upload_field).await?
        },
        | Decoder::Raw => Bytes::from_request(request, &state).await?.to_vec(),
    };

    info!("Received {} bytes", filedata.len());
    tokio::fs::write(&*state.upload_path, &filedata).await?;
    debug!("Wrote upload to {:?}", state.upload_path);

    Ok(Redirect::to("/"))
}
