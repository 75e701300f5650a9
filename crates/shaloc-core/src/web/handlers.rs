//! HTTP handler for the share route.

use std::io;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::state::SharedState;

/// GET /{uri} - Stream the shared artifact as an attachment.
///
/// Once the quota is used up the route answers `503` with an empty body,
/// which covers requests that slip in while the listener is shutting down.
/// A failure to open the artifact only fails this request.
///
/// axum also routes HEAD here; those requests get the headers only and are
/// never counted as downloads.
pub async fn download(
    State(state): State<SharedState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if state.counter.is_exhausted() {
        tracing::debug!("Rejecting request, download quota already reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let artifact = &state.artifact;
    let file = match File::open(artifact.path()).await {
        Ok(file) => file,
        Err(e) => return open_failure_response(&state, &e),
    };

    let length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            tracing::error!("Failed to stat {}: {}", artifact.path().display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.display_name()),
        )
        .header(header::CONTENT_LENGTH, length);

    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        response = response.header(header::CONTENT_TYPE, content_type.clone());
    }

    // Hyper never polls an empty fixed-length body, so an empty GET is
    // counted here.
    let body = if method == Method::HEAD {
        Body::empty()
    } else if length == 0 {
        drop(file);
        state.complete_download().await;
        Body::empty()
    } else {
        Body::from_stream(artifact_stream(file, length, state.clone()))
    };

    response.body(body).unwrap_or_else(|e| {
        tracing::error!("Failed to build response: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

/// Response for a request whose artifact could not be opened.
///
/// The exhausting request deletes a temporary artifact, so a request that
/// passed the quota check just before that sees the file vanish. It gets the
/// same `503` as any request arriving after the quota was reached.
fn open_failure_response(state: &SharedState, error: &io::Error) -> Response {
    if state.counter.is_exhausted() {
        tracing::debug!("Artifact gone after the download quota was reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    tracing::error!(
        "Failed to open {}: {}",
        state.artifact.path().display(),
        error
    );
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Stream `file` and count the download once all `length` bytes were read.
///
/// The count happens right before the final chunk is handed to the
/// transport: with a fixed `Content-Length` hyper drops the body as soon as
/// the last byte is written, without polling it to its end. The file handle
/// is released before counting so the exhausting request can delete a
/// temporary artifact. A client that goes away earlier drops the stream and
/// is not counted; a read error ends the body early without counting either.
fn artifact_stream(
    file: File,
    length: u64,
    state: SharedState,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    async_stream::stream! {
        let mut chunks = Some(ReaderStream::new(file));
        let mut sent = 0u64;

        while let Some(reader) = chunks.as_mut() {
            match reader.next().await {
                Some(Ok(bytes)) => {
                    sent += bytes.len() as u64;
                    if sent >= length {
                        chunks = None;
                        state.complete_download().await;
                    }
                    yield Ok(bytes);
                }
                Some(Err(e)) => {
                    tracing::error!(
                        "Failed to stream {}: {}",
                        state.artifact.path().display(),
                        e
                    );
                    yield Err(e);
                    return;
                }
                None => {
                    chunks = None;
                    tracing::error!(
                        "{} shrank while streaming ({} of {} bytes)",
                        state.artifact.path().display(),
                        sent,
                        length
                    );
                }
            }
        }
    }
}
