//! HTTP front of the static file gateway

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use syncserve_fs::{Resolved, ServedFile, StaticGateway};
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, info, warn};

/// Routes every GET/HEAD path through `gateway`.
pub fn router(gateway: StaticGateway) -> Router {
    Router::new()
        .route("/", get(serve_root))
        .route("/{*path}", get(serve_path))
        .with_state(Arc::new(gateway))
}

/// Serve until `shutdown` fires, then finish in-flight requests.
pub async fn serve(
    listener: TcpListener,
    gateway: StaticGateway,
    shutdown: CancellationToken,
    span: Span,
) -> std::io::Result<()> {
    async move {
        info!(
            addr = %listener.local_addr()?,
            root = %gateway.root(),
            "Serving static files"
        );
        axum::serve(listener, router(gateway))
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;
        info!("HTTP server stopped");
        Ok::<(), std::io::Error>(())
    }
    .instrument(span)
    .await
}

async fn serve_root(State(gateway): State<Arc<StaticGateway>>, uri: Uri) -> Response {
    respond(gateway, "/".to_string(), &uri).await
}

async fn serve_path(
    State(gateway): State<Arc<StaticGateway>>,
    Path(path): Path<String>,
    uri: Uri,
) -> Response {
    respond(gateway, format!("/{path}"), &uri).await
}

/// Resolution stats the filesystem, so it runs on the blocking pool.
async fn respond(gateway: Arc<StaticGateway>, request_path: String, uri: &Uri) -> Response {
    let resolved = {
        let request_path = request_path.clone();
        tokio::task::spawn_blocking(move || gateway.open(&request_path)).await
    };
    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(path = %request_path, error = %e, "Resolver task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match resolved {
        Ok(Resolved::File(file)) => stream_file(&file).await,
        Ok(Resolved::NeedsTrailingSlash) => redirect_with_slash(uri),
        Err(e) if e.is_not_found() => {
            debug!(path = %request_path, "Not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            warn!(path = %request_path, error = %e, "Failed to resolve request");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn stream_file(file: &ServedFile) -> Response {
    let handle = match tokio::fs::File::open(file.path().to_native()).await {
        Ok(handle) => handle,
        // Removed by a concurrent pull between resolution and open.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            warn!(path = %file.path(), error = %e, "Failed to open file");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let body = Body::from_stream(ReaderStream::new(handle));
    ([(header::CONTENT_TYPE, file.content_type())], body).into_response()
}

fn redirect_with_slash(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("{}/?{query}", uri.path()),
        None => format!("{}/", uri.path()),
    };
    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
