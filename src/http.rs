//! HTTP surface: a single question endpoint plus read-only introspection.

use crate::{
    doc_loader::Upload,
    error::{Result, ServerError},
    server::{Answer, AskRequest, DocQaServer, DocumentListing},
};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::info!("Request rejected: {}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

pub fn create_router(server: DocQaServer, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/documents", get(documents))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("HTTP server shutting down");
        })
        .await?;
    Ok(())
}

async fn ask(
    State(server): State<DocQaServer>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Answer>, ServerError> {
    let multipart = multipart.map_err(|e| ServerError::InvalidForm(e.body_text()))?;
    let request = read_ask_form(multipart).await?;
    tracing::info!(
        has_file = request.upload.is_some(),
        "Received question: {}",
        request.question
    );
    let answer = server.ask(request).await?;
    Ok(Json(answer))
}

async fn documents(State(server): State<DocQaServer>) -> Json<DocumentListing> {
    Json(server.documents().await)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Reads the `question` text field and the optional `file` field.
/// Browsers send an empty, unnamed `file` part when nothing was chosen.
async fn read_ask_form(mut multipart: Multipart) -> Result<AskRequest> {
    let mut question = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Multipart(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("question") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::Multipart(e.to_string()))?;
                question = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let mime_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Multipart(e.to_string()))?;
                let unnamed = file_name.as_deref().is_none_or(str::is_empty);
                if bytes.is_empty() && unnamed {
                    continue;
                }
                upload = Some(Upload::new(file_name, mime_type, bytes.to_vec()));
            }
            other => {
                tracing::debug!("Ignoring unexpected form field {:?}", other);
            }
        }
    }

    let question = question.ok_or_else(|| ServerError::MissingField("question".to_string()))?;
    Ok(AskRequest { question, upload })
}
