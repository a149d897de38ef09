use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri, header},
    response::IntoResponse,
};
use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::{
    category::{self, LinkItem},
    errors::Error,
    models::{AppState, ExtensionRequest, ExtensionResponse, Job},
};

pub async fn compile(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let job_id = uuid::Uuid::new_v4();
    let (reply, result) = oneshot::channel();
    let job = Job {
        id: job_id,
        source: body,
        reply,
    };

    debug!("Sending new job {job_id} to work queue");

    state
        .work_queue
        .send(job)
        .await
        .map_err(|_| Error::QueueClosed)?;
    let result = result.await.map_err(|_| Error::WorkerDropped)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        result.render(),
    ))
}

pub async fn favicon() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found(uri: Uri) -> StatusCode {
    warn!("Don't know how to respond to the request to {}", uri.path());
    StatusCode::NOT_FOUND
}

// memoized version of asking the compiler for its version
pub async fn get_version(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, Error> {
    let program = &state.compiler.program;

    let version = state
        .version
        .get_or_try_init(|| async {
            let output = tokio::process::Command::new(program)
                .arg("--version")
                .output()
                .await
                .map_err(|e| Error::Version {
                    message: e.to_string(),
                })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let text = if stdout.trim().is_empty() {
                stderr
            } else {
                stdout
            };

            match text.lines().next().map(str::trim) {
                Some(line) if output.status.success() && !line.is_empty() => {
                    Ok(line.to_string())
                }
                _ => Err(Error::Version {
                    message: format!("{program} --version exited with {}", output.status),
                }),
            }
        })
        .await?;

    Ok(Json(serde_json::json!({ "version": version })))
}

pub async fn category_titles(body: String) -> Result<Json<Vec<LinkItem>>, Error> {
    let links = category::page_titles(&body)?;

    for link in &links {
        info!(title = %link.title, "category link");
    }

    Ok(Json(links))
}

/// Endpoint for the browser extension's message channel. `log` is the only
/// action; anything else is answered with `success: false`.
pub async fn extension_request(Json(req): Json<ExtensionRequest>) -> Json<ExtensionResponse> {
    match req.action.as_str() {
        "log" => {
            match &req.arg {
                serde_json::Value::String(message) => info!(target: "extension", "{message}"),
                other => info!(target: "extension", "{other}"),
            }
            Json(ExtensionResponse {
                success: true,
                error: None,
            })
        }
        action => {
            debug!("Rejecting unknown extension action {action:?}");
            Json(ExtensionResponse {
                success: false,
                error: Some(format!("Unknown action: {action}")),
            })
        }
    }
}
