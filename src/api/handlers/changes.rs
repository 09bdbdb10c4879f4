//! Change delivery endpoint: the trigger layer's push target.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ChangeAckResponse, ChangeRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ShimError};

/// `POST /documents/{document_id}/changes` — Mirror one document write.
///
/// Warehouse failures do not fail the request: they are logged and
/// reported as `"delivered": false`.
///
/// # Errors
///
/// Returns [`ShimError`] when the body is not a decodable change.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{document_id}/changes",
    tag = "Changes",
    summary = "Deliver a document change",
    description = "Classifies the write, sanitizes both snapshots and appends one changelog row.",
    params(
        ("document_id" = String, Path, description = "Document id within the watched collection"),
    ),
    request_body = ChangeRequest,
    responses(
        (status = 200, description = "Change handled", body = ChangeAckResponse),
        (status = 400, description = "Undecodable change", body = ErrorResponse),
    )
)]
pub async fn deliver_change(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    body: Result<Json<ChangeRequest>, JsonRejection>,
) -> Result<Json<ChangeAckResponse>, ShimError> {
    let Json(request) = body?;
    let notification = request.into_notification(document_id)?;

    let outcome = state.translator.handle(notification).await;
    Ok(Json(ChangeAckResponse::from(outcome)))
}

/// Change routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/documents/{document_id}/changes", post(deliver_change))
}
