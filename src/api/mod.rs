//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Change delivery is mounted under `/api/v1`; system endpoints live at
//! the root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "firestore-changelog",
        description = "Document change to warehouse changelog shim"
    ),
    paths(handlers::changes::deliver_change, handlers::system::health_handler),
    components(schemas(
        dto::ChangeRequest,
        dto::DocumentSnapshotDto,
        dto::ChangeAckResponse,
        crate::domain::Operation,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Changes", description = "Document change delivery"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the served application: routes, OpenAPI UI, tracing and the
/// per-request timeout.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(timeout_layer(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers `408 Request Timeout` once a request runs past `request_timeout`.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[test]
    fn openapi_lists_change_endpoint() {
        let doc = ApiDoc::openapi();
        assert!(
            doc.paths
                .paths
                .contains_key("/api/v1/documents/{document_id}/changes")
        );
        assert!(doc.paths.paths.contains_key("/health"));
    }

    #[tokio::test]
    async fn slow_requests_get_request_timeout() {
        let router: Router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(50)));

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let Ok(response) = reqwest::get(format!("http://{addr}/slow")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status().as_u16(), 408);
    }
}
