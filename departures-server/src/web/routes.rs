//! HTTP route handlers.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::departures::{ApiError, Outcome};
use crate::store::{DepartureStore, StopsInAreaStore, SystemStatusStore};

use super::dto::{InternalErrorResponse, TabJson};
use super::state::AppState;

/// Create the application router.
pub fn create_router<A, D, T>(state: AppState<A, D, T>) -> Router
where
    A: StopsInAreaStore + 'static,
    D: DepartureStore + 'static,
    T: SystemStatusStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/departures/:location", get(departures::<A, D, T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Departures for a stop or stop area.
async fn departures<A, D, T>(
    State(state): State<AppState<A, D, T>>,
    Path(location): Path<String>,
) -> Result<Response, AppError>
where
    A: StopsInAreaStore + 'static,
    D: DepartureStore + 'static,
    T: SystemStatusStore + 'static,
{
    let outcome = state
        .api
        .render(&location)
        .await
        .map_err(|source| AppError::Departures { location, source })?;

    let response = match outcome {
        Outcome::Departures(body) => TabJson(StatusCode::OK, body).into_response(),
        Outcome::BadRequest(body) => TabJson(StatusCode::BAD_REQUEST, body).into_response(),
        Outcome::Stale(body) => TabJson(StatusCode::BAD_GATEWAY, body).into_response(),
    };
    Ok(response)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Departures { location: String, source: ApiError },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Departures { location, source } => error!(
                location = %location,
                error = %source,
                "error with Metrolink departures API response"
            ),
        }

        TabJson(
            StatusCode::INTERNAL_SERVER_ERROR,
            InternalErrorResponse {
                error: "internal server error",
            },
        )
        .into_response()
    }
}
