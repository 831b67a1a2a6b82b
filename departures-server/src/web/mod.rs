//! HTTP transport for the departures API.

mod dto;
mod routes;
mod state;

pub use dto::{InternalErrorResponse, TabJson, to_tab_indented};
pub use routes::{AppError, create_router};
pub use state::AppState;
