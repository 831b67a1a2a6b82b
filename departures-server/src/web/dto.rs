//! Response bodies and JSON rendering.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::error;

/// Body of a hard failure.
#[derive(Debug, Serialize)]
pub struct InternalErrorResponse {
    pub error: &'static str,
}

/// A JSON response indented with tabs and ending in a newline.
pub struct TabJson<T>(pub StatusCode, pub T);

/// Serialize `value` indented with tabs.
pub fn to_tab_indented<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

impl<T: Serialize> IntoResponse for TabJson<T> {
    fn into_response(self) -> Response {
        match to_tab_indented(&self.1) {
            Ok(body) => {
                (self.0, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Err(e) => {
                error!(error = %e, "error encoding JSON response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    "{\n\t\"error\": \"internal server error\"\n}\n",
                )
                    .into_response()
            }
        }
    }
}
