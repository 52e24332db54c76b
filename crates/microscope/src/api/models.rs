// crates/microscope/src/api/models.rs
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub entries: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub count: i64,
    pub entries: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON body indented with tabs.
#[derive(Debug)]
pub struct PrettyJson<T>(pub StatusCode, pub T);

impl<T: Serialize> PrettyJson<T> {
    pub fn ok(value: T) -> Self {
        Self(StatusCode::OK, value)
    }
}

pub fn to_pretty_vec<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        let PrettyJson(status, value) = self;
        match to_pretty_vec(&value) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
                    serde_json::json!({ "error": e.to_string() }).to_string(),
                )
                    .into_response()
            }
        }
    }
}
