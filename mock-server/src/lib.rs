//! Scripted HTTP server for exercising web service clients.
//!
//! Requests to any path other than the control endpoints are answered with
//! the next queued `CannedResponse`. `/mirror` echoes the request back as
//! JSON so callers can inspect exactly what a client sent.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Response, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};

/// A response to replay, in the order it was queued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannedResponse {
    pub status: u16,
    #[serde(default, rename = "contentType")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl CannedResponse {
    pub fn new(status: u16, content_type: &str, body: &str) -> Self {
        Self {
            status,
            content_type: Some(content_type.to_string()),
            body: body.to_string(),
        }
    }
}

/// What `/mirror` reports about a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirroredRequest {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Queue = Arc<Mutex<VecDeque<CannedResponse>>>;

pub fn queue() -> Queue {
    Arc::new(Mutex::new(VecDeque::new()))
}

pub fn app(queue: Queue) -> Router {
    Router::new()
        .route("/test", get(|| async { StatusCode::OK }))
        .route("/mirror", any(mirror))
        .route("/_queue", post(enqueue))
        .fallback(replay)
        .with_state(queue)
}

pub async fn run(listener: TcpListener, queue: Queue) -> Result<(), std::io::Error> {
    axum::serve(listener, app(queue)).await
}

async fn mirror(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<MirroredRequest> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(MirroredRequest {
        method: method.to_string(),
        uri: uri.to_string(),
        headers,
        body,
    })
}

async fn enqueue(State(queue): State<Queue>, Json(response): Json<CannedResponse>) -> StatusCode {
    queue.lock().await.push_back(response);
    StatusCode::NO_CONTENT
}

async fn replay(State(queue): State<Queue>) -> Response<Body> {
    let Some(canned) = queue.lock().await.pop_front() else {
        return StatusCode::OK.into_response();
    };
    tracing::debug!(status = canned.status, "replaying canned response");

    let Ok(status) = StatusCode::from_u16(canned.status) else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "invalid canned status").into_response();
    };
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = &canned.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(canned.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_response_reads_camel_case_content_type() {
        let canned: CannedResponse = serde_json::from_str(
            r#"{"status":402,"contentType":"application/json","body":"{}"}"#,
        )
        .unwrap();
        assert_eq!(canned, CannedResponse::new(402, "application/json", "{}"));
    }

    #[test]
    fn canned_response_defaults_optional_fields() {
        let canned: CannedResponse = serde_json::from_str(r#"{"status":500}"#).unwrap();
        assert_eq!(canned.content_type, None);
        assert_eq!(canned.body, "");
    }

    #[test]
    fn canned_response_rejects_missing_status() {
        let result: Result<CannedResponse, _> = serde_json::from_str(r#"{"body":"x"}"#);
        assert!(result.is_err());
    }
}
