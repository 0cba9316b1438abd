//! Per-request context shared with response rendering.
//!
//! `SetRequestIdLayer` stamps `x-request-id` on the way in; this middleware
//! lifts it into a task-local so envelopes built anywhere below it (handlers,
//! extractor rejections, the fallback) can echo it.

use axum::{extract::Request, middleware::Next, response::Response};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// The current request id, if called inside [`request_context`].
pub fn request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

pub async fn request_context(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match id {
        Some(id) => REQUEST_ID.scope(id, next.run(req)).await,
        None => next.run(req).await,
    }
}
