//! # API adapters
//!
//! HTTP surface for MovieSpace. [`envelope`] is framework-agnostic; the
//! axum router and everything it needs sit behind the `web-axum` feature.
//!
//! Middleware, outermost first:
//!
//! 1. `SetRequestIdLayer` stamps `x-request-id` (UUID) when absent
//! 2. `PropagateRequestIdLayer` echoes it on the response
//! 3. `TraceLayer` opens a span per request carrying that id
//! 4. CORS, then gzip
//! 5. [`context::request_context`] exposes the id to envelope rendering
//! 6. [`metrics::track_requests`] counts responses by method and status

pub mod envelope;

#[cfg(feature = "web-axum")]
pub mod context;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod metrics;
#[cfg(feature = "web-axum")]
pub mod response;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use server::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;

#[cfg(feature = "web-axum")]
mod server {
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use serde::Serialize;
    use tower_http::compression::CompressionLayer;
    use tower_http::cors::{AllowOrigin, Any, CorsLayer};
    use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
    use tower_http::trace::TraceLayer;
    use tracing::{info_span, warn};

    use crate::context::{request_context, REQUEST_ID_HEADER};
    use crate::error::ApiError;
    use crate::metrics::{metrics_handler, track_requests};
    use crate::response::ApiResponse;
    use crate::routes::api_routes;
    use crate::state::AppState;

    #[derive(Serialize)]
    struct Health {
        status: &'static str,
        version: &'static str,
    }

    async fn health() -> ApiResponse<Health> {
        ApiResponse::ok(Health {
            status: "up",
            version: env!("CARGO_PKG_VERSION"),
        })
    }

    async fn not_found() -> ApiError {
        ApiError::RouteNotFound
    }

    /// `*` (or an empty list) allows any origin.
    fn cors(origins: &[String]) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(AllowOrigin::list(allowed))
    }

    pub fn router(state: AppState, cors_origins: &[String]) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics_handler))
            .nest("/api/v1", api_routes())
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), track_requests))
            .layer(middleware::from_fn(request_context))
            .layer(CompressionLayer::new())
            .layer(cors(cors_origins))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!("http", method = %req.method(), uri = %req.uri(), request_id)
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(state)
    }
}
