//! Ferry relay server
//!
//! - `POST /` and `POST /proxy`: relay call, JSON in and out
//! - `OPTIONS` on the same paths: CORS preflight
//! - `GET /healthz`: liveness
//!
//! Every response carries the same permissive CORS headers.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use ferry_relay::{
    ErrorBody, Fetcher, Relay, CORS_ALLOW_HEADERS, CORS_ALLOW_ORIGIN, FALLBACK_ERROR_MESSAGE,
};

pub fn router<F: Fetcher + 'static>(relay: Relay<F>) -> Router {
    Router::new()
        .route("/", post(relay_handler::<F>).options(preflight))
        .route("/proxy", post(relay_handler::<F>).options(preflight))
        .route("/healthz", get(healthz))
        .with_state(relay)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(map_response(with_cors))
        .layer(TraceLayer::new_for_http())
}

async fn relay_handler<F: Fetcher + 'static>(
    State(relay): State<Relay<F>>,
    body: Bytes,
) -> Response {
    match relay.handle_json(&body).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if e.is_client_error() {
                tracing::warn!(status = status.as_u16(), error = %e, "Relay request rejected");
            } else {
                tracing::error!(status = status.as_u16(), error = %e, "Relay request failed");
            }
            json_response(status, &ErrorBody::new(e.to_string()))
        }
    }
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn healthz() -> &'static str {
    "ok"
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize relay response");
            fallback_error()
        }
    }
}

fn fallback_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        format!(r#"{{"error":"{}"}}"#, FALLBACK_ERROR_MESSAGE),
    )
        .into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        FALLBACK_ERROR_MESSAGE.to_string()
    };

    tracing::error!(error = %message, "Relay handler panicked");
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &ErrorBody::new(message))
}
