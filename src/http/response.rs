//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform backend response for client
//! - Handle response streaming efficiently
//! - Map gateway-side outcomes to status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped automatically, except the upgrade pair on
//!   a 101 answer
//! - No matching route is a bare 404 with an empty body
//! - Backend failures surface as 502, never retried

use axum::body::Body;
use axum::http::header::{CONNECTION, UPGRADE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;

/// Convert a backend response into the response sent to the client.
pub fn from_upstream(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Relay a `101 Switching Protocols` answer; the body belongs to the tunnel.
pub fn switching_protocols(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, _body) = response.into_parts();
    let protocol = parts.headers.get(UPGRADE).cloned();

    strip_hop_by_hop(&mut parts.headers);
    if let Some(protocol) = protocol {
        parts.headers.insert(CONNECTION, HeaderValue::from_static("upgrade"));
        parts.headers.insert(UPGRADE, protocol);
    }

    Response::from_parts(parts, Body::empty())
}

pub fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}
