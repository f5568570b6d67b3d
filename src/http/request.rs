//! Request handling and transformation.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the route target (scheme, host, path, query)
//! - Strip hop-by-hop headers
//! - Record the client in `X-Forwarded-For` / `X-Forwarded-Host`
//! - Carry `Connection: upgrade` through for protocol upgrades
//!
//! # Design Decisions
//! - Method, remaining headers and body are forwarded untouched
//! - The body is streamed, never buffered
//! - Outbound requests are always HTTP/1.1, over plain TCP or TLS as the
//!   target scheme says

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::http::header::{
    CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
    UPGRADE,
};
use axum::http::uri::InvalidUri;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Uri, Version};
use url::Url;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP: [HeaderName; 9] = [
    CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// The protocol named in `Upgrade`, when `Connection` asks for an upgrade.
pub fn upgrade_protocol(headers: &HeaderMap) -> Option<HeaderValue> {
    let wants_upgrade = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    if wants_upgrade {
        headers.get(UPGRADE).cloned()
    } else {
        None
    }
}

/// Turn an inbound request into the request sent to `target`.
///
/// `upgrade` is the protocol from [`upgrade_protocol`]; it survives the
/// hop-by-hop strip together with `Connection: upgrade`.
pub fn prepare(
    target: &Url,
    request: Request<Body>,
    client_addr: Option<SocketAddr>,
    upgrade: Option<HeaderValue>,
) -> Result<Request<Body>, InvalidUri> {
    let (mut parts, body) = request.into_parts();

    // HTTP/2 and absolute-form requests carry the host in the URI.
    let original_host = parts.headers.remove(HOST).or_else(|| {
        parts
            .uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
    });

    parts.uri = rewrite_uri(target, &parts.uri)?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if let Some(protocol) = upgrade {
        parts.headers.insert(CONNECTION, HeaderValue::from_static("upgrade"));
        parts.headers.insert(UPGRADE, protocol);
    }

    if let Some(host) = original_host {
        parts.headers.insert(X_FORWARDED_HOST, host);
    }
    if let Some(addr) = client_addr {
        append_forwarded_for(&mut parts.headers, addr.ip());
    }
    if let Ok(host) = HeaderValue::from_str(&authority(target)) {
        parts.headers.insert(HOST, host);
    }

    Ok(Request::from_parts(parts, body))
}

/// Rebase `uri` onto `target`: target scheme and authority, joined paths,
/// merged queries.
pub fn rewrite_uri(target: &Url, uri: &Uri) -> Result<Uri, InvalidUri> {
    let path = join_paths(target.path(), uri.path());

    let target_query = target.query().filter(|q| !q.is_empty());
    let request_query = uri.query().filter(|q| !q.is_empty());
    let query = match (target_query, request_query) {
        (Some(a), Some(b)) => format!("?{a}&{b}"),
        (Some(q), None) | (None, Some(q)) => format!("?{q}"),
        (None, None) => String::new(),
    };

    format!("{}://{}{}{}", target.scheme(), authority(target), path, query).parse()
}

/// Join two URL paths with exactly one slash between them.
pub fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// `host[:port]` of a target URL; default ports are omitted.
pub fn authority(target: &Url) -> String {
    let host = target.host_str().unwrap_or_default();
    match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
