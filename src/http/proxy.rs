//! Single-target reverse proxy.
//!
//! One `ReverseProxy` exists per registered route. All of them share one
//! pooled HTTP client that speaks plain http and https to targets.
//!
//! Requests asking for a protocol upgrade (`Connection: upgrade`) are
//! forwarded with their upgrade headers intact. When the target answers
//! `101 Switching Protocols`, both upgraded connections are spliced together
//! in a background task until either side closes.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::uri::InvalidUri;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use hyper::upgrade::OnUpgrade;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use thiserror::Error;
use url::Url;

use crate::http::{request, response};

/// Pooled client used for every upstream request.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

pub fn build_client() -> HttpClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(connector)
}

/// Forwarding failures. Confined to the request that hit them.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("cannot build upstream uri: {0}")]
    InvalidUri(#[from] InvalidUri),

    #[error("upstream request to {target} failed: {source}")]
    Upstream {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// Forwards requests to a single target base URL.
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    target: Url,
    client: HttpClient,
}

impl ReverseProxy {
    pub fn new(target: Url, client: HttpClient) -> Self {
        Self { target, client }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Send `request` to the target and stream the response back.
    ///
    /// There is no deadline: a backend that never answers holds the request
    /// open until the client goes away.
    pub async fn forward(
        &self,
        mut request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response, ProxyError> {
        let upgrade = request::upgrade_protocol(request.headers());
        let client_upgrade = upgrade
            .is_some()
            .then(|| hyper::upgrade::on(&mut request));

        let outbound = request::prepare(&self.target, request, client_addr, upgrade)?;

        let mut upstream = self
            .client
            .request(outbound)
            .await
            .map_err(|source| ProxyError::Upstream {
                target: self.target.to_string(),
                source,
            })?;

        match client_upgrade {
            Some(client_upgrade) if upstream.status() == StatusCode::SWITCHING_PROTOCOLS => {
                let upstream_upgrade = hyper::upgrade::on(&mut upstream);
                tokio::spawn(tunnel(
                    client_upgrade,
                    upstream_upgrade,
                    self.target.to_string(),
                ));
                Ok(response::switching_protocols(upstream))
            }
            _ => Ok(response::from_upstream(upstream)),
        }
    }
}

/// Copy bytes both ways between the client and the target once both sides
/// have switched protocols.
async fn tunnel(client: OnUpgrade, upstream: OnUpgrade, target: String) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(upgraded) => upgraded,
        Err(e) => {
            tracing::warn!(target = %target, error = %e, "Protocol upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    tracing::debug!(target = %target, "Upgraded connection opened");

    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => {
            tracing::debug!(target = %target, sent, received, "Upgraded connection closed");
        }
        Err(e) => {
            tracing::debug!(target = %target, error = %e, "Upgraded connection ended with error");
        }
    }
}
