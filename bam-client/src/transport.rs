//! The concrete wire transport: a `reqwest::Client` wrapped in a `tower`
//! service stack so the per-request timeout named in §5 lives at the
//! transport boundary rather than scattered across every call site.

use std::time::Duration;

use bam_errors::{BamError, BamResult};
use tower::{Service, ServiceBuilder, ServiceExt};

/// Builds the underlying HTTP client with the connection-pool bounds from
/// §5 (`max_connections`/`max_keepalive`), independent of and strictly
/// looser than the throttle's own `limit`.
pub fn build_http_client(
    max_keepalive: usize,
    request_timeout: Duration,
    verify_ssl: bool,
) -> BamResult<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(max_keepalive)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(request_timeout)
        .danger_accept_invalid_certs(!verify_ssl)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("failed to build HTTP client: {err}"),
        })
}

/// Sends `request` through a one-shot `tower` stack applying the
/// per-request timeout. A fresh stack is built per call since
/// `reqwest::Request` is not `Clone` and the stack is cheap to construct.
pub async fn send(http: &reqwest::Client, request: reqwest::Request, timeout: Duration) -> BamResult<reqwest::Response> {
    let http = http.clone();
    let mut service = ServiceBuilder::new()
        .timeout(timeout)
        .service(tower::service_fn(move |request: reqwest::Request| {
            let http = http.clone();
            async move { http.execute(request).await }
        }));

    service
        .ready()
        .await
        .map_err(classify_transport_error)?
        .call(request)
        .await
        .map_err(classify_transport_error)
}

/// The timeout layer reports both its own elapsed-deadline error and the
/// inner `reqwest::Error` as a boxed `std::error::Error`; either way it is
/// a transient-network condition from the caller's point of view.
fn classify_transport_error(err: tower::BoxError) -> BamError {
    BamError::TransientNetwork {
        attempts: 1,
        message: err.to_string(),
    }
}
