//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the edge serve the SPA? Failure → pulled from load-balancer. |
//!
//! Probes are opt-in ([`Edge::health_probes`](crate::Edge::health_probes)).
//! When enabled they are answered before routing, so `/healthz` and `/readyz`
//! never reach the entry-document rewrite.

use http::StatusCode;

use crate::origin::Assets;
use crate::response::Response;

pub const LIVENESS_PATH: &str = "/healthz";
pub const READINESS_PATH: &str = "/readyz";

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub fn liveness() -> Response {
    Response::text("ok")
}

/// Readiness probe.
///
/// `200 OK` with body `"ready"` while the asset origin can serve the entry
/// document, `503 Service Unavailable` otherwise. A directory origin is
/// checked on disk; an upstream origin is assumed ready.
pub async fn readiness(assets: &Assets, entry_document: &str) -> Response {
    if assets.has_entry(entry_document).await {
        Response::text("ready")
    } else {
        Response::status(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::AssetDir;

    #[tokio::test]
    async fn readiness_follows_entry_document() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = Assets::Directory(AssetDir::new(tmp.path()));

        let res = readiness(&assets, "/index.html").await;
        assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        std::fs::write(tmp.path().join("index.html"), "<!doctype html>").unwrap();
        let res = readiness(&assets, "/index.html").await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"ready");
    }

    #[test]
    fn liveness_is_unconditional() {
        let res = liveness();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"ok");
    }
}
