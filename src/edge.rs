//! The per-request pipeline: probes, routing, forwarding.

use std::net::SocketAddr;

use http::{Method, StatusCode};
use hyper::body::Incoming;
use tracing::{Span, warn};

use crate::health;
use crate::origin::{Assets, Upstream};
use crate::response::{EdgeBody, Response};
use crate::rewrite::{Class, Rules};

/// Everything the server needs to answer a request.
///
/// ```rust,no_run
/// use spa_edge::{AssetDir, Assets, Edge, Rules, Upstream};
///
/// # fn build() -> Result<Edge, spa_edge::Error> {
/// let edge = Edge::new(Rules::default(), Assets::Directory(AssetDir::new("dist")))
///     .api_origin(Upstream::new("http://127.0.0.1:8081")?)
///     .health_probes(true);
/// # Ok(edge)
/// # }
/// ```
pub struct Edge {
    rules: Rules,
    assets: Assets,
    api: Option<Upstream>,
    probes: bool,
}

impl Edge {
    pub fn new(rules: Rules, assets: Assets) -> Self {
        Self { rules, assets, api: None, probes: false }
    }

    /// Sets the origin for requests under the API prefix. Without one, API
    /// requests are answered with `502 Bad Gateway`.
    pub fn api_origin(mut self, api: Upstream) -> Self {
        self.api = Some(api);
        self
    }

    /// Answers `/healthz` and `/readyz` locally instead of routing them.
    pub fn health_probes(mut self, enabled: bool) -> Self {
        self.probes = enabled;
        self
    }

    pub fn rules(&self) -> &Rules { &self.rules }

    pub(crate) async fn handle(
        &self,
        req: hyper::Request<Incoming>,
        peer: SocketAddr,
    ) -> http::Response<EdgeBody> {
        if self.probes && req.method() == Method::GET {
            match req.uri().path() {
                health::LIVENESS_PATH => return health::liveness().into_http(),
                health::READINESS_PATH => {
                    return health::readiness(&self.assets, self.rules.entry_document())
                        .await
                        .into_http();
                }
                _ => {}
            }
        }

        let routed = self.rules.route(req);
        let span = Span::current();
        span.record("class", routed.class.as_str());
        span.record("rewritten", routed.rewritten);

        match routed.class {
            Class::Api => match &self.api {
                Some(api) => api.forward(routed.request, peer).await,
                None => {
                    warn!("no api origin configured");
                    Response::status(StatusCode::BAD_GATEWAY).into_http()
                }
            },
            Class::Asset | Class::AppRoute => self.assets.serve(routed.request, peer).await,
        }
    }
}
