//! Forwarding to a plain-HTTP upstream origin.

use std::net::SocketAddr;

use http::header::{
    CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
    UPGRADE,
};
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri, Version};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, error};

use crate::error::Error;
use crate::response::{BoxError, EdgeBody, Response};

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
static KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// A plain-HTTP origin requests are proxied to.
///
/// The origin URI may carry a base path: with `http://backend:8080/v2`,
/// `/api/users/5?page=2` is forwarded as `/v2/api/users/5?page=2`.
#[derive(Clone)]
pub struct Upstream {
    authority: Authority,
    base_path: String,
    client: Client<HttpConnector, Incoming>,
}

impl Upstream {
    /// Parses and validates an origin URI such as `http://127.0.0.1:8081`.
    pub fn new(origin: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidOrigin {
            uri: origin.to_owned(),
            reason: reason.to_owned(),
        };

        let uri: Uri = origin.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

        match uri.scheme() {
            Some(scheme) if *scheme == Scheme::HTTP => {}
            Some(_) => return Err(invalid("only http:// origins are supported")),
            None => return Err(invalid("missing scheme")),
        }
        let authority = uri.authority().cloned().ok_or_else(|| invalid("missing host"))?;
        if uri.query().is_some() {
            return Err(invalid("must not carry a query string"));
        }

        let base_path = uri.path().trim_end_matches('/').to_owned();
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self { authority, base_path, client })
    }

    pub fn authority(&self) -> &Authority { &self.authority }

    /// Proxies `req` and returns the origin's response, or `502` when the
    /// origin cannot be reached.
    pub(crate) async fn forward(
        &self,
        req: hyper::Request<Incoming>,
        peer: SocketAddr,
    ) -> http::Response<EdgeBody> {
        let (mut parts, body) = req.into_parts();
        // HTTP/2 viewers send the host as `:authority`, not as `Host`.
        let viewer_authority = parts.uri.authority().cloned();

        parts.uri = match self.target(&parts.uri) {
            Some(uri) => uri,
            None => {
                error!(uri = %parts.uri, origin = %self.authority, "cannot build upstream uri");
                return Response::status(StatusCode::BAD_GATEWAY).into_http();
            }
        };
        // The pooled client speaks HTTP/1.1 to the origin whatever the
        // viewer negotiated.
        parts.version = Version::HTTP_11;
        forwarded_headers(&mut parts.headers, viewer_authority.as_ref(), peer);

        debug!(uri = %parts.uri, "forwarding upstream");

        match self.client.request(hyper::Request::from_parts(parts, body)).await {
            Ok(res) => {
                let (mut parts, body) = res.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                http::Response::from_parts(parts, body.map_err(BoxError::from).boxed_unsync())
            }
            Err(e) => {
                error!(origin = %self.authority, error = %e, "upstream request failed");
                Response::status(StatusCode::BAD_GATEWAY).into_http()
            }
        }
    }

    /// The absolute URI `uri` is forwarded to.
    fn target(&self, uri: &Uri) -> Option<Uri> {
        let path_and_query = uri.path_and_query().map_or("/", PathAndQuery::as_str);
        let path_and_query = PathAndQuery::try_from(format!("{}{path_and_query}", self.base_path)).ok()?;

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .ok()
    }
}

/// Rewrites viewer headers for the upstream hop.
///
/// `x-forwarded-host` comes from `Host`, or from the request-target
/// authority when there is no `Host` header.
fn forwarded_headers(headers: &mut HeaderMap, authority: Option<&Authority>, peer: SocketAddr) {
    strip_hop_by_hop(headers);

    let host = headers
        .remove(HOST)
        .or_else(|| authority.and_then(|a| HeaderValue::from_str(a.as_str()).ok()));
    if let Some(host) = host {
        headers.insert(X_FORWARDED_HOST.clone(), host);
    }
    headers.insert(X_FORWARDED_PROTO.clone(), HeaderValue::from_static("http"));

    let client_ip = peer.ip().to_string();
    let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{prior}, {client_ip}"),
        None => client_ip,
    };
    if let Ok(value) = HeaderValue::try_from(chain) {
        headers.insert(X_FORWARDED_FOR.clone(), value);
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop too.
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }

    for name in [
        &CONNECTION,
        &KEEP_ALIVE,
        &PROXY_AUTHENTICATE,
        &PROXY_AUTHORIZATION,
        &TE,
        &TRAILER,
        &TRANSFER_ENCODING,
        &UPGRADE,
    ] {
        headers.remove(name);
    }
}
