//! Locally generated responses and the body type every response shares.
//!
//! Proxied responses and files from the asset directory stream straight
//! through. Everything the edge answers itself (probes, errors) is built here
//! and converted with [`Response::into_http`].

use std::convert::Infallible;
use std::error::Error as StdError;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Body type of every response the edge sends.
///
/// Upstream bodies (`hyper::body::Incoming`), file streams and local `Full`
/// bodies are all boxed into this one type so a single service can return
/// any of them.
pub type EdgeBody = UnsyncBoxBody<Bytes, BoxError>;

/// Error type of [`EdgeBody`].
pub type BoxError = Box<dyn StdError + Send + Sync>;

pub(crate) fn full(body: impl Into<Bytes>) -> EdgeBody {
    Full::new(body.into()).map_err(never).boxed_unsync()
}

pub(crate) fn empty() -> EdgeBody {
    Empty::<Bytes>::new().map_err(never).boxed_unsync()
}

fn never(e: Infallible) -> BoxError {
    match e {}
}

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types of the bodies the edge writes itself. Files from the asset
/// directory get theirs from the file extension instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Html,  // text/html
    Json,  // application/json
    Text,  // text/plain
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A response produced by the edge itself.
///
/// ```rust
/// use spa_edge::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::text("ok");
/// Response::status(StatusCode::NOT_FOUND);
/// Response::builder()
///     .status(StatusCode::OK)
///     .bytes(ContentType::Html, "<!doctype html>");
/// ```
#[derive(Debug)]
pub struct Response {
    body: Bytes,
    headers: HeaderMap,
    status: StatusCode,
}

impl Response {
    /// `200 OK` with a `text/plain; charset=utf-8` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().bytes(ContentType::Text, body.into())
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    /// `405 Method Not Allowed` listing the methods that are.
    pub fn method_not_allowed(allow: &'static str) -> Self {
        Self::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, HeaderValue::from_static(allow))
            .no_body()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Converts into the `http` response hyper writes to the wire.
    pub fn into_http(self) -> http::Response<EdgeBody> {
        let body = if self.body.is_empty() { empty() } else { full(self.body) };
        let mut res = http::Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `200 OK`.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(mut self, content_type: ContentType, body: Bytes) -> Response {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        Response { body, headers: self.headers, status: self.status }
    }
}
