//! Request descriptors the router can inspect and rewrite.

use http::Uri;
use http::uri::PathAndQuery;
use tracing::{debug, warn};

/// Anything that exposes a path the router can read and replace.
///
/// The router only ever touches the path. Query strings, headers, bodies and
/// every other field pass through exactly as they arrived.
pub trait RequestDescriptor {
    fn path(&self) -> &str;

    /// Replaces the path. Returns `false` if `path` could not be applied, in
    /// which case the descriptor is unchanged.
    fn set_path(&mut self, path: &str) -> bool;
}

/// A bare path. Handy for the `classify` command and for tests.
impl RequestDescriptor for String {
    fn path(&self) -> &str { self }

    fn set_path(&mut self, path: &str) -> bool {
        path.clone_into(self);
        true
    }
}

/// An `http` request. The URI path is replaced; the query string is kept.
///
/// An authority-form target (`CONNECT example.com:443`) has no path to
/// replace, so it becomes the origin-form `path`.
impl<B> RequestDescriptor for http::Request<B> {
    fn path(&self) -> &str { self.uri().path() }

    fn set_path(&mut self, path: &str) -> bool {
        match with_path(self.uri(), path) {
            Some(uri) => {
                *self.uri_mut() = uri;
                true
            }
            None => {
                warn!(path, uri = %self.uri(), "rewritten uri is invalid, forwarding unchanged");
                false
            }
        }
    }
}

/// Rebuilds `uri` with `path` in place of its path, keeping scheme,
/// authority and query where the result is still a valid URI.
fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => PathAndQuery::try_from(format!("{path}?{query}")),
        None => PathAndQuery::try_from(path),
    }
    .ok()?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.clone());
    match Uri::from_parts(parts) {
        Ok(uri) => Some(uri),
        Err(e) => {
            debug!(%uri, error = %e, "falling back to origin-form uri");
            Some(Uri::from(path_and_query))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::{Class, Rules};

    #[test]
    fn rewrite_keeps_query_string() {
        let req = http::Request::get("/users/edit/5?tab=roles&x=1").body(()).unwrap();
        let routed = Rules::default().route(req);
        assert_eq!(routed.class, Class::AppRoute);
        assert_eq!(routed.request.uri().path(), "/index.html");
        assert_eq!(routed.request.uri().query(), Some("tab=roles&x=1"));
    }

    #[test]
    fn rewrite_keeps_method_headers_and_body() {
        let req = http::Request::post("http://example.com/dashboard")
            .header("x-trace", "abc")
            .body("payload")
            .unwrap();
        let routed = Rules::default().route(req);
        assert!(routed.rewritten);
        assert_eq!(routed.request.method(), http::Method::POST);
        assert_eq!(routed.request.headers()["x-trace"], "abc");
        assert_eq!(*routed.request.body(), "payload");
        assert_eq!(routed.request.uri().to_string(), "http://example.com/index.html");
    }

    #[test]
    fn api_and_asset_requests_are_untouched() {
        let rules = Rules::default();

        let api = rules.route(http::Request::get("/api/users/5?page=2").body(()).unwrap());
        assert_eq!(api.class, Class::Api);
        assert!(!api.rewritten);
        assert_eq!(api.request.uri(), "/api/users/5?page=2");

        let asset = rules.route(http::Request::get("/main.abc123.js").body(()).unwrap());
        assert_eq!(asset.class, Class::Asset);
        assert_eq!(asset.request.uri(), "/main.abc123.js");
    }

    #[test]
    fn authority_form_target_becomes_entry_document() {
        let req = http::Request::builder()
            .method(http::Method::CONNECT)
            .uri("example.com:443")
            .body(())
            .unwrap();
        assert_eq!(req.uri().path(), "");

        let routed = Rules::default().route(req);
        assert_eq!(routed.class, Class::AppRoute);
        assert!(routed.rewritten);
        assert_eq!(routed.request.uri(), "/index.html");
        assert_eq!(routed.request.method(), http::Method::CONNECT);
    }

    #[test]
    fn invalid_path_leaves_request_unchanged() {
        let mut req = http::Request::get("/dashboard?tab=1").body(()).unwrap();
        assert!(!req.set_path("/not a path"));
        assert_eq!(req.uri(), "/dashboard?tab=1");
    }

    #[test]
    fn string_descriptor_is_replaced() {
        let mut path = String::from("/dashboard");
        assert!(path.set_path("/index.html"));
        assert_eq!(path, "/index.html");
    }
}
