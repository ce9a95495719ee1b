//! Lambda@Edge viewer-request adapter.
//!
//! CloudFront hands the function an event shaped like
//!
//! ```text
//! { "Records": [ { "cf": { "config": {…}, "request": { "uri": "/dashboard", … } } } ] }
//! ```
//!
//! and expects the (possibly modified) `request` object back. Only `uri` is
//! ever changed; every other field, known or not, is returned verbatim.
//!
//! ```rust
//! use spa_edge::{Rules, cloudfront};
//!
//! let event = r#"{"Records":[{"cf":{"request":{"uri":"/users/5","method":"GET","querystring":"tab=1"}}}]}"#;
//! let request = cloudfront::handle_event_json(&Rules::default(), event).unwrap();
//! assert!(request.contains(r#""uri":"/index.html""#));
//! assert!(request.contains(r#""querystring":"tab=1""#));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::request::RequestDescriptor;
use crate::rewrite::Rules;

/// The event CloudFront passes to a Lambda@Edge function.
#[derive(Debug, Deserialize, Serialize)]
pub struct Event {
    #[serde(rename = "Records")]
    pub records: Vec<Record>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Record {
    pub cf: CfRecord,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CfRecord {
    /// Distribution metadata (`distributionId`, `eventType`, …). Not used
    /// for routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    pub request: CfRequest,
}

/// The CloudFront request object.
///
/// `uri` never includes the query string; CloudFront carries that in the
/// separate `querystring` field, so rewriting `uri` leaves it intact.
#[derive(Debug, Deserialize, Serialize)]
pub struct CfRequest {
    pub uri: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CfRequest {
    pub fn method(&self) -> Option<&str> {
        self.fields.get("method").and_then(Value::as_str)
    }

    pub fn querystring(&self) -> Option<&str> {
        self.fields.get("querystring").and_then(Value::as_str)
    }
}

impl RequestDescriptor for CfRequest {
    fn path(&self) -> &str { &self.uri }

    fn set_path(&mut self, path: &str) -> bool {
        path.clone_into(&mut self.uri);
        true
    }
}

/// Routes the first record's request and returns it.
///
/// CloudFront delivers exactly one record per viewer request; any extra
/// records are ignored.
pub fn handle_event(rules: &Rules, event: Event) -> Result<CfRequest, Error> {
    let record = event.records.into_iter().next().ok_or(Error::EmptyEvent)?;
    let original = record.cf.request.uri.clone();
    let routed = rules.route(record.cf.request);

    debug!(
        uri = %original,
        class = %routed.class,
        rewritten = routed.rewritten,
        "viewer request routed"
    );

    Ok(routed.request)
}

/// [`handle_event`] over raw JSON, for runtimes that pass the payload as text.
pub fn handle_event_json(rules: &Rules, event: &str) -> Result<String, Error> {
    let event: Event = serde_json::from_str(event)?;
    let request = handle_event(rules, event)?;
    Ok(serde_json::to_string(&request)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWER_REQUEST: &str = r#"{
      "Records": [
        {
          "cf": {
            "config": {
              "distributionDomainName": "d111111abcdef8.cloudfront.net",
              "distributionId": "EDFDVBD6EXAMPLE",
              "eventType": "viewer-request",
              "requestId": "4TyzHTaYWb1GX1qTfsHhEqV6HUDd_BzoBZnwfnvQc_1oF26ClkoUSEQ=="
            },
            "request": {
              "clientIp": "203.0.113.178",
              "headers": {
                "host": [{ "key": "Host", "value": "d111111abcdef8.cloudfront.net" }],
                "user-agent": [{ "key": "User-Agent", "value": "curl/8.4.0" }]
              },
              "method": "GET",
              "querystring": "page=2",
              "uri": "/users/edit/5"
            }
          }
        }
      ]
    }"#;

    fn event_for(uri: &str) -> Event {
        let mut event: Event = serde_json::from_str(VIEWER_REQUEST).unwrap();
        event.records[0].cf.request.uri = uri.to_owned();
        event
    }

    #[test]
    fn rewrites_app_route_and_keeps_other_fields() {
        let event: Event = serde_json::from_str(VIEWER_REQUEST).unwrap();
        let request = handle_event(&Rules::default(), event).unwrap();

        assert_eq!(request.uri, "/index.html");
        assert_eq!(request.method(), Some("GET"));
        assert_eq!(request.querystring(), Some("page=2"));
        assert_eq!(request.fields["clientIp"], "203.0.113.178");
        assert_eq!(request.fields["headers"]["host"][0]["value"], "d111111abcdef8.cloudfront.net");
    }

    #[test]
    fn api_and_asset_uris_pass_through() {
        let rules = Rules::default();
        for uri in ["/api/users/5", "/main.abc123.js", "/index.html"] {
            let request = handle_event(&rules, event_for(uri)).unwrap();
            assert_eq!(request.uri, uri);
        }
    }

    #[test]
    fn root_resolves_to_entry_document() {
        let request = handle_event(&Rules::default(), event_for("/")).unwrap();
        assert_eq!(request.uri, "/index.html");
    }

    #[test]
    fn empty_records_is_an_error() {
        let err = handle_event_json(&Rules::default(), r#"{"Records":[]}"#).unwrap_err();
        assert!(matches!(err, Error::EmptyEvent));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = handle_event_json(&Rules::default(), r#"{"Records":"#).unwrap_err();
        assert!(matches!(err, Error::Event(_)));
    }

    #[test]
    fn json_output_round_trips_unknown_fields() {
        let out = handle_event_json(&Rules::default(), VIEWER_REQUEST).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["uri"], "/index.html");
        assert_eq!(value["headers"]["user-agent"][0]["value"], "curl/8.4.0");
        assert!(value.get("Records").is_none());
    }
}
