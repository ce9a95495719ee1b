//! Request tracing.
//!
//! Each request runs inside an `info` span:
//!
//! ```text
//! request{method=GET path=/users/edit/5 peer=10.0.0.3:51234 class=app-route rewritten=true}
//! ```
//!
//! `class` and `rewritten` start empty and are recorded by the edge once the
//! path has been classified. Probe requests leave them empty. Completion is
//! one `info` event carrying `status` and `latency_ms`.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use http::Method;
use tracing::{Instrument, field, info, info_span};

use crate::response::EdgeBody;

pub(crate) async fn traced<F>(
    method: &Method,
    path: &str,
    peer: SocketAddr,
    next: F,
) -> http::Response<EdgeBody>
where
    F: Future<Output = http::Response<EdgeBody>>,
{
    let span = info_span!(
        "request",
        %method,
        path,
        %peer,
        class = field::Empty,
        rewritten = field::Empty,
    );
    let start = Instant::now();

    let res = next.instrument(span.clone()).await;

    span.in_scope(|| {
        info!(
            status = res.status().as_u16(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "request completed"
        );
    });
    res
}
