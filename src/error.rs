//! Unified error type.

/// The error type returned by spa-edge's fallible operations.
///
/// Routing itself never fails: every path is classified and forwarded. HTTP
/// level outcomes (404, 405, 502, …) are expressed as responses, not as
/// `Error`s. This type surfaces configuration mistakes, malformed Lambda@Edge
/// events, and infrastructure failures such as binding to a port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A routing rule (API prefix or entry document) failed validation.
    #[error("invalid rule `{name}`: {reason}")]
    InvalidRule { name: &'static str, reason: String },

    /// An origin URI failed validation.
    #[error("invalid origin `{uri}`: {reason}")]
    InvalidOrigin { uri: String, reason: String },

    #[error("event: {0}")]
    Event(#[from] serde_json::Error),

    /// A Lambda@Edge event arrived with an empty `Records` array.
    #[error("event carries no records")]
    EmptyEvent,

    #[error("log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
