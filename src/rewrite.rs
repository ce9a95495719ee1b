//! Path classification and the entry-document rewrite.
//!
//! Three rules, checked top-to-bottom. The first match wins:
//!
//! | # | Condition                         | Class      | Outgoing path    |
//! |---|-----------------------------------|------------|------------------|
//! | 1 | starts with the API prefix        | `Api`      | unchanged        |
//! | 2 | contains `.` anywhere             | `Asset`    | unchanged        |
//! | 3 | anything else (including `""`)    | `AppRoute` | entry document   |
//!
//! The function is total and pure. Applying it to its own output returns the
//! same output.

use std::fmt;

use http::uri::PathAndQuery;

use crate::error::Error;
use crate::request::RequestDescriptor;

/// Requests under this prefix go to the backend REST API untouched.
pub const API_PREFIX: &str = "/api/";

/// The single document every application route resolves to.
pub const ENTRY_DOCUMENT: &str = "/index.html";

/// Which of the three routing categories a path falls into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Class {
    Api,
    Asset,
    AppRoute,
}

impl Class {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api      => "api",
            Self::Asset    => "asset",
            Self::AppRoute => "app-route",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The routing rules: an API prefix and an entry document.
///
/// [`Rules::default`] uses [`API_PREFIX`] and [`ENTRY_DOCUMENT`]. Build once,
/// share freely: rules are immutable and classification allocates nothing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rules {
    api_prefix: String,
    entry_document: String,
}

impl Rules {
    /// Validates and builds a rule set.
    ///
    /// Both values must start with `/`. The entry document must also be a
    /// valid URI path with no query or fragment, because it is written
    /// straight into outgoing request URIs.
    pub fn new(api_prefix: impl Into<String>, entry_document: impl Into<String>) -> Result<Self, Error> {
        let api_prefix = api_prefix.into();
        let entry_document = entry_document.into();

        if !api_prefix.starts_with('/') {
            return Err(Error::InvalidRule {
                name: "api_prefix",
                reason: format!("`{api_prefix}` must start with `/`"),
            });
        }

        if !entry_document.starts_with('/') {
            return Err(Error::InvalidRule {
                name: "entry_document",
                reason: format!("`{entry_document}` must start with `/`"),
            });
        }
        if entry_document.contains(['?', '#']) {
            return Err(Error::InvalidRule {
                name: "entry_document",
                reason: format!("`{entry_document}` must not carry a query or fragment"),
            });
        }
        if let Err(e) = PathAndQuery::try_from(entry_document.as_str()) {
            return Err(Error::InvalidRule {
                name: "entry_document",
                reason: format!("`{entry_document}` is not a valid URI path: {e}"),
            });
        }

        Ok(Self { api_prefix, entry_document })
    }

    pub fn api_prefix(&self) -> &str { &self.api_prefix }
    pub fn entry_document(&self) -> &str { &self.entry_document }

    /// Classifies `path`. Never fails: every string lands in exactly one class.
    pub fn classify(&self, path: &str) -> Class {
        classify_with(&self.api_prefix, path)
    }

    /// Returns the outgoing path for `path`.
    pub fn rewrite<'a>(&'a self, path: &'a str) -> &'a str {
        match self.classify(path) {
            Class::Api | Class::Asset => path,
            Class::AppRoute => &self.entry_document,
        }
    }

    /// Classifies a request descriptor and rewrites its path when needed.
    ///
    /// A path already equal to the entry document is left alone and reported
    /// as not rewritten. That equality check keeps routing idempotent for
    /// entry documents without a `.`, which classify as app routes; it must
    /// stay even though the write itself would be a no-op.
    ///
    /// `rewritten` reflects what the descriptor actually accepted.
    pub fn route<R: RequestDescriptor>(&self, mut request: R) -> Routed<R> {
        let class = self.classify(request.path());
        let rewritten = class == Class::AppRoute
            && request.path() != self.entry_document
            && request.set_path(&self.entry_document);
        Routed { request, class, rewritten }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            api_prefix: API_PREFIX.to_owned(),
            entry_document: ENTRY_DOCUMENT.to_owned(),
        }
    }
}

/// A request descriptor after routing.
#[derive(Debug)]
pub struct Routed<R> {
    /// The outgoing descriptor, path already rewritten if needed.
    pub request: R,
    pub class: Class,
    /// `true` when the path was changed to the entry document.
    pub rewritten: bool,
}

/// [`Rules::classify`] with the default rules.
pub fn classify(path: &str) -> Class {
    classify_with(API_PREFIX, path)
}

/// [`Rules::rewrite`] with the default rules.
pub fn rewrite(path: &str) -> &str {
    match classify(path) {
        Class::Api | Class::Asset => path,
        Class::AppRoute => ENTRY_DOCUMENT,
    }
}

fn classify_with(api_prefix: &str, path: &str) -> Class {
    if path.starts_with(api_prefix) {
        Class::Api
    } else if path.contains('.') {
        Class::Asset
    } else {
        Class::AppRoute
    }
}
