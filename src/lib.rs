//! # spa-edge
//!
//! Edge routing for a single-page application and its REST backend.
//!
//! ## The contract
//!
//! Every request path lands in exactly one of three classes:
//!
//! - **API**: starts with `/api/`. Forwarded untouched to the backend.
//! - **Asset**: contains a `.` anywhere (`main.abc123.js`, `favicon.ico`).
//!   Forwarded untouched to static storage.
//! - **App route**: everything else (`/dashboard`, `/users/edit/5`, `/`).
//!   Rewritten to `/index.html` so the client-side router can take over.
//!
//! The rule is a pure, total function of the path. It never rejects a
//! request, and applying it twice gives the same result as applying it once.
//!
//! ## Where it runs
//!
//! - **Lambda@Edge**: [`cloudfront::handle_event`] takes the viewer-request
//!   event and returns the request object with its `uri` rewritten.
//! - **Self-hosted**: [`Server`] runs the same rule in front of an asset
//!   directory (or asset origin) and an API origin.
//!
//! ## Quick start
//!
//! ```rust
//! use spa_edge::{Class, Rules};
//!
//! let rules = Rules::default();
//! assert_eq!(rules.rewrite("/api/users/5"), "/api/users/5");
//! assert_eq!(rules.rewrite("/main.abc123.js"), "/main.abc123.js");
//! assert_eq!(rules.rewrite("/users/edit/5"), "/index.html");
//! assert_eq!(rules.classify("/"), Class::AppRoute);
//! ```
//!
//! ```rust,no_run
//! use spa_edge::{AssetDir, Assets, Edge, Rules, Server, Upstream};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), spa_edge::Error> {
//!     let edge = Edge::new(Rules::default(), Assets::Directory(AssetDir::new("dist")))
//!         .api_origin(Upstream::new("http://127.0.0.1:8081")?);
//!
//!     Server::bind(([0, 0, 0, 0], 8080).into()).serve(edge).await
//! }
//! ```

mod edge;
mod error;
mod middleware;
mod origin;
mod request;
mod response;
mod rewrite;
mod server;

pub mod cloudfront;
pub mod config;
pub mod health;
pub mod logging;

pub use edge::Edge;
pub use error::Error;
pub use origin::{AssetDir, Assets, Upstream};
pub use request::RequestDescriptor;
pub use response::{BoxError, ContentType, EdgeBody, Response, ResponseBuilder};
pub use rewrite::{API_PREFIX, Class, ENTRY_DOCUMENT, Routed, Rules, classify, rewrite};
pub use server::Server;
