//! Origins: where routed requests are served from.
//!
//! - [`AssetDir`]: a directory holding the SPA build output.
//! - [`Upstream`]: any plain-HTTP origin, such as the REST backend or a
//!   remote asset store.

mod directory;
mod upstream;

pub use directory::AssetDir;
pub use upstream::Upstream;

use std::net::SocketAddr;

use hyper::body::Incoming;

use crate::response::EdgeBody;

/// The origin for static assets and the entry document.
pub enum Assets {
    Directory(AssetDir),
    Upstream(Upstream),
}

impl Assets {
    pub(crate) async fn serve(
        &self,
        req: hyper::Request<Incoming>,
        peer: SocketAddr,
    ) -> http::Response<EdgeBody> {
        match self {
            Self::Directory(dir) => dir.serve(req).await,
            Self::Upstream(upstream) => upstream.forward(req, peer).await,
        }
    }

    /// Whether the origin can currently serve `entry_document`.
    pub(crate) async fn has_entry(&self, entry_document: &str) -> bool {
        match self {
            Self::Directory(dir) => dir.contains(entry_document).await,
            Self::Upstream(_) => true,
        }
    }
}
