//! Embedding the edge in your own binary.
//!
//! Run with:
//!   RUST_LOG=spa_edge=debug cargo run --example embedded
//!
//! Then, with an Angular/React build in ./dist and a backend on :8081:
//!   curl -i http://localhost:3000/users/edit/5        # -> dist/index.html
//!   curl -i http://localhost:3000/main.abc123.js      # -> dist/main.abc123.js
//!   curl -i http://localhost:3000/api/users/5         # -> http://127.0.0.1:8081/api/users/5
//!   curl -i http://localhost:3000/healthz

use spa_edge::logging::{self, LogFormat};
use spa_edge::{AssetDir, Assets, Edge, Rules, Server, Upstream};

#[tokio::main]
async fn main() -> Result<(), spa_edge::Error> {
    logging::init(LogFormat::Text)?;

    let edge = Edge::new(Rules::default(), Assets::Directory(AssetDir::new("dist")))
        .api_origin(Upstream::new("http://127.0.0.1:8081")?)
        .health_probes(true);

    Server::bind(([127, 0, 0, 1], 3000).into()).serve(edge).await
}
