//! Command-line and environment configuration.
//!
//! Every flag has an environment fallback so the same binary runs unchanged
//! from a shell, a container, or a Kubernetes manifest:
//!
//! | Flag                | Environment                 | Default        |
//! |---------------------|-----------------------------|----------------|
//! | `--listen`          | `SPA_EDGE_LISTEN`           | `0.0.0.0:8080` |
//! | `--assets-dir`      | `SPA_EDGE_ASSETS_DIR`       | `dist`         |
//! | `--assets-origin`   | `SPA_EDGE_ASSETS_ORIGIN`    | none           |
//! | `--api-origin`      | `SPA_EDGE_API_ORIGIN`       | none           |
//! | `--health-probes`   | `SPA_EDGE_HEALTH_PROBES`    | off            |
//! | `--api-prefix`      | `SPA_EDGE_API_PREFIX`       | `/api/`        |
//! | `--entry-document`  | `SPA_EDGE_ENTRY_DOCUMENT`   | `/index.html`  |
//! | `--log-format`      | `SPA_EDGE_LOG_FORMAT`       | `text`         |
//!
//! Log verbosity follows `RUST_LOG` (see [`logging`](crate::logging)).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use crate::edge::Edge;
use crate::error::Error;
use crate::origin::{AssetDir, Assets, Upstream};
use crate::rewrite::{API_PREFIX, ENTRY_DOCUMENT, Rules};

const DEFAULT_ASSETS_DIR: &str = "dist";

/// Routing rule overrides, shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct RuleArgs {
    /// Path prefix of requests forwarded to the API origin.
    #[arg(long, env = "SPA_EDGE_API_PREFIX", default_value = API_PREFIX)]
    pub api_prefix: String,

    /// Document application routes are rewritten to.
    #[arg(long, env = "SPA_EDGE_ENTRY_DOCUMENT", default_value = ENTRY_DOCUMENT)]
    pub entry_document: String,
}

impl RuleArgs {
    pub fn rules(&self) -> Result<Rules, Error> {
        Rules::new(self.api_prefix.clone(), self.entry_document.clone())
    }
}

/// Settings for the self-hosted edge server.
#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "SPA_EDGE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory holding the SPA build output [default: dist].
    #[arg(long, env = "SPA_EDGE_ASSETS_DIR", conflicts_with = "assets_origin")]
    pub assets_dir: Option<PathBuf>,

    /// Plain-HTTP origin serving the SPA build output, instead of a directory.
    #[arg(long, env = "SPA_EDGE_ASSETS_ORIGIN")]
    pub assets_origin: Option<String>,

    /// Plain-HTTP origin of the REST backend.
    #[arg(long, env = "SPA_EDGE_API_ORIGIN")]
    pub api_origin: Option<String>,

    /// Answer /healthz and /readyz locally.
    #[arg(long, env = "SPA_EDGE_HEALTH_PROBES")]
    pub health_probes: bool,

    #[command(flatten)]
    pub rules: RuleArgs,
}

impl ServeArgs {
    /// Validates every setting and assembles the edge.
    pub fn edge(&self) -> Result<Edge, Error> {
        let rules = self.rules.rules()?;

        let assets = match (&self.assets_origin, &self.assets_dir) {
            (Some(origin), _) => Assets::Upstream(Upstream::new(origin)?),
            (None, Some(dir)) => Assets::Directory(AssetDir::new(dir)),
            (None, None) => Assets::Directory(AssetDir::new(DEFAULT_ASSETS_DIR)),
        };

        let mut edge = Edge::new(rules, assets).health_probes(self.health_probes);
        if let Some(origin) = &self.api_origin {
            edge = edge.api_origin(Upstream::new(origin)?);
        }
        Ok(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    fn parse(args: &[&str]) -> Result<ServeArgs, clap::Error> {
        let argv = std::iter::once("spa-edge").chain(args.iter().copied());
        Cli::try_parse_from(argv).map(|cli| cli.serve)
    }

    #[test]
    fn defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(args.rules.api_prefix, "/api/");
        assert_eq!(args.rules.entry_document, "/index.html");
        assert!(!args.health_probes);
        assert!(args.assets_dir.is_none());
    }

    #[test]
    fn assets_dir_and_origin_conflict() {
        let err = parse(&["--assets-dir", "public", "--assets-origin", "http://cdn:9000"]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn builds_edge_with_overrides() {
        let args = parse(&[
            "--assets-dir", "public",
            "--api-origin", "http://backend:8080",
            "--api-prefix", "/rest/",
            "--health-probes",
        ])
        .unwrap();
        let edge = args.edge().unwrap();
        assert_eq!(edge.rules().api_prefix(), "/rest/");
    }

    #[tokio::test]
    async fn invalid_values_surface_as_errors() {
        let args = parse(&["--entry-document", "index.html"]).unwrap();
        assert!(matches!(args.edge(), Err(Error::InvalidRule { .. })));

        let args = parse(&["--api-origin", "https://backend"]).unwrap();
        assert!(matches!(args.edge(), Err(Error::InvalidOrigin { .. })));
    }
}
