//! Static files from a local directory.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use http::{Method, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::response::{BoxError, EdgeBody, Response};

/// Serves files below `root`.
///
/// Request paths are percent-decoded and mapped onto relative file paths.
/// Paths that would leave the root, and directories, are `404`. Bodies are
/// streamed from disk with `Last-Modified`; `If-Modified-Since` and `Range`
/// are honoured.
#[derive(Clone, Debug)]
pub struct AssetDir {
    root: PathBuf,
    files: ServeDir,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let files = ServeDir::new(&root).append_index_html_on_directories(false);
        Self { root, files }
    }

    pub fn root(&self) -> &Path { &self.root }

    /// Answers a `GET` or `HEAD`; any other method is a `405`.
    pub async fn serve<B>(&self, req: http::Request<B>) -> http::Response<EdgeBody>
    where
        B: Send + 'static,
    {
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            return Response::method_not_allowed("GET, HEAD").into_http();
        }

        let path = req.uri().path().to_owned();
        let res = match self.files.clone().oneshot(req).await {
            Ok(res) => res,
            Err(never) => match never {},
        };
        if res.status() == StatusCode::NOT_FOUND {
            debug!(%path, root = %self.root.display(), "asset not found");
        }
        res.map(|body| body.map_err(BoxError::from).boxed_unsync())
    }

    /// Whether `path` is a file the directory would serve.
    pub(crate) async fn contains(&self, path: &str) -> bool {
        let Ok(req) = http::Request::head(path).body(()) else {
            return false;
        };
        let res: Result<_, Infallible> = self.files.clone().oneshot(req).await;
        res.is_ok_and(|res| res.status() == StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED, RANGE};

    fn site() -> (tempfile::TempDir, AssetDir) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<!doctype html><app-root></app-root>").unwrap();
        std::fs::write(tmp.path().join("main.abc123.js"), "console.log(1)").unwrap();
        std::fs::write(tmp.path().join("my logo.svg"), "<svg/>").unwrap();
        std::fs::create_dir(tmp.path().join("assets")).unwrap();
        std::fs::write(tmp.path().join("assets").join("logo.svg"), "<svg/>").unwrap();
        let dir = AssetDir::new(tmp.path());
        (tmp, dir)
    }

    fn request(method: Method, path: &str) -> http::Request<()> {
        http::Request::builder().method(method).uri(path).body(()).unwrap()
    }

    async fn body(res: http::Response<EdgeBody>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn serves_file_with_content_type() {
        let (_tmp, dir) = site();
        let res = dir.serve(request(Method::GET, "/main.abc123.js")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[CONTENT_TYPE].to_str().unwrap().contains("javascript"));
        assert_eq!(body(res).await, "console.log(1)");
    }

    #[tokio::test]
    async fn serves_nested_file() {
        let (_tmp, dir) = site();
        let res = dir.serve(request(Method::GET, "/assets/logo.svg")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn percent_encoded_names_are_decoded() {
        let (_tmp, dir) = site();
        let res = dir.serve(request(Method::GET, "/my%20logo.svg")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(res).await, "<svg/>");
    }

    #[tokio::test]
    async fn head_sends_length_only() {
        let (_tmp, dir) = site();
        let res = dir.serve(request(Method::HEAD, "/main.abc123.js")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_LENGTH], "14");
        assert!(body(res).await.is_empty());
    }

    #[tokio::test]
    async fn conditional_get_is_not_modified() {
        let (_tmp, dir) = site();
        let res = dir.serve(request(Method::GET, "/index.html")).await;
        let last_modified = res.headers()[LAST_MODIFIED].clone();

        let req = http::Request::get("/index.html")
            .header(IF_MODIFIED_SINCE, last_modified)
            .body(())
            .unwrap();
        let res = dir.serve(req).await;
        assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn range_requests_get_partial_content() {
        let (_tmp, dir) = site();
        let req = http::Request::get("/main.abc123.js").header(RANGE, "bytes=0-6").body(()).unwrap();
        let res = dir.serve(req).await;
        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body(res).await, "console");
    }

    #[tokio::test]
    async fn missing_file_and_directory_are_not_found() {
        let (_tmp, dir) = site();
        for path in ["/missing.css", "/assets", "/assets/", "/../index.html", "/assets/../../etc/passwd"] {
            let res = dir.serve(request(Method::GET, path)).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn other_methods_are_refused() {
        let (_tmp, dir) = site();
        let res = dir.serve(request(Method::POST, "/index.html")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[ALLOW], "GET, HEAD");
    }

    #[tokio::test]
    async fn contains_checks_regular_files() {
        let (_tmp, dir) = site();
        assert!(dir.contains("/index.html").await);
        assert!(!dir.contains("/assets").await);
        assert!(!dir.contains("/nope.html").await);
    }
}
