//! Development server
//!
//! Serves the public directory. Detail pages missing from a fallback
//! collection get that collection's placeholder page; anything else missing
//! gets the 404 page.

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::OnUnknownId;
use crate::generator::FALLBACK_DIR;
use crate::Site;

/// Server state
struct ServerState {
    public_dir: PathBuf,
    /// Routes of collections that serve a placeholder for unknown ids
    fallback_routes: Vec<String>,
}

impl ServerState {
    fn new(site: &Site) -> Self {
        Self {
            public_dir: site.public_dir.clone(),
            fallback_routes: site
                .config
                .collections
                .iter()
                .filter(|c| c.on_unknown_id == OnUnknownId::Fallback)
                .map(|c| c.route_segment().to_string())
                .collect(),
        }
    }

    /// Fallback page for `/<route>/<id>/` when `<route>` is a fallback collection
    fn fallback_page(&self, path: &str) -> Option<PathBuf> {
        let mut segments = path.trim_matches('/').split('/');
        let route = segments.next()?;
        let id = segments.next()?;
        if segments.next().is_some() || id.is_empty() {
            return None;
        }

        self.fallback_routes
            .iter()
            .any(|r| r == route)
            .then(|| self.public_dir.join(route).join(FALLBACK_DIR).join("index.html"))
    }
}

/// Start the development server
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(site));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    if watch {
        let site = site.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::commands::build::watch(&site).await {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .fallback(fallback_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve files, applying the unknown-id policy to missing pages
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();

    if !exists(&state.public_dir, &path) {
        if let Some(page) = state.fallback_page(&path) {
            tracing::debug!("Serving fallback page for {}", path);
            return serve_html(&page, StatusCode::OK).await;
        }
        return serve_html(&state.public_dir.join("404.html"), StatusCode::NOT_FOUND).await;
    }

    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Whether the request path maps to a file in the public directory
fn exists(public_dir: &Path, path: &str) -> bool {
    let clean = path.trim_start_matches('/');
    if clean.split('/').any(|s| s == "..") {
        return false;
    }

    let candidate = public_dir.join(clean);
    if candidate.is_dir() {
        candidate.join("index.html").is_file()
    } else {
        candidate.is_file()
    }
}

async fn serve_html(path: &Path, status: StatusCode) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => (status, Html(content)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn state(public_dir: &Path) -> ServerState {
        let site = Site::with_config(public_dir.parent().unwrap(), SiteConfig::default());
        ServerState {
            public_dir: public_dir.to_path_buf(),
            ..ServerState::new(&site)
        }
    }

    #[test]
    fn test_fallback_routes_follow_policy() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp.path().join("public"));
        assert_eq!(state.fallback_routes, vec!["portfolio".to_string()]);

        assert_eq!(
            state.fallback_page("/portfolio/unknown/"),
            Some(state.public_dir.join("portfolio/_fallback/index.html"))
        );
        assert_eq!(state.fallback_page("/posts/unknown/"), None);
        assert_eq!(state.fallback_page("/portfolio/"), None);
        assert_eq!(state.fallback_page("/portfolio/a/b/"), None);
    }

    #[test]
    fn test_exists() {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public");
        fs::create_dir_all(public.join("posts/a")).unwrap();
        fs::write(public.join("posts/a/index.html"), "a").unwrap();
        fs::write(public.join("404.html"), "404").unwrap();

        assert!(exists(&public, "/posts/a/"));
        assert!(exists(&public, "/404.html"));
        assert!(!exists(&public, "/posts/b/"));
        assert!(!exists(&public, "/posts/"));
        assert!(!exists(&public, "/../secret"));
    }

    #[tokio::test]
    async fn test_handler_statuses() {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public");
        fs::create_dir_all(public.join("portfolio/_fallback")).unwrap();
        fs::write(public.join("portfolio/_fallback/index.html"), "loading").unwrap();
        fs::write(public.join("404.html"), "missing").unwrap();
        let state = Arc::new(state(&public));

        let request = Request::builder()
            .uri("/portfolio/new-thing/")
            .body(Body::empty())
            .unwrap();
        let response = fallback_handler(State(Arc::clone(&state)), request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("/posts/new-thing/")
            .body(Body::empty())
            .unwrap();
        let response = fallback_handler(State(state), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
