//! URL helper functions

use crate::config::SiteConfig;

/// Prefix a site path with the configured root
///
/// # Examples
/// ```ignore
/// url_for(&config, "/posts/hello/") // -> "/blog/posts/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        return path.to_string();
    }

    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Site path of a collection page, `/<route>/` or `/<route>/<id>/`
pub fn collection_path(route: &str, id: Option<&str>) -> String {
    let route = route.trim_matches('/');
    match id {
        Some(id) => format!("/{}/{}/", route, id),
        None => format!("/{}/", route),
    }
}
