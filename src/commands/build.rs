//! Build the static site

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::generator::{BuildStats, Generator};
use crate::Site;

/// Build the site once
pub async fn run(site: &Site) -> Result<BuildStats> {
    let start = std::time::Instant::now();

    let generator = Generator::new(site)?;
    let stats = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} documents, {} listings and {} pages in {:.2}s",
        stats.documents,
        stats.listings,
        stats.pages,
        duration.as_secs_f64()
    );

    Ok(stats)
}

/// Directories and files whose changes trigger a rebuild
pub fn watch_paths(site: &Site) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = site
        .config
        .collections
        .iter()
        .map(|c| site.base_dir.join(&c.dir))
        .collect();
    paths.push(site.pages_dir.clone());
    paths.push(site.static_dir.clone());
    paths.push(site.base_dir.join("_config.yml"));
    paths.retain(|p| p.exists());
    paths
}

/// Watch content, pages, static files and config; rebuild on change.
///
/// Runs until the watcher channel closes. The config is reloaded before each
/// rebuild.
pub async fn watch(site: &Site) -> Result<()> {
    let site = site.clone();
    let handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || watch_blocking(site, handle)).await?
}

fn watch_blocking(site: Site, handle: tokio::runtime::Handle) -> Result<()> {
    let (tx, rx) = channel();

    // Debounce to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for path in watch_paths(&site) {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(&path, mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<&DebouncedEvent> =
                    events.iter().filter(|e| is_relevant(&e.path)).collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                let site = match Site::new(&site.base_dir) {
                    Ok(site) => site,
                    Err(e) => {
                        tracing::error!("Failed to reload config: {:#}", e);
                        continue;
                    }
                };

                if let Err(e) = handle.block_on(run(&site)) {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Editor droppings and VCS metadata never trigger a rebuild
fn is_relevant(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_watch_paths_only_existing() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("posts")).unwrap();
        fs::create_dir_all(tmp.path().join("static")).unwrap();

        let site = Site::new(tmp.path()).unwrap();
        let paths = watch_paths(&site);
        assert_eq!(
            paths,
            vec![tmp.path().join("posts"), tmp.path().join("static")]
        );
    }

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(Path::new("/site/posts/a.mdx")));
        assert!(!is_relevant(Path::new("/site/posts/.a.mdx.swp")));
        assert!(!is_relevant(Path::new("/site/.git/index")));
        assert!(!is_relevant(Path::new("/site/posts/a.mdx~")));
    }
}
