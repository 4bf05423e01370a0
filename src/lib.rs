//! folio-rs: a personal site builder for Markdown-with-components content
//!
//! Content collections (posts, portfolio) and standalone pages are compiled
//! at build time and rendered to static HTML with embedded Tera templates.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use content::{Collection, ComponentRegistry, MarkdownRenderer, OnUnknownId};

/// The main site application
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Files copied verbatim into the output
    pub static_dir: PathBuf,
    /// Standalone pages
    pub pages_dir: PathBuf,
}

/// Collections and pages sharing one registry and renderer
#[derive(Clone)]
pub struct SiteContent {
    pub collections: Vec<Collection>,
    pub pages: Collection,
}

impl SiteContent {
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name() == name)
    }
}

impl Site {
    /// Create a site from a directory, loading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = config::SiteConfig::load_or_default(&base_dir)?;
        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site from an already loaded config
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let pages_dir = base_dir.join(&config.pages_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            pages_dir,
        }
    }

    /// Built-in components plus the ones declared in config
    pub fn registry(&self) -> Result<ComponentRegistry> {
        ComponentRegistry::with_templates(&self.config.components)
            .context("Invalid component template in _config.yml")
    }

    /// Markdown renderer with the configured highlight settings
    pub fn markdown(&self) -> MarkdownRenderer {
        MarkdownRenderer::with_options(
            &self.config.highlight.theme,
            self.config.highlight.line_number,
        )
    }

    /// Build every collection and the standalone pages
    pub fn content(&self) -> Result<SiteContent> {
        let registry = Arc::new(self.registry()?);
        let renderer = Arc::new(self.markdown());

        let collections = self
            .config
            .collections
            .iter()
            .map(|c| {
                Collection::new(
                    c.name.as_str(),
                    c.route.as_str(),
                    c.heading.as_str(),
                    self.base_dir.join(&c.dir),
                    c.extension.as_str(),
                    c.extensions.clone(),
                    c.on_unknown_id,
                    Arc::clone(&registry),
                    Arc::clone(&renderer),
                )
            })
            .collect();

        let pages = Collection::new(
            "pages",
            "",
            "Pages",
            &self.pages_dir,
            "mdx",
            self.config.pages_extensions.clone(),
            OnUnknownId::Fail,
            registry,
            renderer,
        );

        Ok(SiteContent { collections, pages })
    }

    /// Generate the static site
    pub async fn build(&self) -> Result<generator::BuildStats> {
        commands::build::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
