//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::content::{MarkupExtension, OnUnknownId};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,
    pub pages_dir: String,

    // Display
    pub date_format: String,
    pub nav: Vec<NavLink>,
    pub highlight: HighlightConfig,

    // Content
    pub collections: Vec<CollectionConfig>,
    pub pages_extensions: Vec<MarkupExtension>,

    /// Extra components as Tera templates, keyed by component name
    pub components: IndexMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Jeremy Rieunier".to_string(),
            author: "Jeremy Rieunier".to_string(),
            description: String::new(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            pages_dir: "pages".to_string(),

            date_format: "MMMM D, YYYY".to_string(),
            nav: vec![
                NavLink::new("Home", "/"),
                NavLink::new("Posts", "/posts/"),
                NavLink::new("Portfolio", "/portfolio/"),
                NavLink::new("About", "/about/"),
            ],
            highlight: HighlightConfig::default(),

            collections: vec![CollectionConfig::posts(), CollectionConfig::portfolio()],
            pages_extensions: vec![MarkupExtension::Gfm],

            components: IndexMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `_config.yml` from `base_dir`, falling back to defaults
    pub fn load_or_default<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");
        if config_path.exists() {
            tracing::debug!("Loading config from {:?}", config_path);
            Self::load(&config_path)
        } else {
            tracing::debug!("No _config.yml found, using defaults");
            Ok(Self::default())
        }
    }

    /// Reject collections that would collide on disk or in the output
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut routes = HashSet::new();

        for collection in &self.collections {
            if !crate::content::is_valid_id(&collection.name) {
                bail!("Invalid collection name '{}'", collection.name);
            }
            if !names.insert(collection.name.as_str()) {
                bail!("Duplicate collection '{}'", collection.name);
            }
            let route = collection.route.trim_matches('/');
            if route.is_empty() || route.starts_with('_') {
                bail!(
                    "Collection '{}' has an invalid route '{}'",
                    collection.name,
                    collection.route
                );
            }
            if !routes.insert(route) {
                bail!("Route '{}' is used by more than one collection", route);
            }
            if collection.extension.is_empty() || collection.extension.contains('.') {
                bail!(
                    "Collection '{}' has an invalid extension '{}'",
                    collection.name,
                    collection.extension
                );
            }
        }

        Ok(())
    }

    /// Find a collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }
}

/// A header navigation link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    pub title: String,
    pub href: String,
}

impl NavLink {
    pub fn new(title: &str, href: &str) -> Self {
        Self {
            title: title.to_string(),
            href: href.to_string(),
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// One content collection: a directory of documents published under a route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub name: String,
    /// Source directory, relative to the site root
    pub dir: String,
    /// URL segment the collection is published under
    pub route: String,
    /// Listing heading, e.g. "Posts" in "Posts written by ..."
    pub heading: String,
    /// Listing `<title>`; `{site}` is replaced with the site title
    pub listing_title: Option<String>,
    pub extension: String,
    /// Markup extensions applied in order when compiling
    pub extensions: Vec<MarkupExtension>,
    pub on_unknown_id: OnUnknownId,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            dir: String::new(),
            route: String::new(),
            heading: String::new(),
            listing_title: None,
            extension: "mdx".to_string(),
            extensions: Vec::new(),
            on_unknown_id: OnUnknownId::Fail,
        }
    }
}

impl CollectionConfig {
    pub fn posts() -> Self {
        Self {
            name: "posts".to_string(),
            dir: "posts".to_string(),
            route: "posts".to_string(),
            heading: "Posts".to_string(),
            extensions: vec![MarkupExtension::Gfm, MarkupExtension::Highlight],
            on_unknown_id: OnUnknownId::Fail,
            ..Default::default()
        }
    }

    pub fn portfolio() -> Self {
        Self {
            name: "portfolio".to_string(),
            dir: "portfolio".to_string(),
            route: "portfolio".to_string(),
            heading: "Data Analyst Portfolio".to_string(),
            listing_title: Some("Data Analyst portfolio of {site}".to_string()),
            extensions: Vec::new(),
            on_unknown_id: OnUnknownId::Fallback,
            ..Default::default()
        }
    }

    /// `<title>` of the listing page
    pub fn listing_title(&self, site_title: &str) -> String {
        match &self.listing_title {
            Some(title) => title.replace("{site}", site_title),
            None => format!("{} written by {}", self.heading, site_title),
        }
    }

    /// The route without surrounding slashes
    pub fn route_segment(&self) -> &str {
        self.route.trim_matches('/')
    }
}
