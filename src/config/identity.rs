//! Process-wide site identity
//!
//! Installed once from the loaded config and read by every page render.

use serde::Serialize;
use std::sync::OnceLock;

use super::SiteConfig;

static IDENTITY: OnceLock<SiteIdentity> = OnceLock::new();

/// Read-only facts about the site shown on every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteIdentity {
    pub title: String,
    pub author: String,
    pub description: String,
}

impl SiteIdentity {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            author: config.author.clone(),
            description: config.description.clone(),
        }
    }
}

/// Install the identity for this process.
///
/// The first call wins; later calls return the installed identity and log
/// when it differs from `config`.
pub fn install(config: &SiteConfig) -> &'static SiteIdentity {
    let candidate = SiteIdentity::from_config(config);
    let installed = IDENTITY.get_or_init(|| candidate.clone());
    if *installed != candidate {
        tracing::warn!(
            "Site identity already set to '{}', ignoring '{}'",
            installed.title,
            candidate.title
        );
    }
    installed
}

/// The installed identity, if any
pub fn get() -> Option<&'static SiteIdentity> {
    IDENTITY.get()
}

/// The site title, as installed
pub fn site_title() -> Option<&'static str> {
    get().map(|identity| identity.title.as_str())
}
