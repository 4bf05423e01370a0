//! Create a new document in a collection

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::is_valid_id;
use crate::Site;

/// Front-matter used when the site has no `scaffolds/<collection>.mdx`
const DEFAULT_SCAFFOLD: &str = r#"---
title: "{{ title }}"
date: "{{ date }}"
description: ""
---

"#;

/// Create `<collection dir>/<id>.<ext>` from a scaffold with today's date
pub fn create_document(
    site: &Site,
    collection: &str,
    title: &str,
    id: Option<&str>,
) -> Result<PathBuf> {
    let config = site
        .config
        .collection(collection)
        .ok_or_else(|| super::list::unknown_collection(site, collection))?;

    let id = match id {
        Some(id) => id.to_string(),
        None => slug::slugify(title),
    };
    if !is_valid_id(&id) {
        bail!("Invalid document id: {:?}", id);
    }

    let target_dir = site.base_dir.join(&config.dir);
    fs::create_dir_all(&target_dir)?;

    let file_path = target_dir.join(format!("{}.{}", id, config.extension));
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let scaffold_path = site
        .base_dir
        .join("scaffolds")
        .join(format!("{}.{}", collection, config.extension));
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let content = scaffold
        .replace("{{ title }}", &title.replace('"', "\\\""))
        .replace("{{ date }}", &today);

    fs::write(&file_path, content)?;
    tracing::debug!("Created {:?}", file_path);

    Ok(file_path)
}
