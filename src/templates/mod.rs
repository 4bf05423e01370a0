//! Built-in site templates using the Tera template engine
//!
//! Templates and the stylesheet are embedded in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{NavLink, SiteConfig, SiteIdentity};
use crate::helpers::{collection_path, format_date_str, strip_html, truncate, url_for};

/// Bundled stylesheet, written to `assets/site.css`
pub const SITE_CSS: &str = include_str!("site/site.css");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Output is HTML we assemble ourselves; templates escape explicitly
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("page.html", include_str!("site/page.html")),
            ("list.html", include_str!("site/list.html")),
            ("article.html", include_str!("site/article.html")),
            ("fallback.html", include_str!("site/fallback.html")),
            ("404.html", include_str!("site/404.html")),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };

    Ok(tera::Value::String(truncate(&s, length, &omission)))
}

/// Tera filter: display a front-matter date with a Moment-style format
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = match value {
        tera::Value::Null => return Ok(tera::Value::String(String::new())),
        tera::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "MMMM D, YYYY".to_string(),
    };

    Ok(tera::Value::String(format_date_str(&s, &format)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub date_format: String,
    pub stylesheet: String,
    pub nav: Vec<NavLink>,
}

impl SiteData {
    pub fn new(config: &SiteConfig, identity: &SiteIdentity) -> Self {
        Self {
            title: identity.title.clone(),
            author: identity.author.clone(),
            description: identity.description.clone(),
            language: config.language.clone(),
            root: url_for(config, "/"),
            date_format: config.date_format.clone(),
            stylesheet: url_for(config, "assets/site.css"),
            nav: config
                .nav
                .iter()
                .map(|link| NavLink {
                    title: link.title.clone(),
                    href: url_for(config, &link.href),
                })
                .collect(),
        }
    }
}

/// One line of a collection listing
#[derive(Debug, Clone, Serialize)]
pub struct EntryData {
    pub id: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub url: String,
}

impl EntryData {
    pub fn new(config: &SiteConfig, route: &str, record: &crate::content::ContentRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title().unwrap_or(&record.id).to_string(),
            date: record.date().unwrap_or_default().to_string(),
            description: record.description().unwrap_or_default().to_string(),
            url: url_for(config, &collection_path(route, Some(&record.id))),
        }
    }
}

/// Context shared by every page
pub fn base_context(site: &SiteData) -> Context {
    let mut context = Context::new();
    context.insert("site", site);
    context.insert("home", &false);
    context.insert("description", "");
    context.insert("body", "");
    context.insert("heading", "");
    context.insert("page_title", &site.title);
    context
}
