//! Generator module - renders the site to static HTML using built-in Tera templates
//!
//! Output goes to a staging directory that replaces the public directory only
//! when every page rendered.

use anyhow::{anyhow, bail, Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::config::{identity, CollectionConfig};
use crate::content::{require_fields, Collection, CompiledDocument, ContentRecord, OnUnknownId};
use crate::helpers::{collection_path, url_for};
use crate::templates::{base_context, EntryData, SiteData, TemplateRenderer, SITE_CSS};
use crate::Site;

/// Directory the fallback page of a collection is written to
pub const FALLBACK_DIR: &str = "_fallback";

/// Name of the staging directory, next to the public directory
const STAGING_DIR: &str = ".folio-staging";

/// What a build produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub documents: usize,
    pub pages: usize,
    pub listings: usize,
    pub static_files: usize,
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
    site_data: SiteData,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let identity = identity::install(&site.config);
        let site_data = SiteData::new(&site.config, identity);

        Ok(Self {
            site: site.clone(),
            renderer,
            site_data,
        })
    }

    /// Generate the entire site.
    ///
    /// The public directory is left untouched when anything fails.
    pub async fn generate(&self) -> Result<BuildStats> {
        let staging = staging_dir(&self.site);
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Failed to remove stale {:?}", staging))?;
        }
        fs::create_dir_all(&staging)
            .with_context(|| format!("Failed to create {:?}", staging))?;

        match self.generate_into(&staging).await {
            Ok(stats) => {
                self.publish(&staging)?;
                Ok(stats)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    tracing::warn!("Failed to remove {:?}: {}", staging, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn generate_into(&self, out: &Path) -> Result<BuildStats> {
        let mut stats = BuildStats::default();
        let content = self.site.content()?;

        write_file(&out.join("assets").join("site.css"), SITE_CSS)?;
        stats.static_files = self.copy_static_files(out)?;

        let mut routes: Vec<&str> = Vec::new();
        for collection in &content.collections {
            let config = self
                .site
                .config
                .collection(collection.name())
                .ok_or_else(|| anyhow!("No config for collection '{}'", collection.name()))?;
            routes.push(collection.route());

            let records = list_summaries(collection).await?;
            for record in &records {
                require_fields(&record.id, &record.frontmatter)?;
            }

            self.generate_listing(out, collection, config, &records)?;
            stats.listings += 1;

            stats.documents += self.generate_articles(out, collection, &records).await?;

            if collection.on_unknown_id() == OnUnknownId::Fallback {
                self.generate_fallback(out, collection)?;
            }
        }

        stats.pages = self.generate_pages(out, &content.pages, &routes).await?;

        let html = self.renderer.render("404.html", &base_context(&self.site_data))?;
        write_file(&out.join("404.html"), &html)?;

        Ok(stats)
    }

    /// Collection listing at `/<route>/`
    fn generate_listing(
        &self,
        out: &Path,
        collection: &Collection,
        config: &CollectionConfig,
        records: &[ContentRecord],
    ) -> Result<()> {
        let entries: Vec<EntryData> = records
            .iter()
            .map(|r| EntryData::new(&self.site.config, collection.route(), r))
            .collect();

        let mut context = base_context(&self.site_data);
        context.insert("page_title", &config.listing_title(&self.site_data.title));
        context.insert("heading", collection.heading());
        context.insert("entries", &entries);

        let html = self.renderer.render("list.html", &context)?;
        write_file(&output_path(out, &collection_path(collection.route(), None)), &html)?;
        tracing::debug!("Generated listing for {}", collection.name());
        Ok(())
    }

    /// Compile every document of a collection concurrently and write its page
    async fn generate_articles(
        &self,
        out: &Path,
        collection: &Collection,
        records: &[ContentRecord],
    ) -> Result<usize> {
        let mut tasks = JoinSet::new();
        for record in records {
            let collection = collection.clone();
            let id = record.id.clone();
            tasks.spawn(async move { collection.compile(&id).await });
        }

        let mut count = 0;
        while let Some(joined) = tasks.join_next().await {
            let doc = match joined {
                Ok(Ok(doc)) => doc,
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e.into());
                }
                Err(e) => {
                    tasks.abort_all();
                    bail!("Compile task for {} failed: {}", collection.name(), e);
                }
            };
            self.write_article(out, collection, &doc)?;
            count += 1;
        }

        Ok(count)
    }

    fn write_article(&self, out: &Path, collection: &Collection, doc: &CompiledDocument) -> Result<()> {
        require_fields(&doc.id, &doc.frontmatter)?;
        let body = doc
            .render_body()
            .with_context(|| format!("Failed to render {}/{}", collection.name(), doc.id))?;

        let mut context = base_context(&self.site_data);
        context.insert("page_title", doc.frontmatter.title().unwrap_or(&doc.id));
        context.insert("page_date", doc.frontmatter.date().unwrap_or_default());
        context.insert("description", doc.frontmatter.description().unwrap_or_default());
        context.insert("body", &body);

        let html = self.renderer.render("article.html", &context)?;
        let path = collection_path(collection.route(), Some(&doc.id));
        write_file(&output_path(out, &path), &html)?;
        tracing::debug!("Generated {}", path);
        Ok(())
    }

    /// Placeholder served for ids a fallback collection does not have
    fn generate_fallback(&self, out: &Path, collection: &Collection) -> Result<()> {
        let html = self.render_fallback(collection)?;
        let path = format!("/{}/{}/", collection.route(), FALLBACK_DIR);
        write_file(&output_path(out, &path), &html)
    }

    pub fn render_fallback(&self, collection: &Collection) -> Result<String> {
        let mut context = base_context(&self.site_data);
        context.insert("heading", collection.heading());
        context.insert(
            "listing_url",
            &url_for(&self.site.config, &collection_path(collection.route(), None)),
        );
        self.renderer.render("fallback.html", &context)
    }

    /// Standalone pages: `index` becomes the home page, others `/<id>/`
    async fn generate_pages(&self, out: &Path, pages: &Collection, routes: &[&str]) -> Result<usize> {
        let ids = if pages.dir().is_dir() {
            list_ids(pages).await?
        } else {
            tracing::debug!("No pages directory at {:?}", pages.dir());
            Vec::new()
        };

        let mut count = 0;
        let mut has_index = false;
        for id in ids {
            if routes.contains(&id.as_str()) {
                bail!("Page '{}' collides with the collection of the same route", id);
            }

            let doc = pages.compile(&id).await?;
            let body = doc
                .render_body()
                .with_context(|| format!("Failed to render page {}", id))?;

            let mut context = base_context(&self.site_data);
            context.insert("body", &body);
            if let Some(description) = doc.frontmatter.description() {
                context.insert("description", description);
            }

            if id == "index" {
                has_index = true;
                context.insert("home", &true);
                if let Some(title) = doc.frontmatter.title() {
                    context.insert("page_title", title);
                }
                let html = self.renderer.render("home.html", &context)?;
                write_file(&out.join("index.html"), &html)?;
            } else {
                let title = doc
                    .frontmatter
                    .title()
                    .ok_or_else(|| crate::content::ContentError::MissingField {
                        id: id.clone(),
                        field: "title".to_string(),
                    })?;
                context.insert("page_title", title);
                context.insert("heading", doc.frontmatter.get_str("heading").unwrap_or_default());
                let html = self.renderer.render("page.html", &context)?;
                write_file(&output_path(out, &format!("/{}/", id)), &html)?;
            }
            count += 1;
        }

        if !has_index {
            let mut context = base_context(&self.site_data);
            context.insert("home", &true);
            let html = self.renderer.render("home.html", &context)?;
            write_file(&out.join("index.html"), &html)?;
            count += 1;
        }

        Ok(count)
    }

    /// Copy the static directory verbatim
    fn copy_static_files(&self, out: &Path) -> Result<usize> {
        let static_dir = &self.site.static_dir;
        if !static_dir.is_dir() {
            return Ok(0);
        }

        let mut count = 0;
        for entry in WalkDir::new(static_dir).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(static_dir)?;
            let dest = out.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)
                .with_context(|| format!("Failed to copy {:?}", entry.path()))?;
            count += 1;
        }

        tracing::debug!("Copied {} static files", count);
        Ok(count)
    }

    /// Replace the public directory with the staged output
    fn publish(&self, staging: &Path) -> Result<()> {
        let public_dir = &self.site.public_dir;
        if public_dir.exists() {
            fs::remove_dir_all(public_dir)
                .with_context(|| format!("Failed to remove {:?}", public_dir))?;
        }
        fs::rename(staging, public_dir)
            .with_context(|| format!("Failed to move {:?} to {:?}", staging, public_dir))?;
        Ok(())
    }
}

/// Where a build is assembled before it replaces the public directory
pub fn staging_dir(site: &Site) -> PathBuf {
    site.public_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| site.base_dir.clone())
        .join(STAGING_DIR)
}

/// Listing reads are synchronous; keep them off the async workers
async fn list_summaries(collection: &Collection) -> Result<Vec<ContentRecord>> {
    let collection = collection.clone();
    Ok(tokio::task::spawn_blocking(move || collection.list_summaries()).await??)
}

async fn list_ids(collection: &Collection) -> Result<Vec<String>> {
    let collection = collection.clone();
    let params = tokio::task::spawn_blocking(move || collection.list_ids()).await??;
    Ok(params.into_iter().map(|p| p.id).collect())
}

/// `/a/b/` -> `<out>/a/b/index.html`
fn output_path(out: &Path, site_path: &str) -> PathBuf {
    let clean = site_path.trim_matches('/');
    if clean.is_empty() {
        out.join("index.html")
    } else {
        out.join(clean).join("index.html")
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| anyhow!("Failed to write {:?}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::ContentError;
    use tempfile::TempDir;

    fn write(base: &Path, rel: &str, contents: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        write(
            base,
            "posts/a.mdx",
            "---\ntitle: A\ndate: 2020-01-01\n---\nFirst.\n",
        );
        write(
            base,
            "posts/b.mdx",
            "---\ntitle: B\ndate: 2021-06-15\ndescription: Second post\n---\n\n<Callout type=\"tip\">\nCareful.\n</Callout>\n\n| x | y |\n|---|---|\n| 1 | 2 |\n",
        );
        write(
            base,
            "portfolio/report.mdx",
            "---\ntitle: Report\ndate: 2022-03-01\n---\n| x | y |\n|---|---|\n| 1 | 2 |\n",
        );
        write(
            base,
            "pages/about.mdx",
            "---\ntitle: About Jeremy Rieunier\nheading: About me\n---\nHello there.\n",
        );
        write(base, "static/img/logo.txt", "logo");
        tmp
    }

    async fn build(base: &Path) -> Result<BuildStats> {
        let site = Site::with_config(base, SiteConfig::default());
        Generator::new(&site)?.generate().await
    }

    fn read(base: &Path, rel: &str) -> String {
        fs::read_to_string(base.join("public").join(rel)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_site() {
        let tmp = fixture();
        let base = tmp.path();
        let stats = build(base).await.unwrap();

        assert_eq!(stats.documents, 3);
        assert_eq!(stats.listings, 2);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.static_files, 1);

        let listing = read(base, "posts/index.html");
        assert!(listing.contains("<title>Posts written by Jeremy Rieunier</title>"));
        let b = listing.find("/posts/b/").unwrap();
        let a = listing.find("/posts/a/").unwrap();
        assert!(b < a, "newest first");
        assert!(listing.contains("June 15, 2021"));

        let post = read(base, "posts/b/index.html");
        assert!(post.contains("<h1>B</h1>"));
        assert!(post.contains(r#"<meta name="description" content="Second post">"#));
        assert!(post.contains("callout-tip"));
        assert!(post.contains("<table>"));

        let report = read(base, "portfolio/report/index.html");
        assert!(!report.contains("<table>"));
        assert!(read(base, "portfolio/index.html")
            .contains("<title>Data Analyst portfolio of Jeremy Rieunier</title>"));
        assert!(read(base, "portfolio/_fallback/index.html").contains("Loading"));
        assert!(!base.join("public/posts/_fallback").exists());

        let about = read(base, "about/index.html");
        assert!(about.contains("<title>About Jeremy Rieunier</title>"));
        assert!(about.contains("<h1>About me</h1>"));
        assert!(about.contains("Back to"));

        let home = read(base, "index.html");
        assert!(!home.contains("Back to"));
        assert!(base.join("public/404.html").exists());
        assert!(base.join("public/assets/site.css").exists());
        assert_eq!(read(base, "img/logo.txt"), "logo");
        assert!(!base.join(STAGING_DIR).exists());
    }

    #[tokio::test]
    async fn test_failed_build_keeps_previous_output() {
        let tmp = fixture();
        let base = tmp.path();
        build(base).await.unwrap();

        write(base, "posts/broken.mdx", "---\ntitle: Broken\ndate: 2023-01-01\n");
        assert!(build(base).await.is_err());

        assert!(base.join("public/posts/b/index.html").exists());
        assert!(!base.join("public/posts/broken").exists());
        assert!(!base.join(STAGING_DIR).exists());
    }

    #[tokio::test]
    async fn test_missing_date_fails_build() {
        let tmp = fixture();
        let base = tmp.path();
        write(base, "posts/undated.mdx", "---\ntitle: Undated\n---\nNo date.\n");

        let err = build(base).await.unwrap_err();
        let err = err.downcast::<ContentError>().unwrap();
        assert!(matches!(err, ContentError::MissingField { ref field, .. } if field == "date"));
        assert!(!base.join("public").exists());
    }

    #[tokio::test]
    async fn test_unknown_component_fails_build() {
        let tmp = fixture();
        let base = tmp.path();
        write(
            base,
            "posts/c.mdx",
            "---\ntitle: C\ndate: 2023-01-01\n---\n<Chart />\n",
        );

        let err = build(base).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::Compile { .. })
        ));
    }

    #[test]
    fn test_output_path() {
        let out = Path::new("/out");
        assert_eq!(output_path(out, "/"), PathBuf::from("/out/index.html"));
        assert_eq!(
            output_path(out, "/posts/a/"),
            PathBuf::from("/out/posts/a/index.html")
        );
    }
}
