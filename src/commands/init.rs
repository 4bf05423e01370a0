//! Initialize a new site

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: My Site
author: Your Name
description: ''
language: en

# URL
url: http://example.com
root: /

# Directory
public_dir: public
static_dir: static
pages_dir: pages

# Display
date_format: MMMM D, YYYY
nav:
  - title: Home
    href: /
  - title: Posts
    href: /posts/
  - title: Portfolio
    href: /portfolio/
  - title: About
    href: /about/
highlight:
  theme: base16-ocean.dark
  line_number: false

# Content
collections:
  - name: posts
    dir: posts
    route: posts
    heading: Posts
    extensions: [gfm, highlight]
    on_unknown_id: fail
  - name: portfolio
    dir: portfolio
    route: portfolio
    heading: Portfolio
    extensions: []
    on_unknown_id: fallback
pages_extensions: [gfm]

# Extra components, as Tera templates
components:
  Badge: '<span class="badge">{{ children | safe }}</span>'
"#;

const SCAFFOLD: &str = r#"---
title: "{{ title }}"
date: "{{ date }}"
description: ""
---

"#;

const INDEX_PAGE: &str = r#"---
title: Home
---

# Hi 👋

This is my personal website.
"#;

const ABOUT_PAGE: &str = r#"---
title: About me
heading: About
---

<Callout type="note">
Write something about yourself here.
</Callout>
"#;

const PORTFOLIO_ITEM: &str = r#"---
title: Sample project
date: "2024-01-01"
description: A first portfolio entry
---

Describe the project, the data and what came out of it.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    if target_dir.join("_config.yml").exists() {
        bail!("{:?} already contains a _config.yml", target_dir);
    }

    for dir in ["posts", "portfolio", "pages", "static", "scaffolds"] {
        fs::create_dir_all(target_dir.join(dir))?;
    }

    fs::write(target_dir.join("_config.yml"), CONFIG)?;
    fs::write(target_dir.join("scaffolds/posts.mdx"), SCAFFOLD)?;
    fs::write(target_dir.join("scaffolds/portfolio.mdx"), SCAFFOLD)?;
    fs::write(target_dir.join("pages/index.mdx"), INDEX_PAGE)?;
    fs::write(target_dir.join("pages/about.mdx"), ABOUT_PAGE)?;
    fs::write(target_dir.join("portfolio/sample-project.mdx"), PORTFOLIO_ITEM)?;

    let today = chrono::Local::now().format("%Y-%m-%d");
    let sample_post = format!(
        r#"---
title: Hello World
date: "{}"
description: The first post
---

Welcome! Posts are Markdown with embedded components.

<Callout type="tip" title="Components">
Use `<Callout>`, `<Figure>` and `<YouTube>`, or declare your own in `_config.yml`.
</Callout>

| Command | What it does |
|---------|--------------|
| `folio new posts "Title"` | Create a post |
| `folio serve` | Preview with rebuild on change |
| `folio build` | Write the site to `public/` |

```rust
fn main() {{
    println!("Hello, world!");
}}
```
"#,
        today
    );
    fs::write(target_dir.join("posts/hello-world.mdx"), sample_post)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Site;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_build() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();

        let mut site = Site::new(tmp.path()).unwrap();
        assert_eq!(site.config.title, "My Site");
        assert!(site.config.components.contains_key("Badge"));

        // Site identity is per process; keep the one other tests install
        site.config.title = crate::config::SiteConfig::default().title;

        let stats = site.build().await.unwrap();
        assert_eq!(stats.documents, 2);
        assert!(tmp.path().join("public/posts/hello-world/index.html").exists());
        assert!(tmp.path().join("public/about/index.html").exists());
        assert!(tmp.path().join("public/portfolio/_fallback/index.html").exists());

        assert!(init_site(tmp.path()).is_err());
    }
}
