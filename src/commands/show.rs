//! Compile one document and print it

use anyhow::Result;

use crate::content::CompiledDocument;
use crate::Site;

/// Print the front-matter and body HTML of `<collection>/<id>`.
///
/// Unknown ids follow the collection's policy: an error, or a note that the
/// fallback page applies.
pub async fn run(site: &Site, collection: &str, id: &str) -> Result<()> {
    let content = site.content()?;
    let coll = content
        .collection(collection)
        .ok_or_else(|| super::list::unknown_collection(site, collection))?;

    match coll.compile_resolved(id).await? {
        Some(doc) => print!("{}", render(&doc)?),
        None => println!(
            "No document '{}' in {}; the fallback page is served at /{}/{}/",
            id,
            coll.name(),
            coll.route(),
            crate::generator::FALLBACK_DIR
        ),
    }

    Ok(())
}

/// Front-matter as YAML, a separator, then the body HTML
fn render(doc: &CompiledDocument) -> Result<String> {
    let frontmatter = serde_yaml::to_string(&doc.frontmatter)?;
    let body = doc.render_body()?;
    Ok(format!("---\n{}---\n{}", frontmatter, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, Site) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("posts")).unwrap();
        fs::write(
            tmp.path().join("posts/hello.mdx"),
            "---\ntitle: Hello\ndate: 2022-01-01\n---\nHi *there*\n",
        )
        .unwrap();
        let site = Site::new(tmp.path()).unwrap();
        (tmp, site)
    }

    #[tokio::test]
    async fn test_render_document() {
        let (_tmp, site) = site();
        let content = site.content().unwrap();
        let doc = content.collection("posts").unwrap().compile("hello").await.unwrap();

        let out = render(&doc).unwrap();
        assert!(out.starts_with("---\ntitle: Hello\n"));
        assert!(out.ends_with("---\n<p>Hi <em>there</em></p>\n"));
    }

    #[tokio::test]
    async fn test_unknown_post_fails() {
        let (_tmp, site) = site();
        let err = run(&site, "posts", "nope").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::UnknownId { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_portfolio_item_falls_back() {
        let (_tmp, site) = site();
        assert!(run(&site, "portfolio", "nope").await.is_ok());
    }
}
