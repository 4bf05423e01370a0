//! Content loader - lists the documents of a content directory

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::record::{sort_by_date_desc, ContentRecord, RouteParams};
use super::{ContentError, FrontMatter};

/// Reads front-matter summaries from one content directory.
///
/// Nothing is cached: every call goes back to the filesystem.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    dir: PathBuf,
    extension: String,
}

impl ContentLoader {
    /// Create a loader for files with `extension` (without the dot) in `dir`
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file backing `id`
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, self.extension))
    }

    /// Load every document's front-matter, newest first.
    ///
    /// One malformed file fails the whole listing.
    pub fn list_summaries(&self) -> Result<Vec<ContentRecord>, ContentError> {
        let mut records = Vec::new();

        for (id, path) in self.enumerate()? {
            let content =
                fs::read_to_string(&path).map_err(|e| ContentError::from_io(&path, e))?;
            let (fm, _body) = FrontMatter::parse(&content).map_err(|e| ContentError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
            records.push(ContentRecord::new(id, fm));
        }

        sort_by_date_desc(&mut records);
        tracing::debug!("Loaded {} records from {:?}", records.len(), self.dir);

        Ok(records)
    }

    /// List the ids of all documents, in enumeration order
    pub fn list_ids(&self) -> Result<Vec<RouteParams>, ContentError> {
        Ok(self
            .enumerate()?
            .into_iter()
            .map(|(id, _)| RouteParams { id })
            .collect())
    }

    /// Whether a document file exists for `id`
    pub fn contains(&self, id: &str) -> bool {
        is_valid_id(id) && self.document_path(id).is_file()
    }

    /// Matching files directly inside the directory, by filename
    fn enumerate(&self) -> Result<Vec<(String, PathBuf)>, ContentError> {
        if !self.dir.is_dir() {
            return Err(ContentError::NotFound {
                path: self.dir.clone(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.dir).to_path_buf();
                match e.into_io_error() {
                    Some(io) => ContentError::from_io(path, io),
                    None => ContentError::NotFound { path },
                }
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || !self.has_extension(path) {
                continue;
            }

            if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((id.to_string(), path.to_path_buf()));
            } else {
                tracing::warn!("Skipping non UTF-8 file name {:?}", path);
            }
        }

        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e == self.extension)
            .unwrap_or(false)
    }
}

/// An id must be a single path segment
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn doc(title: &str, date: &str) -> String {
        format!("---\ntitle: {}\ndate: {}\n---\n\nBody of {}.\n", title, date, title)
    }

    #[test]
    fn test_one_record_per_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "alpha.mdx", &doc("Alpha", "2021-01-01"));
        write(tmp.path(), "beta.mdx", &doc("Beta", "2021-02-01"));
        write(tmp.path(), "gamma.mdx", &doc("Gamma", "2021-03-01"));

        let loader = ContentLoader::new(tmp.path(), "mdx");
        let records = loader.list_summaries().unwrap();

        let mut ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
        let beta = records.iter().find(|r| r.id == "beta").unwrap();
        assert_eq!(beta.title(), Some("Beta"));
    }

    #[test]
    fn test_newest_first() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.mdx", &doc("A", "2021-06-01"));
        write(tmp.path(), "b.mdx", &doc("B", "2022-01-01"));

        let records = ContentLoader::new(tmp.path(), "mdx")
            .list_summaries()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "b");
        assert_eq!(records[0].title(), Some("B"));
        assert_eq!(records[1].id, "a");
        assert_eq!(records[1].date(), Some("2021-06-01"));
    }

    #[test]
    fn test_equal_dates_keep_enumeration_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one.mdx", &doc("One", "2020-01-01"));
        write(tmp.path(), "three.mdx", &doc("Three", "2020-01-01"));
        write(tmp.path(), "two.mdx", &doc("Two", "2019-12-31"));

        let records = ContentLoader::new(tmp.path(), "mdx")
            .list_summaries()
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "three", "two"]);
    }

    #[test]
    fn test_skips_other_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "post.mdx", &doc("Post", "2021-01-01"));
        write(tmp.path(), "notes.txt", "not content");
        write(tmp.path(), ".DS_Store", "");
        fs::create_dir(tmp.path().join("drafts.mdx")).unwrap();

        let loader = ContentLoader::new(tmp.path(), "mdx");
        let records = loader.list_summaries().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "post");
    }

    #[test]
    fn test_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let loader = ContentLoader::new(tmp.path().join("nope"), "mdx");
        assert!(matches!(
            loader.list_summaries(),
            Err(ContentError::NotFound { .. })
        ));
        assert!(loader.list_ids().unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_file_aborts_listing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "good.mdx", &doc("Good", "2021-01-01"));
        write(tmp.path(), "bad.mdx", "---\ntitle: Bad\ndate: 2021-01-02\n\nno closing");

        let err = ContentLoader::new(tmp.path(), "mdx")
            .list_summaries()
            .unwrap_err();
        match err {
            ContentError::Parse { path, .. } => assert!(path.ends_with("bad.mdx")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_list_ids() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.mdx", &doc("B", "2022-01-01"));
        write(tmp.path(), "a.mdx", &doc("A", "2021-06-01"));
        // ids do not need valid front-matter
        write(tmp.path(), "c.mdx", "---\nbroken");

        let ids = ContentLoader::new(tmp.path(), "mdx").list_ids().unwrap();
        assert_eq!(
            ids,
            vec![
                RouteParams { id: "a".into() },
                RouteParams { id: "b".into() },
                RouteParams { id: "c".into() },
            ]
        );
    }

    #[test]
    fn test_contains() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.mdx", &doc("A", "2021-06-01"));

        let loader = ContentLoader::new(tmp.path(), "mdx");
        assert!(loader.contains("a"));
        assert!(!loader.contains("b"));
        assert!(!loader.contains("../a"));
    }
}
