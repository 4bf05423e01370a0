//! Collections: a loader and compiler bound to one content directory, plus
//! the policy for ids that have no document.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::compiler::{CompiledDocument, ContentCompiler};
use super::loader::{is_valid_id, ContentLoader};
use super::markdown::{MarkdownRenderer, MarkupExtension};
use super::markup::ComponentRegistry;
use super::{ContentError, ContentRecord, FrontMatter, RouteParams};

/// What to do when a route asks for an id with no document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnUnknownId {
    /// Unknown ids are a hard error
    #[default]
    Fail,
    /// Unknown ids get a placeholder page
    Fallback,
}

/// Outcome of resolving an id against a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    Fallback,
}

/// Fields every rendered document must carry
pub const REQUIRED_FIELDS: [&str; 2] = ["title", "date"];

/// A named content collection
#[derive(Clone)]
pub struct Collection {
    name: String,
    route: String,
    heading: String,
    on_unknown_id: OnUnknownId,
    loader: ContentLoader,
    compiler: ContentCompiler,
}

impl Collection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        route: impl Into<String>,
        heading: impl Into<String>,
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        extensions: Vec<MarkupExtension>,
        on_unknown_id: OnUnknownId,
        registry: Arc<ComponentRegistry>,
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        let loader = ContentLoader::new(dir, extension);
        let compiler = ContentCompiler::new(loader.clone(), extensions, registry, renderer);
        Self {
            name: name.into(),
            route: route.into().trim_matches('/').to_string(),
            heading: heading.into(),
            on_unknown_id,
            loader,
            compiler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL segment, without slashes
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn on_unknown_id(&self) -> OnUnknownId {
        self.on_unknown_id
    }

    pub fn dir(&self) -> &Path {
        self.loader.dir()
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    /// Summaries of every document, newest first
    pub fn list_summaries(&self) -> Result<Vec<ContentRecord>, ContentError> {
        self.loader.list_summaries()
    }

    /// Route params of every document
    pub fn list_ids(&self) -> Result<Vec<RouteParams>, ContentError> {
        self.loader.list_ids()
    }

    /// Map `id` to its document or apply the unknown-id policy
    pub fn resolve(&self, id: &str) -> Result<Resolution, ContentError> {
        if is_valid_id(id) && self.loader.contains(id) {
            return Ok(Resolution::Found(self.loader.document_path(id)));
        }

        match self.on_unknown_id {
            OnUnknownId::Fail => Err(ContentError::UnknownId {
                collection: self.name.clone(),
                id: id.to_string(),
            }),
            OnUnknownId::Fallback => {
                tracing::debug!("No '{}' in {}, using fallback", id, self.name);
                Ok(Resolution::Fallback)
            }
        }
    }

    /// Compile one document
    pub async fn compile(&self, id: &str) -> Result<CompiledDocument, ContentError> {
        self.compiler.compile(id).await
    }

    /// Resolve, then compile. `None` means the fallback page applies.
    pub async fn compile_resolved(
        &self,
        id: &str,
    ) -> Result<Option<CompiledDocument>, ContentError> {
        match self.resolve(id)? {
            Resolution::Found(_) => self.compile(id).await.map(Some),
            Resolution::Fallback => Ok(None),
        }
    }
}

/// Check the fields page templates rely on
pub fn require_fields(id: &str, frontmatter: &FrontMatter) -> Result<(), ContentError> {
    for field in REQUIRED_FIELDS {
        let present = frontmatter
            .get(field)
            .map(|v| !v.is_null())
            .unwrap_or(false);
        if !present {
            return Err(ContentError::MissingField {
                id: id.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}
