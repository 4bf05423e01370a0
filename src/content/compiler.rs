//! Content compiler - turns one document into a compiled UI unit

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::{is_valid_id, ContentLoader};
use super::markdown::{MarkdownRenderer, MarkupExtension};
use super::markup::{jsx, CompiledUnit, ComponentCall, ComponentError, ComponentRegistry};
use super::{ContentError, FrontMatter};

/// A compiled document: front-matter plus the compiled body
#[derive(Debug, Clone, Serialize)]
pub struct CompiledDocument {
    pub id: String,
    pub frontmatter: FrontMatter,
    #[serde(skip)]
    pub code: CompiledUnit,
}

impl CompiledDocument {
    /// Instantiate the compiled body into HTML
    pub fn render_body(&self) -> Result<String, ComponentError> {
        self.code.render()
    }
}

/// Compiles documents of one content directory.
///
/// Cheap to clone; clones share the syntax sets and component registry.
#[derive(Clone)]
pub struct ContentCompiler {
    inner: Arc<CompilerInner>,
}

struct CompilerInner {
    loader: ContentLoader,
    extensions: Vec<MarkupExtension>,
    registry: Arc<ComponentRegistry>,
    renderer: Arc<MarkdownRenderer>,
}

impl ContentCompiler {
    pub fn new(
        loader: ContentLoader,
        extensions: Vec<MarkupExtension>,
        registry: Arc<ComponentRegistry>,
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            inner: Arc::new(CompilerInner {
                loader,
                extensions,
                registry,
                renderer,
            }),
        }
    }

    pub fn extensions(&self) -> &[MarkupExtension] {
        &self.inner.extensions
    }

    /// Read and compile the document `id`.
    ///
    /// The file is read asynchronously; parsing and rendering run on the
    /// blocking pool.
    pub async fn compile(&self, id: &str) -> Result<CompiledDocument, ContentError> {
        let path = self.inner.loader.document_path(id);
        if !is_valid_id(id) {
            return Err(ContentError::NotFound { path });
        }

        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ContentError::from_io(&path, e))?;

        let inner = Arc::clone(&self.inner);
        let id = id.to_string();
        let task_path = path.clone();
        tokio::task::spawn_blocking(move || inner.compile_source(id, &task_path, &source))
            .await
            .map_err(|e| ContentError::Compile {
                path,
                message: format!("compile task failed: {}", e),
            })?
    }

    /// Compile already loaded source text
    pub fn compile_source(
        &self,
        id: impl Into<String>,
        path: &Path,
        source: &str,
    ) -> Result<CompiledDocument, ContentError> {
        self.inner.compile_source(id.into(), path, source)
    }
}

impl CompilerInner {
    fn compile_source(
        &self,
        id: String,
        path: &Path,
        source: &str,
    ) -> Result<CompiledDocument, ContentError> {
        let (frontmatter, body) = FrontMatter::parse(source).map_err(|e| ContentError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let code = self
            .compile_body(body)
            .map_err(|message| ContentError::Compile {
                path: PathBuf::from(path),
                message,
            })?;

        tracing::debug!(
            "Compiled {} ({} components)",
            id,
            code.component_names().len()
        );

        Ok(CompiledDocument {
            id,
            frontmatter,
            code,
        })
    }

    fn compile_body(&self, body: &str) -> Result<CompiledUnit, String> {
        let scanned = jsx::scan(body).map_err(|e| e.to_string())?;

        let mut calls = Vec::with_capacity(scanned.elements.len());
        for element in scanned.elements {
            let component = self.registry.get(&element.name).ok_or_else(|| {
                format!(
                    "line {}: unknown component <{}>",
                    element.line, element.name
                )
            })?;
            component
                .validate(&element.props)
                .map_err(|e| format!("line {}: {}", element.line, e))?;

            let children = match element.children.as_deref() {
                Some(children) => self
                    .compile_body(children)
                    .map_err(|e| format!("in <{}> at line {}: {}", element.name, element.line, e))?,
                None => CompiledUnit::default(),
            };

            calls.push(ComponentCall::new(
                element.name,
                component,
                element.props,
                children,
                !element.block,
            ));
        }

        let html = self.renderer.render(&scanned.markdown, &self.extensions);
        CompiledUnit::assemble(&html, calls)
    }
}
