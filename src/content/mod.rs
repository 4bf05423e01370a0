//! Content module - loading, compiling and resolving content documents

pub mod collection;
pub mod compiler;
mod error;
mod frontmatter;
pub mod loader;
mod markdown;
pub mod markup;
mod record;

pub use collection::{require_fields, Collection, OnUnknownId, Resolution};
pub use compiler::{CompiledDocument, ContentCompiler};
pub use error::ContentError;
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use loader::{is_valid_id, ContentLoader};
pub use markdown::{MarkdownRenderer, MarkupExtension};
pub use markup::{CompiledUnit, Component, ComponentError, ComponentRegistry};
pub use record::{sort_by_date_desc, ContentRecord, RouteParams};
