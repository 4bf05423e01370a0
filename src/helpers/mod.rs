//! Small helpers shared by the markup compiler and the page templates

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
