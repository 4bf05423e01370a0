//! Configuration module

pub mod identity;
mod site;

pub use identity::SiteIdentity;
pub use site::CollectionConfig;
pub use site::HighlightConfig;
pub use site::NavLink;
pub use site::SiteConfig;
