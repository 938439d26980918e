pub mod config;
pub mod types;

pub use config::SiteConfig;
pub use types::{ContentItem, ItemId, PostStatus, RenderContext, TaxonomyTerm};
