pub mod core;
pub mod models;
pub mod utils;

// Re-export commonly used types and traits
pub use crate::core::{ContentError, ContentRepository, Engine, MemoryRepository, PostFilter, Site};
pub use crate::models::{ContentItem, ItemId, PostStatus, RenderContext, SiteConfig, TaxonomyTerm};
