pub mod engine;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod popular;
pub mod recent;
pub mod related;
pub mod repository;
pub mod views;

pub use engine::Engine;
pub use error::{ContentError, ContentResult};
pub use loader::Site;
pub use metadata::{format_view_count, MetadataDeriver};
pub use popular::PopularContentRanker;
pub use recent::RecentContent;
pub use related::{AuthorStrategy, RelatedContentRanker, RelatedStrategy, TagStrategy, TaxonomyStrategy};
pub use repository::{ContentRepository, MemoryRepository, PostFilter};
pub use views::ViewCounter;
