use std::sync::Arc;

use tracing::debug;

use crate::core::error::ContentResult;
use crate::core::popular::{positive_limit, recency_order};
use crate::core::repository::{ContentRepository, PostFilter};
use crate::models::ItemId;

/// 最新文章列表
#[derive(Clone)]
pub struct RecentContent {
    repository: Arc<dyn ContentRepository>,
}

impl RecentContent {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// 最近发布的 `limit` 篇文章
    pub fn recent(&self, limit: i64) -> ContentResult<Vec<ItemId>> {
        let limit = match positive_limit(limit) {
            Ok(limit) => limit,
            Err(e) => {
                debug!("最新文章查询返回空结果: {}", e);
                return Ok(Vec::new());
            }
        };

        let mut items = self.repository.list_published(&PostFilter::new())?;
        items.sort_by(recency_order);
        Ok(items.into_iter().take(limit).map(|item| item.id).collect())
    }
}
