use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::core::error::{ContentError, ContentResult};
use crate::core::repository::{ContentRepository, PostFilter};
use crate::models::{ContentItem, ItemId};

/// 校验数量参数，非正数视为无效
pub(crate) fn positive_limit(limit: i64) -> ContentResult<usize> {
    if limit <= 0 {
        return Err(ContentError::InvalidArgument {
            message: format!("数量必须为正数: {}", limit),
        });
    }
    Ok(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// 热门排序：阅读数降序，其次发布时间降序，最后按标识升序
pub(crate) fn popularity_order(
    a: &ContentItem,
    b: &ContentItem,
    counts: &HashMap<ItemId, u64>,
) -> Ordering {
    let views_a = counts.get(&a.id).copied().unwrap_or(0);
    let views_b = counts.get(&b.id).copied().unwrap_or(0);
    views_b
        .cmp(&views_a)
        .then_with(|| recency_order(a, b))
}

/// 时间排序：发布时间降序，其次按标识升序
pub(crate) fn recency_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

/// 按热门程度排序并截取前 `limit` 个标识
pub(crate) fn rank_by_popularity(
    repository: &dyn ContentRepository,
    mut items: Vec<ContentItem>,
    limit: usize,
) -> ContentResult<Vec<ItemId>> {
    let ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
    let counts = repository.view_counts(&ids)?;
    items.sort_by(|a, b| popularity_order(a, b, &counts));
    Ok(items.into_iter().take(limit).map(|item| item.id).collect())
}

/// 热门文章排行
#[derive(Clone)]
pub struct PopularContentRanker {
    repository: Arc<dyn ContentRepository>,
}

impl PopularContentRanker {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// 阅读数最高的 `limit` 篇已发布文章
    pub fn popular(&self, limit: i64) -> ContentResult<Vec<ItemId>> {
        let limit = match positive_limit(limit) {
            Ok(limit) => limit,
            Err(e) => {
                debug!("热门文章查询返回空结果: {}", e);
                return Ok(Vec::new());
            }
        };

        let items = self.repository.list_published(&PostFilter::new())?;
        rank_by_popularity(self.repository.as_ref(), items, limit)
    }
}
