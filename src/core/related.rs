use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::core::error::{ContentError, ContentResult};
use crate::core::popular::{positive_limit, rank_by_popularity, recency_order};
use crate::core::repository::{ContentRepository, PostFilter};
use crate::models::{ContentItem, ItemId};

/// 相关文章的候选来源
///
/// 每一层按自己的排序返回最多 `remaining` 个候选，且不包含 `exclude` 中的文章。
pub trait RelatedStrategy: Send + Sync {
    /// 策略名称，用于日志
    fn name(&self) -> &str;

    fn candidates(
        &self,
        repository: &dyn ContentRepository,
        source: &ContentItem,
        exclude: &HashSet<ItemId>,
        remaining: usize,
    ) -> ContentResult<Vec<ItemId>>;
}

/// 同分类的文章，按热门程度排序
pub struct TaxonomyStrategy;

impl RelatedStrategy for TaxonomyStrategy {
    fn name(&self) -> &str {
        "taxonomy"
    }

    fn candidates(
        &self,
        repository: &dyn ContentRepository,
        source: &ContentItem,
        exclude: &HashSet<ItemId>,
        remaining: usize,
    ) -> ContentResult<Vec<ItemId>> {
        if source.categories.is_empty() {
            return Ok(Vec::new());
        }
        let filter = PostFilter::new()
            .in_categories(&source.categories)
            .excluding(exclude);
        let items = repository.list_published(&filter)?;
        rank_by_popularity(repository, items, remaining)
    }
}

/// 同标签的文章，按热门程度排序
pub struct TagStrategy;

impl RelatedStrategy for TagStrategy {
    fn name(&self) -> &str {
        "tag"
    }

    fn candidates(
        &self,
        repository: &dyn ContentRepository,
        source: &ContentItem,
        exclude: &HashSet<ItemId>,
        remaining: usize,
    ) -> ContentResult<Vec<ItemId>> {
        if source.tags.is_empty() {
            return Ok(Vec::new());
        }
        let filter = PostFilter::new().with_tags(&source.tags).excluding(exclude);
        let items = repository.list_published(&filter)?;
        rank_by_popularity(repository, items, remaining)
    }
}

/// 同作者的文章，最新的优先
pub struct AuthorStrategy;

impl RelatedStrategy for AuthorStrategy {
    fn name(&self) -> &str {
        "author"
    }

    fn candidates(
        &self,
        repository: &dyn ContentRepository,
        source: &ContentItem,
        exclude: &HashSet<ItemId>,
        remaining: usize,
    ) -> ContentResult<Vec<ItemId>> {
        let filter = PostFilter::new().by_author(&source.author).excluding(exclude);
        let mut items = repository.list_published(&filter)?;
        items.sort_by(recency_order);
        Ok(items.into_iter().take(remaining).map(|item| item.id).collect())
    }
}

/// 相关文章排行：依次尝试分类、标签、作者三层，直到凑满数量
pub struct RelatedContentRanker {
    repository: Arc<dyn ContentRepository>,
    strategies: Vec<Box<dyn RelatedStrategy>>,
}

impl RelatedContentRanker {
    /// 使用默认的三层策略
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self::with_strategies(
            repository,
            vec![
                Box::new(TaxonomyStrategy),
                Box::new(TagStrategy),
                Box::new(AuthorStrategy),
            ],
        )
    }

    /// 自定义策略顺序
    pub fn with_strategies(
        repository: Arc<dyn ContentRepository>,
        strategies: Vec<Box<dyn RelatedStrategy>>,
    ) -> Self {
        Self {
            repository,
            strategies,
        }
    }

    /// 与 `id` 相关的最多 `limit` 篇已发布文章，不包含其自身
    ///
    /// 未知文章或非正数量返回空列表；只有存储错误会返回 Err。
    pub fn related(&self, id: ItemId, limit: i64) -> ContentResult<Vec<ItemId>> {
        match self.try_related(id, limit) {
            Err(e @ ContentError::NotFound { .. }) | Err(e @ ContentError::InvalidArgument { .. }) => {
                debug!("相关文章查询返回空结果: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn try_related(&self, id: ItemId, limit: i64) -> ContentResult<Vec<ItemId>> {
        let limit = positive_limit(limit)?;
        let source = self
            .repository
            .get(id)?
            .ok_or(ContentError::NotFound { id })?;

        let mut selected: Vec<ItemId> = Vec::new();
        let mut exclude: HashSet<ItemId> = HashSet::new();
        exclude.insert(id);

        for strategy in &self.strategies {
            let remaining = limit - selected.len();
            if remaining == 0 {
                break;
            }

            let found = strategy.candidates(self.repository.as_ref(), &source, &exclude, remaining)?;
            debug!("相关文章 {}: {} 层找到 {} 篇", id, strategy.name(), found.len());

            for candidate in found.into_iter().take(remaining) {
                if exclude.insert(candidate) {
                    selected.push(candidate);
                }
            }
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repository::tests::post;
    use crate::core::repository::MemoryRepository;
    use crate::models::PostStatus;

    fn ranker(repo: &Arc<MemoryRepository>) -> RelatedContentRanker {
        RelatedContentRanker::new(repo.clone())
    }

    #[test]
    fn unknown_item_has_no_related_posts() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &[])).unwrap();
        let ranker = ranker(&repo);
        for n in [-1, 0, 1, 5, 100] {
            assert!(ranker.related(ItemId(404), n).unwrap().is_empty());
        }
    }

    #[test]
    fn isolated_item_has_no_related_posts() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &["async"])).unwrap();
        repo.insert(post(2, 2, "bob", &["php"], &["web"])).unwrap();
        repo.insert(post(3, 3, "carol", &[], &[])).unwrap();
        assert!(ranker(&repo).related(ItemId(1), 3).unwrap().is_empty());
    }

    #[test]
    fn taxonomy_tier_picks_most_viewed() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &[])).unwrap();
        for (id, views) in [(2, 5), (3, 50), (4, 20), (5, 1), (6, 30)] {
            repo.insert(post(id, id as u32, "bob", &["rust"], &[])).unwrap();
            repo.set_view_count(ItemId(id), views).unwrap();
        }

        let related = ranker(&repo).related(ItemId(1), 3).unwrap();
        assert_eq!(related, vec![ItemId(3), ItemId(6), ItemId(4)]);
    }

    #[test]
    fn taxonomy_tier_breaks_view_ties_by_date() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &[])).unwrap();
        repo.insert(post(2, 3, "bob", &["rust"], &[])).unwrap();
        repo.insert(post(3, 7, "bob", &["rust"], &[])).unwrap();
        repo.insert(post(4, 5, "bob", &["rust"], &[])).unwrap();
        repo.set_view_count(ItemId(2), 10).unwrap();
        repo.set_view_count(ItemId(3), 10).unwrap();
        repo.set_view_count(ItemId(4), 10).unwrap();

        let related = ranker(&repo).related(ItemId(1), 3).unwrap();
        assert_eq!(related, vec![ItemId(3), ItemId(4), ItemId(2)]);
    }

    #[test]
    fn tag_tier_ranks_by_views_before_date() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &["async"])).unwrap();
        // 没有同分类文章，全部来自标签层；日期顺序与阅读数顺序相反
        for (id, day, views) in [(2, 2, 40), (3, 9, 5), (4, 5, 40), (5, 8, 12)] {
            repo.insert(post(id, day, "bob", &["go"], &["async"])).unwrap();
            repo.set_view_count(ItemId(id), views).unwrap();
        }

        let related = ranker(&repo).related(ItemId(1), 3).unwrap();
        assert_eq!(related, vec![ItemId(4), ItemId(2), ItemId(5)]);
    }

    #[test]
    fn falls_back_to_tags_then_author() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &["async"])).unwrap();
        repo.insert(post(2, 2, "bob", &["rust"], &[])).unwrap();
        repo.insert(post(3, 3, "bob", &["go"], &["async"])).unwrap();
        repo.insert(post(4, 4, "alice", &["go"], &[])).unwrap();
        repo.insert(post(5, 8, "alice", &[], &[])).unwrap();
        repo.insert(post(6, 9, "carol", &[], &[])).unwrap();

        let related = ranker(&repo).related(ItemId(1), 4).unwrap();
        // 分类 -> 标签 -> 作者（最新优先）
        assert_eq!(related, vec![ItemId(2), ItemId(3), ItemId(5), ItemId(4)]);
    }

    #[test]
    fn items_selected_in_earlier_tiers_are_not_repeated() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &["async"])).unwrap();
        repo.insert(post(2, 2, "alice", &["rust"], &["async"])).unwrap();
        repo.insert(post(3, 3, "alice", &[], &["async"])).unwrap();

        let related = ranker(&repo).related(ItemId(1), 10).unwrap();
        assert_eq!(related, vec![ItemId(2), ItemId(3)]);
    }

    #[test]
    fn never_returns_source_or_drafts() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &["async"])).unwrap();
        let mut draft = post(2, 2, "alice", &["rust"], &["async"]);
        draft.status = PostStatus::Unpublished;
        repo.insert(draft).unwrap();
        repo.insert(post(3, 3, "alice", &["rust"], &[])).unwrap();

        let ranker = ranker(&repo);
        for n in 1..5 {
            let related = ranker.related(ItemId(1), n).unwrap();
            assert!(!related.contains(&ItemId(1)));
            assert!(!related.contains(&ItemId(2)));
            assert!(related.len() as i64 <= n);
            // 只有一篇符合条件的文章
            assert!(related.len() <= 1);
        }
    }

    #[test]
    fn custom_strategy_order() {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert(post(1, 1, "alice", &["rust"], &[])).unwrap();
        repo.insert(post(2, 2, "bob", &["rust"], &[])).unwrap();
        repo.insert(post(3, 3, "alice", &[], &[])).unwrap();

        let ranker = RelatedContentRanker::with_strategies(
            repo.clone(),
            vec![Box::new(AuthorStrategy), Box::new(TaxonomyStrategy)],
        );
        assert_eq!(ranker.related(ItemId(1), 2).unwrap(), vec![ItemId(3), ItemId(2)]);
    }
}
