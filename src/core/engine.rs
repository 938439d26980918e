use std::sync::Arc;

use serde_yaml::Value;
use tracing::{debug, info};

use crate::core::error::ContentResult;
use crate::core::metadata::{self, MetadataDeriver, DEFAULT_WORDS_PER_MINUTE};
use crate::core::popular::PopularContentRanker;
use crate::core::recent::RecentContent;
use crate::core::related::RelatedContentRanker;
use crate::core::repository::ContentRepository;
use crate::core::views::ViewCounter;
use crate::models::{ContentItem, ItemId, RenderContext, SiteConfig, TaxonomyTerm};

/// 相关文章默认数量
pub const DEFAULT_RELATED_COUNT: usize = 3;
/// 热门文章默认数量
pub const DEFAULT_POPULAR_COUNT: usize = 4;
/// 最新文章默认数量
pub const DEFAULT_RECENT_COUNT: usize = 6;
/// 摘要默认词数
pub const DEFAULT_EXCERPT_LENGTH: usize = 25;

/// 内容引擎：模板层调用的统一入口
///
/// 每个操作都显式接收文章标识，不依赖“当前文章”之类的全局状态。
#[derive(Clone)]
pub struct Engine {
    /// 站点配置
    config: SiteConfig,
    /// 内容仓库
    repository: Arc<dyn ContentRepository>,
    /// 派生信息计算
    metadata: MetadataDeriver,
    /// 阅读计数
    views: ViewCounter,
    /// 相关文章
    related: Arc<RelatedContentRanker>,
    /// 热门文章
    popular: PopularContentRanker,
    /// 最新文章
    recent: RecentContent,
}

impl Engine {
    /// 创建一个新的引擎实例
    pub fn new(config: SiteConfig, repository: Arc<dyn ContentRepository>) -> Self {
        info!("初始化内容引擎...");

        let words_per_minute =
            config.get_usize("content.words_per_minute", DEFAULT_WORDS_PER_MINUTE);
        debug!("阅读速度: 每分钟 {} 词", words_per_minute);

        Self {
            metadata: MetadataDeriver::with_words_per_minute(words_per_minute),
            views: ViewCounter::new(repository.clone()),
            related: Arc::new(RelatedContentRanker::new(repository.clone())),
            popular: PopularContentRanker::new(repository.clone()),
            recent: RecentContent::new(repository.clone()),
            repository,
            config,
        }
    }

    /// 站点配置
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// 按点号路径读取配置
    pub fn config_get(&self, path: &str, default: Value) -> Value {
        self.config.get(path, default)
    }

    /// 获取文章
    pub fn item(&self, id: ItemId) -> ContentResult<Option<ContentItem>> {
        self.repository.get(id)
    }

    /// 相关文章
    pub fn related(&self, id: ItemId, limit: i64) -> ContentResult<Vec<ItemId>> {
        self.related.related(id, limit)
    }

    /// 使用 `content.related_posts_count` 作为数量的相关文章
    pub fn related_default(&self, id: ItemId) -> ContentResult<Vec<ItemId>> {
        self.related(id, self.configured_count("content.related_posts_count", DEFAULT_RELATED_COUNT))
    }

    /// 热门文章
    pub fn popular(&self, limit: i64) -> ContentResult<Vec<ItemId>> {
        self.popular.popular(limit)
    }

    /// 使用 `content.popular_posts_count` 作为数量的热门文章
    pub fn popular_default(&self) -> ContentResult<Vec<ItemId>> {
        self.popular(self.configured_count("content.popular_posts_count", DEFAULT_POPULAR_COUNT))
    }

    /// 最新文章
    pub fn recent(&self, limit: i64) -> ContentResult<Vec<ItemId>> {
        self.recent.recent(limit)
    }

    /// 使用 `content.recent_posts_count` 作为数量的最新文章
    pub fn recent_default(&self) -> ContentResult<Vec<ItemId>> {
        self.recent(self.configured_count("content.recent_posts_count", DEFAULT_RECENT_COUNT))
    }

    /// 文章的预计阅读时间（分钟），未知文章按空正文计算
    pub fn estimated_reading_time(&self, id: ItemId) -> ContentResult<u32> {
        let body = self
            .repository
            .get(id)?
            .map(|item| item.body)
            .unwrap_or_default();
        Ok(self.metadata.estimated_reading_time(&body))
    }

    /// 文章的阅读数（格式化后），未知文章显示 `0`
    pub fn format_view_count(&self, id: ItemId) -> ContentResult<String> {
        let count = self.repository.get_view_count(id)?;
        Ok(metadata::format_view_count(i64::try_from(count).unwrap_or(i64::MAX)))
    }

    /// 文章摘要，长度由 `content.excerpt_length` 决定；未知文章返回空字符串
    pub fn excerpt(&self, id: ItemId) -> ContentResult<String> {
        let length = self
            .config
            .get_usize("content.excerpt_length", DEFAULT_EXCERPT_LENGTH);
        Ok(self
            .repository
            .get(id)?
            .map(|item| self.metadata.excerpt(&item.body, length))
            .unwrap_or_default())
    }

    /// 文章的点赞数，未知文章为 0
    pub fn like_count(&self, id: ItemId) -> ContentResult<u64> {
        self.repository.get_like_count(id)
    }

    /// 记录一次详情页阅读
    pub fn record_view(&self, id: ItemId) -> ContentResult<Option<u64>> {
        self.views.record_view(id)
    }

    /// 按渲染上下文记录阅读，只有详情页会计数
    pub fn track_view(&self, id: ItemId, context: RenderContext) -> ContentResult<Option<u64>> {
        self.views.track(id, context)
    }

    /// 所有分类
    pub fn categories(&self) -> ContentResult<Vec<TaxonomyTerm>> {
        self.repository.categories()
    }

    /// 所有标签
    pub fn tags(&self) -> ContentResult<Vec<TaxonomyTerm>> {
        self.repository.tags()
    }

    fn configured_count(&self, path: &str, default: usize) -> i64 {
        let count = self.config.get_usize(path, default);
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}
