use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use tracing::debug;

use crate::core::error::{ContentError, ContentResult};
use crate::models::{ContentItem, ItemId, TaxonomyTerm};

/// 查询已发布文章时的过滤条件
///
/// 各条件之间为“与”关系；分类、标签列表内部为“或”关系。
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// 至少命中其中一个分类
    pub categories: Vec<String>,
    /// 至少命中其中一个标签
    pub tags: Vec<String>,
    /// 指定作者
    pub author: Option<String>,
    /// 排除的文章
    pub exclude: HashSet<ItemId>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_categories(mut self, categories: &[String]) -> Self {
        self.categories = categories.to_vec();
        self
    }

    pub fn with_tags(mut self, tags: &[String]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    pub fn by_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn excluding(mut self, exclude: &HashSet<ItemId>) -> Self {
        self.exclude = exclude.clone();
        self
    }

    /// 判断文章是否满足条件（不检查发布状态）
    pub fn matches(&self, item: &ContentItem) -> bool {
        if self.exclude.contains(&item.id) {
            return false;
        }
        if !self.categories.is_empty() && !item.shares_category(&self.categories) {
            return false;
        }
        if !self.tags.is_empty() && !item.shares_tag(&self.tags) {
            return false;
        }
        match &self.author {
            Some(author) => &item.author == author,
            None => true,
        }
    }
}

/// 内容仓库：核心读取文章和阅读数的唯一入口
pub trait ContentRepository: Send + Sync {
    /// 列出满足条件的已发布文章，顺序不做保证
    fn list_published(&self, filter: &PostFilter) -> ContentResult<Vec<ContentItem>>;

    /// 按标识获取文章（不论发布状态）
    fn get(&self, id: ItemId) -> ContentResult<Option<ContentItem>>;

    /// 获取阅读数，未记录过的文章为 0
    fn get_view_count(&self, id: ItemId) -> ContentResult<u64>;

    /// 阅读数加一，必须是存储层的原子操作
    fn increment_view_count(&self, id: ItemId) -> ContentResult<u64>;

    /// 获取点赞数，未记录过的文章为 0
    fn get_like_count(&self, id: ItemId) -> ContentResult<u64>;

    /// 批量获取阅读数
    fn view_counts(&self, ids: &[ItemId]) -> ContentResult<HashMap<ItemId, u64>> {
        let mut counts = HashMap::with_capacity(ids.len());
        for id in ids {
            counts.insert(*id, self.get_view_count(*id)?);
        }
        Ok(counts)
    }

    /// 所有分类及其已发布文章数
    fn categories(&self) -> ContentResult<Vec<TaxonomyTerm>>;

    /// 所有标签及其已发布文章数
    fn tags(&self) -> ContentResult<Vec<TaxonomyTerm>>;
}

/// 基于内存的内容仓库
#[derive(Debug, Default)]
pub struct MemoryRepository {
    /// 所有文章
    items: RwLock<BTreeMap<ItemId, ContentItem>>,
    /// 分类标识到显示名称
    category_names: RwLock<HashMap<String, String>>,
    /// 标签标识到显示名称
    tag_names: RwLock<HashMap<String, String>>,
    /// 阅读数
    views: RwLock<HashMap<ItemId, u64>>,
    /// 点赞数，只读
    likes: RwLock<HashMap<ItemId, u64>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入文章，已存在的同标识文章会被替换
    pub fn insert(&self, item: ContentItem) -> ContentResult<()> {
        let mut items = self.items.write().map_err(poisoned)?;
        items.insert(item.id, item);
        Ok(())
    }

    /// 登记分类的显示名称
    pub fn name_category(&self, id: &str, name: &str) -> ContentResult<()> {
        let mut names = self.category_names.write().map_err(poisoned)?;
        names.insert(id.to_string(), name.to_string());
        Ok(())
    }

    /// 登记标签的显示名称
    pub fn name_tag(&self, id: &str, name: &str) -> ContentResult<()> {
        let mut names = self.tag_names.write().map_err(poisoned)?;
        names.insert(id.to_string(), name.to_string());
        Ok(())
    }

    /// 直接设置阅读数，用于从持久化文件恢复
    pub fn set_view_count(&self, id: ItemId, count: u64) -> ContentResult<()> {
        let mut views = self.views.write().map_err(poisoned)?;
        views.insert(id, count);
        Ok(())
    }

    /// 设置点赞数，用于从持久化文件恢复
    pub fn set_like_count(&self, id: ItemId, count: u64) -> ContentResult<()> {
        let mut likes = self.likes.write().map_err(poisoned)?;
        likes.insert(id, count);
        Ok(())
    }

    /// 当前阅读数的快照，用于持久化
    pub fn view_snapshot(&self) -> ContentResult<BTreeMap<ItemId, u64>> {
        let views = self.views.read().map_err(poisoned)?;
        Ok(views.iter().map(|(id, count)| (*id, *count)).collect())
    }

    /// 文章总数（包括未发布的）
    pub fn len(&self) -> ContentResult<usize> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.len())
    }

    pub fn is_empty(&self) -> ContentResult<bool> {
        Ok(self.len()? == 0)
    }

    fn summarize<F>(&self, names: &RwLock<HashMap<String, String>>, terms_of: F) -> ContentResult<Vec<TaxonomyTerm>>
    where
        F: Fn(&ContentItem) -> &[String],
    {
        let items = self.items.read().map_err(poisoned)?;
        let names = names.read().map_err(poisoned)?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in items.values() {
            for term in terms_of(item) {
                let count = counts.entry(term.as_str()).or_insert(0);
                if item.is_published() {
                    *count += 1;
                }
            }
        }

        let mut terms: Vec<TaxonomyTerm> = counts
            .into_iter()
            .map(|(id, count)| TaxonomyTerm {
                id: id.to_string(),
                name: names.get(id).cloned().unwrap_or_else(|| id.to_string()),
                count,
            })
            .collect();
        terms.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(terms)
    }
}

impl ContentRepository for MemoryRepository {
    fn list_published(&self, filter: &PostFilter) -> ContentResult<Vec<ContentItem>> {
        let items = self.items.read().map_err(poisoned)?;
        let found: Vec<ContentItem> = items
            .values()
            .filter(|item| item.is_published() && filter.matches(item))
            .cloned()
            .collect();
        debug!("查询已发布文章: {:?} -> {} 篇", filter, found.len());
        Ok(found)
    }

    fn get(&self, id: ItemId) -> ContentResult<Option<ContentItem>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.get(&id).cloned())
    }

    fn get_view_count(&self, id: ItemId) -> ContentResult<u64> {
        let views = self.views.read().map_err(poisoned)?;
        Ok(views.get(&id).copied().unwrap_or(0))
    }

    fn increment_view_count(&self, id: ItemId) -> ContentResult<u64> {
        // 在写锁内完成读取和写入，并发阅读不会丢失计数
        let mut views = self.views.write().map_err(poisoned)?;
        let count = views.entry(id).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn get_like_count(&self, id: ItemId) -> ContentResult<u64> {
        let likes = self.likes.read().map_err(poisoned)?;
        Ok(likes.get(&id).copied().unwrap_or(0))
    }

    fn categories(&self) -> ContentResult<Vec<TaxonomyTerm>> {
        self.summarize(&self.category_names, |item| item.categories.as_slice())
    }

    fn tags(&self) -> ContentResult<Vec<TaxonomyTerm>> {
        self.summarize(&self.tag_names, |item| item.tags.as_slice())
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> ContentError {
    ContentError::storage(format!("仓库锁已损坏: {}", err))
}
