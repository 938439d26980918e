use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 文章的唯一标识，创建后不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId(id)
    }
}

/// 文章发布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Unpublished,
}

impl PostStatus {
    /// 解析前置数据中的状态字段，未知值按未发布处理
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "publish" | "published" => PostStatus::Published,
            _ => PostStatus::Unpublished,
        }
    }
}

/// 博客文章
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// 文章标识
    pub id: ItemId,
    /// 文章标题
    pub title: String,
    /// 文章正文（HTML）
    pub body: String,
    /// 作者标识
    pub author: String,
    /// 发布时间
    pub date: DateTime<Utc>,
    /// 发布状态
    pub status: PostStatus,
    /// 分类标识（别名）
    pub categories: Vec<String>,
    /// 标签标识（别名）
    pub tags: Vec<String>,
    /// 是否有特色图片
    pub has_thumbnail: bool,
}

impl ContentItem {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// 是否与给定分类有交集
    pub fn shares_category(&self, categories: &[String]) -> bool {
        self.categories.iter().any(|c| categories.contains(c))
    }

    /// 是否与给定标签有交集
    pub fn shares_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// 分类或标签的汇总信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    /// 别名（用于匹配和URL）
    pub id: String,
    /// 显示名称
    pub name: String,
    /// 已发布文章数量
    pub count: usize,
}

/// 渲染上下文：只有单篇文章页面才算一次有效阅读
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// 单篇文章详情页
    Single,
    /// 列表、归档、首页等
    Listing,
}
