use std::sync::Arc;

use tracing::{debug, info};

use crate::core::error::ContentResult;
use crate::core::repository::ContentRepository;
use crate::models::{ItemId, RenderContext};

/// 阅读计数器
///
/// 只在已发布文章的详情页渲染时计数，列表、归档页面和草稿预览不计。
#[derive(Clone)]
pub struct ViewCounter {
    repository: Arc<dyn ContentRepository>,
}

impl ViewCounter {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// 记录一次阅读，返回新的计数；未知文章不做任何操作并返回 None
    pub fn record_view(&self, id: ItemId) -> ContentResult<Option<u64>> {
        if self.repository.get(id)?.is_none() {
            debug!("忽略未知文章的阅读记录: {}", id);
            return Ok(None);
        }

        let count = self.repository.increment_view_count(id)?;
        info!("文章 {} 阅读数 +1 -> {}", id, count);
        Ok(Some(count))
    }

    /// 根据渲染上下文和发布状态决定是否计数
    pub fn track(&self, id: ItemId, context: RenderContext) -> ContentResult<Option<u64>> {
        if let RenderContext::Listing = context {
            return Ok(None);
        }

        match self.repository.get(id)? {
            Some(item) if item.is_published() => self.record_view(id),
            Some(_) => {
                debug!("忽略未发布文章的阅读记录: {}", id);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
