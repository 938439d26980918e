use thiserror::Error;

use crate::models::ItemId;

/// 内容核心的错误类型
///
/// 只有 `StorageUnavailable` 会传递给调用方；其余两类在核心内部被吸收为
/// 空结果、零值或默认值。
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("未找到文章: {id}")]
    NotFound {
        id: ItemId,
    },

    #[error("参数无效: {message}")]
    InvalidArgument {
        message: String,
    },

    #[error("存储不可用: {message}")]
    StorageUnavailable {
        message: String,
    },
}

impl ContentError {
    pub fn storage(message: impl Into<String>) -> Self {
        ContentError::StorageUnavailable {
            message: message.into(),
        }
    }
}

pub type ContentResult<T> = std::result::Result<T, ContentError>;
