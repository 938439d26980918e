use crate::utils::{group_thousands, html::strip_tags};

/// 默认阅读速度：每分钟 200 词
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// 文章派生信息：字数、阅读时间、摘要
#[derive(Debug, Clone)]
pub struct MetadataDeriver {
    /// 每分钟阅读词数
    words_per_minute: usize,
}

impl Default for MetadataDeriver {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl MetadataDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 自定义阅读速度，0 按默认值处理
    pub fn with_words_per_minute(words_per_minute: usize) -> Self {
        Self {
            words_per_minute: if words_per_minute == 0 {
                DEFAULT_WORDS_PER_MINUTE
            } else {
                words_per_minute
            },
        }
    }

    /// 统计去除标签后的词数（按空白切分）
    pub fn word_count(&self, content: &str) -> usize {
        strip_tags(content).split_whitespace().count()
    }

    /// 估算阅读时间（分钟），至少为 1
    pub fn estimated_reading_time(&self, content: &str) -> u32 {
        let words = self.word_count(content);
        let minutes = words.div_ceil(self.words_per_minute);
        minutes.max(1) as u32
    }

    /// 生成纯文本摘要，超出 `max_words` 时截断并追加省略号
    pub fn excerpt(&self, content: &str, max_words: usize) -> String {
        let text = strip_tags(content);
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.len() > max_words {
            format!("{}...", words[..max_words].join(" "))
        } else {
            words.join(" ")
        }
    }
}

/// 格式化阅读数：1000 及以上显示为 `12.6K`，否则按千位分组
///
/// 负数按 0 处理；千位以上保留一位小数，四舍五入。
pub fn format_view_count(raw_count: i64) -> String {
    let count = raw_count.max(0) as u64;
    if count >= 1000 {
        // count / 1000 保留一位小数 == round(count / 100) / 10
        let tenths = (count + 50) / 100;
        format!("{}.{}K", group_thousands(tenths / 10), tenths % 10)
    } else {
        group_thousands(count)
    }
}
