use std::path::Path;

pub mod html;
pub mod markdown;

/// 从分类或标签名称生成 URL 友好的别名
pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// 检查文件是否为 Markdown 文件
pub fn is_markdown_file<P: AsRef<Path>>(path: P) -> bool {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"),
        None => false,
    }
}

/// 按千位分组格式化整数，例如 `1234567` -> `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
