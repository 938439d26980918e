use regex::Regex;
use std::sync::OnceLock;

fn script_or_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
            .expect("valid script/style pattern")
    })
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"))
}

/// 去除所有 HTML 标签，`<script>` 和 `<style>` 连同内容一起删除
///
/// 标签替换为空格，避免相邻块级元素的文字粘连成一个词。
pub fn strip_tags(html: &str) -> String {
    let without_blocks = script_or_style().replace_all(html, " ");
    let text = any_tag().replace_all(&without_blocks, " ");
    text.trim().to_string()
}
