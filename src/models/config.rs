use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

// 内置的默认站点配置
const DEFAULT_CONFIG: &str = r#"
site:
  author: 'Your Name Here'
  description: 'A modern blog theme with a Rust content core.'
  theme_repository: 'https://github.com/yourusername/your-theme-repo'

social:
  github: 'https://github.com/yourusername'
  portfolio: 'https://yourwebsite.com'
  linkedin: 'https://linkedin.com/in/your-profile'

content:
  recent_posts_count: 6
  blog_page_slug: blog
  excerpt_length: 25
"#;

/// 站点配置：用点号路径读取的嵌套键值树
///
/// 加载后只读；`set` 是唯一的覆盖入口，供测试和运行时动态值使用。
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    root: Value,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let root = serde_yaml::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|_| Value::Mapping(Mapping::new()));
        Self { root }
    }
}

impl SiteConfig {
    /// 用给定的配置树创建，不合并默认值
    pub fn from_value(root: Value) -> Self {
        let root = match root {
            Value::Mapping(_) => root,
            _ => Value::Mapping(Mapping::new()),
        };
        Self { root }
    }

    /// 空配置
    pub fn empty() -> Self {
        Self::from_value(Value::Mapping(Mapping::new()))
    }

    /// 从 YAML 文件加载配置，并覆盖到默认配置之上
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let mut config = Self::default();
        config.merge_yaml(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 加载配置，文件不存在时使用默认配置
    pub fn load(base_dir: &Path) -> Result<Self> {
        let config_path = base_dir.join("_config.yml");
        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            debug!("未找到 {}，使用默认配置", config_path.display());
            Ok(Self::default())
        }
    }

    /// 将 YAML 文本深度合并到当前配置
    pub fn merge_yaml(&mut self, yaml: &str) -> Result<()> {
        let value: Value = serde_yaml::from_str(yaml)?;
        match value {
            Value::Mapping(_) => {
                merge_values(&mut self.root, value);
                Ok(())
            }
            // 空文件
            Value::Null => Ok(()),
            _ => Err(anyhow!("配置根节点必须是映射")),
        }
    }

    /// 按点号路径读取配置值
    ///
    /// 列表节点用数字段作下标，例如 `homepage.resources.0.title`。
    /// 任一段不存在、值为 null 或中间节点是标量时返回 `default`。
    /// 空路径等同于查找键 `""`。
    pub fn get(&self, path: &str, default: Value) -> Value {
        let mut current = &self.root;
        for key in path.split('.') {
            let next = match current {
                Value::Mapping(map) => map.get(key),
                Value::Sequence(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                None | Some(Value::Null) => return default,
                Some(value) => current = value,
            }
        }
        current.clone()
    }

    /// 读取并反序列化为指定类型，不存在或类型不符时返回 None
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.get(path, Value::Null) {
            Value::Null => None,
            value => serde_yaml::from_value(value).ok(),
        }
    }

    /// 读取正整数设置，缺失或非法时使用默认值
    pub fn get_usize(&self, path: &str, default: usize) -> usize {
        self.get_as::<usize>(path).unwrap_or(default)
    }

    /// 读取字符串设置
    pub fn get_str(&self, path: &str, default: &str) -> String {
        self.get_as::<String>(path).unwrap_or_else(|| default.to_string())
    }

    /// 按点号路径写入配置值，缺失的中间节点会被创建为映射
    ///
    /// 已存在的中间节点不是映射时返回 false，且不做任何修改。
    pub fn set(&mut self, path: &str, value: Value) -> bool {
        let mut current = &mut self.root;
        for key in path.split('.') {
            if current.is_null() {
                *current = Value::Mapping(Mapping::new());
            }
            let Value::Mapping(map) = current else {
                return false;
            };
            current = map
                .entry(Value::String(key.to_string()))
                .or_insert(Value::Null);
        }
        *current = value;
        true
    }

    /// 已启用的社交链接（`enabled: true` 的条目）
    pub fn social_links(&self) -> Vec<(String, Value)> {
        self.enabled_entries("social")
    }

    /// 已启用的页脚区块
    pub fn footer_sections(&self) -> Vec<(String, Value)> {
        self.enabled_entries("footer.sections")
    }

    /// 功能开关，默认关闭
    pub fn is_feature_enabled(&self, feature: &str) -> bool {
        self.get(&format!("features.{}", feature), Value::Bool(false))
            .as_bool()
            .unwrap_or(false)
    }

    /// 首页资源区块数据
    pub fn homepage_resources(&self) -> Vec<Value> {
        match self.get("homepage.resources", Value::Null) {
            Value::Sequence(items) => items,
            _ => Vec::new(),
        }
    }

    /// 完整配置树（调试用）
    pub fn all(&self) -> &Value {
        &self.root
    }

    fn enabled_entries(&self, path: &str) -> Vec<(String, Value)> {
        let Value::Mapping(entries) = self.get(path, Value::Null) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter(|(_, entry)| {
                entry
                    .get("enabled")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            })
            .filter_map(|(key, entry)| key.as_str().map(|k| (k.to_string(), entry)))
            .collect()
    }
}

// 将 overlay 深度合并进 base，映射逐键合并，其余类型直接覆盖
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SiteConfig {
        let mut config = SiteConfig::empty();
        config
            .merge_yaml(
                r#"
a:
  b: scalar
site:
  description: hello
  empty: ~
"": root-empty-key
social:
  github:
    enabled: true
    url: https://github.com/me
  twitter:
    enabled: false
    url: https://twitter.com/me
features:
  dark_mode: true
homepage:
  resources:
    - title: Docs
      url: https://example.com/docs
    - title: Blog
"#,
            )
            .unwrap();
        config
    }

    #[test]
    fn get_walks_nested_mappings() {
        let config = sample();
        assert_eq!(
            config.get("site.description", Value::Null),
            Value::String("hello".into())
        );
    }

    #[test]
    fn get_returns_default_when_intermediate_is_scalar() {
        let config = sample();
        let default = Value::String("X".into());
        assert_eq!(config.get("a.b.c", default.clone()), default);
    }

    #[test]
    fn get_returns_default_when_root_segment_missing() {
        let config = SiteConfig::empty();
        let default = Value::String("X".into());
        assert_eq!(config.get("a.b.c", default.clone()), default);
    }

    #[test]
    fn null_value_counts_as_missing() {
        let config = sample();
        assert_eq!(
            config.get("site.empty", Value::from(7)),
            Value::from(7)
        );
    }

    #[test]
    fn empty_path_is_a_single_empty_key() {
        let config = sample();
        assert_eq!(
            config.get("", Value::Null),
            Value::String("root-empty-key".into())
        );
        assert_eq!(SiteConfig::empty().get("", Value::from(1)), Value::from(1));
    }

    #[test]
    fn set_creates_intermediate_mappings() {
        let mut config = SiteConfig::empty();
        assert!(config.set("x.y.z", Value::from(3)));
        assert_eq!(config.get("x.y.z", Value::Null), Value::from(3));
        assert!(config.get("x.y", Value::Null).is_mapping());
    }

    #[test]
    fn set_refuses_to_descend_through_scalars() {
        let mut config = sample();
        assert!(!config.set("a.b.c", Value::from(1)));
        assert_eq!(config.get("a.b", Value::Null), Value::String("scalar".into()));
    }

    #[test]
    fn defaults_are_overridden_by_yaml() {
        let mut config = SiteConfig::default();
        config.merge_yaml("content:\n  excerpt_length: 40\n").unwrap();
        assert_eq!(config.get_usize("content.excerpt_length", 0), 40);
        // 同级的其他默认值仍然保留
        assert_eq!(config.get_usize("content.recent_posts_count", 0), 6);
        assert_eq!(config.get_str("content.blog_page_slug", ""), "blog");
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let mut config = SiteConfig::empty();
        assert!(config.merge_yaml("- a\n- b\n").is_err());
    }

    #[test]
    fn only_enabled_social_links_are_listed() {
        let links = sample().social_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, "github");
    }

    #[test]
    fn feature_flags_default_to_disabled() {
        let config = sample();
        assert!(config.is_feature_enabled("dark_mode"));
        assert!(!config.is_feature_enabled("newsletter"));
        assert!(config.footer_sections().is_empty());
        assert!(SiteConfig::empty().homepage_resources().is_empty());
    }

    #[test]
    fn numeric_segments_index_into_lists() {
        let config = sample();
        assert_eq!(config.homepage_resources().len(), 2);
        assert_eq!(
            config.get("homepage.resources.0.title", Value::Null),
            Value::String("Docs".into())
        );
        assert_eq!(config.get_str("homepage.resources.1.title", ""), "Blog");

        let default = Value::from("X");
        assert_eq!(config.get("homepage.resources.2.title", default.clone()), default);
        assert_eq!(config.get("homepage.resources.first", default.clone()), default);
        assert_eq!(config.get("homepage.resources.1.url", default.clone()), default);
    }
}
