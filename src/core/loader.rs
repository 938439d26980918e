use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::engine::Engine;
use crate::core::error::ContentError;
use crate::core::repository::MemoryRepository;
use crate::core::views::ViewCounter;
use crate::models::{ContentItem, ItemId, PostStatus, RenderContext, SiteConfig};
use crate::utils::{is_markdown_file, markdown, slugify};

/// 阅读数持久化文件名
pub const VIEWS_FILE: &str = "views.json";
/// 点赞数文件名，只读
pub const LIKES_FILE: &str = "likes.json";
/// 写阅读数时持有的锁文件
pub const VIEWS_LOCK_FILE: &str = "views.json.lock";

// 等待锁文件：最多 500 次，每次 10ms
const LOCK_ATTEMPTS: u32 = 500;
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// 前置数据中的分类/标签，既可以是单个字符串也可以是列表
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TermList {
    One(String),
    Many(Vec<String>),
}

impl Default for TermList {
    fn default() -> Self {
        TermList::Many(Vec::new())
    }
}

impl TermList {
    fn into_vec(self) -> Vec<String> {
        match self {
            TermList::One(name) => vec![name],
            TermList::Many(names) => names,
        }
    }
}

/// 文章的前置数据
#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    id: Option<u64>,
    title: Option<String>,
    date: Option<String>,
    author: Option<String>,
    status: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    categories: TermList,
    #[serde(default)]
    tags: TermList,
    thumbnail: Option<String>,
}

/// 从站点目录加载的内容：配置、文章和阅读数
pub struct Site {
    /// 站点目录
    pub base_dir: PathBuf,
    /// 站点配置
    pub config: SiteConfig,
    /// 内容仓库
    pub repository: Arc<MemoryRepository>,
}

impl Site {
    /// 加载站点：`_config.yml`、`source/_posts` 下的文章、`views.json` 和 `likes.json`
    pub fn load(base_dir: &Path) -> Result<Self> {
        info!("加载站点: {}", base_dir.display());

        let config = SiteConfig::load(base_dir)?;
        let repository = Arc::new(MemoryRepository::new());

        let posts_dir = base_dir.join("source").join("_posts");
        let default_author = config.get_str("site.author", "");
        let loaded = load_posts(&posts_dir, &default_author, &repository)?;
        info!("加载了 {} 篇文章", loaded);

        for (id, count) in read_counts(&base_dir.join(VIEWS_FILE))? {
            repository.set_view_count(id, count)?;
        }
        for (id, count) in read_counts(&base_dir.join(LIKES_FILE))? {
            repository.set_like_count(id, count)?;
        }

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            config,
            repository,
        })
    }

    /// 阅读数文件路径
    pub fn views_path(&self) -> PathBuf {
        self.base_dir.join(VIEWS_FILE)
    }

    /// 锁文件路径
    pub fn views_lock_path(&self) -> PathBuf {
        self.base_dir.join(VIEWS_LOCK_FILE)
    }

    /// 记录一次详情页阅读并立即写回 `views.json`
    ///
    /// 持有锁文件期间先重新读取磁盘上的计数再加一，多个进程同时记录不会丢失计数。
    /// 内存中尚未保存的计数会被磁盘上的值覆盖。
    /// 未知或未发布的文章不计数，也不写文件。
    pub fn record_view(&self, id: ItemId) -> Result<Option<u64>> {
        let _lock = ViewsLock::acquire(&self.views_lock_path())?;

        for (stored, count) in read_counts(&self.views_path())? {
            self.repository.set_view_count(stored, count)?;
        }

        let count = ViewCounter::new(self.repository.clone()).track(id, RenderContext::Single)?;
        if count.is_some() {
            write_counts(&self.views_path(), &self.repository.view_snapshot()?)?;
        }
        Ok(count)
    }

    /// 将当前内存中的阅读数整体写回 `views.json`
    pub fn save_views(&self) -> Result<()> {
        let _lock = ViewsLock::acquire(&self.views_lock_path())?;
        let snapshot = self.repository.view_snapshot()?;
        write_counts(&self.views_path(), &snapshot)
    }

    /// 基于本站点内容创建引擎
    pub fn engine(&self) -> Engine {
        Engine::new(self.config.clone(), self.repository.clone())
    }
}

/// 独占 `views.json` 的锁文件，离开作用域时删除
struct ViewsLock {
    path: PathBuf,
    _file: File,
}

impl ViewsLock {
    fn acquire(path: &Path) -> Result<Self> {
        for _ in 0..LOCK_ATTEMPTS {
            // create_new 保证同一时刻只有一个持有者
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(file) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                        _file: file,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => thread::sleep(LOCK_RETRY_INTERVAL),
                Err(e) => {
                    return Err(ContentError::storage(format!(
                        "创建锁文件 {} 失败: {}",
                        path.display(),
                        e
                    ))
                    .into())
                }
            }
        }

        Err(ContentError::storage(format!(
            "等待锁文件超时: {}（没有其他进程运行时可以手动删除）",
            path.display()
        ))
        .into())
    }
}

impl Drop for ViewsLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// 读取计数文件，不存在时视为全部为 0
pub fn read_counts(path: &Path) -> Result<BTreeMap<ItemId, u64>> {
    if !path.exists() {
        debug!("计数文件不存在: {}", path.display());
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ContentError::storage(format!("读取 {} 失败: {}", path.display(), e)))?;
    let counts = serde_json::from_str(&content)
        .map_err(|e| ContentError::storage(format!("解析 {} 失败: {}", path.display(), e)))?;
    Ok(counts)
}

/// 写入计数文件
///
/// 先写到同目录的临时文件再重命名覆盖，写入中途失败不会留下半个文件。
pub fn write_counts(path: &Path, counts: &BTreeMap<ItemId, u64>) -> Result<()> {
    let json = serde_json::to_string_pretty(counts)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(path, e))?;
    tmp.write_all(json.as_bytes()).map_err(|e| write_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| write_error(path, e))?;
    tmp.persist(path).map_err(|e| write_error(path, e))?;

    debug!("已保存 {} 条计数到 {}", counts.len(), path.display());
    Ok(())
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> ContentError {
    ContentError::storage(format!("写入 {} 失败: {}", path.display(), e))
}

/// 加载文章目录，返回成功加载的数量
fn load_posts(posts_dir: &Path, default_author: &str, repository: &MemoryRepository) -> Result<usize> {
    if !posts_dir.exists() {
        warn!("文章目录不存在: {}", posts_dir.display());
        return Ok(0);
    }

    let matter = Matter::<YAML>::new();
    let mut seen: HashSet<ItemId> = HashSet::new();

    // 按路径排序，保证重复标识时保留的是同一篇
    let mut paths: Vec<PathBuf> = WalkDir::new(posts_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_markdown_file(path))
        .collect();
    paths.sort();

    for path in paths {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("读取文章失败: {}", path.display()))?;
        let parsed = matter.parse(&raw);

        let front_matter: FrontMatter = match parsed.data {
            Some(data) => match data.deserialize() {
                Ok(front_matter) => front_matter,
                Err(e) => {
                    warn!("跳过前置数据无效的文章 {}: {}", path.display(), e);
                    continue;
                }
            },
            None => FrontMatter::default(),
        };

        let Some(id) = front_matter.id.map(ItemId) else {
            warn!("跳过缺少 id 的文章: {}", path.display());
            continue;
        };
        if !seen.insert(id) {
            warn!("跳过重复 id {} 的文章: {}", id, path.display());
            continue;
        }

        let item = build_item(id, front_matter, &parsed.content, &path, default_author, repository)?;
        debug!("加载文章 {}: {}", item.id, item.title);
        repository.insert(item)?;
    }

    Ok(seen.len())
}

fn build_item(
    id: ItemId,
    front_matter: FrontMatter,
    body: &str,
    path: &Path,
    default_author: &str,
    repository: &MemoryRepository,
) -> Result<ContentItem> {
    let title = front_matter.title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    });

    let date = match front_matter.date.as_deref().and_then(parse_date) {
        Some(date) => date,
        None => {
            // 没有或无法解析日期时使用文件修改时间
            let modified = fs::metadata(path)?.modified()?;
            DateTime::<Utc>::from(modified)
        }
    };

    let status = match front_matter.status.as_deref() {
        Some(status) => PostStatus::parse(status),
        None if front_matter.draft => PostStatus::Unpublished,
        None => PostStatus::Published,
    };

    let mut categories = Vec::new();
    for name in front_matter.categories.into_vec() {
        let slug = slugify(&name);
        repository.name_category(&slug, &name)?;
        categories.push(slug);
    }

    let mut tags = Vec::new();
    for name in front_matter.tags.into_vec() {
        let slug = slugify(&name);
        repository.name_tag(&slug, &name)?;
        tags.push(slug);
    }

    Ok(ContentItem {
        id,
        title,
        body: markdown::to_html(body),
        author: front_matter
            .author
            .unwrap_or_else(|| default_author.to_string()),
        date,
        status,
        categories,
        tags,
        has_thumbnail: front_matter
            .thumbnail
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false),
    })
}

/// 解析前置数据中的日期
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }

    warn!("无法解析日期: {}", value);
    None
}
