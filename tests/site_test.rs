// 站点加载和内容引擎的集成测试

use std::fs;
use std::path::Path;
use std::thread;

use rust_press::{ItemId, RenderContext, Site};
use serde_yaml::Value;
use tempfile::TempDir;

fn write_post(dir: &Path, name: &str, front_matter: &str, body: &str) {
    fs::write(dir.join(name), format!("---\n{}---\n\n{}\n", front_matter, body)).unwrap();
}

/// 创建一个包含几篇文章的站点目录
fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let posts = tmp.path().join("source").join("_posts");
    fs::create_dir_all(&posts).unwrap();

    fs::write(
        tmp.path().join("_config.yml"),
        "site:\n  author: admin\ncontent:\n  related_posts_count: 2\n  excerpt_length: 3\n",
    )
    .unwrap();

    write_post(
        &posts,
        "hello-world.md",
        "id: 1\ntitle: Hello World\ndate: 2024-01-01 10:00:00\ncategories:\n  - WP Programming\ntags: intro\n",
        "Welcome to the **blog**, enjoy your stay here.",
    );
    write_post(
        &posts,
        "headless.md",
        "id: 2\ntitle: Headless WP\ndate: 2024-02-01\ncategories: WP Programming\nauthor: jane\n",
        "Decoupled frontends.",
    );
    write_post(
        &posts,
        "hosting.md",
        "id: 3\ntitle: Hosting\ndate: 2024-03-01\ncategories: Hosting\ntags:\n  - intro\n",
        "Pick a host.",
    );
    write_post(
        &posts,
        "draft.md",
        "id: 4\ntitle: Draft\ndate: 2024-04-01\ncategories: WP Programming\ndraft: true\n",
        "Not yet.",
    );
    write_post(&posts, "no-id.md", "title: Missing id\n", "Skipped.");
    write_post(&posts, "zz-duplicate.md", "id: 1\ntitle: Duplicate\n", "Skipped too.");

    fs::write(tmp.path().join("views.json"), r#"{"3": 1500}"#).unwrap();
    fs::write(tmp.path().join("likes.json"), r#"{"1": 7}"#).unwrap();
    tmp
}

#[test]
fn loads_posts_config_and_views() {
    let tmp = setup_site();
    let site = Site::load(tmp.path()).unwrap();
    let engine = site.engine();

    // 缺少 id 和重复 id 的文章被跳过
    assert_eq!(site.repository.len().unwrap(), 4);

    let hello = engine.item(ItemId(1)).unwrap().unwrap();
    assert_eq!(hello.title, "Hello World");
    assert_eq!(hello.author, "admin");
    assert_eq!(hello.categories, vec!["wp-programming".to_string()]);
    assert_eq!(hello.tags, vec!["intro".to_string()]);

    assert_eq!(engine.format_view_count(ItemId(3)).unwrap(), "1.5K");
    assert_eq!(engine.format_view_count(ItemId(2)).unwrap(), "0");
    assert_eq!(engine.excerpt(ItemId(1)).unwrap(), "Welcome to the...");
    assert_eq!(engine.estimated_reading_time(ItemId(1)).unwrap(), 1);
    assert_eq!(engine.like_count(ItemId(1)).unwrap(), 7);
    assert_eq!(engine.like_count(ItemId(2)).unwrap(), 0);
    assert_eq!(
        engine.config_get("content.blog_page_slug", Value::Null),
        Value::String("blog".into())
    );
}

#[test]
fn related_uses_category_then_tag_tiers() {
    let tmp = setup_site();
    let engine = Site::load(tmp.path()).unwrap().engine();

    // 草稿 4 虽然同分类但不会出现
    assert_eq!(engine.related_default(ItemId(1)).unwrap(), vec![ItemId(2), ItemId(3)]);
    assert_eq!(engine.related(ItemId(1), 1).unwrap(), vec![ItemId(2)]);
    assert!(engine.related(ItemId(99), 3).unwrap().is_empty());
}

#[test]
fn popular_and_recent_lists() {
    let tmp = setup_site();
    let engine = Site::load(tmp.path()).unwrap().engine();

    assert_eq!(
        engine.popular(10).unwrap(),
        vec![ItemId(3), ItemId(2), ItemId(1)]
    );
    assert_eq!(
        engine.recent(2).unwrap(),
        vec![ItemId(3), ItemId(2)]
    );
}

#[test]
fn detail_views_are_persisted() {
    let tmp = setup_site();
    {
        let site = Site::load(tmp.path()).unwrap();
        let engine = site.engine();
        assert_eq!(engine.track_view(ItemId(2), RenderContext::Listing).unwrap(), None);
        assert_eq!(engine.track_view(ItemId(2), RenderContext::Single).unwrap(), Some(1));
        assert_eq!(engine.record_view(ItemId(2)).unwrap(), Some(2));
        site.save_views().unwrap();
    }

    let reloaded = Site::load(tmp.path()).unwrap().engine();
    assert_eq!(reloaded.format_view_count(ItemId(2)).unwrap(), "2");
    assert_eq!(reloaded.format_view_count(ItemId(3)).unwrap(), "1.5K");
}

#[test]
fn recording_a_view_rereads_the_file_first() {
    let tmp = setup_site();
    // 两个站点实例都在任何阅读记录之前加载
    let first = Site::load(tmp.path()).unwrap();
    let second = Site::load(tmp.path()).unwrap();

    assert_eq!(first.record_view(ItemId(2)).unwrap(), Some(1));
    assert_eq!(second.record_view(ItemId(2)).unwrap(), Some(2));
    assert_eq!(first.record_view(ItemId(3)).unwrap(), Some(1501));

    let reloaded = Site::load(tmp.path()).unwrap().engine();
    assert_eq!(reloaded.format_view_count(ItemId(2)).unwrap(), "2");
    assert!(!tmp.path().join("views.json.lock").exists());
}

#[test]
fn concurrent_recorders_do_not_lose_views() {
    let tmp = setup_site();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dir = tmp.path().to_path_buf();
            thread::spawn(move || {
                let site = Site::load(&dir).unwrap();
                for _ in 0..5 {
                    site.record_view(ItemId(1)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let reloaded = Site::load(tmp.path()).unwrap().engine();
    assert_eq!(reloaded.format_view_count(ItemId(1)).unwrap(), "40");
}

#[test]
fn draft_views_are_not_recorded_or_saved() {
    let tmp = setup_site();
    let site = Site::load(tmp.path()).unwrap();

    assert_eq!(site.record_view(ItemId(4)).unwrap(), None);
    assert_eq!(site.record_view(ItemId(99)).unwrap(), None);

    let saved = fs::read_to_string(tmp.path().join("views.json")).unwrap();
    assert_eq!(saved, r#"{"3": 1500}"#);
}

#[test]
fn term_summaries_count_published_posts() {
    let tmp = setup_site();
    let engine = Site::load(tmp.path()).unwrap().engine();

    let categories = engine.categories().unwrap();
    let names: Vec<(&str, usize)> = categories
        .iter()
        .map(|term| (term.name.as_str(), term.count))
        .collect();
    assert_eq!(names, vec![("Hosting", 1), ("WP Programming", 2)]);

    let tags = engine.tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].count, 2);
}

#[test]
fn missing_site_directory_loads_empty() {
    let tmp = TempDir::new().unwrap();
    let site = Site::load(tmp.path()).unwrap();
    assert!(site.repository.is_empty().unwrap());
    assert!(site.engine().popular(3).unwrap().is_empty());
}
