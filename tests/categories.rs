use catpages::build::{build_categories, Outcome};
use catpages::config::Config;
use catpages::frontmatter::Frontmatter;
use catpages::template::filter_predicate;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TEMPLATE: &str = r#"---
layout: category
pagination:
  data: collections.posts
  size: 20
  alias: posts
permalink: "/categories/{{ page.fileSlug }}/"
---
{% for post in posts %}
- [{{ post.data.title }}]({{ post.url }})
{% endfor %}
"#;

struct Site {
    dir: TempDir,
    config: Config,
}

impl Site {
    fn new() -> Site {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for folder in ["src/posts", "src/_data", "src/categories"] {
            fs::create_dir_all(root.join(folder)).unwrap();
        }
        fs::write(root.join("11ty-cat-pages.liquid"), TEMPLATE).unwrap();
        let config = Config {
            categories_folder: root.join("src/categories"),
            data_file_name: root.join("src/_data/category-meta.json"),
            data_folder: root.join("src/_data"),
            posts_folder: root.join("src/posts"),
            template_file_name: root.join("11ty-cat-pages.liquid"),
        };
        Site { dir, config }
    }

    fn post(&self, name: &str, frontmatter: &str) {
        let path = self.config.posts_folder.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("---\n{}---\nPost body.\n", frontmatter)).unwrap();
    }

    fn build(&self) -> Outcome {
        build_categories(&self.config, false).unwrap()
    }

    fn store(&self) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(&self.config.data_file_name).unwrap()).unwrap()
    }

    fn pages(&self) -> Vec<String> {
        listing(&self.config.categories_folder)
    }

    fn page(&self, file_name: &str) -> String {
        fs::read_to_string(self.config.categories_folder.join(file_name)).unwrap()
    }
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn page_filter(page: &str) -> String {
    let mapping = Frontmatter::split(page).unwrap().unwrap().mapping().unwrap();
    let pagination = mapping
        .get(&Value::String("pagination".to_owned()))
        .and_then(Value::as_mapping)
        .unwrap();
    pagination
        .get(&Value::String("before".to_owned()))
        .and_then(Value::as_str)
        .unwrap()
        .to_owned()
}

fn scenario() -> Site {
    let site = Site::new();
    site.post("a.md", "title: A\ncategories: \"Tech, News\"\n");
    site.post("2023/b.md", "title: B\ncategories: \"Tech\"\n");
    site.post("c.md", "title: C\n");
    site
}

#[test]
fn test_scenario_store_and_pages() {
    let site = scenario();

    assert_eq!(
        site.build(),
        Outcome::Generated {
            categories: 3,
            pages: 3,
            skipped: Vec::new(),
        }
    );

    assert_eq!(
        site.store(),
        serde_json::json!([
            { "category": "News", "count": 1, "description": "" },
            { "category": "Tech", "count": 2, "description": "" },
            { "category": "Uncategorized", "count": 1, "description": "" },
        ])
    );
    assert_eq!(site.pages(), vec!["news.md", "tech.md", "uncategorized.md"]);

    for (file, category) in [
        ("news.md", "News"),
        ("tech.md", "Tech"),
        ("uncategorized.md", "Uncategorized"),
    ] {
        let page = site.page(file);
        assert_eq!(page_filter(&page), filter_predicate(category));
        assert!(page.ends_with(
            "---\n{% for post in posts %}\n- [{{ post.data.title }}]({{ post.url }})\n{% endfor %}\n"
        ));
    }
}

#[test]
fn test_filters_do_not_leak_between_categories() {
    let site = scenario();
    site.build();

    let tech = page_filter(&site.page("tech.md"));
    let news = page_filter(&site.page("news.md"));
    assert!(!tech.contains("News") && !tech.contains("Uncategorized"));
    assert!(!news.contains("Tech") && !news.contains("Uncategorized"));
}

#[test]
fn test_rerun_is_idempotent() {
    let site = scenario();
    site.build();
    let store = fs::read(&site.config.data_file_name).unwrap();
    let pages: Vec<(String, String)> = site
        .pages()
        .into_iter()
        .map(|name| {
            let contents = site.page(&name);
            (name, contents)
        })
        .collect();

    site.build();

    assert_eq!(fs::read(&site.config.data_file_name).unwrap(), store);
    let rerun: Vec<(String, String)> = site
        .pages()
        .into_iter()
        .map(|name| {
            let contents = site.page(&name);
            (name, contents)
        })
        .collect();
    assert_eq!(rerun, pages);
}

#[test]
fn test_descriptions_survive_reruns() {
    let site = scenario();
    fs::write(
        &site.config.data_file_name,
        r#"[
  { "category": "Tech", "count": 40, "description": "Gadgets and code" },
  { "category": "Travel", "count": 3, "description": "Trips" }
]"#,
    )
    .unwrap();
    fs::write(site.config.categories_folder.join("travel.md"), "stale").unwrap();

    site.build();

    let store = site.store();
    let records = store.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["category"], "Tech");
    assert_eq!(records[1]["count"], 2);
    assert_eq!(records[1]["description"], "Gadgets and code");
    assert!(records.iter().all(|r| r["category"] != "Travel"));
    assert_eq!(site.pages(), vec!["news.md", "tech.md", "uncategorized.md"]);
}

#[test]
fn test_removed_category_is_dropped() {
    let site = scenario();
    site.build();

    site.post("a.md", "title: A\ncategories: Tech\n");
    site.build();

    assert_eq!(
        site.store(),
        serde_json::json!([
            { "category": "Tech", "count": 2, "description": "" },
            { "category": "Uncategorized", "count": 1, "description": "" },
        ])
    );
    assert_eq!(site.pages(), vec!["tech.md", "uncategorized.md"]);
}

#[test]
fn test_no_posts_leaves_everything_untouched() {
    let site = Site::new();
    fs::write(&site.config.data_file_name, "[]").unwrap();
    fs::write(site.config.categories_folder.join("old.md"), "old").unwrap();

    assert_eq!(site.build(), Outcome::NoPosts);

    assert_eq!(fs::read_to_string(&site.config.data_file_name).unwrap(), "[]");
    assert_eq!(site.pages(), vec!["old.md"]);
}

#[test]
fn test_malformed_post_fails_run_without_changes() {
    let site = scenario();
    site.build();
    let store = fs::read(&site.config.data_file_name).unwrap();

    let broken: PathBuf = site.config.posts_folder.join("broken.md");
    fs::write(&broken, "---\ncategories: [Tech\n---\n").unwrap();

    let err = anyhow::Error::from(build_categories(&site.config, false).unwrap_err());
    assert!(err.to_string().contains("broken.md"));
    // the parse message is part of the top-level error and isn't repeated
    // further down the chain
    assert_eq!(err.chain().count(), 1);
    assert_eq!(fs::read(&site.config.data_file_name).unwrap(), store);
    assert_eq!(site.pages(), vec!["news.md", "tech.md", "uncategorized.md"]);
}

#[test]
fn test_malformed_post_skipped_when_asked() {
    let site = scenario();
    let broken = site.config.posts_folder.join("broken.md");
    fs::write(&broken, "---\ncategories: [Tech\n---\n").unwrap();

    match build_categories(&site.config, true).unwrap() {
        Outcome::Generated { skipped, .. } => assert_eq!(skipped, vec![broken]),
        other => panic!("expected pages, got {:?}", other),
    }
    assert_eq!(site.pages(), vec!["news.md", "tech.md", "uncategorized.md"]);
}

#[test]
fn test_path_like_categories_stay_inside_categories_folder() {
    let site = Site::new();
    site.post("a.md", "categories: \"AC/DC\"\n");
    site.post("b.md", "categories: \"../escaped\"\n");

    site.build();

    assert_eq!(
        site.store(),
        serde_json::json!([
            { "category": "../escaped", "count": 1, "description": "" },
            { "category": "AC/DC", "count": 1, "description": "" },
        ])
    );
    assert_eq!(site.pages(), vec!["..escaped.md", "acdc.md"]);
    assert_eq!(
        page_filter(&site.page("acdc.md")),
        filter_predicate("AC/DC")
    );
    assert_eq!(
        listing(site.config.posts_folder.parent().unwrap()),
        vec!["_data", "categories", "posts"]
    );
}

#[cfg(unix)]
#[test]
fn test_symlinked_post_counts_once() {
    let site = scenario();
    std::os::unix::fs::symlink(
        site.config.posts_folder.join("a.md"),
        site.config.posts_folder.join("alias.md"),
    )
    .unwrap();

    site.build();

    assert_eq!(
        site.store(),
        serde_json::json!([
            { "category": "News", "count": 1, "description": "" },
            { "category": "Tech", "count": 2, "description": "" },
            { "category": "Uncategorized", "count": 1, "description": "" },
        ])
    );
}

#[test]
fn test_list_categories_are_not_split() {
    let site = Site::new();
    site.post("a.md", "categories:\n  - Food, Drink\n  - Web Dev\n");
    site.build();

    assert_eq!(site.pages(), vec!["food,drink.md", "webdev.md"]);
    assert_eq!(
        page_filter(&site.page("webdev.md")),
        filter_predicate("Web Dev")
    );
    // keep the temp dir alive until the end of the test
    drop(site.dir);
}
