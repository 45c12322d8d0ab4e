use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::models::RowId;

pub const PORTFOLIO_FILE: &str = "mock_data.json";
pub const BLOG_FILE: &str = "blog_data.json";
pub const CUSTOM_FILE: &str = "custom.json";

/// Reads the static JSON fallback files and reshapes them into the rows the
/// hosted tables would return.
#[derive(Debug, Clone)]
pub struct StaticSource {
    dir: PathBuf,
}

impl StaticSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        StaticSource {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file: &str) -> Option<Value> {
        let path = self.dir.join(file);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                log::error!("Static data {} unavailable: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(v) => Some(v),
            Err(e) => {
                log::error!("Static data {} is not valid JSON: {}", path.display(), e);
                None
            }
        }
    }

    pub fn portfolios(&self) -> Vec<Value> {
        self.read(PORTFOLIO_FILE)
            .map(|v| newest_first(list_under(v, &["portfolios", "projects"])))
            .unwrap_or_default()
    }

    pub fn blogs(&self) -> Vec<Value> {
        self.read(BLOG_FILE)
            .map(|v| newest_first(list_under(v, &["blogs"])))
            .unwrap_or_default()
    }

    pub fn landing_settings(&self) -> Vec<Value> {
        self.read(CUSTOM_FILE)
            .and_then(|v| landing_row(&v))
            .into_iter()
            .collect()
    }

    pub fn about(&self) -> Vec<Value> {
        self.read(CUSTOM_FILE)
            .and_then(|v| v.get("about").cloned())
            .and_then(|about| match about {
                Value::Object(mut map) => {
                    map.entry("id").or_insert(serde_json::json!(RowId::SINGLETON));
                    Some(Value::Object(map))
                }
                _ => None,
            })
            .into_iter()
            .collect()
    }
}

/// A top-level array, or the first array found under one of `keys`.
fn list_under(value: Value, keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => keys
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Same order the hosted list queries use (`created_at` descending).
/// Rows without a timestamp keep their file order after dated ones.
fn newest_first(mut rows: Vec<Value>) -> Vec<Value> {
    rows.sort_by(|a, b| {
        let ka = a.get("created_at").and_then(Value::as_str);
        let kb = b.get("created_at").and_then(Value::as_str);
        match (ka, kb) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
    rows
}

const SECTIONS: &[&str] = &["hero", "branding", "portfolio", "blog"];

/// Flatten `custom.json` into a `landing_settings` row. The file is either
/// sectioned (`hero`, `branding`, `portfolio`, `blog`) or already flat.
fn landing_row(custom: &Value) -> Option<Value> {
    let obj = custom.as_object()?;
    let mut row = Map::new();

    if SECTIONS.iter().any(|s| obj.contains_key(*s)) {
        let section = |name: &str| obj.get(name).and_then(Value::as_object);

        if let Some(hero) = section("hero") {
            for key in ["greeting", "title", "description", "logo_url", "socials"] {
                copy(hero, key, &mut row, key);
            }
        }
        if let Some(branding) = section("branding") {
            for key in ["site_title", "favicon_url", "default_theme"] {
                copy(branding, key, &mut row, key);
            }
        }
        if let Some(portfolio) = section("portfolio") {
            for key in ["banner_url", "banner_title", "banner_description"] {
                copy(portfolio, key, &mut row, key);
            }
            copy_if_absent(portfolio, "title", &mut row, "title");
        }
        if let Some(blog) = section("blog") {
            copy(blog, "page_banner_url", &mut row, "blog_banner_url");
            copy(blog, "blog_banner_url", &mut row, "blog_banner_url");
            copy(blog, "blog_banner_title", &mut row, "blog_banner_title");
            copy(blog, "blog_banner_description", &mut row, "blog_banner_description");
            copy_if_absent(blog, "title", &mut row, "title");
        }
    } else {
        for (k, v) in obj {
            if k != "about" {
                row.insert(k.clone(), v.clone());
            }
        }
    }

    row.entry("id").or_insert(serde_json::json!(RowId::SINGLETON));
    Some(Value::Object(row))
}

fn copy(from: &Map<String, Value>, key: &str, to: &mut Map<String, Value>, as_key: &str) {
    if let Some(v) = from.get(key).filter(|v| !v.is_null()) {
        to.insert(as_key.to_string(), v.clone());
    }
}

fn copy_if_absent(from: &Map<String, Value>, key: &str, to: &mut Map<String, Value>, as_key: &str) {
    if !to.contains_key(as_key) {
        copy(from, key, to, as_key);
    }
}
