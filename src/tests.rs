#![cfg(test)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};

use crate::branding::{Branding, BrandingState, Theme};
use crate::config::{DataMode, SiteConfig};
use crate::data::{DataService, Resource};
use crate::models::about::AboutMe;
use crate::models::blog::{BlogForm, BlogPost};
use crate::models::portfolio::{PortfolioForm, PortfolioItem, SaveOutcome};
use crate::models::settings::{BannerPage, BrandImage, LandingForm, LandingSettings, PageBanner};
use crate::models::RowId;
use crate::security::{AuthError, AuthProvider, AuthUser, Session};
use crate::store::json::StaticSource;
use crate::store::supabase::SupabaseClient;
use crate::store::{Backend, ObjectStore, Query, RemoteStore, StoreError, Table};

const STATIC_DIR: &str = "website/database";
const BUCKET_URL: &str = "https://proj.example.co/storage/v1/object/public/assets/";

// ═══════════════════════════════════════════════════════════
// Recording fake for the hosted services
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
struct FakeState {
    tables: HashMap<Table, Vec<Value>>,
    objects: Vec<String>,
    log: Vec<String>,
    next_id: i64,
}

/// In-memory stand-in for the remote store, the bucket and the auth
/// service. Every call is appended to a shared log.
#[derive(Clone, Default)]
struct Fake {
    state: Arc<Mutex<FakeState>>,
    /// Every remote call fails as if the host were unreachable.
    offline: bool,
    /// Only bucket removals fail.
    storage_broken: bool,
}

impl Fake {
    fn new() -> Self {
        Fake::default()
    }

    fn offline() -> Self {
        Fake {
            offline: true,
            ..Fake::default()
        }
    }

    fn with_rows(self, table: Table, rows: Vec<Value>) -> Self {
        self.state.lock().unwrap().tables.insert(table, rows);
        self
    }

    fn with_object(self, path: &str) -> Self {
        self.state.lock().unwrap().objects.push(path.to_string());
        self
    }

    fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    fn rows(&self, table: Table) -> Vec<Value> {
        self.state.lock().unwrap().tables.get(&table).cloned().unwrap_or_default()
    }

    fn objects(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.clone()
    }

    fn record(&self, entry: String) -> Result<(), StoreError> {
        self.state.lock().unwrap().log.push(entry);
        if self.offline {
            Err(StoreError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn id_matches(row: &Value, id: &RowId) -> bool {
    row.get("id") == Some(&json!(id))
}

#[rocket::async_trait]
impl RemoteStore for Fake {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError> {
        let mut entry = format!("select {}", table.name());
        if let Some(id) = &query.id {
            entry.push_str(&format!(" id={}", id));
        }
        if let (Some(offset), Some(limit)) = (query.offset, query.limit) {
            entry.push_str(&format!(" offset={} limit={}", offset, limit));
        }
        self.record(entry)?;

        let mut rows = self.rows(table);
        if let Some(id) = &query.id {
            rows.retain(|r| id_matches(r, id));
        }
        if query.newest_first {
            rows.sort_by(|a, b| {
                let ka = a["created_at"].as_str().unwrap_or("");
                let kb = b["created_at"].as_str().unwrap_or("");
                kb.cmp(ka)
            });
        }
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, table: Table) -> Result<usize, StoreError> {
        self.record(format!("count {}", table.name()))?;
        Ok(self.rows(table).len())
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<(), StoreError> {
        self.record(format!("insert {}", table.name()))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        row["id"] = json!(format!("new-{}", state.next_id));
        row["created_at"] = json!("2030-01-01T00:00:00+00:00");
        state.tables.entry(table).or_default().push(row);
        Ok(())
    }

    async fn update(&self, table: Table, id: &RowId, patch: Value) -> Result<(), StoreError> {
        self.record(format!("update {} {}", table.name(), id))?;
        let mut state = self.state.lock().unwrap();
        let rows = state.tables.entry(table).or_default();
        for row in rows.iter_mut().filter(|r| id_matches(r, id)) {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (k, v) in fields {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &RowId) -> Result<(), StoreError> {
        self.record(format!("delete {} {}", table.name(), id))?;
        let mut state = self.state.lock().unwrap();
        state.tables.entry(table).or_default().retain(|r| !id_matches(r, id));
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<(), StoreError> {
        self.record(format!("upsert {}", table.name()))?;
        let id: RowId = serde_json::from_value(row["id"].clone())
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        let rows = state.tables.entry(table).or_default();
        match rows.iter_mut().find(|r| id_matches(r, &id)) {
            Some(existing) => {
                if let (Some(target), Some(fields)) = (existing.as_object_mut(), row.as_object()) {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
            None => rows.push(row),
        }
        Ok(())
    }

    fn scoped(&self, access_token: &str) -> Arc<dyn RemoteStore> {
        self.state.lock().unwrap().log.push(format!("scoped {}", access_token));
        Arc::new(self.clone())
    }
}

#[rocket::async_trait]
impl ObjectStore for Fake {
    fn bucket(&self) -> &str {
        "assets"
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}", BUCKET_URL, path)
    }

    async fn upload(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), StoreError> {
        self.record(format!("upload {}", path))?;
        self.state.lock().unwrap().objects.push(path.to_string());
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        self.record(format!("remove {}", paths.join(",")))?;
        if self.storage_broken {
            return Err(StoreError::Status {
                status: 500,
                message: "bucket unavailable".to_string(),
            });
        }
        self.state.lock().unwrap().objects.retain(|o| !paths.contains(o));
        Ok(())
    }

    fn scoped(&self, _access_token: &str) -> Arc<dyn ObjectStore> {
        Arc::new(self.clone())
    }
}

const GOOD_TOKEN: &str = "tok-admin";

#[rocket::async_trait]
impl AuthProvider for Fake {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.state.lock().unwrap().log.push(format!("sign_in {}", email));
        if self.offline {
            return Err(AuthError::Unavailable("offline".to_string()));
        }
        if password == "locked" {
            return Err(AuthError::RateLimited);
        }
        if email == "admin@example.com" && password == "secret" {
            Ok(Session {
                access_token: GOOD_TOKEN.to_string(),
                refresh_token: None,
                expires_in: Some(3600),
                user: admin_user(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        if access_token == GOOD_TOKEN {
            Ok(admin_user())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.state.lock().unwrap().log.push("sign_out".to_string());
        Ok(())
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: "u-1".to_string(),
        email: Some("admin@example.com".to_string()),
    }
}

fn data_service(mode: DataMode, fake: &Fake) -> DataService {
    DataService::new(mode, Some(Arc::new(fake.clone())), StaticSource::new(STATIC_DIR))
}

fn backend(mode: DataMode, fake: &Fake) -> Backend {
    Backend::new(
        data_service(mode, fake),
        Some(Arc::new(fake.clone())),
        Some(Arc::new(fake.clone())),
        Some(Arc::new(fake.clone())),
    )
}

fn remote_portfolios() -> Vec<Value> {
    vec![
        json!({"id": "a", "title": "Old", "category": "Web", "tags": ["x"], "created_at": "2022-01-01T00:00:00+00:00"}),
        json!({"id": "b", "title": "New", "category": "Design", "tags": null, "image_url": null, "created_at": "2024-01-01T00:00:00+00:00"}),
    ]
}

fn remote_blogs(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Post {}", i),
                "slug": format!("post-{}", i),
                "content": "<p>x</p>",
                "created_at": format!("2024-01-{:02}T00:00:00+00:00", i),
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Data modes
// ═══════════════════════════════════════════════════════════

#[rocket::async_test]
async fn auto_mode_falls_back_to_static_rows_when_remote_is_down() {
    let fake = Fake::offline();
    let data = data_service(DataMode::Auto, &fake);
    let fallback = StaticSource::new(STATIC_DIR);

    for resource in Resource::ALL {
        let rows = data.get_items(resource).await.unwrap();
        let expected = match resource {
            Resource::Portfolio => fallback.portfolios(),
            Resource::Blog => fallback.blogs(),
            Resource::LandingSettings => fallback.landing_settings(),
            Resource::About => fallback.about(),
        };
        assert_eq!(rows, expected, "{}", resource.name());
        assert!(!rows.is_empty(), "{}", resource.name());
    }

    let items = data.portfolios().await.unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0].title, "Weather Dashboard");
    assert!(items.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let landing = data.landing().await.unwrap();
    assert_eq!(landing.id, Some(RowId::SINGLETON));
    assert_eq!(landing.title, "Alex Doe");
    assert_eq!(landing.banner_title, "Portfolio");
    assert_eq!(landing.socials.len(), 2);

    let about = data.about().await.unwrap();
    assert_eq!(about.contact_email, "hello@example.com");
    assert!(!fake.log().is_empty());
}

#[rocket::async_test]
async fn auto_mode_prefers_healthy_remote() {
    let fake = Fake::new().with_rows(Table::Portfolios, remote_portfolios());
    let data = data_service(DataMode::Auto, &fake);
    let items = data.portfolios().await.unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["New", "Old"]);
    assert!(items[0].tags.is_empty());
    assert_eq!(items[0].image_url, "");
}

#[rocket::async_test]
async fn auto_mode_treats_missing_singleton_as_fallback() {
    let fake = Fake::new();
    let data = data_service(DataMode::Auto, &fake);
    let about = data.about().await.unwrap();
    assert_eq!(about.full_name, "Alex Doe");
    assert_eq!(fake.log(), vec!["select about_me id=1".to_string()]);
}

#[rocket::async_test]
async fn json_mode_never_contacts_remote() {
    let fake = Fake::new().with_rows(Table::Portfolios, remote_portfolios());
    let data = data_service(DataMode::Json, &fake);

    assert_eq!(data.portfolios().await.unwrap().len(), 4);
    assert_eq!(data.blogs().await.unwrap().len(), 3);
    assert_eq!(data.landing().await.unwrap().site_title, "Digital Soul");
    assert_eq!(data.about().await.unwrap().full_name, "Alex Doe");
    assert_eq!(data.blog_page(1, 2).await.unwrap().total_pages, 2);
    assert!(data.blog_by_id(&RowId::Int(2)).await.unwrap().is_some());
    for r in Resource::ALL {
        data.get_items(r).await.unwrap();
    }

    assert!(fake.log().is_empty(), "unexpected remote calls: {:?}", fake.log());
}

#[rocket::async_test]
async fn forced_remote_propagates_errors() {
    let fake = Fake::offline();
    let data = data_service(DataMode::Remote, &fake);
    assert!(matches!(data.portfolios().await, Err(StoreError::Network(_))));
    assert!(matches!(data.blog_page(1, 6).await, Err(StoreError::Network(_))));
    assert!(matches!(data.landing().await, Err(StoreError::Network(_))));

    let unconfigured = DataService::new(DataMode::Remote, None, StaticSource::new(STATIC_DIR));
    assert!(matches!(unconfigured.blogs().await, Err(StoreError::NotConfigured)));
}

#[rocket::async_test]
async fn auto_mode_falls_back_when_remote_stalls() {
    // Accepted into the backlog, never answered.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let remote = SupabaseClient::new(
        &format!("http://{}", listener.local_addr().unwrap()),
        "key",
        "assets",
        Duration::from_millis(300),
    );
    let data = DataService::new(DataMode::Auto, Some(Arc::new(remote)), StaticSource::new(STATIC_DIR));

    let items = rocket::tokio::time::timeout(Duration::from_secs(10), data.portfolios())
        .await
        .expect("fallback before the deadline")
        .unwrap();
    assert_eq!(items.len(), 4);
    drop(listener);
}

#[rocket::async_test]
async fn unconfigured_remote_falls_back_without_requests() {
    let data = DataService::new(DataMode::Auto, None, StaticSource::new(STATIC_DIR));
    assert_eq!(data.blogs().await.unwrap().len(), 3);
}

#[rocket::async_test]
async fn missing_static_files_read_as_empty() {
    let fake = Fake::offline();
    let data = DataService::new(
        DataMode::Auto,
        Some(Arc::new(fake)),
        StaticSource::new("website/no-such-dir"),
    );
    assert!(data.portfolios().await.unwrap().is_empty());
    assert_eq!(data.landing().await.unwrap(), LandingSettings::default());
}

#[rocket::async_test]
async fn remote_blog_page_uses_count_and_window() {
    let fake = Fake::new().with_rows(Table::Blogs, remote_blogs(14));
    let data = data_service(DataMode::Remote, &fake);

    let page = data.blog_page(2, 6).await.unwrap();
    assert_eq!(page.total, 14);
    assert_eq!(page.total_pages, 3);
    let ids: Vec<RowId> = page.items.iter().filter_map(|p| p.id.clone()).collect();
    assert_eq!(ids, (3..=8).rev().map(RowId::Int).collect::<Vec<_>>());
    assert_eq!(
        fake.log(),
        vec!["count blogs".to_string(), "select blogs offset=6 limit=6".to_string()]
    );
}

#[rocket::async_test]
async fn static_blog_pages_match_the_half_open_window() {
    let data = DataService::new(DataMode::Json, None, StaticSource::new(STATIC_DIR));
    let all = data.blogs().await.unwrap();
    for k in 1..=3 {
        let page = data.blog_page(k, 1).await.unwrap();
        assert_eq!(page.items, all[(k - 1)..k].to_vec());
    }
    assert!(data.blog_page(4, 1).await.unwrap().items.is_empty());
}

#[rocket::async_test]
async fn blog_by_id_absent_is_none() {
    let fake = Fake::new().with_rows(Table::Blogs, remote_blogs(2));
    let data = data_service(DataMode::Remote, &fake);
    assert!(data.blog_by_id(&RowId::Int(2)).await.unwrap().is_some());
    assert!(data.blog_by_id(&RowId::Int(99)).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════
// Writes
// ═══════════════════════════════════════════════════════════

fn project_form(title: &str, image_url: &str) -> PortfolioForm {
    PortfolioForm {
        title: title.to_string(),
        category: "Web".to_string(),
        tags: vec!["rust".to_string()],
        image_url: image_url.to_string(),
        ..Default::default()
    }
}

#[rocket::async_test]
async fn portfolio_save_updates_with_id_and_inserts_without() {
    let fake = Fake::new().with_rows(Table::Portfolios, remote_portfolios());

    let outcome = PortfolioItem::save(&fake, Some(&RowId::parse("a")), &project_form("Renamed", ""))
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Updated);

    let outcome = PortfolioItem::save(&fake, None, &project_form("Brand new", ""))
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Created);

    assert_eq!(
        fake.log(),
        vec!["update portfolios a".to_string(), "insert portfolios".to_string()]
    );
    let items = PortfolioItem::list(&fake).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Brand new");
    assert!(items.iter().any(|i| i.title == "Renamed"));
}

#[rocket::async_test]
async fn delete_removes_stored_image_before_row() {
    let image = format!("{}portfolio/1700-abc.png", BUCKET_URL);
    let fake = Fake::new()
        .with_rows(Table::Portfolios, vec![json!({"id": 7, "title": "T", "image_url": image})])
        .with_object("portfolio/1700-abc.png");

    let item = PortfolioItem::find(&fake, &RowId::Int(7)).await.unwrap();
    PortfolioItem::delete(&fake, &fake, &item).await.unwrap();

    assert_eq!(
        fake.log(),
        vec![
            "select portfolios id=7".to_string(),
            "remove portfolio/1700-abc.png".to_string(),
            "delete portfolios 7".to_string(),
        ]
    );
    assert!(fake.objects().is_empty());
    assert!(fake.rows(Table::Portfolios).is_empty());
}

#[rocket::async_test]
async fn delete_leaves_external_images_alone() {
    let fake = Fake::new().with_rows(
        Table::Portfolios,
        vec![json!({"id": 3, "image_url": "https://images.example.com/pic.png"})],
    );
    let item = PortfolioItem::find(&fake, &RowId::Int(3)).await.unwrap();
    PortfolioItem::delete(&fake, &fake, &item).await.unwrap();
    assert!(!fake.log().iter().any(|l| l.starts_with("remove")));
    assert!(fake.log().contains(&"delete portfolios 3".to_string()));
}

#[rocket::async_test]
async fn delete_survives_storage_failure() {
    let fake = Fake {
        storage_broken: true,
        ..Fake::new()
    }
    .with_rows(
        Table::Blogs,
        vec![json!({"id": 4, "banner_url": format!("{}blog/1-x.png", BUCKET_URL)})],
    );
    let post = BlogPost::find(&fake, &RowId::Int(4)).await.unwrap();
    BlogPost::delete(&fake, &fake, &post).await.unwrap();
    assert!(fake.rows(Table::Blogs).is_empty());
}

#[rocket::async_test]
async fn clearing_brand_image_stops_when_storage_fails() {
    let fake = Fake {
        storage_broken: true,
        ..Fake::new()
    }
    .with_rows(
        Table::LandingSettings,
        vec![json!({"id": 1, "logo_url": format!("{}branding/1-l.png", BUCKET_URL)})],
    );
    let url = format!("{}branding/1-l.png", BUCKET_URL);
    let result = LandingSettings::clear_image(&fake, &fake, BrandImage::Logo, &url).await;
    assert!(result.is_err());
    assert!(!fake.log().iter().any(|l| l.starts_with("update")));
}

#[rocket::async_test]
async fn clearing_brand_image_blanks_the_column() {
    let url = format!("{}branding/1-f.png", BUCKET_URL);
    let fake = Fake::new()
        .with_rows(Table::LandingSettings, vec![json!({"id": 1, "favicon_url": url})])
        .with_object("branding/1-f.png");
    LandingSettings::clear_image(&fake, &fake, BrandImage::Favicon, &url)
        .await
        .unwrap();
    assert_eq!(
        fake.log(),
        vec!["remove branding/1-f.png".to_string(), "update landing_settings 1".to_string()]
    );
    assert_eq!(fake.rows(Table::LandingSettings)[0]["favicon_url"], json!(""));
}

#[rocket::async_test]
async fn clearing_listing_banner_removes_object_then_blanks_url() {
    let url = format!("{}banner/1-b.png", BUCKET_URL);
    let fake = Fake::new()
        .with_rows(
            Table::LandingSettings,
            vec![json!({"id": 1, "blog_banner_url": url, "blog_banner_title": "Journal", "banner_url": "/keep.png"})],
        )
        .with_object("banner/1-b.png");

    LandingSettings::clear_banner_image(&fake, &fake, BannerPage::Blog, &url)
        .await
        .unwrap();
    assert_eq!(
        fake.log(),
        vec!["remove banner/1-b.png".to_string(), "upsert landing_settings".to_string()]
    );
    let settings = LandingSettings::load(&fake).await.unwrap();
    assert_eq!(settings.blog_banner_url, "");
    assert_eq!(settings.blog_banner_title, "Journal");
    assert_eq!(settings.banner_url, "/keep.png");
    assert!(fake.objects().is_empty());
}

#[rocket::async_test]
async fn landing_and_banner_saves_upsert_the_singleton() {
    let fake = Fake::new();
    let form = LandingForm {
        title: "Hello".to_string(),
        site_title: "Mine".to_string(),
        default_theme: "light".to_string(),
        ..Default::default()
    };
    LandingSettings::save(&fake, &form).await.unwrap();
    LandingSettings::save_banner(
        &fake,
        BannerPage::Blog,
        &PageBanner {
            title: "Journal".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let rows = fake.rows(Table::LandingSettings);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(1));
    let settings = LandingSettings::load(&fake).await.unwrap();
    assert_eq!(settings.site_title, "Mine");
    assert_eq!(settings.banner(BannerPage::Blog).title, "Journal");
}

#[rocket::async_test]
async fn about_round_trip_and_photo_removal() {
    let fake = Fake::new().with_object("profile/1-me.jpg");
    let about = AboutMe {
        full_name: "  Sam  ".to_string(),
        description: "\nFirst line\nSecond".to_string(),
        photo_url: format!("{}profile/1-me.jpg", BUCKET_URL),
        ..Default::default()
    };
    about.save(&fake).await.unwrap();

    let loaded = AboutMe::load(&fake).await.unwrap();
    assert_eq!(loaded.full_name, "Sam");
    assert_eq!(loaded.headline(), "First line");

    AboutMe::clear_photo(&fake, &fake, &loaded.photo_url).await.unwrap();
    assert!(fake.objects().is_empty());
    assert_eq!(AboutMe::load(&fake).await.unwrap().photo_url, "");
}

#[rocket::async_test]
async fn blog_save_derives_slug() {
    let fake = Fake::new();
    let form = BlogForm {
        title: "Rust & Rocket: Part 2".to_string(),
        content: "<p>hi</p>".to_string(),
        ..Default::default()
    };
    BlogPost::save(&fake, None, &form).await.unwrap();
    let posts = BlogPost::list(&fake).await.unwrap();
    assert_eq!(posts[0].slug, "rust-rocket-part-2");
}

// ═══════════════════════════════════════════════════════════
// Branding
// ═══════════════════════════════════════════════════════════

#[rocket::async_test]
async fn branding_uses_defaults_when_remote_fails() {
    let defaults = Branding {
        site_title: "Fallback".to_string(),
        ..Default::default()
    };
    let data = data_service(DataMode::Auto, &Fake::offline());
    assert_eq!(Branding::resolve(&data, &defaults).await, defaults);
}

#[rocket::async_test]
async fn branding_in_json_mode_skips_remote() {
    let fake = Fake::new().with_rows(
        Table::LandingSettings,
        vec![json!({"id": 1, "site_title": "Remote"})],
    );
    let data = data_service(DataMode::Json, &fake);
    let state = BrandingState::new(Branding::default());
    state.refresh(&data, &Branding::default()).await;
    let b = state.get();
    assert_eq!(b.site_title, Branding::default().site_title);
    assert_eq!(b.footer_title, "Alex Doe");
    assert_eq!(state.remote_theme(), None);
    assert!(fake.log().is_empty());
}

#[rocket::async_test]
async fn branding_reads_remote_settings() {
    let fake = Fake::new().with_rows(
        Table::LandingSettings,
        vec![json!({"id": 1, "site_title": "Remote", "favicon_url": "", "default_theme": "light"})],
    );
    let data = data_service(DataMode::Auto, &fake);
    let state = BrandingState::new(Branding::default());
    state.refresh(&data, &Branding::default()).await;
    let b = state.get();
    assert_eq!(b.site_title, "Remote");
    assert_eq!(b.favicon_url, Branding::default().favicon_url);
    assert_eq!(state.remote_theme(), Some(Theme::Light));
}

// ═══════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════

fn json_config() -> SiteConfig {
    SiteConfig {
        data_mode: DataMode::Json,
        static_dir: STATIC_DIR.into(),
        ..Default::default()
    }
}

async fn client_with(fake: &Fake, mode: DataMode) -> Client {
    let config = SiteConfig {
        data_mode: mode,
        ..json_config()
    };
    client_for(fake, config).await
}

async fn client_for(fake: &Fake, config: SiteConfig) -> Client {
    let mode = config.data_mode;
    Client::tracked(crate::build(config, backend(mode, fake)))
        .await
        .expect("valid rocket instance")
}

async fn failed_login(client: &Client, forwarded_for: &str) {
    client
        .post("/gate-access")
        .header(ContentType::Form)
        .header(Header::new("X-Forwarded-For", forwarded_for.to_string()))
        .body("email=admin%40example.com&password=wrong")
        .dispatch()
        .await;
}

async fn sign_in(client: &Client) {
    let resp = client
        .post("/gate-access")
        .header(ContentType::Form)
        .body("email=admin%40example.com&password=secret")
        .dispatch()
        .await;
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/dashboard"));
}

#[rocket::async_test]
async fn dashboard_requires_a_session() {
    let fake = Fake::new();
    let client = client_with(&fake, DataMode::Json).await;

    for path in ["/dashboard", "/dashboard/landing", "/dashboard/portfolio?q=x", "/dashboard/blog/1/edit", "/dashboard/about"] {
        let resp = client.get(path).dispatch().await;
        assert_eq!(resp.status(), Status::SeeOther, "{}", path);
        assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"), "{}", path);
    }

    let resp = client
        .post("/dashboard/portfolio/7/delete")
        .dispatch()
        .await;
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"));
    assert!(!fake.log().iter().any(|l| l.starts_with("delete")));
}

#[rocket::async_test]
async fn dashboard_without_auth_service_redirects() {
    let data = DataService::new(DataMode::Json, None, StaticSource::new(STATIC_DIR));
    let client = Client::tracked(crate::build(json_config(), Backend::new(data, None, None, None)))
        .await
        .unwrap();
    let resp = client.get("/dashboard/landing").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"));

    let page = client.get("/gate-access").dispatch().await;
    assert_eq!(page.status(), Status::Ok);
    assert!(page.into_string().await.unwrap().contains("no auth service is configured"));
}

#[rocket::async_test]
async fn login_alias_redirects_permanently() {
    let client = client_with(&Fake::new(), DataMode::Json).await;
    let resp = client.get("/login").dispatch().await;
    assert_eq!(resp.status(), Status::PermanentRedirect);
    assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"));
}

#[rocket::async_test]
async fn sign_in_opens_the_dashboard_and_sign_out_closes_it() {
    let fake = Fake::new().with_rows(Table::Portfolios, remote_portfolios());
    let client = client_with(&fake, DataMode::Auto).await;
    sign_in(&client).await;

    let resp = client.get("/dashboard").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/dashboard/landing"));

    let page = client.get("/dashboard/portfolio?q=new").dispatch().await;
    assert_eq!(page.status(), Status::Ok);
    let html = page.into_string().await.unwrap();
    assert!(html.contains(">New</a>"));
    assert!(!html.contains(">Old</a>"));
    assert!(fake.log().contains(&format!("scoped {}", GOOD_TOKEN)));

    let resp = client.post("/logout").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"));
    assert!(fake.log().contains(&"sign_out".to_string()));

    let resp = client.get("/dashboard/landing").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"));
}

#[rocket::async_test]
async fn spoofed_forwarding_headers_share_one_lockout() {
    let fake = Fake::new();
    let client = client_with(&fake, DataMode::Json).await;

    for i in 0..8 {
        failed_login(&client, &format!("198.51.100.{}", i)).await;
    }
    let attempts = fake.log().iter().filter(|l| l.starts_with("sign_in")).count();
    assert_eq!(attempts, 5);
    let page = client.get("/gate-access").dispatch().await;
    assert!(page.into_string().await.unwrap().contains("Locked: wait 5 minutes."));
}

#[rocket::async_test]
async fn trusted_proxy_keys_lockout_by_forwarded_address() {
    let fake = Fake::new();
    let config = SiteConfig {
        trusted_proxy: true,
        ..json_config()
    };
    let client = client_for(&fake, config).await;

    for _ in 0..6 {
        failed_login(&client, "198.51.100.7").await;
    }
    failed_login(&client, "203.0.113.5").await;
    let attempts = fake.log().iter().filter(|l| l.starts_with("sign_in")).count();
    assert_eq!(attempts, 6);
}

#[rocket::async_test]
async fn failed_logins_get_locked_out() {
    let fake = Fake::new();
    let client = client_with(&fake, DataMode::Json).await;

    for _ in 0..5 {
        let resp = client
            .post("/gate-access")
            .header(ContentType::Form)
            .body("email=admin%40example.com&password=wrong")
            .dispatch()
            .await;
        assert_eq!(resp.headers().get_one("Location"), Some("/gate-access"));
    }
    let page = client.get("/gate-access").dispatch().await;
    assert!(page.into_string().await.unwrap().contains("Access denied."));

    client
        .post("/gate-access")
        .header(ContentType::Form)
        .body("email=admin%40example.com&password=secret")
        .dispatch()
        .await;
    let page = client.get("/gate-access").dispatch().await;
    assert!(page.into_string().await.unwrap().contains("Locked: wait 5 minutes."));

    let attempts = fake.log().iter().filter(|l| l.starts_with("sign_in")).count();
    assert_eq!(attempts, 5);
}

#[rocket::async_test]
async fn upstream_rate_limit_is_reported_as_locked() {
    let client = client_with(&Fake::new(), DataMode::Json).await;
    client
        .post("/gate-access")
        .header(ContentType::Form)
        .body("email=admin%40example.com&password=locked")
        .dispatch()
        .await;
    let page = client.get("/gate-access").dispatch().await;
    assert!(page.into_string().await.unwrap().contains("Locked: wait 5 minutes."));
}

#[rocket::async_test]
async fn dashboard_portfolio_save_and_delete() {
    let image = format!("{}portfolio/9-old.png", BUCKET_URL);
    let fake = Fake::new()
        .with_rows(
            Table::Portfolios,
            vec![json!({"id": 9, "title": "Nine", "image_url": image, "created_at": "2024-01-01T00:00:00+00:00"})],
        )
        .with_object("portfolio/9-old.png");
    let client = client_with(&fake, DataMode::Auto).await;
    sign_in(&client).await;

    let resp = client
        .post("/dashboard/portfolio")
        .header(ContentType::Form)
        .body("id=9&title=Nine+v2&description=&category=Web&tags=a%2C+%2Cb&project_url=&image_url=")
        .dispatch()
        .await;
    assert_eq!(resp.headers().get_one("Location"), Some("/dashboard/portfolio"));
    let row = &fake.rows(Table::Portfolios)[0];
    assert_eq!(row["title"], json!("Nine v2"));
    assert_eq!(row["tags"], json!(["a", "b"]));

    let resp = client
        .post("/dashboard/portfolio")
        .header(ContentType::Form)
        .body("title=&description=&category=&tags=&project_url=")
        .dispatch()
        .await;
    assert_eq!(resp.headers().get_one("Location"), Some("/dashboard/portfolio/new"));
    assert_eq!(fake.rows(Table::Portfolios).len(), 1);

    // the update above blanked image_url, so put it back before deleting
    fake.state.lock().unwrap().tables.get_mut(&Table::Portfolios).unwrap()[0]["image_url"] = json!(image);
    client.post("/dashboard/portfolio/9/delete").dispatch().await;
    let log = fake.log();
    let remove = log.iter().position(|l| l == "remove portfolio/9-old.png").unwrap();
    let delete = log.iter().position(|l| l == "delete portfolios 9").unwrap();
    assert!(remove < delete);
}

#[rocket::async_test]
async fn dashboard_banner_image_removals() {
    let page_banner = format!("{}banner/7-p.png", BUCKET_URL);
    let post_banner = format!("{}blog/8-b.png", BUCKET_URL);
    let fake = Fake::new()
        .with_rows(Table::LandingSettings, vec![json!({"id": 1, "banner_url": page_banner})])
        .with_rows(Table::Blogs, vec![json!({"id": 4, "title": "Four", "banner_url": post_banner})])
        .with_object("banner/7-p.png")
        .with_object("blog/8-b.png");
    let client = client_with(&fake, DataMode::Auto).await;
    sign_in(&client).await;

    let resp = client.post("/dashboard/portfolio/banner/image/delete").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/dashboard/portfolio"));
    assert_eq!(fake.rows(Table::LandingSettings)[0]["banner_url"], json!(""));

    let resp = client.post("/dashboard/blog/4/banner/delete").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/dashboard/blog/4/edit"));
    assert_eq!(fake.rows(Table::Blogs)[0]["banner_url"], json!(""));

    let log = fake.log();
    let position = |entry: &str| log.iter().position(|l| l == entry).unwrap();
    assert!(position("remove banner/7-p.png") < position("upsert landing_settings"));
    assert!(position("remove blog/8-b.png") < position("update blogs 4"));
    assert!(fake.objects().is_empty());
}

#[rocket::async_test]
async fn suggestions_endpoint() {
    let fake = Fake::new().with_rows(
        Table::Portfolios,
        vec![
            json!({"id": 1, "category": "Web Apps", "tags": ["React", "Rust"]}),
            json!({"id": 2, "category": "Web", "tags": ["Rocket"]}),
        ],
    );
    let client = client_with(&fake, DataMode::Auto).await;
    sign_in(&client).await;

    let resp = client
        .get("/dashboard/portfolio/suggest?category=web&tags=Rust,%20R")
        .dispatch()
        .await;
    let body: Value = resp.into_json().await.unwrap();
    assert_eq!(body["categories"], json!(["Web Apps"]));
    assert_eq!(body["tags"], json!(["React", "Rocket"]));
}

#[rocket::async_test]
async fn landing_save_updates_branding() {
    let fake = Fake::new();
    let client = client_with(&fake, DataMode::Auto).await;
    sign_in(&client).await;

    client
        .post("/dashboard/landing")
        .header(ContentType::Form)
        .body("greeting=Hi&title=Me&site_title=Fresh+Title&description=&default_theme=light&social_icon=Github&social_url=https%3A%2F%2Fgithub.com&social_icon=&social_url=")
        .dispatch()
        .await;

    let settings = LandingSettings::load(&fake).await.unwrap();
    assert_eq!(settings.site_title, "Fresh Title");
    assert_eq!(settings.socials.len(), 1);

    let home = client.get("/").dispatch().await.into_string().await.unwrap();
    assert!(home.contains("<title>Fresh Title</title>"));
    assert!(home.contains(r#"data-theme="light""#));
    assert!(home.contains("Me</p></footer>"));
}

#[rocket::async_test]
async fn public_pages_render_static_content() {
    let client = client_with(&Fake::new(), DataMode::Json).await;

    let home = client.get("/").dispatch().await;
    assert_eq!(home.status(), Status::Ok);
    let html = home.into_string().await.unwrap();
    assert!(html.contains("Alex Doe"));
    assert!(html.contains(r#"<a href="/?tab=Web+Apps">Web Apps</a>"#));

    let tab = client.get("/portfolio?tab=Design").dispatch().await.into_string().await.unwrap();
    assert!(tab.contains("Brand Identity: Kaffee"));
    assert!(!tab.contains("Weather Dashboard"));

    let blog = client.get("/blog?page=1").dispatch().await.into_string().await.unwrap();
    assert!(blog.contains("Journal"));
    assert!(blog.contains(r#"<a href="/blog/1">Shipping a Static Fallback</a>"#));

    let post = client.get("/blog/2").dispatch().await;
    assert_eq!(post.status(), Status::Ok);
    assert!(post.into_string().await.unwrap().contains("Notes on Colour and Contrast"));

    let missing = client.get("/blog/999").dispatch().await;
    assert_eq!(missing.status(), Status::NotFound);
    assert!(missing.into_string().await.unwrap().contains("Page not found."));

    let about = client.get("/about").dispatch().await.into_string().await.unwrap();
    assert!(about.contains("mailto:hello@example.com"));
}

#[rocket::async_test]
async fn items_api_serves_normalized_rows() {
    let client = client_with(&Fake::new(), DataMode::Json).await;

    let rows: Vec<Value> = client.get("/api/items/portfolio").dispatch().await.into_json().await.unwrap();
    assert_eq!(rows.len(), 4);

    let settings: Vec<Value> = client
        .get("/api/items/landing_settings")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(settings[0]["blog_banner_title"], json!("Journal"));

    let unknown = client.get("/api/items/unknown").dispatch().await;
    assert_eq!(unknown.status(), Status::NotFound);
}

#[rocket::async_test]
async fn items_api_reports_forced_remote_failures() {
    let client = client_with(&Fake::offline(), DataMode::Remote).await;
    let resp = client.get("/api/items/blog").dispatch().await;
    assert_eq!(resp.status(), Status::ServiceUnavailable);
}

#[rocket::async_test]
async fn theme_toggle_sets_cookie_and_returns() {
    let client = client_with(&Fake::new(), DataMode::Json).await;
    let resp = client.get("/theme/light?next=/blog").dispatch().await;
    assert_eq!(resp.headers().get_one("Location"), Some("/blog"));
    assert_eq!(resp.cookies().get("theme").map(|c| c.value()), Some("light"));

    let html = client.get("/about").dispatch().await.into_string().await.unwrap();
    assert!(html.contains(r#"data-theme="light""#));

    let bad = client.get("/theme/sepia").dispatch().await;
    assert_eq!(bad.status(), Status::NotFound);
}
