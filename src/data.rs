use std::sync::Arc;

use serde_json::Value;

use crate::config::DataMode;
use crate::models::about::AboutMe;
use crate::models::blog::BlogPost;
use crate::models::portfolio::PortfolioItem;
use crate::models::settings::LandingSettings;
use crate::models::{decode_rows, RowId};
use crate::pagination::{self, Paginated};
use crate::store::json::StaticSource;
use crate::store::{Query, RemoteStore, StoreError, Table};

/// Logical record sets the public site reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Portfolio,
    Blog,
    LandingSettings,
    About,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Portfolio,
        Resource::Blog,
        Resource::LandingSettings,
        Resource::About,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "portfolio" | "portfolios" => Some(Resource::Portfolio),
            "blog" | "blogs" => Some(Resource::Blog),
            "landing_settings" | "settings" => Some(Resource::LandingSettings),
            "about" | "about_me" => Some(Resource::About),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Portfolio => "portfolio",
            Resource::Blog => "blog",
            Resource::LandingSettings => "landing_settings",
            Resource::About => "about",
        }
    }

    pub fn table(&self) -> Table {
        match self {
            Resource::Portfolio => Table::Portfolios,
            Resource::Blog => Table::Blogs,
            Resource::LandingSettings => Table::LandingSettings,
            Resource::About => Table::AboutMe,
        }
    }

    /// Lists are ordered newest first; singletons are read by `id = 1`.
    fn query(&self) -> Query {
        match self {
            Resource::Portfolio | Resource::Blog => Query::newest_first(),
            Resource::LandingSettings | Resource::About => Query::by_id(RowId::SINGLETON),
        }
    }

    fn is_singleton(&self) -> bool {
        matches!(self, Resource::LandingSettings | Resource::About)
    }
}

/// Resolves every public read against the hosted store or the static
/// JSON files, depending on the configured [`DataMode`].
pub struct DataService {
    mode: DataMode,
    remote: Option<Arc<dyn RemoteStore>>,
    fallback: StaticSource,
}

impl DataService {
    pub fn new(mode: DataMode, remote: Option<Arc<dyn RemoteStore>>, fallback: StaticSource) -> Self {
        DataService {
            mode,
            remote,
            fallback,
        }
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn fallback(&self) -> &StaticSource {
        &self.fallback
    }

    fn remote(&self) -> Result<&dyn RemoteStore, StoreError> {
        self.remote.as_deref().ok_or(StoreError::NotConfigured)
    }

    fn static_rows(&self, resource: Resource) -> Vec<Value> {
        match resource {
            Resource::Portfolio => self.fallback.portfolios(),
            Resource::Blog => self.fallback.blogs(),
            Resource::LandingSettings => self.fallback.landing_settings(),
            Resource::About => self.fallback.about(),
        }
    }

    /// Applies the mode to a remote attempt: auto mode swaps any failure for
    /// the static result, forced-remote hands it back.
    fn settle<T>(
        &self,
        resource: Resource,
        attempt: Result<T, StoreError>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, StoreError> {
        match (attempt, self.mode) {
            (Ok(v), _) => Ok(v),
            (Err(e), DataMode::Auto) => {
                log::info!("{}: remote read failed ({}), using static data", resource.name(), e);
                Ok(fallback())
            }
            (Err(e), _) => Err(e),
        }
    }

    async fn remote_rows(&self, resource: Resource) -> Result<Vec<Value>, StoreError> {
        let rows = self.remote()?.select(resource.table(), &resource.query()).await?;
        if resource.is_singleton() && rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows)
    }

    /// Raw rows of one resource, normalized to the hosted row shape.
    pub async fn get_items(&self, resource: Resource) -> Result<Vec<Value>, StoreError> {
        if self.mode == DataMode::Json {
            return Ok(self.static_rows(resource));
        }
        let attempt = self.remote_rows(resource).await;
        self.settle(resource, attempt, || self.static_rows(resource))
    }

    pub async fn portfolios(&self) -> Result<Vec<PortfolioItem>, StoreError> {
        let rows = self.get_items(Resource::Portfolio).await?;
        Ok(decode_rows(Table::Portfolios.name(), rows))
    }

    pub async fn blogs(&self) -> Result<Vec<BlogPost>, StoreError> {
        let rows = self.get_items(Resource::Blog).await?;
        Ok(decode_rows(Table::Blogs.name(), rows))
    }

    /// Remote reads use a count plus a row window; static data is sliced.
    pub async fn blog_page(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<Paginated<BlogPost>, StoreError> {
        let from_static = || {
            let posts: Vec<BlogPost> = decode_rows(Table::Blogs.name(), self.fallback.blogs());
            pagination::paginate(&posts, page, per_page)
        };
        if self.mode == DataMode::Json {
            return Ok(from_static());
        }
        let attempt = match self.remote() {
            Ok(remote) => BlogPost::page(remote, page, per_page).await,
            Err(e) => Err(e),
        };
        self.settle(Resource::Blog, attempt, from_static)
    }

    /// `None` when no post carries that id.
    pub async fn blog_by_id(&self, id: &RowId) -> Result<Option<BlogPost>, StoreError> {
        let from_static = || {
            decode_rows::<BlogPost>(Table::Blogs.name(), self.fallback.blogs())
                .into_iter()
                .find(|p| p.id.as_ref() == Some(id))
        };
        if self.mode == DataMode::Json {
            return Ok(from_static());
        }
        let attempt = match self.remote() {
            Ok(remote) => match BlogPost::find(remote, id).await {
                Ok(post) => Ok(Some(post)),
                Err(StoreError::NotFound) => Ok(None),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.settle(Resource::Blog, attempt, from_static)
    }

    pub async fn landing(&self) -> Result<LandingSettings, StoreError> {
        let rows = self.get_items(Resource::LandingSettings).await?;
        Ok(first_or_default(Table::LandingSettings, rows))
    }

    pub async fn about(&self) -> Result<AboutMe, StoreError> {
        let rows = self.get_items(Resource::About).await?;
        Ok(first_or_default(Table::AboutMe, rows))
    }

    /// The hosted settings row only, no static fallback. Branding uses this
    /// so a broken remote falls back to configured defaults instead.
    pub async fn remote_landing(&self) -> Result<LandingSettings, StoreError> {
        let rows = self.remote_rows(Resource::LandingSettings).await?;
        decode_rows(Table::LandingSettings.name(), rows)
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("malformed landing_settings row".to_string()))
    }
}

fn first_or_default<T: serde::de::DeserializeOwned + Default>(table: Table, rows: Vec<Value>) -> T {
    decode_rows(table.name(), rows).into_iter().next().unwrap_or_default()
}
