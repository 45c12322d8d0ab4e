use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::data::DataService;
use crate::models::RowId;
use crate::security::AuthProvider;

pub mod json;
pub mod supabase;

/// Tables of the hosted database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    LandingSettings,
    Portfolios,
    Blogs,
    AboutMe,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::LandingSettings => "landing_settings",
            Table::Portfolios => "portfolios",
            Table::Blogs => "blogs",
            Table::AboutMe => "about_me",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store is not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("record not found")]
    NotFound,
}

/// A `select` against one table. Only the handful of filters the site uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<&'static str>,
    pub id: Option<RowId>,
    pub newest_first: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    /// Every row, newest first.
    pub fn newest_first() -> Self {
        Query {
            newest_first: true,
            ..Default::default()
        }
    }

    pub fn by_id(id: RowId) -> Self {
        Query {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn columns(mut self, columns: &'static str) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Restrict to the half-open row window `[from, to)`.
    pub fn window(mut self, from: usize, to: usize) -> Self {
        self.offset = Some(from);
        self.limit = Some(to.saturating_sub(from));
        self
    }
}

/// Generic table access against the hosted relational store.
#[rocket::async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError>;
    async fn count(&self, table: Table) -> Result<usize, StoreError>;
    async fn insert(&self, table: Table, row: Value) -> Result<(), StoreError>;
    async fn update(&self, table: Table, id: &RowId, patch: Value) -> Result<(), StoreError>;
    async fn delete(&self, table: Table, id: &RowId) -> Result<(), StoreError>;
    async fn upsert(&self, table: Table, row: Value) -> Result<(), StoreError>;

    /// Same store, acting with a signed-in user's access token.
    fn scoped(&self, access_token: &str) -> Arc<dyn RemoteStore>;

    async fn find(&self, table: Table, id: &RowId) -> Result<Value, StoreError> {
        self.select(table, &Query::by_id(id.clone()))
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }
}

/// Object storage bucket for uploaded images.
#[rocket::async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;
    fn public_url(&self, path: &str) -> String;
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StoreError>;
    async fn remove(&self, paths: &[String]) -> Result<(), StoreError>;
    fn scoped(&self, access_token: &str) -> Arc<dyn ObjectStore>;
}

/// Everything the handlers reach the outside world through.
pub struct Backend {
    pub data: DataService,
    remote: Option<Arc<dyn RemoteStore>>,
    storage: Option<Arc<dyn ObjectStore>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl Backend {
    pub fn new(
        data: DataService,
        remote: Option<Arc<dyn RemoteStore>>,
        storage: Option<Arc<dyn ObjectStore>>,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> Self {
        Backend {
            data,
            remote,
            storage,
            auth,
        }
    }

    /// Wire the hosted service if its config is usable; JSON-only otherwise.
    pub fn from_config(config: &SiteConfig) -> Self {
        let fallback = json::StaticSource::new(&config.static_dir);
        if !config.remote.is_configured() {
            log::info!("Remote store not configured, dashboard writes are disabled");
            return Backend::new(DataService::new(config.data_mode, None, fallback), None, None, None);
        }

        let client = Arc::new(supabase::SupabaseClient::new(
            &config.remote.url,
            &config.remote.anon_key,
            &config.remote.bucket,
            config.remote.timeout(),
        ));
        let remote: Arc<dyn RemoteStore> = client.clone();
        Backend::new(
            DataService::new(config.data_mode, Some(remote.clone()), fallback),
            Some(remote),
            Some(client.clone()),
            Some(client),
        )
    }

    pub fn auth(&self) -> Option<&dyn AuthProvider> {
        self.auth.as_deref()
    }

    /// Store handle carrying the user's token, for dashboard reads and writes.
    pub fn remote_as(&self, access_token: &str) -> Result<Arc<dyn RemoteStore>, StoreError> {
        self.remote
            .as_ref()
            .map(|r| r.scoped(access_token))
            .ok_or(StoreError::NotConfigured)
    }

    pub fn storage_as(&self, access_token: &str) -> Result<Arc<dyn ObjectStore>, StoreError> {
        self.storage
            .as_ref()
            .map(|s| s.scoped(access_token))
            .ok_or(StoreError::NotConfigured)
    }
}
