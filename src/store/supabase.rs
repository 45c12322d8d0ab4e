use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ObjectStore, Query, RemoteStore, StoreError, Table};
use crate::models::RowId;
use crate::security::{AuthError, AuthProvider, AuthUser, Session};

/// Client for the hosted database-as-a-service: PostgREST tables under
/// `/rest/v1`, object storage under `/storage/v1`, auth under `/auth/v1`.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    access_token: Option<String>,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

impl SupabaseClient {
    /// `timeout` bounds a whole request, so a stalled remote surfaces as
    /// `StoreError::Network` instead of hanging the page.
    pub fn new(base_url: &str, anon_key: &str, bucket: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("HTTP client setup failed ({}), using defaults", e);
                reqwest::Client::new()
            });
        SupabaseClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            access_token: None,
        }
    }

    fn with_token(&self, access_token: &str) -> Self {
        SupabaseClient {
            access_token: Some(access_token.to_string()),
            ..self.clone()
        }
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    async fn send(req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status,
            message: error_message(&body),
        })
    }
}

/// PostgREST and storage errors carry `message` (or `error`) in a JSON body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn id_filter(id: &RowId) -> (String, String) {
    ("id".to_string(), format!("eq.{}", id))
}

/// Query-string pairs for a `select`.
fn select_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![(
        "select".to_string(),
        query.columns.unwrap_or("*").to_string(),
    )];
    if let Some(id) = &query.id {
        params.push(id_filter(id));
    }
    if query.newest_first {
        params.push(("order".to_string(), "created_at.desc".to_string()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

/// Total from a `Content-Range: 0-5/12` (or `*/12`) header.
fn parse_content_range(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[rocket::async_trait]
impl RemoteStore for SupabaseClient {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError> {
        let req = self
            .authorize(self.http.get(self.table_url(table)))
            .query(&select_params(query));
        let resp = Self::send(req).await?;
        match resp.json::<Value>().await {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Err(StoreError::Decode(format!("expected array, got {}", other))),
            Err(e) => Err(StoreError::Decode(e.to_string())),
        }
    }

    async fn count(&self, table: Table) -> Result<usize, StoreError> {
        let req = self
            .authorize(self.http.get(self.table_url(table)))
            .query(&[("select", "id"), ("limit", "0")])
            .header("Prefer", "count=exact");
        let resp = Self::send(req).await?;
        resp.headers()
            .get("content-range")
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Decode("missing Content-Range total".to_string()))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<(), StoreError> {
        let req = self
            .authorize(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&json!([row]));
        Self::send(req).await.map(|_| ())
    }

    async fn update(&self, table: Table, id: &RowId, patch: Value) -> Result<(), StoreError> {
        let req = self
            .authorize(self.http.patch(self.table_url(table)))
            .query(&[id_filter(id)])
            .header("Prefer", "return=minimal")
            .json(&patch);
        Self::send(req).await.map(|_| ())
    }

    async fn delete(&self, table: Table, id: &RowId) -> Result<(), StoreError> {
        let req = self
            .authorize(self.http.delete(self.table_url(table)))
            .query(&[id_filter(id)]);
        Self::send(req).await.map(|_| ())
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<(), StoreError> {
        let req = self
            .authorize(self.http.post(self.table_url(table)))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);
        Self::send(req).await.map(|_| ())
    }

    fn scoped(&self, access_token: &str) -> Arc<dyn RemoteStore> {
        Arc::new(self.with_token(access_token))
    }
}

#[rocket::async_trait]
impl ObjectStore for SupabaseClient {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let req = self
            .authorize(self.http.post(self.object_url(path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        Self::send(req).await.map(|_| ())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let req = self
            .authorize(self.http.delete(url))
            .json(&json!({ "prefixes": paths }));
        Self::send(req).await.map(|_| ())
    }

    fn scoped(&self, access_token: &str) -> Arc<dyn ObjectStore> {
        Arc::new(self.with_token(access_token))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

fn auth_failure(status: StatusCode, body: &str) -> AuthError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AuthError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Unavailable(format!("{}: {}", status.as_u16(), error_message(body))),
    }
}

#[rocket::async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let resp = self
            .http
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(auth_failure(status, &body));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        Ok(Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let resp = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(auth_failure(status, &body));
        }
        resp.json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(auth_failure(status, &body))
        }
    }
}
