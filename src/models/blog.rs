use serde::{Deserialize, Serialize};

use super::{decode_rows, null_as_default, RowId};
use super::portfolio::SaveOutcome;
use crate::images;
use crate::pagination::Paginated;
use crate::store::{ObjectStore, Query, RemoteStore, StoreError, Table};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    /// Rich-text HTML as produced by the dashboard editor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogForm {
    pub title: String,
    pub content: String,
    pub category: String,
    pub banner_url: String,
}

#[derive(Serialize)]
struct BlogPayload<'a> {
    title: &'a str,
    slug: String,
    content: &'a str,
    category: &'a str,
    banner_url: &'a str,
}

impl BlogForm {
    fn payload(&self) -> BlogPayload<'_> {
        BlogPayload {
            title: self.title.trim(),
            slug: slug::slugify(self.title.trim()),
            content: &self.content,
            category: self.category.trim(),
            banner_url: &self.banner_url,
        }
    }
}

/// Plain-text teaser: tags stripped, whitespace collapsed, cut at `max_words`.
pub fn excerpt(html: &str, max_words: usize) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        words.join(" ")
    } else {
        format!("{}…", words[..max_words].join(" "))
    }
}

impl BlogPost {
    pub async fn list(remote: &dyn RemoteStore) -> Result<Vec<Self>, StoreError> {
        let rows = remote.select(Table::Blogs, &Query::newest_first()).await?;
        Ok(decode_rows(Table::Blogs.name(), rows))
    }

    /// One page of posts, newest first, using a count plus a row window.
    pub async fn page(
        remote: &dyn RemoteStore,
        page: usize,
        per_page: usize,
    ) -> Result<Paginated<Self>, StoreError> {
        let total = remote.count(Table::Blogs).await?;
        let (from, to) = crate::pagination::bounds(page, per_page);
        let rows = remote
            .select(Table::Blogs, &Query::newest_first().window(from, to))
            .await?;
        Ok(Paginated::from_window(
            decode_rows(Table::Blogs.name(), rows),
            page,
            per_page,
            total,
        ))
    }

    pub async fn find(remote: &dyn RemoteStore, id: &RowId) -> Result<Self, StoreError> {
        let row = remote.find(Table::Blogs, id).await?;
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn save(
        remote: &dyn RemoteStore,
        id: Option<&RowId>,
        form: &BlogForm,
    ) -> Result<SaveOutcome, StoreError> {
        let payload =
            serde_json::to_value(form.payload()).map_err(|e| StoreError::Decode(e.to_string()))?;
        match id {
            Some(id) => {
                remote.update(Table::Blogs, id, payload).await?;
                Ok(SaveOutcome::Updated)
            }
            None => {
                remote.insert(Table::Blogs, payload).await?;
                Ok(SaveOutcome::Created)
            }
        }
    }

    /// Banner object first, then the row.
    pub async fn delete(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        post: &BlogPost,
    ) -> Result<(), StoreError> {
        let id = post.id.as_ref().ok_or(StoreError::NotFound)?;
        if !post.banner_url.is_empty() {
            if let Err(e) = images::remove_by_url(storage, &post.banner_url).await {
                log::warn!("Blog {}: banner cleanup failed: {}", id, e);
            }
        }
        remote.delete(Table::Blogs, id).await
    }

    /// Banner object first, then the column.
    pub async fn clear_banner(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        post: &BlogPost,
    ) -> Result<(), StoreError> {
        let id = post.id.as_ref().ok_or(StoreError::NotFound)?;
        images::remove_by_url(storage, &post.banner_url).await?;
        remote
            .update(Table::Blogs, id, serde_json::json!({ "banner_url": "" }))
            .await
    }

    pub fn excerpt(&self, max_words: usize) -> String {
        excerpt(&self.content, max_words)
    }

    pub fn date(&self) -> String {
        self.created_at
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.format("%B %-d, %Y").to_string())
            .unwrap_or_default()
    }
}
