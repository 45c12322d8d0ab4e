use serde::{Deserialize, Serialize};

use super::{decode_rows, null_as_default, RowId};
use crate::images;
use crate::store::{ObjectStore, Query, RemoteStore, StoreError, Table};

pub const TAB_ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Columns written on create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub project_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

impl SaveOutcome {
    pub fn verb(&self) -> &'static str {
        match self {
            SaveOutcome::Created => "created",
            SaveOutcome::Updated => "updated",
        }
    }
}

/// "a, b, , c" -> ["a", "b", "c"]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `All` followed by each distinct category in first-seen order.
pub fn category_tabs(items: &[PortfolioItem]) -> Vec<String> {
    let mut tabs = vec![TAB_ALL.to_string()];
    for item in items {
        if !item.category.is_empty() && !tabs.contains(&item.category) {
            tabs.push(item.category.clone());
        }
    }
    tabs
}

pub fn filter_by_tab(items: Vec<PortfolioItem>, tab: &str) -> Vec<PortfolioItem> {
    if tab.is_empty() || tab == TAB_ALL {
        return items;
    }
    items.into_iter().filter(|i| i.category == tab).collect()
}

/// Dashboard search: case-insensitive substring of title or category.
pub fn search(items: Vec<PortfolioItem>, query: &str) -> Vec<PortfolioItem> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|i| i.title.to_lowercase().contains(&q) || i.category.to_lowercase().contains(&q))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suggestions {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// Completion candidates for the category field and the tag being typed
/// (the last comma-separated entry). Prefix match, case-insensitive; exact
/// matches and tags already entered are left out.
pub fn suggest(items: &[PortfolioItem], category_input: &str, tags_input: &str) -> Suggestions {
    let cat_lower = category_input.trim().to_lowercase();
    let mut categories: Vec<String> = Vec::new();
    for cat in items.iter().map(|i| &i.category).filter(|c| !c.is_empty()) {
        let lower = cat.to_lowercase();
        if lower.starts_with(&cat_lower) && lower != cat_lower && !categories.contains(cat) {
            categories.push(cat.clone());
        }
    }

    let entered: Vec<&str> = tags_input.split(',').map(str::trim).collect();
    let (typing, done) = match entered.split_last() {
        Some((last, rest)) => (*last, rest),
        None => ("", &[][..]),
    };
    let typing_lower = typing.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for tag in items.iter().flat_map(|i| i.tags.iter()).filter(|t| !t.is_empty()) {
        let lower = tag.to_lowercase();
        if lower.starts_with(&typing_lower)
            && lower != typing_lower
            && !done.contains(&tag.as_str())
            && !tags.contains(tag)
        {
            tags.push(tag.clone());
        }
    }

    Suggestions { categories, tags }
}

impl PortfolioItem {
    pub async fn list(remote: &dyn RemoteStore) -> Result<Vec<Self>, StoreError> {
        let rows = remote
            .select(Table::Portfolios, &Query::newest_first())
            .await?;
        Ok(decode_rows(Table::Portfolios.name(), rows))
    }

    pub async fn find(remote: &dyn RemoteStore, id: &RowId) -> Result<Self, StoreError> {
        let row = remote.find(Table::Portfolios, id).await?;
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Update when the item already has an id, insert otherwise.
    pub async fn save(
        remote: &dyn RemoteStore,
        id: Option<&RowId>,
        form: &PortfolioForm,
    ) -> Result<SaveOutcome, StoreError> {
        let payload = serde_json::to_value(form).map_err(|e| StoreError::Decode(e.to_string()))?;
        match id {
            Some(id) => {
                remote.update(Table::Portfolios, id, payload).await?;
                Ok(SaveOutcome::Updated)
            }
            None => {
                remote.insert(Table::Portfolios, payload).await?;
                Ok(SaveOutcome::Created)
            }
        }
    }

    /// Removes the stored image first, then the row. A failed storage
    /// removal is logged and the row is still deleted.
    pub async fn delete(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        item: &PortfolioItem,
    ) -> Result<(), StoreError> {
        let id = item.id.as_ref().ok_or(StoreError::NotFound)?;
        if !item.image_url.is_empty() {
            if let Err(e) = images::remove_by_url(storage, &item.image_url).await {
                log::warn!("Portfolio {}: image cleanup failed: {}", id, e);
            }
        }
        remote.delete(Table::Portfolios, id).await
    }

    /// Removes the stored image and blanks `image_url` on the row.
    pub async fn clear_image(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        item: &PortfolioItem,
    ) -> Result<(), StoreError> {
        let id = item.id.as_ref().ok_or(StoreError::NotFound)?;
        images::remove_by_url(storage, &item.image_url).await?;
        remote
            .update(Table::Portfolios, id, serde_json::json!({ "image_url": "" }))
            .await
    }

    pub fn form(&self) -> PortfolioForm {
        PortfolioForm {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            image_url: self.image_url.clone(),
            project_url: self.project_url.clone(),
        }
    }
}
