use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{null_as_default, RowId};
use crate::images;
use crate::store::{ObjectStore, RemoteStore, StoreError, Table};

/// The `about_me` singleton profile (id = 1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AboutMe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photo_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub portfolio_url: String,
}

impl AboutMe {
    pub async fn load(remote: &dyn RemoteStore) -> Result<Self, StoreError> {
        match remote.find(Table::AboutMe, &RowId::SINGLETON).await {
            Ok(row) => serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string())),
            Err(StoreError::NotFound) => Ok(AboutMe::default()),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, remote: &dyn RemoteStore) -> Result<(), StoreError> {
        let row = json!({
            "id": RowId::SINGLETON,
            "full_name": self.full_name.trim(),
            "description": self.description,
            "contact_email": self.contact_email.trim(),
            "photo_url": self.photo_url,
            "portfolio_url": self.portfolio_url.trim(),
        });
        remote.upsert(Table::AboutMe, row).await
    }

    /// Removes the stored photo, then blanks `photo_url`.
    pub async fn clear_photo(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        current_url: &str,
    ) -> Result<(), StoreError> {
        images::remove_by_url(storage, current_url).await?;
        remote
            .update(Table::AboutMe, &RowId::SINGLETON, json!({ "photo_url": "" }))
            .await
    }

    /// First line of the bio, used as the page lede.
    pub fn headline(&self) -> &str {
        self.description.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
    }
}
