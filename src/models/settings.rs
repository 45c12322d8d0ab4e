use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{null_as_default, RowId};
use crate::images;
use crate::store::{ObjectStore, RemoteStore, StoreError, Table};

/// One social link shown in the hero and footer. `icon` is a brand name
/// (e.g. "Github"), resolved to an icon by the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// The `landing_settings` singleton row (id = 1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub greeting: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub site_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favicon_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_theme: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub socials: Vec<SocialLink>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blog_banner_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blog_banner_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blog_banner_description: String,
}

/// Hero + branding fields edited on the landing dashboard page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LandingForm {
    pub greeting: String,
    pub title: String,
    pub site_title: String,
    pub description: String,
    pub logo_url: String,
    pub favicon_url: String,
    pub default_theme: String,
    pub socials: Vec<SocialLink>,
}

/// Banner shown at the top of the portfolio or blog listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageBanner {
    pub url: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPage {
    Portfolio,
    Blog,
}

impl BannerPage {
    pub fn url_column(&self) -> &'static str {
        match self {
            BannerPage::Portfolio => "banner_url",
            BannerPage::Blog => "blog_banner_url",
        }
    }
}

/// Images held directly on the settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandImage {
    Logo,
    Favicon,
}

impl BrandImage {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "logo" => Some(BrandImage::Logo),
            "favicon" => Some(BrandImage::Favicon),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            BrandImage::Logo => "logo_url",
            BrandImage::Favicon => "favicon_url",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrandImage::Logo => "Logo",
            BrandImage::Favicon => "Favicon",
        }
    }
}

/// Zip the parallel icon/url form columns, dropping rows without a URL.
pub fn socials_from_columns(icons: &[String], urls: &[String]) -> Vec<SocialLink> {
    icons
        .iter()
        .zip(urls.iter())
        .filter(|(_, url)| !url.trim().is_empty())
        .map(|(icon, url)| SocialLink {
            icon: icon.trim().to_string(),
            url: url.trim().to_string(),
        })
        .collect()
}

impl LandingSettings {
    /// Reads the singleton; a missing row reads as empty settings.
    pub async fn load(remote: &dyn RemoteStore) -> Result<Self, StoreError> {
        match remote.find(Table::LandingSettings, &RowId::SINGLETON).await {
            Ok(row) => serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string())),
            Err(StoreError::NotFound) => Ok(LandingSettings::default()),
            Err(e) => Err(e),
        }
    }

    pub fn banner(&self, page: BannerPage) -> PageBanner {
        match page {
            BannerPage::Portfolio => PageBanner {
                url: self.banner_url.clone(),
                title: self.banner_title.clone(),
                description: self.banner_description.clone(),
            },
            BannerPage::Blog => PageBanner {
                url: self.blog_banner_url.clone(),
                title: self.blog_banner_title.clone(),
                description: self.blog_banner_description.clone(),
            },
        }
    }

    pub fn image(&self, slot: BrandImage) -> &str {
        match slot {
            BrandImage::Logo => &self.logo_url,
            BrandImage::Favicon => &self.favicon_url,
        }
    }

    pub async fn save(remote: &dyn RemoteStore, form: &LandingForm) -> Result<(), StoreError> {
        let mut row = serde_json::to_value(form).map_err(|e| StoreError::Decode(e.to_string()))?;
        row["id"] = json!(RowId::SINGLETON);
        remote.upsert(Table::LandingSettings, row).await
    }

    pub async fn save_banner(
        remote: &dyn RemoteStore,
        page: BannerPage,
        banner: &PageBanner,
    ) -> Result<(), StoreError> {
        remote
            .upsert(Table::LandingSettings, banner_row(page, banner))
            .await
    }

    /// Removes the stored logo/favicon object, then blanks the column.
    pub async fn clear_image(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        slot: BrandImage,
        current_url: &str,
    ) -> Result<(), StoreError> {
        images::remove_by_url(storage, current_url).await?;
        let mut patch = serde_json::Map::new();
        patch.insert(slot.column().to_string(), json!(""));
        remote
            .update(Table::LandingSettings, &RowId::SINGLETON, Value::Object(patch))
            .await
    }

    /// Removes a listing banner's stored object, then blanks its URL.
    pub async fn clear_banner_image(
        remote: &dyn RemoteStore,
        storage: &dyn ObjectStore,
        page: BannerPage,
        current_url: &str,
    ) -> Result<(), StoreError> {
        images::remove_by_url(storage, current_url).await?;
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), json!(RowId::SINGLETON));
        row.insert(page.url_column().to_string(), json!(""));
        remote.upsert(Table::LandingSettings, Value::Object(row)).await
    }
}

fn banner_row(page: BannerPage, banner: &PageBanner) -> Value {
    match page {
        BannerPage::Portfolio => json!({
            "id": RowId::SINGLETON,
            "banner_url": banner.url,
            "banner_title": banner.title,
            "banner_description": banner.description,
        }),
        BannerPage::Blog => json!({
            "id": RowId::SINGLETON,
            "blog_banner_url": banner.url,
            "blog_banner_title": banner.title,
            "blog_banner_description": banner.description,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_read_as_empty() {
        let row = json!({
            "id": 1,
            "title": "Hi",
            "logo_url": null,
            "socials": null,
        });
        let s: LandingSettings = serde_json::from_value(row).unwrap();
        assert_eq!(s.id, Some(RowId::Int(1)));
        assert_eq!(s.title, "Hi");
        assert!(s.logo_url.is_empty());
        assert!(s.socials.is_empty());
    }

    #[test]
    fn banner_rows_target_their_columns() {
        let banner = PageBanner {
            url: "u".into(),
            title: "t".into(),
            description: "d".into(),
        };
        let row = banner_row(BannerPage::Blog, &banner);
        assert_eq!(row["id"], json!(1));
        assert_eq!(row["blog_banner_title"], json!("t"));
        assert!(row.get("banner_title").is_none());
    }

    #[test]
    fn socials_skip_blank_urls() {
        let icons = vec!["Github".to_string(), "X".to_string()];
        let urls = vec![" https://github.com/me ".to_string(), "".to_string()];
        let socials = socials_from_columns(&icons, &urls);
        assert_eq!(socials.len(), 1);
        assert_eq!(socials[0].url, "https://github.com/me");
    }
}
