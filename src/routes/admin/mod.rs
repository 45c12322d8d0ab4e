use std::sync::Arc;

use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use serde_json::{json, Value};

use crate::images::{self, UploadError, FOLDER_BANNER};
use crate::models::settings::{BannerPage, LandingSettings, PageBanner};
use crate::security::auth::{AdminSession, LOGIN_PATH};
use crate::store::{Backend, ObjectStore, RemoteStore, StoreError};

pub mod about;
pub mod blog;
pub mod landing;
pub mod portfolio;

/// Dashboard lists show this many records per page.
pub const ADMIN_PER_PAGE: usize = 8;

/// Store handles acting as the signed-in user.
pub(crate) struct Stores {
    pub remote: Arc<dyn RemoteStore>,
    pub storage: Arc<dyn ObjectStore>,
}

pub(crate) fn stores(backend: &Backend, session: &AdminSession) -> Result<Stores, StoreError> {
    Ok(Stores {
        remote: backend.remote_as(&session.access_token)?,
        storage: backend.storage_as(&session.access_token)?,
    })
}

/// Base template context shared by every dashboard page.
pub(crate) fn page_context(
    title: &str,
    section: &str,
    session: &AdminSession,
    flash: Option<FlashMessage<'_>>,
) -> Value {
    let mut context = json!({
        "page_title": title,
        "section": section,
        "user_email": session.user.display_name(),
    });
    if let Some(ref f) = flash {
        context["flash_kind"] = json!(f.kind());
        context["flash_msg"] = json!(f.message());
    }
    context
}

/// Turns a write result into the flash redirect the dashboard answers with.
pub(crate) fn flash_result<E: std::fmt::Display>(
    to: String,
    result: Result<String, E>,
    action: &str,
) -> Flash<Redirect> {
    match result {
        Ok(msg) => Flash::success(Redirect::to(to), msg),
        Err(e) => {
            log::warn!("Dashboard {} failed: {}", action, e);
            Flash::error(Redirect::to(to), format!("Could not {}: {}", action, e))
        }
    }
}

/// Listing-page banner editor, shared by the portfolio and blog dashboards.
#[derive(FromForm)]
pub struct BannerFormData<'f> {
    pub banner_url: Option<String>,
    pub banner_title: String,
    pub banner_description: String,
    pub banner: Option<TempFile<'f>>,
}

pub(crate) async fn save_banner(
    backend: &Backend,
    session: &AdminSession,
    page: BannerPage,
    form: &BannerFormData<'_>,
) -> Result<String, UploadError> {
    let s = stores(backend, session)?;
    let uploaded =
        images::store_upload(s.storage.as_ref(), form.banner.as_ref(), FOLDER_BANNER).await?;
    let banner = PageBanner {
        url: uploaded
            .or_else(|| form.banner_url.clone())
            .unwrap_or_default(),
        title: form.banner_title.trim().to_string(),
        description: form.banner_description.trim().to_string(),
    };
    LandingSettings::save_banner(s.remote.as_ref(), page, &banner).await?;
    Ok("Page banner saved.".to_string())
}

/// Drops the listing banner image, shared by the portfolio and blog dashboards.
pub(crate) async fn clear_banner_image(
    backend: &Backend,
    session: &AdminSession,
    page: BannerPage,
) -> Result<String, StoreError> {
    let s = stores(backend, session)?;
    let settings = LandingSettings::load(s.remote.as_ref()).await?;
    let current = settings.banner(page).url;
    LandingSettings::clear_banner_image(s.remote.as_ref(), s.storage.as_ref(), page, &current).await?;
    Ok("Banner image removed.".to_string())
}

#[get("/")]
pub fn dashboard_home(_session: AdminSession) -> Redirect {
    Redirect::to("/dashboard/landing")
}

/// Any dashboard GET that failed the session guard.
#[get("/<_path..>", rank = 99)]
pub fn redirect_to_login(_path: std::path::PathBuf) -> Redirect {
    Redirect::to(LOGIN_PATH)
}

pub fn routes() -> Vec<rocket::Route> {
    let mut all = routes![dashboard_home, redirect_to_login];
    all.extend(landing::routes());
    all.extend(portfolio::routes());
    all.extend(blog::routes());
    all.extend(about::routes());
    all
}
