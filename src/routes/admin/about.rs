use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{flash_result, page_context, stores};
use crate::images::{self, UploadError, FOLDER_PROFILE};
use crate::models::about::AboutMe;
use crate::security::auth::AdminSession;
use crate::store::{Backend, StoreError};

const ABOUT: &str = "/dashboard/about";

#[get("/about")]
pub async fn about_page(
    session: AdminSession,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = page_context("About Me", "about", &session, flash);
    let loaded = match stores(backend, &session) {
        Ok(s) => AboutMe::load(s.remote.as_ref()).await,
        Err(e) => Err(e),
    };
    match loaded {
        Ok(about) => context["about"] = json!(about),
        Err(e) => {
            log::error!("About profile unavailable: {}", e);
            context["about"] = json!(AboutMe::default());
            context["load_error"] = json!(e.to_string());
        }
    }
    Template::render("admin/about", &context)
}

#[derive(FromForm)]
pub struct AboutFormData<'f> {
    pub full_name: String,
    pub description: String,
    pub contact_email: String,
    pub portfolio_url: String,
    pub photo_url: Option<String>,
    pub photo: Option<TempFile<'f>>,
}

#[post("/about", data = "<form>")]
pub async fn about_save(
    session: AdminSession,
    backend: &State<Backend>,
    form: Form<AboutFormData<'_>>,
) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let uploaded =
            images::store_upload(s.storage.as_ref(), form.photo.as_ref(), FOLDER_PROFILE).await?;
        let about = AboutMe {
            id: None,
            full_name: form.full_name.clone(),
            description: form.description.clone(),
            contact_email: form.contact_email.clone(),
            photo_url: uploaded.or_else(|| form.photo_url.clone()).unwrap_or_default(),
            portfolio_url: form.portfolio_url.clone(),
        };
        about.save(s.remote.as_ref()).await?;
        Ok::<_, UploadError>("Profile saved.".to_string())
    }
    .await;
    flash_result(ABOUT.to_string(), result, "save the profile")
}

#[post("/about/photo/delete")]
pub async fn about_photo_delete(session: AdminSession, backend: &State<Backend>) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let about = AboutMe::load(s.remote.as_ref()).await?;
        AboutMe::clear_photo(s.remote.as_ref(), s.storage.as_ref(), &about.photo_url).await?;
        Ok::<_, StoreError>("Photo removed.".to_string())
    }
    .await;
    flash_result(ABOUT.to_string(), result, "remove the photo")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![about_page, about_save, about_photo_delete]
}
