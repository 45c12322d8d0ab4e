use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{flash_result, page_context, stores};
use crate::branding::{Branding, BrandingState};
use crate::config::SiteConfig;
use crate::images::{self, FOLDER_BRANDING};
use crate::models::settings::{socials_from_columns, BrandImage, LandingForm, LandingSettings};
use crate::security::auth::AdminSession;
use crate::store::Backend;

const LANDING: &str = "/dashboard/landing";

#[get("/landing")]
pub async fn landing_page(
    session: AdminSession,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = page_context("Landing Page", "landing", &session, flash);
    let settings = match stores(backend, &session) {
        Ok(s) => LandingSettings::load(s.remote.as_ref()).await,
        Err(e) => Err(e),
    };
    match settings {
        Ok(settings) => context["settings"] = json!(settings),
        Err(e) => {
            log::error!("Landing settings unavailable: {}", e);
            context["settings"] = json!(LandingSettings::default());
            context["load_error"] = json!(e.to_string());
        }
    }
    context["themes"] = json!(["dark", "light"]);
    Template::render("admin/landing", &context)
}

#[derive(FromForm)]
pub struct LandingFormData<'f> {
    pub greeting: String,
    pub title: String,
    pub site_title: String,
    pub description: String,
    pub default_theme: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub social_icon: Vec<String>,
    pub social_url: Vec<String>,
    pub logo: Option<TempFile<'f>>,
    pub favicon: Option<TempFile<'f>>,
}

#[post("/landing", data = "<form>")]
pub async fn landing_save(
    session: AdminSession,
    backend: &State<Backend>,
    branding: &State<BrandingState>,
    config: &State<SiteConfig>,
    form: Form<LandingFormData<'_>>,
) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let logo = images::store_upload(s.storage.as_ref(), form.logo.as_ref(), FOLDER_BRANDING).await?;
        let favicon =
            images::store_upload(s.storage.as_ref(), form.favicon.as_ref(), FOLDER_BRANDING).await?;

        let landing = LandingForm {
            greeting: form.greeting.trim().to_string(),
            title: form.title.trim().to_string(),
            site_title: form.site_title.trim().to_string(),
            description: form.description.trim().to_string(),
            logo_url: logo.or_else(|| form.logo_url.clone()).unwrap_or_default(),
            favicon_url: favicon.or_else(|| form.favicon_url.clone()).unwrap_or_default(),
            default_theme: form.default_theme.trim().to_lowercase(),
            socials: socials_from_columns(&form.social_icon, &form.social_url),
        };
        LandingSettings::save(s.remote.as_ref(), &landing).await?;

        let saved = LandingSettings {
            title: landing.title,
            site_title: landing.site_title,
            favicon_url: landing.favicon_url,
            default_theme: landing.default_theme,
            ..Default::default()
        };
        branding.set(Branding::from_settings(&saved, &config.branding), true);
        Ok::<_, images::UploadError>("Landing page saved.".to_string())
    }
    .await;
    flash_result(LANDING.to_string(), result, "save the landing page")
}

#[post("/landing/image/<slot>/delete")]
pub async fn landing_image_delete(
    session: AdminSession,
    backend: &State<Backend>,
    branding: &State<BrandingState>,
    config: &State<SiteConfig>,
    slot: &str,
) -> Option<Flash<Redirect>> {
    let slot = BrandImage::parse(slot)?;
    let result = async {
        let s = stores(backend, &session)?;
        let settings = LandingSettings::load(s.remote.as_ref()).await?;
        let current = settings.image(slot).to_string();
        LandingSettings::clear_image(s.remote.as_ref(), s.storage.as_ref(), slot, &current).await?;

        if slot == BrandImage::Favicon {
            let cleared = LandingSettings {
                favicon_url: String::new(),
                ..settings
            };
            branding.set(Branding::from_settings(&cleared, &config.branding), true);
        }
        Ok::<_, crate::store::StoreError>(format!("{} removed.", slot.label()))
    }
    .await;
    Some(flash_result(LANDING.to_string(), result, "remove the image"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![landing_page, landing_save, landing_image_delete]
}
