use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{
    clear_banner_image, flash_result, page_context, save_banner, stores, BannerFormData,
    ADMIN_PER_PAGE,
};
use crate::images::{self, UploadError, FOLDER_PORTFOLIO};
use crate::models::portfolio::{self, PortfolioForm, PortfolioItem, Suggestions};
use crate::models::settings::{BannerPage, LandingSettings};
use crate::models::RowId;
use crate::pagination;
use crate::security::auth::AdminSession;
use crate::store::{Backend, StoreError};

const LIST: &str = "/dashboard/portfolio";

// ── Portfolio ──────────────────────────────────────────

#[get("/portfolio?<q>&<page>")]
pub async fn portfolio_list(
    session: AdminSession,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
    q: Option<&str>,
    page: Option<usize>,
) -> Template {
    let mut context = page_context("Portfolio", "portfolio", &session, flash);
    let query = q.unwrap_or("").trim();

    let loaded = match stores(backend, &session) {
        Ok(s) => {
            let items = PortfolioItem::list(s.remote.as_ref()).await;
            let settings = LandingSettings::load(s.remote.as_ref()).await;
            items.map(|items| (items, settings.unwrap_or_default()))
        }
        Err(e) => Err(e),
    };
    let (items, settings) = loaded.unwrap_or_else(|e| {
        log::error!("Portfolio list unavailable: {}", e);
        context["load_error"] = json!(e.to_string());
        (Vec::new(), LandingSettings::default())
    });

    let matches = portfolio::search(items, query);
    let paged = pagination::paginate(&matches, page.unwrap_or(1), ADMIN_PER_PAGE);
    context["items"] = json!(paged.items);
    context["current_page"] = json!(paged.current_page);
    context["total_pages"] = json!(paged.total_pages);
    context["total"] = json!(paged.total);
    context["pages"] = json!((1..=paged.total_pages).collect::<Vec<_>>());
    context["q"] = json!(query);
    context["banner"] = json!(settings.banner(BannerPage::Portfolio));
    context["banner_action"] = json!("/dashboard/portfolio/banner");
    Template::render("admin/portfolio_list", &context)
}

#[get("/portfolio/new")]
pub fn portfolio_new(session: AdminSession, flash: Option<FlashMessage<'_>>) -> Template {
    let mut context = page_context("New Project", "portfolio", &session, flash);
    context["item"] = json!(PortfolioItem::default());
    Template::render("admin/portfolio_edit", &context)
}

#[get("/portfolio/<id>/edit")]
pub async fn portfolio_edit(
    session: AdminSession,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
    id: RowId,
) -> Result<Template, Flash<Redirect>> {
    let found = match stores(backend, &session) {
        Ok(s) => PortfolioItem::find(s.remote.as_ref(), &id).await,
        Err(e) => Err(e),
    };
    let item = found.map_err(|e| {
        log::warn!("Portfolio {} unavailable: {}", id, e);
        Flash::error(Redirect::to(LIST), format!("Project not found: {}", e))
    })?;

    let mut context = page_context("Edit Project", "portfolio", &session, flash);
    context["tags_csv"] = json!(item.tags.join(", "));
    context["item"] = json!(item);
    Ok(Template::render("admin/portfolio_edit", &context))
}

#[derive(FromForm)]
pub struct PortfolioFormData<'f> {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    pub image_url: Option<String>,
    pub project_url: String,
    pub image: Option<TempFile<'f>>,
}

#[post("/portfolio", data = "<form>")]
pub async fn portfolio_save(
    session: AdminSession,
    backend: &State<Backend>,
    form: Form<PortfolioFormData<'_>>,
) -> Flash<Redirect> {
    let id = RowId::from_form(form.id.as_deref());
    let back = match &id {
        Some(id) => format!("{}/{}/edit", LIST, id),
        None => format!("{}/new", LIST),
    };
    if form.title.trim().is_empty() {
        return Flash::error(Redirect::to(back), "Title is required.");
    }

    let result = async {
        let s = stores(backend, &session)?;
        let uploaded =
            images::store_upload(s.storage.as_ref(), form.image.as_ref(), FOLDER_PORTFOLIO).await?;
        let item = PortfolioForm {
            title: form.title.trim().to_string(),
            description: form.description.trim().to_string(),
            category: form.category.trim().to_string(),
            tags: portfolio::parse_tags(&form.tags),
            image_url: uploaded.or_else(|| form.image_url.clone()).unwrap_or_default(),
            project_url: form.project_url.trim().to_string(),
        };
        let outcome = PortfolioItem::save(s.remote.as_ref(), id.as_ref(), &item).await?;
        Ok::<_, UploadError>(format!("Project {}.", outcome.verb()))
    }
    .await;

    match result {
        Ok(msg) => Flash::success(Redirect::to(LIST), msg),
        Err(e) => flash_result(back, Err(e), "save the project"),
    }
}

#[post("/portfolio/<id>/delete")]
pub async fn portfolio_delete(
    session: AdminSession,
    backend: &State<Backend>,
    id: RowId,
) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let item = PortfolioItem::find(s.remote.as_ref(), &id).await?;
        PortfolioItem::delete(s.remote.as_ref(), s.storage.as_ref(), &item).await?;
        Ok::<_, StoreError>(format!("Deleted \"{}\".", item.title))
    }
    .await;
    flash_result(LIST.to_string(), result, "delete the project")
}

#[post("/portfolio/<id>/image/delete")]
pub async fn portfolio_image_delete(
    session: AdminSession,
    backend: &State<Backend>,
    id: RowId,
) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let item = PortfolioItem::find(s.remote.as_ref(), &id).await?;
        PortfolioItem::clear_image(s.remote.as_ref(), s.storage.as_ref(), &item).await?;
        Ok::<_, StoreError>("Image removed.".to_string())
    }
    .await;
    flash_result(format!("{}/{}/edit", LIST, id), result, "remove the image")
}

#[post("/portfolio/banner", data = "<form>")]
pub async fn portfolio_banner_save(
    session: AdminSession,
    backend: &State<Backend>,
    form: Form<BannerFormData<'_>>,
) -> Flash<Redirect> {
    let result = save_banner(backend, &session, BannerPage::Portfolio, &form).await;
    flash_result(LIST.to_string(), result, "save the banner")
}

#[post("/portfolio/banner/image/delete")]
pub async fn portfolio_banner_image_delete(
    session: AdminSession,
    backend: &State<Backend>,
) -> Flash<Redirect> {
    let result = clear_banner_image(backend, &session, BannerPage::Portfolio).await;
    flash_result(LIST.to_string(), result, "remove the banner image")
}

/// Category and tag completions for the project form.
#[get("/portfolio/suggest?<category>&<tags>")]
pub async fn portfolio_suggest(
    session: AdminSession,
    backend: &State<Backend>,
    category: Option<&str>,
    tags: Option<&str>,
) -> Json<Suggestions> {
    let items = match stores(backend, &session) {
        Ok(s) => PortfolioItem::list(s.remote.as_ref()).await.unwrap_or_else(|e| {
            log::warn!("Suggestions unavailable: {}", e);
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };
    Json(portfolio::suggest(
        &items,
        category.unwrap_or(""),
        tags.unwrap_or(""),
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        portfolio_list,
        portfolio_new,
        portfolio_edit,
        portfolio_save,
        portfolio_delete,
        portfolio_image_delete,
        portfolio_banner_save,
        portfolio_banner_image_delete,
        portfolio_suggest
    ]
}
