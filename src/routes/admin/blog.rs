use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{
    clear_banner_image, flash_result, page_context, save_banner, stores, BannerFormData,
    ADMIN_PER_PAGE,
};
use crate::images::{self, UploadError, FOLDER_BLOG};
use crate::models::blog::{BlogForm, BlogPost};
use crate::models::settings::{BannerPage, LandingSettings};
use crate::models::RowId;
use crate::pagination;
use crate::security::auth::AdminSession;
use crate::store::{Backend, StoreError};

const LIST: &str = "/dashboard/blog";

#[get("/blog?<page>")]
pub async fn blog_list(
    session: AdminSession,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
    page: Option<usize>,
) -> Template {
    let mut context = page_context("Blog", "blog", &session, flash);

    let loaded = match stores(backend, &session) {
        Ok(s) => {
            let posts = BlogPost::list(s.remote.as_ref()).await;
            let settings = LandingSettings::load(s.remote.as_ref()).await;
            posts.map(|posts| (posts, settings.unwrap_or_default()))
        }
        Err(e) => Err(e),
    };
    let (posts, settings) = loaded.unwrap_or_else(|e| {
        log::error!("Blog list unavailable: {}", e);
        context["load_error"] = json!(e.to_string());
        (Vec::new(), LandingSettings::default())
    });

    let paged = pagination::paginate(&posts, page.unwrap_or(1), ADMIN_PER_PAGE);
    let rows: Vec<_> = paged
        .items
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "title": p.title,
                "slug": p.slug,
                "category": p.category,
                "banner_url": p.banner_url,
                "date": p.date(),
            })
        })
        .collect();
    context["posts"] = json!(rows);
    context["current_page"] = json!(paged.current_page);
    context["total_pages"] = json!(paged.total_pages);
    context["total"] = json!(paged.total);
    context["pages"] = json!((1..=paged.total_pages).collect::<Vec<_>>());
    context["banner"] = json!(settings.banner(BannerPage::Blog));
    context["banner_action"] = json!("/dashboard/blog/banner");
    Template::render("admin/blog_list", &context)
}

#[get("/blog/new")]
pub fn blog_new(session: AdminSession, flash: Option<FlashMessage<'_>>) -> Template {
    let mut context = page_context("New Post", "blog", &session, flash);
    context["post"] = json!(BlogPost::default());
    Template::render("admin/blog_edit", &context)
}

#[get("/blog/<id>/edit")]
pub async fn blog_edit(
    session: AdminSession,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
    id: RowId,
) -> Result<Template, Flash<Redirect>> {
    let found = match stores(backend, &session) {
        Ok(s) => BlogPost::find(s.remote.as_ref(), &id).await,
        Err(e) => Err(e),
    };
    let post = found.map_err(|e| {
        log::warn!("Blog {} unavailable: {}", id, e);
        Flash::error(Redirect::to(LIST), format!("Post not found: {}", e))
    })?;

    let mut context = page_context("Edit Post", "blog", &session, flash);
    context["post"] = json!(post);
    Ok(Template::render("admin/blog_edit", &context))
}

#[derive(FromForm)]
pub struct BlogFormData<'f> {
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub banner_url: Option<String>,
    pub banner: Option<TempFile<'f>>,
}

#[post("/blog", data = "<form>")]
pub async fn blog_save(
    session: AdminSession,
    backend: &State<Backend>,
    form: Form<BlogFormData<'_>>,
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
            images::store_upload(s.storage.as_ref(), form.banner.as_ref(), FOLDER_BLOG).await?;
        let post = BlogForm {
            title: form.title.clone(),
            content: form.content.clone(),
            category: form.category.clone(),
            banner_url: uploaded.or_else(|| form.banner_url.clone()).unwrap_or_default(),
        };
        let outcome = BlogPost::save(s.remote.as_ref(), id.as_ref(), &post).await?;
        Ok::<_, UploadError>(format!("Post {}.", outcome.verb()))
    }
    .await;

    match result {
        Ok(msg) => Flash::success(Redirect::to(LIST), msg),
        Err(e) => flash_result(back, Err(e), "save the post"),
    }
}

#[post("/blog/<id>/delete")]
pub async fn blog_delete(
    session: AdminSession,
    backend: &State<Backend>,
    id: RowId,
) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let post = BlogPost::find(s.remote.as_ref(), &id).await?;
        BlogPost::delete(s.remote.as_ref(), s.storage.as_ref(), &post).await?;
        Ok::<_, StoreError>(format!("Deleted \"{}\".", post.title))
    }
    .await;
    flash_result(LIST.to_string(), result, "delete the post")
}

#[post("/blog/<id>/banner/delete")]
pub async fn blog_post_banner_delete(
    session: AdminSession,
    backend: &State<Backend>,
    id: RowId,
) -> Flash<Redirect> {
    let result = async {
        let s = stores(backend, &session)?;
        let post = BlogPost::find(s.remote.as_ref(), &id).await?;
        BlogPost::clear_banner(s.remote.as_ref(), s.storage.as_ref(), &post).await?;
        Ok::<_, StoreError>("Banner removed.".to_string())
    }
    .await;
    flash_result(format!("{}/{}/edit", LIST, id), result, "remove the banner")
}

#[post("/blog/banner", data = "<form>")]
pub async fn blog_banner_save(
    session: AdminSession,
    backend: &State<Backend>,
    form: Form<BannerFormData<'_>>,
) -> Flash<Redirect> {
    let result = save_banner(backend, &session, BannerPage::Blog, &form).await;
    flash_result(LIST.to_string(), result, "save the banner")
}

#[post("/blog/banner/image/delete")]
pub async fn blog_banner_image_delete(
    session: AdminSession,
    backend: &State<Backend>,
) -> Flash<Redirect> {
    let result = clear_banner_image(backend, &session, BannerPage::Blog).await;
    flash_result(LIST.to_string(), result, "remove the banner image")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        blog_list,
        blog_new,
        blog_edit,
        blog_save,
        blog_delete,
        blog_post_banner_delete,
        blog_banner_save,
        blog_banner_image_delete
    ]
}
