use rocket::http::uri::Origin;
use rocket::http::{CookieJar, Status};
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::{Request, State};

use crate::branding::{self, Branding, BrandingState, PageTheme, Theme, THEME_COOKIE};
use crate::models::about::AboutMe;
use crate::models::portfolio::{self, TAB_ALL};
use crate::models::settings::{BannerPage, LandingSettings};
use crate::models::RowId;
use crate::pagination::{self, Paginated};
use crate::render::{self, Chrome, Nav};
use crate::store::Backend;

/// Public listings show this many records per page.
pub const PER_PAGE: usize = 6;

fn chrome<'a>(page: &'a PageTheme, nav: Nav, path: &'a str) -> Chrome<'a> {
    Chrome {
        branding: &page.branding,
        theme: page.theme,
        nav,
        path,
        now_millis: chrono::Utc::now().timestamp_millis(),
    }
}

async fn landing_or_default(backend: &Backend) -> LandingSettings {
    backend.data.landing().await.unwrap_or_else(|e| {
        log::error!("Landing settings unavailable: {}", e);
        LandingSettings::default()
    })
}

/// `tab` if it names a known category, `All` otherwise.
fn active_tab(tabs: &[String], tab: Option<&str>) -> String {
    tab.filter(|t| tabs.iter().any(|known| known == t))
        .unwrap_or(TAB_ALL)
        .to_string()
}

// ── Home ───────────────────────────────────────────────

#[get("/?<tab>")]
pub async fn home(
    backend: &State<Backend>,
    page: PageTheme,
    uri: &Origin<'_>,
    tab: Option<&str>,
) -> RawHtml<String> {
    let settings = landing_or_default(backend).await;
    let items = backend.data.portfolios().await.unwrap_or_else(|e| {
        log::error!("Portfolio unavailable: {}", e);
        Vec::new()
    });

    let tabs = portfolio::category_tabs(&items);
    let active = active_tab(&tabs, tab);
    let shown: Vec<_> = portfolio::filter_by_tab(items, &active)
        .into_iter()
        .take(PER_PAGE)
        .collect();

    let path = uri.to_string();
    RawHtml(render::home(
        &chrome(&page, Nav::Home, &path),
        &settings,
        &tabs,
        &active,
        &shown,
    ))
}

// ── Portfolio ──────────────────────────────────────────

#[get("/portfolio?<tab>&<page>")]
pub async fn portfolio_page(
    backend: &State<Backend>,
    theme: PageTheme,
    uri: &Origin<'_>,
    tab: Option<&str>,
    page: Option<usize>,
) -> RawHtml<String> {
    let settings = landing_or_default(backend).await;
    let items = backend.data.portfolios().await.unwrap_or_else(|e| {
        log::error!("Portfolio unavailable: {}", e);
        Vec::new()
    });

    let tabs = portfolio::category_tabs(&items);
    let active = active_tab(&tabs, tab);
    let filtered = portfolio::filter_by_tab(items, &active);
    let paged = pagination::paginate(&filtered, page.unwrap_or(1), PER_PAGE);

    let path = uri.to_string();
    RawHtml(render::portfolio(
        &chrome(&theme, Nav::Portfolio, &path),
        &settings.banner(BannerPage::Portfolio),
        &tabs,
        &active,
        &paged,
    ))
}

// ── Blog ───────────────────────────────────────────────

#[get("/blog?<page>")]
pub async fn blog_page(
    backend: &State<Backend>,
    theme: PageTheme,
    uri: &Origin<'_>,
    page: Option<usize>,
) -> RawHtml<String> {
    let page = page.unwrap_or(1);
    let settings = landing_or_default(backend).await;
    let posts = backend
        .data
        .blog_page(page, PER_PAGE)
        .await
        .unwrap_or_else(|e| {
            log::error!("Blog unavailable: {}", e);
            Paginated::from_window(Vec::new(), page, PER_PAGE, 0)
        });

    let path = uri.to_string();
    RawHtml(render::blog_list(
        &chrome(&theme, Nav::Blog, &path),
        &settings.banner(BannerPage::Blog),
        &posts,
    ))
}

#[get("/blog/<id>")]
pub async fn blog_detail(
    backend: &State<Backend>,
    theme: PageTheme,
    uri: &Origin<'_>,
    id: RowId,
) -> Result<RawHtml<String>, Status> {
    let post = match backend.data.blog_by_id(&id).await {
        Ok(Some(post)) => post,
        Ok(None) => return Err(Status::NotFound),
        Err(e) => {
            log::error!("Blog post {} unavailable: {}", id, e);
            return Err(Status::NotFound);
        }
    };
    let path = uri.to_string();
    Ok(RawHtml(render::blog_detail(
        &chrome(&theme, Nav::Blog, &path),
        &post,
    )))
}

// ── About ──────────────────────────────────────────────

#[get("/about")]
pub async fn about_page(
    backend: &State<Backend>,
    theme: PageTheme,
    uri: &Origin<'_>,
) -> RawHtml<String> {
    let about = backend.data.about().await.unwrap_or_else(|e| {
        log::error!("About profile unavailable: {}", e);
        AboutMe::default()
    });
    let path = uri.to_string();
    RawHtml(render::about(&chrome(&theme, Nav::About, &path), &about))
}

// ── Theme toggle ───────────────────────────────────────

/// Only same-site absolute paths are followed.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

#[get("/theme/<theme>?<next>")]
pub fn set_theme(cookies: &CookieJar<'_>, theme: &str, next: Option<&str>) -> Option<Redirect> {
    let theme = Theme::parse(theme)?;
    branding::set_visitor_theme(cookies, theme);
    Some(Redirect::to(safe_next(next).to_string()))
}

// ── Catcher pages ──────────────────────────────────────

/// Branding and theme for catchers, which can't run async guards.
fn catcher_theme(req: &Request<'_>) -> PageTheme {
    let branding = req
        .rocket()
        .state::<BrandingState>()
        .map(BrandingState::get)
        .unwrap_or_else(Branding::default);
    let theme = req
        .cookies()
        .get(THEME_COOKIE)
        .and_then(|c| Theme::parse(c.value()))
        .unwrap_or(branding.default_theme);
    PageTheme { theme, branding }
}

pub fn not_found_page(req: &Request<'_>) -> String {
    let page = catcher_theme(req);
    let path = req.uri().to_string();
    render::not_found(&chrome(&page, Nav::None, &path))
}

pub fn server_error_page(req: &Request<'_>) -> String {
    let page = catcher_theme(req);
    render::server_error(&chrome(&page, Nav::None, "/"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        home,
        portfolio_page,
        blog_page,
        blog_detail,
        about_page,
        set_theme
    ]
}
