#[macro_use]
extern crate rocket;

use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::{Build, Request, Rocket};
use rocket_dyn_templates::Template;

mod boot;
mod branding;
mod config;
mod data;
mod images;
mod models;
mod pagination;
mod rate_limit;
mod render;
mod routes;
mod security;
mod store;

#[cfg(test)]
mod tests;

use branding::BrandingState;
use config::SiteConfig;
use rate_limit::RateLimiter;
use security::auth::LOGIN_PATH;
use store::Backend;

pub struct NoCacheDashboard;

#[rocket::async_trait]
impl Fairing for NoCacheDashboard {
    fn info(&self) -> Info {
        Info { name: "No-Cache Dashboard Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut rocket::Response<'r>) {
        let path = req.uri().path();
        if path.starts_with("/dashboard") || path.starts_with(LOGIN_PATH) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

/// Resolves the site branding once the server is up.
fn branding_fairing() -> AdHoc {
    AdHoc::on_liftoff("Branding", |rocket| {
        Box::pin(async move {
            let (Some(backend), Some(state), Some(config)) = (
                rocket.state::<Backend>(),
                rocket.state::<BrandingState>(),
                rocket.state::<SiteConfig>(),
            ) else {
                return;
            };
            state.refresh(&backend.data, &config.branding).await;
            log::info!("Branding resolved: {}", state.get().site_title);
        })
    })
}

#[catch(401)]
fn unauthorized() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> RawHtml<String> {
    RawHtml(routes::public::not_found_page(req))
}

#[catch(500)]
fn server_error(req: &Request<'_>) -> RawHtml<String> {
    RawHtml(routes::public::server_error_page(req))
}

/// The full application around an already-wired backend.
pub fn build(config: SiteConfig, backend: Backend) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("template_dir", "website/templates"));
    let branding = BrandingState::new(config.branding.clone());

    rocket::custom(figment)
        .manage(backend)
        .manage(branding)
        .manage(RateLimiter::default())
        .manage(config)
        .attach(Template::fairing())
        .attach(branding_fairing())
        .attach(NoCacheDashboard)
        .mount("/static", FileServer::from("website/static"))
        .mount("/", routes::public::routes())
        .mount("/", routes::auth::routes())
        .mount("/api", routes::api::routes())
        .mount("/dashboard", routes::admin::routes())
        .register("/", catchers![unauthorized, not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let config = match SiteConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Verify directories and critical files before launch
    boot::run(&config);

    let backend = Backend::from_config(&config);
    log::info!("Data mode: {}", config.data_mode);
    build(config, backend)
}
