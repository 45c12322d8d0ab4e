use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::rate_limit::RateLimiter;
use crate::security::auth::{self, AdminSession, ClientIp, LOGIN_PATH};
use crate::store::Backend;

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[get("/gate-access")]
pub fn login_page(
    session: Option<AdminSession>,
    backend: &State<Backend>,
    flash: Option<FlashMessage<'_>>,
) -> Result<Template, Redirect> {
    if session.is_some() {
        return Err(Redirect::to("/dashboard"));
    }
    let mut context = json!({
        "page_title": "Sign in",
        "auth_available": backend.auth().is_some(),
    });
    if let Some(ref f) = flash {
        context["flash_kind"] = json!(f.kind());
        context["flash_msg"] = json!(f.message());
    }
    Ok(Template::render("admin/login", &context))
}

#[get("/login")]
pub fn login_alias() -> Redirect {
    Redirect::permanent(LOGIN_PATH)
}

#[post("/gate-access", data = "<form>")]
pub async fn login_submit(
    form: Form<LoginForm>,
    backend: &State<Backend>,
    limiter: &State<RateLimiter>,
    cookies: &CookieJar<'_>,
    client_ip: ClientIp,
) -> Result<Redirect, Flash<Redirect>> {
    let fail = |msg: &str| Flash::error(Redirect::to(LOGIN_PATH), msg);
    let rate_key = auth::hash_ip(&client_ip.0);

    if !limiter.check_and_record(&rate_key) {
        log::warn!("Login rate limit hit for {}", client_ip.0);
        return Err(fail("Locked: wait 5 minutes."));
    }

    let provider = match backend.auth() {
        Some(p) => p,
        None => {
            log::warn!("Login attempted but no auth service is configured");
            return Err(fail("Access denied."));
        }
    };

    match provider.sign_in(form.email.trim(), &form.password).await {
        Ok(session) => {
            limiter.reset(&rate_key);
            auth::set_session_cookie(cookies, &session.access_token);
            log::info!("Dashboard sign-in: {}", session.user.display_name());
            Ok(Redirect::to("/dashboard"))
        }
        Err(e) => {
            log::warn!("Dashboard sign-in failed: {}", e);
            Err(fail(e.user_message()))
        }
    }
}

#[post("/logout")]
pub async fn logout(backend: &State<Backend>, cookies: &CookieJar<'_>) -> Redirect {
    if let (Some(provider), Some(token)) = (backend.auth(), auth::session_token(cookies)) {
        if let Err(e) = provider.sign_out(&token).await {
            log::warn!("Sign-out request failed: {}", e);
        }
    }
    auth::clear_session_cookie(cookies);
    Redirect::to(LOGIN_PATH)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login_page, login_alias, login_submit, logout]
}
