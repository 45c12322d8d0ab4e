use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};

use super::AuthUser;
use crate::config::SiteConfig;
use crate::store::Backend;

const SESSION_COOKIE: &str = "folio_session";

pub const LOGIN_PATH: &str = "/gate-access";

// ── Client IP request guard ──

/// The client address used to key login attempts. Proxy headers are read
/// only when `trusted_proxy` is set, in this order:
///   1. CF-Connecting-IP
///   2. True-Client-IP
///   3. X-Real-IP
///   4. X-Forwarded-For (leftmost entry)
/// Otherwise, and as the last resort, the socket peer address.
pub struct ClientIp(pub String);

fn first_header_ip(request: &Request<'_>) -> Option<String> {
    let headers = request.headers();
    for name in ["CF-Connecting-IP", "True-Client-IP", "X-Real-IP"] {
        if let Some(ip) = headers.get_one(name).map(str::trim).filter(|ip| !ip.is_empty()) {
            return Some(ip.to_string());
        }
    }
    headers
        .get_one("X-Forwarded-For")
        .and_then(|fwd| fwd.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let trusted_proxy = request
            .rocket()
            .state::<SiteConfig>()
            .is_some_and(|c| c.trusted_proxy);
        let forwarded = if trusted_proxy {
            first_header_ip(request)
        } else {
            None
        };
        // `client_ip()` would honour Rocket's `ip_header`, so read the peer.
        let ip = forwarded.unwrap_or_else(|| {
            request
                .remote()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        });
        Outcome::Success(ClientIp(ip))
    }
}

// ── Dashboard session guard ──

/// Guard: a live session with the hosted auth service.
/// Missing cookie, missing auth service and a failed check all forward 401.
pub struct AdminSession {
    pub user: AuthUser,
    pub access_token: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session(request).await {
            Some(session) => Outcome::Success(session),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

async fn resolve_session(request: &Request<'_>) -> Option<AdminSession> {
    let backend = request.guard::<&State<Backend>>().await.succeeded()?;
    let auth = backend.auth()?;
    let cookies = request.cookies();
    let token = cookies.get_private(SESSION_COOKIE)?.value().to_string();

    match auth.get_user(&token).await {
        Ok(user) => Some(AdminSession {
            user,
            access_token: token,
        }),
        Err(e) => {
            log::info!("Dashboard session rejected: {}", e);
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            None
        }
    }
}

/// Reads the session token without validating it (used by logout).
pub fn session_token(cookies: &CookieJar<'_>) -> Option<String> {
    cookies
        .get_private(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, access_token: &str) {
    let mut cookie = Cookie::new(SESSION_COOKIE, access_token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

/// Rate-limiter key for a client address.
pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_ips_are_stable_and_opaque() {
        let a = hash_ip("203.0.113.9");
        assert_eq!(a, hash_ip("203.0.113.9"));
        assert_ne!(a, hash_ip("203.0.113.10"));
        assert_eq!(a.len(), 64);
        assert!(!a.contains("203"));
    }
}
