use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use serde::{Deserialize, Serialize};

use crate::config::DataMode;
use crate::data::DataService;
use crate::models::settings::LandingSettings;

pub const THEME_COOKIE: &str = "theme";
pub const SYNCED_THEME_COOKIE: &str = "last_db_theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document-wide identity: `<title>`, favicon, the starting theme and the
/// name in the footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub site_title: String,
    pub favicon_url: String,
    pub default_theme: Theme,
    /// The hero title of the landing page.
    pub footer_title: String,
}

impl Default for Branding {
    fn default() -> Self {
        Branding {
            site_title: "Digital Soul".to_string(),
            favicon_url: "/static/favicon.svg".to_string(),
            default_theme: Theme::Dark,
            footer_title: "Digital Soul".to_string(),
        }
    }
}

impl Branding {
    /// Settings values where set, `defaults` for the blanks.
    pub fn from_settings(settings: &LandingSettings, defaults: &Branding) -> Branding {
        Branding {
            site_title: pick(&settings.site_title, &defaults.site_title),
            favicon_url: pick(&settings.favicon_url, &defaults.favicon_url),
            default_theme: Theme::parse(&settings.default_theme).unwrap_or(defaults.default_theme),
            footer_title: pick(&settings.title, &defaults.footer_title),
        }
    }

    /// Forced-JSON mode never asks the remote; any remote failure means defaults.
    pub async fn resolve(data: &DataService, defaults: &Branding) -> Branding {
        Self::fetch(data, defaults)
            .await
            .unwrap_or_else(|| defaults.clone())
    }

    /// `Some` only when the hosted settings row was read.
    async fn fetch(data: &DataService, defaults: &Branding) -> Option<Branding> {
        if data.mode() == DataMode::Json {
            return None;
        }
        match data.remote_landing().await {
            Ok(settings) => Some(Branding::from_settings(&settings, defaults)),
            Err(e) => {
                log::warn!("Branding unavailable ({}), using defaults", e);
                None
            }
        }
    }
}

fn pick(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Favicon `<link>` attributes: remote icons get a cache buster, and the
/// MIME type follows the extension.
pub fn favicon_link(favicon_url: &str, now_millis: i64) -> (String, &'static str) {
    let path = favicon_url.split(&['?', '#'][..]).next().unwrap_or(favicon_url);
    let mime = if path.to_ascii_lowercase().ends_with(".svg") {
        "image/svg+xml"
    } else {
        "image/png"
    };
    let href = if favicon_url.starts_with("http") {
        let sep = if favicon_url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", favicon_url, sep, now_millis)
    } else {
        favicon_url.to_string()
    };
    (href, mime)
}

/// Branding resolved at launch, overwritten when the landing settings are saved.
pub struct BrandingState {
    current: RwLock<Branding>,
    /// Theme stored remotely, if it could be read.
    remote_theme: RwLock<Option<Theme>>,
}

impl BrandingState {
    pub fn new(initial: Branding) -> Self {
        BrandingState {
            current: RwLock::new(initial),
            remote_theme: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Branding> {
        self.current.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Branding> {
        self.current.write().unwrap_or_else(|p| p.into_inner())
    }

    pub fn get(&self) -> Branding {
        self.read().clone()
    }

    pub fn remote_theme(&self) -> Option<Theme> {
        *self.remote_theme.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Re-read the branding from the data layer. Without the hosted row the
    /// configured defaults apply, except the footer, which follows whatever
    /// landing settings the pages themselves read.
    pub async fn refresh(&self, data: &DataService, defaults: &Branding) {
        match Branding::fetch(data, defaults).await {
            Some(branding) => self.set(branding, true),
            None => {
                let mut branding = defaults.clone();
                if let Ok(settings) = data.landing().await {
                    branding.footer_title = pick(&settings.title, &defaults.footer_title);
                }
                self.set(branding, false)
            }
        }
    }

    /// Replace the branding; `from_remote` records the stored theme for sync.
    pub fn set(&self, branding: Branding, from_remote: bool) {
        let theme = branding.default_theme;
        *self.write() = branding;
        *self.remote_theme.write().unwrap_or_else(|p| p.into_inner()) =
            from_remote.then_some(theme);
    }
}

/// What the page should render with, and which cookies to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeDecision {
    pub theme: Theme,
    /// A changed stored theme to remember in both cookies.
    pub sync: Option<Theme>,
}

/// A changed stored theme wins once; after that the visitor's choice sticks.
pub fn sync_theme(
    stored: Option<Theme>,
    visitor: Option<Theme>,
    last_synced: Option<Theme>,
    fallback: Theme,
) -> ThemeDecision {
    match stored {
        Some(db) if last_synced != Some(db) => ThemeDecision {
            theme: db,
            sync: Some(db),
        },
        Some(db) => ThemeDecision {
            theme: visitor.unwrap_or(db),
            sync: None,
        },
        None => ThemeDecision {
            theme: visitor.unwrap_or(fallback),
            sync: None,
        },
    }
}

fn theme_cookie(name: &'static str, theme: Theme) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, theme.as_str());
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn set_visitor_theme(cookies: &CookieJar<'_>, theme: Theme) {
    cookies.add(theme_cookie(THEME_COOKIE, theme));
}

/// Request guard: the theme and branding to render this page with.
pub struct PageTheme {
    pub theme: Theme,
    pub branding: Branding,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PageTheme {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let branding_state = match request.guard::<&State<BrandingState>>().await.succeeded() {
            Some(state) => state,
            None => {
                let branding = Branding::default();
                return Outcome::Success(PageTheme {
                    theme: branding.default_theme,
                    branding,
                });
            }
        };
        let branding = branding_state.get();
        let cookies = request.cookies();
        let read = |name: &str| cookies.get(name).and_then(|c| Theme::parse(c.value()));

        let decision = sync_theme(
            branding_state.remote_theme(),
            read(THEME_COOKIE),
            read(SYNCED_THEME_COOKIE),
            branding.default_theme,
        );
        if let Some(theme) = decision.sync {
            cookies.add(theme_cookie(THEME_COOKIE, theme));
            cookies.add(theme_cookie(SYNCED_THEME_COOKIE, theme));
        }
        Outcome::Success(PageTheme {
            theme: decision.theme,
            branding,
        })
    }
}
