use crate::branding::{favicon_link, Branding, Theme};
use crate::models::about::AboutMe;
use crate::models::blog::BlogPost;
use crate::models::portfolio::{PortfolioItem, TAB_ALL};
use crate::models::settings::{LandingSettings, PageBanner, SocialLink};
use crate::pagination::Paginated;

const EXCERPT_WORDS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Home,
    Portfolio,
    Blog,
    About,
    None,
}

/// Per-request document chrome: branding, theme and the active nav entry.
pub struct Chrome<'a> {
    pub branding: &'a Branding,
    pub theme: Theme,
    pub nav: Nav,
    /// Path of the current page, used by the theme toggle to come back.
    pub path: &'a str,
    pub now_millis: i64,
}

/// Wraps a page body in the site shell.
pub fn layout(chrome: &Chrome<'_>, page_title: &str, body: &str) -> String {
    let site = &chrome.branding.site_title;
    let title = if page_title.is_empty() || page_title == site {
        html_escape(site)
    } else {
        format!("{} | {}", html_escape(page_title), html_escape(site))
    };
    let (favicon_href, favicon_mime) = favicon_link(&chrome.branding.favicon_url, chrome.now_millis);
    let toggle = match chrome.theme {
        Theme::Light => Theme::Dark,
        Theme::Dark => Theme::Light,
    };

    let nav_link = |nav: Nav, href: &str, label: &str| {
        let class = if nav == chrome.nav { " class=\"active\"" } else { "" };
        format!("<a href=\"{}\"{}>{}</a>", href, class, label)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="icon" type="{favicon_mime}" href="{favicon_href}">
<link rel="stylesheet" href="/static/site.css">
</head>
<body class="theme-{theme}">
<header class="site-header">
<a class="brand" href="/">{site}</a>
<nav>{home}{portfolio}{blog}{about}</nav>
<a class="theme-toggle" href="/theme/{toggle}?next={next}">{toggle}</a>
</header>
<main>
{body}
</main>
<footer class="site-footer"><p>&copy; {year} {footer}</p></footer>
</body>
</html>"#,
        theme = chrome.theme,
        title = title,
        favicon_mime = favicon_mime,
        favicon_href = html_escape(&favicon_href),
        site = html_escape(site),
        footer = html_escape(&chrome.branding.footer_title),
        home = nav_link(Nav::Home, "/", "Home"),
        portfolio = nav_link(Nav::Portfolio, "/portfolio", "Portfolio"),
        blog = nav_link(Nav::Blog, "/blog", "Blog"),
        about = nav_link(Nav::About, "/about", "About"),
        toggle = toggle,
        next = url_encode(chrome.path),
        body = body,
        year = chrono::Utc::now().format("%Y"),
    )
}

pub fn home(
    chrome: &Chrome<'_>,
    settings: &LandingSettings,
    tabs: &[String],
    active_tab: &str,
    items: &[PortfolioItem],
) -> String {
    let mut html = String::from(r#"<section class="hero">"#);
    if !settings.logo_url.is_empty() {
        html.push_str(&format!(
            r#"<img class="hero-logo" src="{}" alt="">"#,
            html_escape(&settings.logo_url)
        ));
    }
    if !settings.greeting.is_empty() {
        html.push_str(&format!("<p class=\"greeting\">{}</p>", html_escape(&settings.greeting)));
    }
    html.push_str(&format!("<h1>{}</h1>", html_escape(&settings.title)));
    if !settings.description.is_empty() {
        html.push_str(&format!("<p class=\"lede\">{}</p>", html_escape(&settings.description)));
    }
    html.push_str(&build_social_links(&settings.socials));
    html.push_str("</section>\n");

    html.push_str(&build_tabs("/", tabs, active_tab));
    html.push_str(&render_portfolio_grid(items));
    html.push_str(r#"<p class="more"><a href="/portfolio">View all work &rarr;</a></p>"#);

    layout(chrome, &chrome.branding.site_title, &html)
}

pub fn portfolio(
    chrome: &Chrome<'_>,
    banner: &PageBanner,
    tabs: &[String],
    active_tab: &str,
    page: &Paginated<PortfolioItem>,
) -> String {
    let mut html = build_banner(banner, "Portfolio");
    html.push_str(&build_tabs("/portfolio", tabs, active_tab));
    html.push_str(&render_portfolio_grid(&page.items));

    let base = if active_tab == TAB_ALL {
        "/portfolio?".to_string()
    } else {
        format!("/portfolio?tab={}&", url_encode(active_tab))
    };
    html.push_str(&build_pagination(&base, page.current_page, page.total_pages));
    layout(chrome, "Portfolio", &html)
}

pub fn blog_list(chrome: &Chrome<'_>, banner: &PageBanner, page: &Paginated<BlogPost>) -> String {
    let mut html = build_banner(banner, "Blog");

    if page.items.is_empty() {
        html.push_str("<p class=\"empty\">No posts yet.</p>");
    } else {
        html.push_str(r#"<div class="blog-list">"#);
        for post in &page.items {
            let href = post
                .id
                .as_ref()
                .map(|id| format!("/blog/{}", url_encode(&id.to_string())))
                .unwrap_or_else(|| "/blog".to_string());
            html.push_str(r#"<article class="blog-card">"#);
            if !post.banner_url.is_empty() {
                html.push_str(&format!(
                    r#"<a href="{}"><img src="{}" alt="{}" loading="lazy"></a>"#,
                    href,
                    html_escape(&post.banner_url),
                    html_escape(&post.title)
                ));
            }
            html.push_str(&build_post_meta(post));
            html.push_str(&format!(
                "<h2><a href=\"{}\">{}</a></h2><p>{}</p>",
                href,
                html_escape(&post.title),
                html_escape(&post.excerpt(EXCERPT_WORDS))
            ));
            html.push_str("</article>");
        }
        html.push_str("</div>");
    }
    html.push_str(&build_pagination("/blog?", page.current_page, page.total_pages));
    layout(chrome, "Blog", &html)
}

/// Post content is dashboard-authored HTML and is emitted as-is.
pub fn blog_detail(chrome: &Chrome<'_>, post: &BlogPost) -> String {
    let mut html = String::from(r#"<article class="blog-single">"#);
    html.push_str(r#"<p><a href="/blog">&larr; All posts</a></p>"#);
    html.push_str(&format!("<h1>{}</h1>", html_escape(&post.title)));
    html.push_str(&build_post_meta(post));
    if !post.banner_url.is_empty() {
        html.push_str(&format!(
            r#"<img class="blog-banner" src="{}" alt="{}">"#,
            html_escape(&post.banner_url),
            html_escape(&post.title)
        ));
    }
    html.push_str(&format!("<div class=\"blog-content\">{}</div></article>", post.content));
    layout(chrome, &post.title, &html)
}

pub fn about(chrome: &Chrome<'_>, about: &AboutMe) -> String {
    let mut html = String::from(r#"<section class="about">"#);
    if !about.photo_url.is_empty() {
        html.push_str(&format!(
            r#"<img class="about-photo" src="{}" alt="{}">"#,
            html_escape(&about.photo_url),
            html_escape(&about.full_name)
        ));
    }
    let name = if about.full_name.is_empty() {
        "About"
    } else {
        about.full_name.as_str()
    };
    html.push_str(&format!("<h1>{}</h1>", html_escape(name)));
    for para in about.description.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        html.push_str(&format!("<p>{}</p>", html_escape(para).replace('\n', "<br>")));
    }

    let mut links = Vec::new();
    if !about.contact_email.is_empty() {
        links.push(format!(
            "<a href=\"mailto:{0}\">{0}</a>",
            html_escape(&about.contact_email)
        ));
    }
    if !about.portfolio_url.is_empty() {
        links.push(format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">Portfolio</a>",
            html_escape(&about.portfolio_url)
        ));
    }
    if !links.is_empty() {
        html.push_str(&format!("<p class=\"contact\">{}</p>", links.join(" · ")));
    }
    html.push_str("</section>");
    layout(chrome, "About", &html)
}

pub fn not_found(chrome: &Chrome<'_>) -> String {
    let body = r#"<div class="error-page">
    <h1>404</h1>
    <p>Page not found.</p>
    <a href="/">&larr; Back to home</a>
</div>"#;
    layout(chrome, "Not found", body)
}

pub fn server_error(chrome: &Chrome<'_>) -> String {
    let body = r#"<div class="error-page">
    <h1>500</h1>
    <p>Something went wrong.</p>
</div>"#;
    layout(chrome, "Error", body)
}

fn render_portfolio_grid(items: &[PortfolioItem]) -> String {
    if items.is_empty() {
        return "<p class=\"empty\">No portfolio items yet.</p>".to_string();
    }
    let mut html = String::from(r#"<div class="portfolio-grid">"#);
    for item in items {
        html.push_str(r#"<article class="grid-item">"#);
        if !item.image_url.is_empty() {
            html.push_str(&format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                html_escape(&item.image_url),
                html_escape(&item.title)
            ));
        }
        if !item.category.is_empty() {
            html.push_str(&format!(
                "<span class=\"category\">{}</span>",
                html_escape(&item.category)
            ));
        }
        let title = html_escape(&item.title);
        if item.project_url.is_empty() {
            html.push_str(&format!("<h3>{}</h3>", title));
        } else {
            html.push_str(&format!(
                "<h3><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></h3>",
                html_escape(&item.project_url),
                title
            ));
        }
        if !item.description.is_empty() {
            html.push_str(&format!("<p>{}</p>", html_escape(&item.description)));
        }
        if !item.tags.is_empty() {
            html.push_str(r#"<ul class="tags">"#);
            for tag in &item.tags {
                html.push_str(&format!("<li>{}</li>", html_escape(tag)));
            }
            html.push_str("</ul>");
        }
        html.push_str("</article>");
    }
    html.push_str("</div>");
    html
}

fn build_tabs(base: &str, tabs: &[String], active: &str) -> String {
    let mut html = String::from(r#"<nav class="tabs">"#);
    for tab in tabs {
        let href = if tab == TAB_ALL {
            base.to_string()
        } else {
            format!("{}?tab={}", base, url_encode(tab))
        };
        let class = if tab == active { " class=\"active\"" } else { "" };
        html.push_str(&format!("<a href=\"{}\"{}>{}</a>", href, class, html_escape(tab)));
    }
    html.push_str("</nav>");
    html
}

fn build_banner(banner: &PageBanner, fallback_title: &str) -> String {
    let title = if banner.title.is_empty() {
        fallback_title
    } else {
        banner.title.as_str()
    };
    let style = if banner.url.is_empty() {
        String::new()
    } else {
        format!(
            " style=\"background-image: url('{}')\"",
            html_escape(&banner.url)
        )
    };
    let mut html = format!("<section class=\"page-banner\"{}><h1>{}</h1>", style, html_escape(title));
    if !banner.description.is_empty() {
        html.push_str(&format!("<p>{}</p>", html_escape(&banner.description)));
    }
    html.push_str("</section>\n");
    html
}

fn build_post_meta(post: &BlogPost) -> String {
    let mut parts = Vec::new();
    if !post.category.is_empty() {
        parts.push(format!("<span class=\"category\">{}</span>", html_escape(&post.category)));
    }
    let date = post.date();
    if !date.is_empty() {
        parts.push(format!("<time>{}</time>", date));
    }
    if parts.is_empty() {
        return String::new();
    }
    format!("<div class=\"post-meta\">{}</div>", parts.join(" "))
}

fn build_social_links(socials: &[SocialLink]) -> String {
    let links: Vec<String> = socials
        .iter()
        .filter(|s| !s.url.is_empty())
        .map(|s| {
            let label = if s.icon.is_empty() { "Link" } else { s.icon.as_str() };
            format!(
                "<a href=\"{}\" data-icon=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                html_escape(&s.url),
                html_escape(&s.icon.to_ascii_lowercase()),
                html_escape(label)
            )
        })
        .collect();
    if links.is_empty() {
        return String::new();
    }
    format!("<div class=\"social-links\">{}</div>", links.join(""))
}

/// `base` ends in `?` or `&` so `page=` can be appended.
fn build_pagination(base: &str, current: usize, total: usize) -> String {
    if total <= 1 {
        return String::new();
    }
    let mut html = String::from(r#"<nav class="pagination">"#);
    if current > 1 {
        html.push_str(&format!(r#"<a href="{}page={}">&laquo; Prev</a>"#, base, current - 1));
    }
    for p in 1..=total {
        if p == current {
            html.push_str(&format!(r#"<span class="current">{}</span>"#, p));
        } else {
            html.push_str(&format!(r#"<a href="{}page={}">{}</a>"#, base, p, p));
        }
    }
    if current < total {
        html.push_str(&format!(r#"<a href="{}page={}">Next &raquo;</a>"#, base, current + 1));
    }
    html.push_str("</nav>");
    html
}

fn url_encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
