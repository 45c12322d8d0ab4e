use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::{DataMode, SiteConfig};
use crate::store::json::{BLOG_FILE, CUSTOM_FILE, PORTFOLIO_FILE};

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "website",
    "website/static",
    "website/templates",
    "website/templates/admin",
];

/// Dashboard templates; the admin UI cannot render without these
const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/admin/base.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/admin/landing.html.tera",
    "website/templates/admin/portfolio_list.html.tera",
    "website/templates/admin/portfolio_edit.html.tera",
    "website/templates/admin/blog_list.html.tera",
    "website/templates/admin/blog_edit.html.tera",
    "website/templates/admin/about.html.tera",
];

const STATIC_ASSETS: &[&str] = &["website/static/site.css", "website/static/admin.css"];

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories, warns about missing files, and
/// aborts if critical dependencies are absent.
pub fn run(config: &SiteConfig) {
    info!("Folio boot check starting (data mode: {})...", config.data_mode);

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = Path::new(dir);
        if !path.exists() {
            match fs::create_dir_all(path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !Path::new(file).exists() {
            error!("  MISSING critical template: {}", file);
            errors += 1;
        }
    }

    // ── 3. Static assets ───────────────────────────────
    for file in STATIC_ASSETS {
        if !Path::new(file).exists() {
            warn!("  Missing static asset: {} (pages will be unstyled)", file);
            warnings += 1;
        }
    }

    // ── 4. Static data files ───────────────────────────
    // Only fatal when nothing else can serve the pages.
    for file in [PORTFOLIO_FILE, BLOG_FILE, CUSTOM_FILE] {
        let path = config.static_dir.join(file);
        if !path.exists() {
            if config.data_mode == DataMode::Json {
                error!("  MISSING static data file: {}", path.display());
                errors += 1;
            } else {
                warn!("  Missing static data file: {} (no fallback for it)", path.display());
                warnings += 1;
            }
        }
    }

    // ── 5. Remote store ────────────────────────────────
    if config.data_mode != DataMode::Json && !config.remote.is_configured() {
        warn!("  Remote store not configured; public pages will use static data");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}
