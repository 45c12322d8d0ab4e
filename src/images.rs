use rand::distributions::Alphanumeric;
use rand::Rng;
use rocket::fs::TempFile;
use rocket::http::ContentType;
use rocket::tokio::io::AsyncReadExt;

use crate::store::{ObjectStore, StoreError};

/// Image extensions accepted for upload.
const ALLOWED_TYPES: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "avif"];

/// Bucket folders for each kind of upload.
pub const FOLDER_BRANDING: &str = "branding";
pub const FOLDER_PORTFOLIO: &str = "portfolio";
pub const FOLDER_BANNER: &str = "banner";
pub const FOLDER_BLOG: &str = "blog";
pub const FOLDER_PROFILE: &str = "profile";

/// Marker between the project URL and the object path in a public URL.
pub fn public_marker(bucket: &str) -> String {
    format!("/storage/v1/object/public/{}/", bucket)
}

/// Recover the object path from a public URL. URLs that don't point into
/// `bucket` (external images, static assets) yield `None`.
pub fn storage_path(url: &str, bucket: &str) -> Option<String> {
    let marker = public_marker(bucket);
    let (_, path) = url.split_once(&marker)?;
    let path = path.split(&['?', '#'][..]).next().unwrap_or_default();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// `<folder>/<unix-millis>-<random>.<ext>`
pub fn object_path(folder: &str, ext: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!(
        "{}/{}-{}.{}",
        folder,
        chrono::Utc::now().timestamp_millis(),
        suffix,
        ext
    )
}

pub fn is_allowed_image(ext: &str) -> bool {
    ALLOWED_TYPES.iter().any(|a| a.eq_ignore_ascii_case(ext))
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

fn upload_extension(file: &TempFile<'_>) -> Option<String> {
    let raw_name = file
        .raw_name()
        .map(|rn| rn.dangerous_unsafe_unsanitized_raw().as_str());
    pick_extension(file.content_type(), raw_name)
}

/// An `image/*` content type decides the extension; anything else
/// (`application/octet-stream`, missing) defers to the filename.
fn pick_extension(content_type: Option<&ContentType>, file_name: Option<&str>) -> Option<String> {
    let from_type = content_type
        .filter(|ct| ct.top() == "image")
        .and_then(|ct| ct.extension())
        .map(|e| e.to_string().to_lowercase());
    from_type.or_else(|| {
        file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, e)| e.to_lowercase())
            .filter(|e| !e.is_empty())
    })
}

async fn read_upload(file: &TempFile<'_>) -> std::io::Result<Vec<u8>> {
    let reader = file.open().await?;
    rocket::tokio::pin!(reader);
    let mut bytes = Vec::with_capacity(file.len() as usize);
    reader.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file type .{0} is not allowed")]
    NotAllowed(String),
    #[error("could not read upload: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Push an uploaded form file into the bucket and return its public URL.
/// An empty file input yields `Ok(None)`.
pub async fn store_upload(
    storage: &dyn ObjectStore,
    file: Option<&TempFile<'_>>,
    folder: &str,
) -> Result<Option<String>, UploadError> {
    let file = match file {
        Some(f) if f.len() > 0 => f,
        _ => return Ok(None),
    };
    let ext = upload_extension(file).unwrap_or_default();
    if !is_allowed_image(&ext) {
        return Err(UploadError::NotAllowed(ext));
    }

    let bytes = read_upload(file).await?;
    let path = object_path(folder, &ext);
    storage.upload(&path, bytes, content_type_for(&ext)).await?;
    log::info!("Uploaded {} to bucket {}", path, storage.bucket());
    Ok(Some(storage.public_url(&path)))
}

/// Delete the object behind a public URL. Returns whether anything was
/// removed; URLs outside the bucket are left alone.
pub async fn remove_by_url(storage: &dyn ObjectStore, url: &str) -> Result<bool, StoreError> {
    match storage_path(url, storage.bucket()) {
        Some(path) => {
            storage.remove(&[path]).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
