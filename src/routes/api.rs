use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;

use crate::data::Resource;
use crate::store::Backend;

/// Normalized records of one resource, resolved the same way the pages are.
#[get("/items/<resource>")]
pub async fn items(backend: &State<Backend>, resource: &str) -> Result<Json<Vec<Value>>, Status> {
    let resource = Resource::parse(resource).ok_or(Status::NotFound)?;
    match backend.data.get_items(resource).await {
        Ok(rows) => Ok(Json(rows)),
        Err(e) => {
            log::error!("API {}: {}", resource.name(), e);
            Err(Status::ServiceUnavailable)
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![items]
}
