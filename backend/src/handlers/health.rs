use crate::store::Store;
use actix_web::{get, web, HttpResponse, Result};
use serde_json::json;

#[get("/health")]
pub async fn health_check(store: web::Data<Store>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "stockbook-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "store": store.backend_name()
    })))
}
