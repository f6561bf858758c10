pub mod health;
pub mod inventory;
pub mod invoices;
pub mod sales;

use actix_web::{get, http::header, HttpResponse};

#[get("/")]
pub async fn index() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/inventory"))
        .finish()
}
