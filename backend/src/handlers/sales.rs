use crate::error::AppError;
use crate::services::SalesService;
use crate::utils::validation::validation_errors_to_app_error;
use actix_web::{get, post, web, HttpResponse};
use stockbook_shared::{ActionResponse, UpdateTitheStatusRequest};
use tracing::error;
use validator::Validate;

#[get("/sold")]
pub async fn sold_page(sales_service: web::Data<SalesService>) -> HttpResponse {
    let overview = match sales_service.sold_overview().await {
        Ok(overview) => overview,
        Err(e) => {
            error!("Could not load sold items: {}", e);
            Default::default()
        }
    };
    HttpResponse::Ok().json(overview)
}

#[get("/used_freebie")]
pub async fn used_freebie_page(sales_service: web::Data<SalesService>) -> HttpResponse {
    let overview = match sales_service.disposition_overview().await {
        Ok(overview) => overview,
        Err(e) => {
            error!("Could not load used/freebie items: {}", e);
            Default::default()
        }
    };
    HttpResponse::Ok().json(overview)
}

#[post("/update_tithe_status")]
pub async fn update_tithe_status(
    request: web::Json<UpdateTitheStatusRequest>,
    sales_service: web::Data<SalesService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    sales_service
        .set_tithe_kept(request.item_id, request.tithe_kept)
        .await?;

    Ok(HttpResponse::Ok().json(ActionResponse::ok("Tithe status updated")))
}
