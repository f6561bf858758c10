use crate::error::AppError;
use crate::services::InventoryService;
use crate::utils::validation::validation_errors_to_app_error;
use actix_web::{get, post, web, HttpResponse};
use stockbook_shared::{ActionResponse, AddProductRequest, UpdateStatusRequest};
use tracing::{debug, error};
use validator::Validate;

/// Lots, per-product stock and product choices. A store failure is logged
/// and shown as an empty inventory.
#[get("/inventory")]
pub async fn inventory_page(inventory_service: web::Data<InventoryService>) -> HttpResponse {
    let overview = match inventory_service.inventory_overview().await {
        Ok(overview) => overview,
        Err(e) => {
            error!("Could not load inventory: {}", e);
            Default::default()
        }
    };
    debug!("Serving {} lots", overview.lots.len());
    HttpResponse::Ok().json(overview)
}

#[post("/add_product")]
pub async fn add_product(
    request: web::Json<AddProductRequest>,
    inventory_service: web::Data<InventoryService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    inventory_service.add_lot(request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ActionResponse::ok("Product added successfully")))
}

#[post("/update_status")]
pub async fn update_status(
    request: web::Json<UpdateStatusRequest>,
    inventory_service: web::Data<InventoryService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    inventory_service.transition_status(request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ActionResponse::ok("Status updated successfully")))
}
