use crate::error::AppError;
use crate::schema::coerce;
use crate::services::invoice_service::{InvoiceService, InvoicesOverview};
use crate::utils::validation::validation_errors_to_app_error;
use actix_web::{get, post, web, HttpResponse};
use chrono::Local;
use stockbook_shared::{ActionResponse, CreateInvoiceRequest, DeleteInvoiceRequest, InvoiceCreatedResponse};
use tracing::error;
use validator::Validate;

#[get("/invoices")]
pub async fn invoices_page(invoice_service: web::Data<InvoiceService>) -> HttpResponse {
    let overview = match invoice_service.invoices_overview().await {
        Ok(overview) => overview,
        Err(e) => {
            error!("Could not load invoices: {}", e);
            InvoicesOverview {
                today: coerce::format_date(Local::now().date_naive()),
                ..Default::default()
            }
        }
    };
    HttpResponse::Ok().json(overview)
}

#[post("/create_invoice")]
pub async fn create_invoice(
    request: web::Json<CreateInvoiceRequest>,
    invoice_service: web::Data<InvoiceService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let created = invoice_service.create_invoice(request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(InvoiceCreatedResponse {
        success: true,
        message: "Invoice created successfully".to_string(),
        invoice_number: created.invoice_number,
    }))
}

#[post("/delete_invoice")]
pub async fn delete_invoice(
    request: web::Json<DeleteInvoiceRequest>,
    invoice_service: web::Data<InvoiceService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    invoice_service.delete_invoice(&request.invoice_number).await?;

    Ok(HttpResponse::Ok().json(ActionResponse::ok("Invoice deleted successfully")))
}
