use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest};
use tracing::warn;
use validator::ValidationErrors;

use crate::error::AppError;

/// Largest JSON body accepted by the API.
pub const JSON_PAYLOAD_LIMIT: usize = 256 * 1024;

/// Collapse `validator` failures into a single validation error. The field
/// detail is kept for the logs; callers only ever see the generic message.
pub fn validation_errors_to_app_error(errors: ValidationErrors) -> AppError {
    let mut error_messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match error.code.as_ref() {
                "length" => "Invalid length",
                "range" => "Value out of range",
                "required" => "Field is required",
                "blank" => "Must not be blank",
                "negative_amount" => "Amount must not be negative",
                "amount_too_large" => "Amount is too large",
                _ => "Validation error",
            };

            error_messages.push(format!("{}: {}", field, message));
        }
    }

    for (field, nested) in errors.errors() {
        if let validator::ValidationErrorsKind::List(items) = nested {
            for (index, item_errors) in items {
                for (inner, inner_errors) in item_errors.field_errors() {
                    for error in inner_errors {
                        error_messages.push(format!("{}[{}].{}: {}", field, index, inner, error.code));
                    }
                }
            }
        }
    }

    AppError::Validation(error_messages.join(", "))
}

/// Malformed JSON bodies (bad ids, wrong types, unknown statuses) become
/// validation errors so they get the same 400 response as rule failures.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected JSON body for {}: {}", req.path(), err);
    AppError::Validation(err.to_string()).into()
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_PAYLOAD_LIMIT)
        .error_handler(json_error_handler)
}
