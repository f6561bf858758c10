use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use stockbook_shared::ActionResponse;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store connectivity error: {0}")]
    Connectivity(String),

    #[error("Schema error: {table} has no '{column}' column")]
    Schema { table: String, column: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate submission: {0}")]
    Duplicate(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn schema(table: impl Into<String>, column: impl Into<String>) -> Self {
        AppError::Schema {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Message shown to the person using the app. Technical detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Connectivity(_) | AppError::Http(_) => {
                "Could not reach the spreadsheet store. Check your credentials and sheet URLs."
                    .to_string()
            }
            AppError::Schema { table, column } => {
                format!("The {} sheet is missing the '{}' column.", table, column)
            }
            AppError::Validation(_) => {
                "Invalid request data. Please refresh the page and try again.".to_string()
            }
            AppError::NotFound(msg) | AppError::Duplicate(msg) => msg.clone(),
            _ => "An internal error occurred. Please check the logs.".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Connectivity(_)
            | AppError::Http(_)
            | AppError::Schema { .. }
            | AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::Duplicate(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        HttpResponse::build(status).json(ActionResponse::failed(self.user_message()))
    }
}
