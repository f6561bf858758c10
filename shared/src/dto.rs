use crate::constants::MAX_AMOUNT;
use crate::types::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn default_quantity() -> i64 {
    1
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    if *value > MAX_AMOUNT {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

// Inventory DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddProductRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub product_name: String,

    #[serde(default)]
    #[validate(custom = "validate_amount")]
    pub total_price: Decimal,

    #[serde(default)]
    #[validate(custom = "validate_amount")]
    pub shipping_admin_fee: Decimal,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 0, max = 1000000))]
    pub quantity: i64,

    #[validate(length(max = 255))]
    pub supplier: Option<String>,

    #[validate(length(max = 2000))]
    pub remarks: Option<String>,

    pub status: Option<LotStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub product_id: RecordRef,

    pub status: LotStatus,

    #[validate(custom = "validate_amount")]
    pub selling_price: Option<Decimal>,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 0, max = 1000000))]
    pub quantity_used: i64,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub remarks: String,
}

// Sales DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTitheStatusRequest {
    pub item_id: RecordRef,

    #[serde(default)]
    pub tithe_kept: bool,
}

// Invoice DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvoiceLineItem {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,

    #[serde(default)]
    #[validate(custom = "validate_amount")]
    pub price: Decimal,

    #[serde(default)]
    #[validate(range(min = 0, max = 1000000))]
    pub quantity: i64,

    #[validate(custom = "validate_amount")]
    pub subtotal: Option<Decimal>,
}

impl InvoiceLineItem {
    /// The client-computed subtotal when present, otherwise price × quantity.
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        match self.subtotal {
            Some(subtotal) => Some(subtotal),
            None => self.price.checked_mul(Decimal::from(self.quantity)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub customer_name: String,

    #[serde(default)]
    #[validate]
    pub items: Vec<InvoiceLineItem>,

    #[serde(default)]
    #[validate(custom = "validate_amount")]
    pub shipment_fee: Decimal,

    #[serde(default)]
    #[validate(custom = "validate_amount")]
    pub total_amount: Decimal,

    pub invoice_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeleteInvoiceRequest {
    #[validate(length(min = 1), custom = "validate_not_blank")]
    pub invoice_number: String,
}

// Common responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreatedResponse {
    pub success: bool,
    pub message: String,
    pub invoice_number: String,
}
