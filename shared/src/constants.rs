use rust_decimal::Decimal;
use std::time::Duration;

// Sale economics
pub const TITHE_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2); // 0.10

// Cost basis is stored with this many decimal places
pub const COST_PER_UNIT_SCALE: u32 = 4;

// Duplicate-submission guard
pub const DUPLICATE_SUBMISSION_WINDOW: Duration = Duration::from_secs(2 * 60);
pub const MONEY_MATCH_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

// Sheet cell formats
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const INVOICE_DATE_STAMP_FORMAT: &str = "%Y%m%d";

// Invoice numbering
pub const INVOICE_NUMBER_PREFIX: &str = "INV";
pub const INVOICE_SUFFIX_LEN: usize = 6;

// Input limits
pub const MAX_INVOICE_LINE_ITEMS: usize = 200;
pub const MAX_QUANTITY: i64 = 1_000_000;
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
