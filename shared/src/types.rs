use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

// Lot-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    InStock,
    Sold,
    Used,
    Freebie,
    Raffled,
}

impl LotStatus {
    /// Statuses that take units out of a lot's remaining quantity.
    pub fn consumes_stock(&self) -> bool {
        matches!(self, LotStatus::Sold | LotStatus::Used | LotStatus::Freebie)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::InStock => "in_stock",
            LotStatus::Sold => "sold",
            LotStatus::Used => "used",
            LotStatus::Freebie => "freebie",
            LotStatus::Raffled => "raffled",
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LotStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "in_stock" | "" => Ok(LotStatus::InStock),
            "sold" => Ok(LotStatus::Sold),
            "used" => Ok(LotStatus::Used),
            "freebie" => Ok(LotStatus::Freebie),
            "raffled" => Ok(LotStatus::Raffled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// Disposition-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionStatus {
    Used,
    Freebie,
}

impl DispositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionStatus::Used => "used",
            DispositionStatus::Freebie => "freebie",
        }
    }
}

impl fmt::Display for DispositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DispositionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "used" => Ok(DispositionStatus::Used),
            "freebie" => Ok(DispositionStatus::Freebie),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<LotStatus> for DispositionStatus {
    type Error = UnknownStatus;

    fn try_from(status: LotStatus) -> Result<Self, Self::Error> {
        match status {
            LotStatus::Used => Ok(DispositionStatus::Used),
            LotStatus::Freebie => Ok(DispositionStatus::Freebie),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Reference to a stored record: its stable id, or a zero-based row position
/// as returned by the most recent listing (accepted for older clients).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordRef {
    Id(Uuid),
    Position(usize),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Id(id) => write!(f, "{}", id),
            RecordRef::Position(position) => write!(f, "row {}", position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lot_status_parses_sheet_spellings() {
        assert_eq!("Sold".parse::<LotStatus>().unwrap(), LotStatus::Sold);
        assert_eq!(" in stock ".parse::<LotStatus>().unwrap(), LotStatus::InStock);
        assert_eq!("".parse::<LotStatus>().unwrap(), LotStatus::InStock);
        assert!("lost".parse::<LotStatus>().is_err());
    }

    #[test]
    fn only_sold_used_and_freebie_consume_stock() {
        assert!(LotStatus::Sold.consumes_stock());
        assert!(LotStatus::Used.consumes_stock());
        assert!(LotStatus::Freebie.consumes_stock());
        assert!(!LotStatus::Raffled.consumes_stock());
        assert!(!LotStatus::InStock.consumes_stock());
    }

    #[test]
    fn record_ref_accepts_id_or_position() {
        let id = Uuid::new_v4();
        let by_id: RecordRef = serde_json::from_value(serde_json::json!(id.to_string())).unwrap();
        assert_eq!(by_id, RecordRef::Id(id));

        let by_position: RecordRef = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(by_position, RecordRef::Position(3));

        assert!(serde_json::from_value::<RecordRef>(serde_json::json!("abc")).is_err());
        assert!(serde_json::from_value::<RecordRef>(serde_json::json!(-1)).is_err());
    }
}
