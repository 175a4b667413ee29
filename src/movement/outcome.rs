use serde::Serialize;
use std::fmt;
use crate::movement::record::MovementRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningTarget {
    Notification,
    CacheInvalidation,
}

impl WarningTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningTarget::Notification => "notification",
            WarningTarget::CacheInvalidation => "cache_invalidation",
        }
    }
}

/// Non-fatal problem after the money already moved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryWarning {
    pub target: WarningTarget,
    pub detail: String,
}

impl fmt::Display for DeliveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} warning: {}", self.target.as_str(), self.detail)
    }
}

/// Successful command result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MovementOutcome {
    pub record: MovementRecord,
    pub warnings: Vec<DeliveryWarning>,
}

impl MovementOutcome {
    pub fn new(record: MovementRecord) -> Self {
        MovementOutcome {
            record,
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
