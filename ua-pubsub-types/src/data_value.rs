use crate::{StatusCode, Variant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value together with its quality and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    pub value: Variant,
    pub status: StatusCode,
    pub source_timestamp: Option<DateTime<Utc>>,
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Good-quality value stamped with the current wall clock.
    pub fn new_now(value: Variant) -> Self {
        let now = Utc::now();
        Self {
            value,
            status: StatusCode::GOOD,
            source_timestamp: Some(now),
            server_timestamp: Some(now),
        }
    }

    /// Good-quality value with an explicit timestamp, for clock-driven tests
    /// and samplers that stamp at acquisition time.
    pub fn new_at(value: Variant, at: DateTime<Utc>) -> Self {
        Self {
            value,
            status: StatusCode::GOOD,
            source_timestamp: Some(at),
            server_timestamp: Some(at),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}
