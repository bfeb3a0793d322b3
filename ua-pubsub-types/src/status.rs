use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// OPC UA status code.
///
/// Transparent wrapper over the 32-bit wire value. Only the codes the
/// subscription engine and the condition overlay actually return are named
/// here; the numeric values are the Part 6 assignments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    pub const GOOD_SUBSCRIPTION_TRANSFERRED: StatusCode = StatusCode(0x002D_0000);

    pub const BAD_NOTHING_TO_DO: StatusCode = StatusCode(0x800F_0000);
    pub const BAD_TIMEOUT: StatusCode = StatusCode(0x800A_0000);
    pub const BAD_SUBSCRIPTION_ID_INVALID: StatusCode = StatusCode(0x8028_0000);
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    pub const BAD_ATTRIBUTE_ID_INVALID: StatusCode = StatusCode(0x8035_0000);
    pub const BAD_INDEX_RANGE_INVALID: StatusCode = StatusCode(0x8036_0000);
    pub const BAD_DATA_ENCODING_INVALID: StatusCode = StatusCode(0x8038_0000);
    pub const BAD_DATA_ENCODING_UNSUPPORTED: StatusCode = StatusCode(0x8039_0000);
    pub const BAD_MONITORED_ITEM_ID_INVALID: StatusCode = StatusCode(0x8042_0000);
    pub const BAD_MONITORED_ITEM_FILTER_INVALID: StatusCode = StatusCode(0x8043_0000);
    pub const BAD_INVALID_STATE: StatusCode = StatusCode(0x80AF_0000);
    pub const BAD_METHOD_INVALID: StatusCode = StatusCode(0x8075_0000);
    pub const BAD_SEQUENCE_NUMBER_UNKNOWN: StatusCode = StatusCode(0x807A_0000);
    pub const BAD_EVENT_ID_UNKNOWN: StatusCode = StatusCode(0x809A_0000);
    pub const BAD_CONDITION_BRANCH_ALREADY_ACKED: StatusCode = StatusCode(0x80CF_0000);
    pub const BAD_CONDITION_BRANCH_ALREADY_CONFIRMED: StatusCode = StatusCode(0x80D0_0000);

    /// Severity is carried in the top two bits: 00 good, 01 uncertain, 10 bad.
    #[inline]
    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    #[inline]
    pub fn is_uncertain(self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    #[inline]
    pub fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Symbolic name for the well-known codes, hex for everything else.
    pub fn name(self) -> &'static str {
        match self {
            StatusCode::GOOD => "Good",
            StatusCode::GOOD_SUBSCRIPTION_TRANSFERRED => "GoodSubscriptionTransferred",
            StatusCode::BAD_NOTHING_TO_DO => "BadNothingToDo",
            StatusCode::BAD_TIMEOUT => "BadTimeout",
            StatusCode::BAD_SUBSCRIPTION_ID_INVALID => "BadSubscriptionIdInvalid",
            StatusCode::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown",
            StatusCode::BAD_ATTRIBUTE_ID_INVALID => "BadAttributeIdInvalid",
            StatusCode::BAD_INDEX_RANGE_INVALID => "BadIndexRangeInvalid",
            StatusCode::BAD_DATA_ENCODING_INVALID => "BadDataEncodingInvalid",
            StatusCode::BAD_DATA_ENCODING_UNSUPPORTED => "BadDataEncodingUnsupported",
            StatusCode::BAD_MONITORED_ITEM_ID_INVALID => "BadMonitoredItemIdInvalid",
            StatusCode::BAD_MONITORED_ITEM_FILTER_INVALID => "BadMonitoredItemFilterInvalid",
            StatusCode::BAD_INVALID_STATE => "BadInvalidState",
            StatusCode::BAD_METHOD_INVALID => "BadMethodInvalid",
            StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN => "BadSequenceNumberUnknown",
            StatusCode::BAD_EVENT_ID_UNKNOWN => "BadEventIdUnknown",
            StatusCode::BAD_CONDITION_BRANCH_ALREADY_ACKED => "BadConditionBranchAlreadyAcked",
            StatusCode::BAD_CONDITION_BRANCH_ALREADY_CONFIRMED => {
                "BadConditionBranchAlreadyConfirmed"
            }
            _ => "",
        }
    }
}

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        StatusCode::GOOD
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = self.name();
        if name.is_empty() {
            write!(f, "StatusCode(0x{:08X})", self.0)
        } else {
            f.write_str(name)
        }
    }
}

impl From<StatusCode> for u32 {
    #[inline]
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::StatusCode;

    #[test]
    fn severity_bits() {
        assert!(StatusCode::GOOD.is_good());
        assert!(StatusCode::GOOD_SUBSCRIPTION_TRANSFERRED.is_good());
        assert!(StatusCode::BAD_TIMEOUT.is_bad());
        assert!(!StatusCode::BAD_TIMEOUT.is_good());
        assert!(StatusCode(0x406C_0000).is_uncertain());
    }

    #[test]
    fn display_uses_symbolic_names() {
        assert_eq!(
            StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN.to_string(),
            "BadSequenceNumberUnknown"
        );
        assert_eq!(StatusCode(0xDEAD_0000).to_string(), "StatusCode(0xDEAD0000)");
    }
}
