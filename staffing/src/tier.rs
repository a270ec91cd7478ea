//! Escalation tiers among call-center staff.

use serde::{Deserialize, Serialize};

/// Staff tiers in escalation order.
///
/// The derived `Ord` follows declaration order, so `Operator` is the lowest
/// tier and is always tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffTier {
    /// Front-line staff; takes every call it can.
    Operator,
    /// Takes calls only when no Operator is free.
    Supervisor,
    /// Last resort when Operators and Supervisors are all busy.
    Director,
}

impl StaffTier {
    /// All tiers, lowest first. Selection scans in this order.
    pub const ESCALATION_ORDER: [StaffTier; 3] =
        [StaffTier::Operator, StaffTier::Supervisor, StaffTier::Director];

    /// Short suffix used for generated roster ids (`0Op`, `1Sp`, `0Dr`).
    pub fn id_suffix(&self) -> &'static str {
        match self {
            Self::Operator => "Op",
            Self::Supervisor => "Sp",
            Self::Director => "Dr",
        }
    }

    /// The tier a call escalates to when this one has nobody free.
    pub fn next(&self) -> Option<StaffTier> {
        match self {
            Self::Operator => Some(Self::Supervisor),
            Self::Supervisor => Some(Self::Director),
            Self::Director => None,
        }
    }
}

impl std::fmt::Display for StaffTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Supervisor => write!(f, "supervisor"),
            Self::Director => write!(f, "director"),
        }
    }
}
