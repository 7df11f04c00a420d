use crate::error::DecodeError;

/// Remaining number of nested layers the decoder may expand.
///
/// `0` renders only the record it is given; `1` also expands that record's
/// payload; and so on. Data nesting deeper than the budget is truncated
/// without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecursionBudget(u32);

impl RecursionBudget {
    pub const fn new(depth: u32) -> Self {
        Self(depth)
    }

    /// Layers left to expand below the current record.
    pub fn remaining(self) -> u32 {
        self.0
    }

    /// The budget for the next layer down, or `None` once exhausted.
    pub fn descend(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl Default for RecursionBudget {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<i64> for RecursionBudget {
    type Error = DecodeError;

    fn try_from(depth: i64) -> Result<Self, Self::Error> {
        u32::try_from(depth)
            .map(Self)
            .map_err(|_| DecodeError::InvalidDepth(depth))
    }
}
