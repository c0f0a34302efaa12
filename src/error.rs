use thiserror::Error;

/// Typed failure kinds shared by every module in the crate.
///
/// All invalid inputs fail fast, before any competitor state is mutated.
/// Internal clamping performed by the update rules (e.g. a loss that would
/// push a rating below its floor) is a defined numerical policy, not an
/// error; only caller-supplied values are rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RatingError {
    /// A construction-time value was outside its legal range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A state field was assigned an illegal value, or a state document
    /// was malformed or of the wrong competitor type.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An operation was attempted between competitors of different kinds.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Confusion-matrix thresholds outside `0 <= lower <= upper <= 1`.
    #[error("invalid thresholds ({lower}, {upper}): must satisfy 0 <= lower <= upper <= 1")]
    InvalidThresholds { lower: f64, upper: f64 },
}

impl RatingError {
    pub(crate) fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    pub(crate) fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }
}
