//! Setup errors for cars, tracks and races
//!
//! These are configuration bugs caught at construction. Nothing in the
//! per-tick path returns an error.

#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// A track has no waypoints for the computer car
    EmptyWaypoints { track_id: String },
    /// A tuning value that must be positive is not
    NonPositive { field: &'static str, value: f32 },
    /// A value is NaN or infinite
    NonFinite { field: &'static str },
    /// A sprite or track mask has no solid pixels
    EmptyMask { what: &'static str },
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EmptyWaypoints { track_id } => {
                write!(f, "Track `{track_id}` has no waypoints")
            }
            SetupError::NonPositive { field, value } => {
                write!(f, "`{field}` must be positive, got {value}")
            }
            SetupError::NonFinite { field } => write!(f, "`{field}` must be finite"),
            SetupError::EmptyMask { what } => write!(f, "{what} mask has no solid pixels"),
        }
    }
}

impl std::error::Error for SetupError {}

/// Reject NaN/inf and values <= 0
pub(crate) fn require_positive(field: &'static str, value: f32) -> Result<f32, SetupError> {
    if !value.is_finite() {
        return Err(SetupError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(SetupError::NonPositive { field, value });
    }
    Ok(value)
}

pub(crate) fn require_finite(field: &'static str, value: f32) -> Result<f32, SetupError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SetupError::NonFinite { field })
    }
}
