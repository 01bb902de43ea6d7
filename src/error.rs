use thiserror::Error;

/// Errors raised by the sizing core (lookup builder and estimator).
///
/// Per-diameter scattering failures are not represented here: the builder
/// absorbs them (see `scatter::ScatterError`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    /// A caller-supplied optical or grid parameter violates its constraint.
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Curve and diameter grid do not describe the same lookup.
    #[error("curve has {curve} ratios but the diameter grid has {diameters} points")]
    LengthMismatch { curve: usize, diameters: usize },
}

impl SizingError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SizingError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Application-level error carried up to `main` together with its exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SizingError> for AppError {
    fn from(err: SizingError) -> Self {
        let exit_code = match err {
            SizingError::InvalidParameter { .. } => 2,
            SizingError::LengthMismatch { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
