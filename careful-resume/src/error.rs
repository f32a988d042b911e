use std::fmt;

/// Errors raised while validating a [`crate::Config`].
///
/// The congestion controllers themselves are infallible once constructed
/// (see the crate-level docs): this is the one fallible boundary in the
/// crate.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `cwin_minimum` was configured larger than `initial_window`, which
    /// would make the initial window immediately invalid.
    CwinMinimumExceedsInitialWindow { cwin_minimum: u64, initial_window: u64 },

    /// A loss-rate threshold must lie in `(0.0, 1.0]`.
    InvalidLossThreshold(f64),

    /// An EWMA factor must lie in `(0.0, 1.0]`.
    InvalidLossFactor(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::CwinMinimumExceedsInitialWindow { cwin_minimum, initial_window } => write!(
                f,
                "cwin_minimum ({cwin_minimum}) must not exceed initial_window ({initial_window})"
            ),
            ConfigError::InvalidLossThreshold(v) => {
                write!(f, "smoothed_loss_threshold ({v}) must be in (0.0, 1.0]")
            },
            ConfigError::InvalidLossFactor(v) => {
                write!(f, "smoothed_loss_factor ({v}) must be in (0.0, 1.0]")
            },
        }
    }
}

impl std::error::Error for ConfigError {}
