//! Error types for loading estimation.

use std::fmt;
use thiserror::Error;

/// Result type for regression operations.
pub type Result<T> = std::result::Result<T, RegressionError>;

/// Errors raised while estimating factor loadings.
///
/// The variants have different blast radii: [`InsufficientData`] ends one
/// fund, [`SingularDesignMatrix`] ends one window, and [`Configuration`] stops
/// the run before any fund is touched.
///
/// [`InsufficientData`]: RegressionError::InsufficientData
/// [`SingularDesignMatrix`]: RegressionError::SingularDesignMatrix
/// [`Configuration`]: RegressionError::Configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    /// Fewer observations than one window needs
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// The least-squares problem has no unique solution
    #[error("Singular design matrix: {0}")]
    SingularDesignMatrix(SingularReason),

    /// Invalid estimation settings
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

/// Why a design matrix was rejected as singular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingularReason {
    /// Column is (numerically) a linear combination of earlier columns.
    RankDeficient {
        /// Zero-based column index; 0 is the intercept
        column: usize,
    },

    /// No residual degrees of freedom are left for the variance estimate.
    NoResidualDegreesOfFreedom {
        /// Rows in the design matrix
        observations: usize,
        /// Columns in the design matrix
        parameters: usize,
    },
}

impl fmt::Display for SingularReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankDeficient { column } => {
                write!(f, "column {column} is linearly dependent on earlier columns")
            }
            Self::NoResidualDegreesOfFreedom {
                observations,
                parameters,
            } => write!(
                f,
                "{observations} observations leave no residual degrees of freedom for {parameters} parameters"
            ),
        }
    }
}
