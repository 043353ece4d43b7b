//! # Series Math
//!
//! Numeric kernels shared by the forecasting strategies.
//! This crate provides a ridge-regularized least squares solver, a CART
//! regression tree and Fourier seasonality features.

use thiserror::Error;

// Kernel modules
pub mod least_squares;
pub mod seasonal;
pub mod tree;

pub use least_squares::{least_squares, predict_linear};
pub use seasonal::fourier_terms;
pub use tree::{RegressionTree, TreeParams};

/// Errors that can occur in numeric kernels
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric kernels
pub type Result<T> = std::result::Result<T, MathError>;
