use nalgebra::RealField;
use thiserror::Error;

use super::domain::Domain;

/// The base trait for [`Objective`](super::function::Objective).
///
/// It defines the numeric type and the domain of the variables, that is, the
/// simple bounds `lb <= x <= ub`.
pub trait Problem {
    /// Type of the field, usually f64 or f32.
    type Field: RealField + Copy;

    /// Get the domain of the problem. Its dimension is the number of variables.
    fn domain(&self) -> Domain<Self::Field>;
}

/// Error caused by an inconsistent definition of the problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    /// A callable returned a value of a shape that does not match the declared
    /// dimensions.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which part of the problem is inconsistent.
        what: &'static str,
        /// The expected size.
        expected: usize,
        /// The actual size.
        actual: usize,
    },
    /// The initial estimate of Lagrange multipliers was not provided.
    #[error("initial multipliers estimate is required")]
    MissingMultipliers,
}

impl ProblemError {
    pub(crate) fn check(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}
