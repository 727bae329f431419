//! Core abstractions and types for ipsolver.
//!
//! *Users* are mainly interested in implementing the [`Objective`] trait,
//! optionally the [`Constraints`] trait for nonlinear constraints, and in
//! specifying the [domain](Domain) for bounds.
//!
//! Inner solver *developers* are interested in implementing the [`Sqp`] trait
//! that operates on an [`EqualityProblem`], with Jacobians and Hessians given
//! as [linear operators](LinearOperator).

mod base;
mod constraints;
mod domain;
mod function;
mod operator;
mod solver;

pub use base::*;
pub use constraints::*;
pub use domain::*;
pub use function::*;
pub use operator::*;
pub use solver::*;
