#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![warn(missing_docs)]

//! # ipsolver
//!
//! A pure Rust implementation of the trust-region interior point method for
//! general nonlinearly constrained optimization.
//!
//! The library solves problems of the form
//!
//! ```text
//! min  f(x)
//! s.t. c_eq(x) = 0,        A_eq x + b_eq = 0,
//!      c_ineq(x) <= 0,     A_ineq x + b_ineq <= 0,
//!      lb <= x <= ub
//! ```
//!
//! by the barrier method of Byrd, Hribar and Nocedal. Inequalities (including
//! the finite bounds) are turned into equalities by positive slack variables,
//! a logarithmic barrier keeps the slacks away from zero and the resulting
//! sequence of equality-constrained barrier subproblems is solved by a
//! trust-region SQP method with a decreasing barrier parameter.
//!
//! ## Algorithms
//!
//! * [Barrier subproblem](barrier) -- Reformulation of the problem for the
//!   given barrier parameter.
//! * [Byrd-Omojokun](algo::sqp) -- Trust-region SQP for equality-constrained
//!   problems used to solve the barrier subproblems.
//! * [Interior point driver](driver) -- The outer loop updating the barrier
//!   parameter, the tolerance and the trust region.
//!
//! ## Problem
//!
//! The problem is given by a type implementing [`Problem`] and [`Objective`]
//! traits. The bounds on the variables are specified by the [`Domain`] and the
//! objective provides the Hessian of the Lagrangian which accounts for the
//! nonlinear constraints.
//!
//! ```rust
//! use ipsolver::nalgebra as na;
//! use ipsolver::{Domain, Objective, Problem};
//! use na::{DMatrix, Dyn, IsContiguous, OVector};
//!
//! // Minimize (x - 2)^2 subject to 0 <= x <= 1.
//! struct Parabola;
//!
//! impl Problem for Parabola {
//!     // The numeric type. Usually f64 or f32.
//!     type Field = f64;
//!
//!     fn domain(&self) -> Domain<Self::Field> {
//!         Domain::rect(vec![0.0], vec![1.0])
//!     }
//! }
//!
//! impl Objective for Parabola {
//!     // Any linear operator works, dense matrix is the simplest.
//!     type Hessian = DMatrix<f64>;
//!
//!     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
//!     where
//!         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//!     {
//!         (x[0] - 2.0).powi(2)
//!     }
//!
//!     fn gradient<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> OVector<f64, Dyn>
//!     where
//!         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//!     {
//!         na::dvector![2.0 * (x[0] - 2.0)]
//!     }
//!
//!     fn hessian<Sx, Se, Si>(
//!         &self,
//!         _x: &na::Vector<f64, Dyn, Sx>,
//!         _v_eq: &na::Vector<f64, Dyn, Se>,
//!         _v_ineq: &na::Vector<f64, Dyn, Si>,
//!     ) -> DMatrix<f64>
//!     where
//!         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//!         Se: na::storage::Storage<f64, Dyn> + IsContiguous,
//!         Si: na::storage::Storage<f64, Dyn> + IsContiguous,
//!     {
//!         na::dmatrix![2.0]
//!     }
//! }
//! ```
//!
//! Nonlinear constraints are types implementing [`Constraints`], linear
//! constraints are given by a matrix and an offset directly to the driver.
//!
//! ## Solving
//!
//! ```rust
//! use ipsolver::InteriorPoint;
//! # use ipsolver::nalgebra as na;
//! # use ipsolver::{Domain, Objective, Problem};
//! # use na::{DMatrix, Dyn, IsContiguous, OVector};
//! #
//! # struct Parabola;
//! #
//! # impl Problem for Parabola {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::rect(vec![0.0], vec![1.0])
//! #     }
//! # }
//! #
//! # impl Objective for Parabola {
//! #     type Hessian = DMatrix<f64>;
//! #
//! #     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         (x[0] - 2.0).powi(2)
//! #     }
//! #
//! #     fn gradient<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> OVector<f64, Dyn>
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         na::dvector![2.0 * (x[0] - 2.0)]
//! #     }
//! #
//! #     fn hessian<Sx, Se, Si>(
//! #         &self,
//! #         _x: &na::Vector<f64, Dyn, Sx>,
//! #         _v_eq: &na::Vector<f64, Dyn, Se>,
//! #         _v_ineq: &na::Vector<f64, Dyn, Si>,
//! #     ) -> DMatrix<f64>
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #         Se: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #         Si: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         na::dmatrix![2.0]
//! #     }
//! # }
//!
//! let f = Parabola;
//!
//! // One multiplier for each bound.
//! let mut solver = InteriorPoint::builder(&f)
//!     .with_initial(vec![0.5])
//!     .with_multipliers(vec![0.0, 0.0])
//!     .build()
//!     .expect("invalid problem");
//!
//! let (x, diagnostics) = solver
//!     .find(|diagnostics| {
//!         println!(
//!             "iter = {}\toptimality = {}\tviolation = {}",
//!             diagnostics.niter(),
//!             diagnostics.optimality(),
//!             diagnostics.constr_violation()
//!         );
//!         ipsolver::driver::default_stop(diagnostics)
//!     })
//!     .expect("solver encountered an error");
//!
//! println!("x = {:?} after {} iterations", x, diagnostics.niter());
//! ```
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
pub mod barrier;
mod core;
pub mod driver;

pub use core::*;
pub use driver::InteriorPoint;

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
