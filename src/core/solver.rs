use getset::{CopyGetters, Getters, Setters};
use nalgebra::{DVector, Dyn, OVector, RealField};

use super::operator::Operator;

/// Equality constrained problem in the form consumed by an [`Sqp`] solver.
///
/// The variables are the combined iterate `z`. The problem is to minimize
/// [`objective`](EqualityProblem::objective) subject to
/// [`constraints`](EqualityProblem::constraints) being zero. The steps are
/// computed in scaled coordinates given by
/// [`scaling`](EqualityProblem::scaling), that is, a step `d` moves the
/// iterate to `z + S(z) d`. The gradient, the Jacobian and the Hessian are all
/// expressed in the scaled coordinates.
pub trait EqualityProblem {
    /// Type of the field, usually f64 or f32.
    type Field: RealField + Copy;

    /// Number of variables.
    fn dim(&self) -> usize;

    /// Number of constraints.
    fn n_constraints(&self) -> usize;

    /// Calculates the objective value.
    fn objective(&self, z: &OVector<Self::Field, Dyn>) -> Self::Field;

    /// Calculates the gradient of the objective in scaled coordinates.
    fn gradient(&self, z: &OVector<Self::Field, Dyn>) -> OVector<Self::Field, Dyn>;

    /// Calculates the values of the constraints.
    fn constraints(&self, z: &OVector<Self::Field, Dyn>) -> OVector<Self::Field, Dyn>;

    /// Calculates the Jacobian of the constraints in scaled coordinates.
    fn jacobian(&self, z: &OVector<Self::Field, Dyn>) -> Operator<'_, Self::Field>;

    /// Calculates the Hessian of the Lagrangian in scaled coordinates.
    fn lagrangian_hessian(
        &self,
        z: &OVector<Self::Field, Dyn>,
        v: &OVector<Self::Field, Dyn>,
    ) -> Operator<'_, Self::Field>;

    /// Gets the scaling operator at given point.
    fn scaling(&self, z: &OVector<Self::Field, Dyn>) -> Operator<'_, Self::Field>;

    /// Determines whether the solving should stop.
    fn stop(&self, diagnostics: &Diagnostics<Self::Field>) -> bool;
}

/// Bounds on the scaled step computed by an [`Sqp`] solver.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct StepBounds<T: RealField + Copy> {
    /// Lower bounds.
    lower: OVector<T, Dyn>,
    /// Upper bounds.
    upper: OVector<T, Dyn>,
}

impl<T: RealField + Copy> StepBounds<T> {
    /// Creates the bounds.
    pub fn new(lower: OVector<T, Dyn>, upper: OVector<T, Dyn>) -> Self {
        assert_eq!(
            lower.nrows(),
            upper.nrows(),
            "lower and upper have different size"
        );
        Self { lower, upper }
    }

    /// Creates bounds that do not restrict the step.
    pub fn unbounded(dim: usize) -> Self {
        let inf = T::from_subset(&f64::INFINITY);
        Self::new(DVector::from_element(dim, -inf), DVector::from_element(dim, inf))
    }

    /// Gets the dimension.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }
}

/// Diagnostics reported by an [`Sqp`] solver.
#[derive(Debug, Clone, CopyGetters, Getters, Setters)]
pub struct Diagnostics<T: RealField + Copy> {
    /// Number of iterations.
    #[getset(get_copy = "pub", set = "pub")]
    niter: usize,
    /// Infinity norm of the gradient of the Lagrangian.
    #[getset(get_copy = "pub", set = "pub")]
    optimality: T,
    /// Infinity norm of the constraints.
    #[getset(get_copy = "pub", set = "pub")]
    constr_violation: T,
    /// Trust region radius.
    #[getset(get_copy = "pub", set = "pub")]
    trust_radius: T,
    /// Penalty parameter of the merit function.
    #[getset(get_copy = "pub", set = "pub")]
    penalty: T,
    /// Lagrange multipliers estimate.
    #[getset(get = "pub", set = "pub")]
    multipliers: OVector<T, Dyn>,
}

impl<T: RealField + Copy> Diagnostics<T> {
    /// Creates the diagnostics.
    pub fn new(
        niter: usize,
        optimality: T,
        constr_violation: T,
        trust_radius: T,
        penalty: T,
        multipliers: OVector<T, Dyn>,
    ) -> Self {
        Self {
            niter,
            optimality,
            constr_violation,
            trust_radius,
            penalty,
            multipliers,
        }
    }
}

/// Interface of an equality constrained SQP solver.
///
/// The solver is given an [`EqualityProblem`], the initial iterate and
/// multipliers estimate, the initial trust region radius, bounds on the scaled
/// step and the initial penalty of the merit function. It iterates until
/// [`EqualityProblem::stop`] returns true or until it cannot make progress.
/// After the method returns, `z` holds the last accepted iterate.
pub trait Sqp<T: RealField + Copy> {
    /// Name of the solver.
    const NAME: &'static str;

    /// Error while solving.
    type Error;

    /// Solves the equality constrained problem.
    fn solve<P>(
        &mut self,
        p: &P,
        z: &mut OVector<T, Dyn>,
        v: &OVector<T, Dyn>,
        trust_radius: T,
        bounds: &StepBounds<T>,
        penalty: T,
    ) -> Result<Diagnostics<T>, Self::Error>
    where
        P: EqualityProblem<Field = T>;
}
