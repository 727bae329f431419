//! Barrier subproblem of the interior point method.
//!
//! The general nonlinear program
//!
//! ```text
//! min f(x)
//! s.t. c_eq(x) = 0,        A_eq x + b_eq = 0,
//!      c_ineq(x) <= 0,     A_ineq x + b_ineq <= 0,
//!      lb <= x <= ub
//! ```
//!
//! is transformed into a sequence of equality constrained problems by
//! introducing slack variables `s > 0` for every inequality and for every
//! finite bound, and by adding a logarithmic barrier term to the objective:
//!
//! ```text
//! min f(x) - mu sum(ln(s_i))
//! s.t. c_eq(x) = 0,
//!      A_eq x + b_eq = 0,
//!      c_ineq(x) + s_ineq = 0,
//!      A_ineq x + b_ineq + s_lin = 0,
//!      x - ub + s_ub = 0,
//!      lb - x + s_lb = 0
//! ```
//!
//! The variables of the subproblem are `z = [x; s]`. Steps are expressed in
//! coordinates scaled by `D(z) = diag(1, ..., 1, s_1, ..., s_p)`, so the slack
//! steps are relative to the current slack values.
//!
//! The order of the constraints above is fixed and the same order is used in
//! the partition of the multipliers vector.
//!
//! # References
//!
//! \[1\] [An Interior Point Algorithm for Large-Scale Nonlinear
//! Programming](https://doi.org/10.1137/S1052623497325107)
//!
//! \[2\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)

use getset::CopyGetters;
use nalgebra::{ComplexField, DVector, DVectorView, Dyn, OVector, RealField};
use num_traits::{One, Zero};

use crate::core::{
    BlockMatrix, Constraints, Diagnostics, Diagonal, EqualityProblem, LinearConstraints,
    LinearOperator, Objective, Operator, ProblemError, Selection,
};

/// Barrier parameter and inner tolerance of one outer iteration.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BarrierLevel<T: RealField + Copy> {
    /// Weight of the logarithmic barrier term.
    barrier_parameter: T,
    /// Tolerance for the optimality and constraint violation of the inner
    /// solve.
    tolerance: T,
}

impl<T: RealField + Copy> BarrierLevel<T> {
    /// Creates the level.
    pub fn new(barrier_parameter: T, tolerance: T) -> Self {
        Self {
            barrier_parameter,
            tolerance,
        }
    }

    /// Gets the next level with both parameters multiplied by `ratio`.
    pub fn decay(self, ratio: T) -> Self {
        Self::new(self.barrier_parameter * ratio, self.tolerance * ratio)
    }
}

/// Barrier subproblem.
///
/// See [module](self) documentation for more details.
#[derive(CopyGetters)]
pub struct BarrierSubproblem<'a, F: Objective, I, E> {
    f: &'a F,
    ineq: I,
    eq: E,
    lin_ineq: LinearConstraints<F::Field>,
    lin_eq: LinearConstraints<F::Field>,
    lower: OVector<F::Field, Dyn>,
    upper: OVector<F::Field, Dyn>,
    finite_lower: Vec<usize>,
    finite_upper: Vec<usize>,
    x0: OVector<F::Field, Dyn>,
    /// Number of variables.
    #[getset(get_copy = "pub")]
    n_vars: usize,
    /// Number of nonlinear equality constraints.
    #[getset(get_copy = "pub")]
    n_eq: usize,
    /// Number of linear equality constraints.
    #[getset(get_copy = "pub")]
    n_lin_eq: usize,
    /// Number of nonlinear inequality constraints.
    #[getset(get_copy = "pub")]
    n_ineq: usize,
    /// Number of linear inequality constraints.
    #[getset(get_copy = "pub")]
    n_lin_ineq: usize,
    /// Number of slack variables.
    #[getset(get_copy = "pub")]
    n_slack: usize,
    /// Maximum number of inner iterations.
    #[getset(get_copy = "pub")]
    max_iter: usize,
}

impl<'a, F, I, E> BarrierSubproblem<'a, F, I, E>
where
    F: Objective,
    I: Constraints<Field = F::Field>,
    E: Constraints<Field = F::Field>,
    F::Hessian: 'a,
    I::Jacobian: 'a,
    E::Jacobian: 'a,
{
    /// Creates the subproblem with given initial point.
    ///
    /// All functions are evaluated at `x0` and the dimensions of their outputs
    /// are checked against the declared dimensions.
    pub fn new(
        f: &'a F,
        ineq: I,
        eq: E,
        lin_ineq: LinearConstraints<F::Field>,
        lin_eq: LinearConstraints<F::Field>,
        x0: OVector<F::Field, Dyn>,
        max_iter: usize,
    ) -> Result<Self, ProblemError> {
        let dom = f.domain();
        let n_vars = dom.dim();

        ProblemError::check("initial point", n_vars, x0.nrows())?;
        ProblemError::check("objective gradient", n_vars, f.gradient(&x0).nrows())?;

        let n_ineq = ineq.len();
        let n_eq = eq.len();

        ProblemError::check("inequality constraints", n_ineq, ineq.eval(&x0).nrows())?;
        let jac = ineq.jacobian(&x0);
        ProblemError::check("inequality constraints jacobian rows", n_ineq, jac.nrows())?;
        ProblemError::check("inequality constraints jacobian columns", n_vars, jac.ncols())?;

        ProblemError::check("equality constraints", n_eq, eq.eval(&x0).nrows())?;
        let jac = eq.jacobian(&x0);
        ProblemError::check("equality constraints jacobian rows", n_eq, jac.nrows())?;
        ProblemError::check("equality constraints jacobian columns", n_vars, jac.ncols())?;

        ProblemError::check(
            "linear inequality constraints matrix columns",
            n_vars,
            lin_ineq.matrix().ncols(),
        )?;
        ProblemError::check(
            "linear equality constraints matrix columns",
            n_vars,
            lin_eq.matrix().ncols(),
        )?;

        let v_eq = OVector::<F::Field, Dyn>::zeros(n_eq);
        let v_ineq = OVector::<F::Field, Dyn>::zeros(n_ineq);
        let hes = f.hessian(&x0, &v_eq, &v_ineq);
        ProblemError::check("hessian rows", n_vars, hes.nrows())?;
        ProblemError::check("hessian columns", n_vars, hes.ncols())?;

        let finite_lower = dom.finite_lower();
        let finite_upper = dom.finite_upper();

        let n_lin_ineq = lin_ineq.len();
        let n_lin_eq = lin_eq.len();
        let n_slack = n_ineq + n_lin_ineq + finite_upper.len() + finite_lower.len();

        Ok(Self {
            f,
            ineq,
            eq,
            lin_ineq,
            lin_eq,
            lower: dom.lower().clone_owned(),
            upper: dom.upper().clone_owned(),
            finite_lower,
            finite_upper,
            x0,
            n_vars,
            n_eq,
            n_lin_eq,
            n_ineq,
            n_lin_ineq,
            n_slack,
            max_iter,
        })
    }

    /// Number of variables of the subproblem, that is, `n_vars + n_slack`.
    pub fn dim(&self) -> usize {
        self.n_vars + self.n_slack
    }

    /// Number of constraints of the subproblem, which is also the length of the
    /// multipliers vector.
    pub fn n_constraints(&self) -> usize {
        self.n_eq + self.n_lin_eq + self.n_slack
    }

    /// Splits the combined iterate into variables and slacks.
    pub fn split<'z>(
        &self,
        z: &'z OVector<F::Field, Dyn>,
    ) -> (DVectorView<'z, F::Field>, DVectorView<'z, F::Field>) {
        assert_eq!(z.nrows(), self.dim(), "invalid combined iterate dimension");
        (z.rows(0, self.n_vars), z.rows(self.n_vars, self.n_slack))
    }

    /// Gets the initial combined iterate with all slacks equal to one.
    pub fn initial_iterate(&self) -> OVector<F::Field, Dyn> {
        let ones = std::iter::repeat(F::Field::one()).take(self.n_slack);
        DVector::from_iterator(self.dim(), self.x0.iter().copied().chain(ones))
    }

    /// Calculates `f(x) - mu sum(ln(s_i))`.
    ///
    /// All slacks must be positive.
    pub fn barrier_objective(
        &self,
        level: &BarrierLevel<F::Field>,
        z: &OVector<F::Field, Dyn>,
    ) -> F::Field {
        let (x, s) = self.split(z);
        assert_positive(&s);

        let log_sum = s.iter().fold(F::Field::zero(), |acc, &si| acc + si.ln());
        self.f.apply(&x) - level.barrier_parameter() * log_sum
    }

    /// Calculates the constraints of the subproblem.
    pub fn barrier_constraints(&self, z: &OVector<F::Field, Dyn>) -> OVector<F::Field, Dyn> {
        let (x, s) = self.split(z);

        let eq = self.eq.eval(&x);
        let lin_eq = self.lin_eq.residual(&x);
        let ineq = self.ineq.eval(&x);
        let lin_ineq = self.lin_ineq.residual(&x);

        let upper = self.finite_upper.iter().map(|&i| x[i] - self.upper[i]);
        let lower = self.finite_lower.iter().map(|&i| self.lower[i] - x[i]);

        let inequalities = ineq
            .iter()
            .chain(lin_ineq.iter())
            .copied()
            .chain(upper)
            .chain(lower)
            .zip(s.iter())
            .map(|(ci, &si)| ci + si);

        DVector::from_iterator(
            self.n_constraints(),
            eq.iter().chain(lin_eq.iter()).copied().chain(inequalities),
        )
    }

    /// Gets the scaling operator `diag(1, ..., 1, s_1, ..., s_p)`.
    pub fn scaling_operator(&self, z: &OVector<F::Field, Dyn>) -> Diagonal<F::Field> {
        let (_, s) = self.split(z);
        let ones = std::iter::repeat(F::Field::one()).take(self.n_vars);
        Diagonal::new(DVector::from_iterator(
            self.dim(),
            ones.chain(s.iter().copied()),
        ))
    }

    /// Calculates the gradient `[grad f(x); -mu 1]`.
    pub fn barrier_gradient(
        &self,
        level: &BarrierLevel<F::Field>,
        z: &OVector<F::Field, Dyn>,
    ) -> OVector<F::Field, Dyn> {
        let (x, _) = self.split(z);
        let grad = self.f.gradient(&x);
        let barrier = std::iter::repeat(-level.barrier_parameter()).take(self.n_slack);
        DVector::from_iterator(self.dim(), grad.iter().copied().chain(barrier))
    }

    /// Calculates the Jacobian of the constraints with slack columns scaled by
    /// `diag(s)`.
    pub fn barrier_jacobian(&self, z: &OVector<F::Field, Dyn>) -> BlockMatrix<'_, F::Field> {
        let (x, s) = self.split(z);
        let n = self.n_vars;
        let one = F::Field::one();

        let ineq_rows = BlockMatrix::vstack(
            n,
            vec![
                Box::new(self.ineq.jacobian(&x)),
                Box::new(self.lin_ineq.matrix()),
                Box::new(Selection::new(self.finite_upper.clone(), n, one)),
                Box::new(Selection::new(self.finite_lower.clone(), n, -one)),
            ],
        );

        BlockMatrix::zeros(
            vec![self.n_eq, self.n_lin_eq, self.n_slack],
            vec![n, self.n_slack],
        )
        .with_block(0, 0, Box::new(self.eq.jacobian(&x)))
        .with_block(1, 0, Box::new(self.lin_eq.matrix()))
        .with_block(2, 0, Box::new(ineq_rows))
        .with_block(2, 1, Box::new(Diagonal::new(s.clone_owned())))
    }

    /// Evaluates the Hessian of the Lagrangian with respect to `x` using the
    /// nonlinear equality and inequality blocks of the multipliers.
    pub fn lagrangian_hessian_x(
        &self,
        z: &OVector<F::Field, Dyn>,
        v: &OVector<F::Field, Dyn>,
    ) -> F::Hessian {
        assert_eq!(v.nrows(), self.n_constraints(), "invalid multipliers dimension");

        let (x, _) = self.split(z);
        let v_eq = v.rows(0, self.n_eq);
        let v_ineq = v.rows(self.n_eq + self.n_lin_eq, self.n_ineq);
        self.f.hessian(&x, &v_eq, &v_ineq)
    }

    /// Calculates the diagonal of the Hessian of the Lagrangian with respect to
    /// `s`.
    ///
    /// The primal formula `mu / s_i^2` is used for non-positive multipliers and
    /// the primal-dual formula `v_i / s_i` for positive ones.
    pub fn lagrangian_hessian_s(
        &self,
        level: &BarrierLevel<F::Field>,
        z: &OVector<F::Field, Dyn>,
        v: &OVector<F::Field, Dyn>,
    ) -> OVector<F::Field, Dyn> {
        assert_eq!(v.nrows(), self.n_constraints(), "invalid multipliers dimension");

        let (_, s) = self.split(z);
        assert_positive(&s);

        let mu = level.barrier_parameter();
        let v_s = v.rows(self.n_eq + self.n_lin_eq, self.n_slack);

        DVector::from_iterator(
            self.n_slack,
            s.iter().zip(v_s.iter()).map(|(&si, &vi)| {
                if vi > F::Field::zero() {
                    vi / si
                } else {
                    mu / (si * si)
                }
            }),
        )
    }

    /// Gets the Hessian of the Lagrangian in scaled coordinates, that is,
    /// `diag(H_x, S H_s S)`.
    pub fn scaled_lagrangian_hessian(
        &self,
        level: &BarrierLevel<F::Field>,
        z: &OVector<F::Field, Dyn>,
        v: &OVector<F::Field, Dyn>,
    ) -> BlockMatrix<'_, F::Field> {
        let (_, s) = self.split(z);

        let hes_x = self.lagrangian_hessian_x(z, v);
        let mut hes_s = self.lagrangian_hessian_s(level, z, v);
        hes_s.component_mul_assign(&s);
        hes_s.component_mul_assign(&s);

        BlockMatrix::diagonal(vec![Box::new(hes_x), Box::new(Diagonal::new(hes_s))])
    }

    /// Determines whether the inner solve of given level should stop.
    pub fn inner_stop(
        &self,
        level: &BarrierLevel<F::Field>,
        diagnostics: &Diagnostics<F::Field>,
    ) -> bool {
        let tolerance = level.tolerance();
        (diagnostics.optimality() < tolerance && diagnostics.constr_violation() < tolerance)
            || diagnostics.niter() > self.max_iter
    }

    /// Gets the subproblem at given barrier level.
    pub fn at(&self, level: BarrierLevel<F::Field>) -> BarrierProblem<'_, 'a, F, I, E> {
        BarrierProblem { sub: self, level }
    }
}

fn assert_positive<T: RealField + Copy>(s: &DVectorView<'_, T>) {
    assert!(
        s.iter().all(|&si| si > T::zero()),
        "slack variables must be positive"
    );
}

/// The barrier subproblem at a fixed [`BarrierLevel`].
///
/// This is what is passed to an [`Sqp`](crate::core::Sqp) solver.
pub struct BarrierProblem<'s, 'a, F: Objective, I, E> {
    sub: &'s BarrierSubproblem<'a, F, I, E>,
    level: BarrierLevel<F::Field>,
}

impl<'s, 'a, F: Objective, I, E> BarrierProblem<'s, 'a, F, I, E> {
    /// Gets the barrier level.
    pub fn level(&self) -> BarrierLevel<F::Field> {
        self.level
    }
}

impl<'s, 'a, F, I, E> EqualityProblem for BarrierProblem<'s, 'a, F, I, E>
where
    F: Objective,
    I: Constraints<Field = F::Field>,
    E: Constraints<Field = F::Field>,
    F::Hessian: 'a,
    I::Jacobian: 'a,
    E::Jacobian: 'a,
{
    type Field = F::Field;

    fn dim(&self) -> usize {
        self.sub.dim()
    }

    fn n_constraints(&self) -> usize {
        self.sub.n_constraints()
    }

    fn objective(&self, z: &OVector<Self::Field, Dyn>) -> Self::Field {
        self.sub.barrier_objective(&self.level, z)
    }

    fn gradient(&self, z: &OVector<Self::Field, Dyn>) -> OVector<Self::Field, Dyn> {
        self.sub.barrier_gradient(&self.level, z)
    }

    fn constraints(&self, z: &OVector<Self::Field, Dyn>) -> OVector<Self::Field, Dyn> {
        self.sub.barrier_constraints(z)
    }

    fn jacobian(&self, z: &OVector<Self::Field, Dyn>) -> Operator<'_, Self::Field> {
        Box::new(self.sub.barrier_jacobian(z))
    }

    fn lagrangian_hessian(
        &self,
        z: &OVector<Self::Field, Dyn>,
        v: &OVector<Self::Field, Dyn>,
    ) -> Operator<'_, Self::Field> {
        Box::new(self.sub.scaled_lagrangian_hessian(&self.level, z, v))
    }

    fn scaling(&self, z: &OVector<Self::Field, Dyn>) -> Operator<'_, Self::Field> {
        Box::new(self.sub.scaling_operator(z))
    }

    fn stop(&self, diagnostics: &Diagnostics<Self::Field>) -> bool {
        self.sub.inner_stop(&self.level, diagnostics)
    }
}
