//! Testing problems and utilities useful for benchmarking, debugging and smoke
//! testing.
//!
//! [`QuadraticHalfPlane`] and [`BoundedParabola`] are recommended for first
//! tests as they exercise linear inequality constraints and bounds,
//! respectively. [`PlaneWithBound`] adds a linear equality. [`Hs071`] is a
//! classical small nonlinear program with all kinds of constraints and
//! [`RandomQp`] generates convex quadratic programs with a strictly feasible
//! origin.
//!
//! # References
//!
//! \[1\] [Test Examples for Nonlinear Programming
//! Codes](https://link.springer.com/book/10.1007/978-3-642-48320-2)
//!
//! \[2\] [Numerical Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)

#![allow(unused)]

use nalgebra::{
    dmatrix, dvector, storage::Storage, DMatrix, DVector, Dyn, IsContiguous, OVector, Vector,
};

use crate::core::{Constraints, Domain, Objective, Problem};

/// Extension of the [`Objective`] trait that provides additional information
/// that is useful for testing solvers.
pub trait TestProblem: Objective {
    /// Standard initial values for the problem. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>>;

    /// A set of optima (if known). This is mostly just for information, for
    /// example to know how close a solver got even if it failed.
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        Vec::new()
    }
}

/// Minimization of `x1^2 + x2^2` subject to `x1 + x2 >= 1`.
///
/// The constraint is not part of the objective, it is given by
/// [`QuadraticHalfPlane::linear_ineq`]. The optimum is `(0.5, 0.5)` with the
/// value `0.5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticHalfPlane;

impl QuadraticHalfPlane {
    /// The linear inequality constraint in the `A x + b <= 0` form.
    pub fn linear_ineq() -> (DMatrix<f64>, OVector<f64, Dyn>) {
        (dmatrix![-1.0, -1.0], dvector![1.0])
    }
}

impl Problem for QuadraticHalfPlane {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(2)
    }
}

impl Objective for QuadraticHalfPlane {
    type Hessian = DMatrix<f64>;

    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.norm_squared()
    }

    fn gradient<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x * 2.0
    }

    fn hessian<Sx, Se, Si>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        _v_eq: &Vector<Self::Field, Dyn, Se>,
        _v_ineq: &Vector<Self::Field, Dyn, Si>,
    ) -> Self::Hessian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Se: Storage<Self::Field, Dyn> + IsContiguous,
        Si: Storage<Self::Field, Dyn> + IsContiguous,
    {
        DMatrix::identity(2, 2) * 2.0
    }
}

impl TestProblem for QuadraticHalfPlane {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![2.0, 2.0], dvector![0.0, 0.0], dvector![-1.0, 3.0]]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![0.5, 0.5]]
    }
}

/// Minimization of `(x - 2)^2` subject to `0 <= x <= 1`.
///
/// The optimum `x = 1` lies on the upper bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedParabola;

impl Problem for BoundedParabola {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::rect(vec![0.0], vec![1.0])
    }
}

impl Objective for BoundedParabola {
    type Hessian = DMatrix<f64>;

    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (x[0] - 2.0).powi(2)
    }

    fn gradient<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        dvector![2.0 * (x[0] - 2.0)]
    }

    fn hessian<Sx, Se, Si>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        _v_eq: &Vector<Self::Field, Dyn, Se>,
        _v_ineq: &Vector<Self::Field, Dyn, Si>,
    ) -> Self::Hessian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Se: Storage<Self::Field, Dyn> + IsContiguous,
        Si: Storage<Self::Field, Dyn> + IsContiguous,
    {
        dmatrix![2.0]
    }
}

impl TestProblem for BoundedParabola {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![0.5], dvector![0.1]]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![1.0]]
    }
}

/// Minimization of `x1^2 + x2^2 + x3^2` subject to `x1 + x2 + x3 = 3` and
/// `x1 <= 0.5`.
///
/// The equality is given by [`PlaneWithBound::linear_eq`]. The optimum
/// `(0.5, 1.25, 1.25)` lies on the upper bound of `x1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneWithBound;

impl PlaneWithBound {
    /// The linear equality constraint in the `A x + b = 0` form.
    pub fn linear_eq() -> (DMatrix<f64>, OVector<f64, Dyn>) {
        (dmatrix![1.0, 1.0, 1.0], dvector![-3.0])
    }
}

impl Problem for PlaneWithBound {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        let inf = f64::INFINITY;
        Domain::rect(vec![-inf; 3], vec![0.5, inf, inf])
    }
}

impl Objective for PlaneWithBound {
    type Hessian = DMatrix<f64>;

    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.norm_squared()
    }

    fn gradient<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x * 2.0
    }

    fn hessian<Sx, Se, Si>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        _v_eq: &Vector<Self::Field, Dyn, Se>,
        _v_ineq: &Vector<Self::Field, Dyn, Si>,
    ) -> Self::Hessian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Se: Storage<Self::Field, Dyn> + IsContiguous,
        Si: Storage<Self::Field, Dyn> + IsContiguous,
    {
        DMatrix::identity(3, 3) * 2.0
    }
}

impl TestProblem for PlaneWithBound {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![0.0, 0.0, 0.0], dvector![-2.0, 4.0, 1.0]]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![0.5, 1.25, 1.25]]
    }
}

/// Problem 71 from the Hock-Schittkowski collection \[1\].
///
/// ```text
/// min  x1 x4 (x1 + x2 + x3) + x3
/// s.t. x1 x2 x3 x4 >= 25
///      x1^2 + x2^2 + x3^2 + x4^2 = 40
///      1 <= x1, x2, x3, x4 <= 5
/// ```
///
/// The nonlinear constraints are given by [`Hs071Ineq`] and [`Hs071Eq`] and
/// the Hessian of the Lagrangian accounts for both of them.
///
/// # References
///
/// \[1\] [Test Examples for Nonlinear Programming
/// Codes](https://link.springer.com/book/10.1007/978-3-642-48320-2)
#[derive(Debug, Clone, Copy, Default)]
pub struct Hs071;

impl Problem for Hs071 {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::rect(vec![1.0; 4], vec![5.0; 4])
    }
}

impl Objective for Hs071 {
    type Hessian = DMatrix<f64>;

    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x[0] * x[3] * (x[0] + x[1] + x[2]) + x[2]
    }

    fn gradient<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let sum = x[0] + x[1] + x[2];
        dvector![
            x[3] * (x[0] + sum),
            x[0] * x[3],
            x[0] * x[3] + 1.0,
            x[0] * sum
        ]
    }

    fn hessian<Sx, Se, Si>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        v_eq: &Vector<Self::Field, Dyn, Se>,
        v_ineq: &Vector<Self::Field, Dyn, Si>,
    ) -> Self::Hessian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Se: Storage<Self::Field, Dyn> + IsContiguous,
        Si: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let v_eq = v_eq.iter().next().copied().unwrap_or(0.0);
        let v_ineq = v_ineq.iter().next().copied().unwrap_or(0.0);

        let (x1, x2, x3, x4) = (x[0], x[1], x[2], x[3]);

        let mut hes = dmatrix![
            2.0 * x4, x4, x4, 2.0 * x1 + x2 + x3;
            x4, 0.0, 0.0, x1;
            x4, 0.0, 0.0, x1;
            2.0 * x1 + x2 + x3, x1, x1, 0.0
        ];

        // Second derivatives of x1 x2 x3 x4.
        let product = dmatrix![
            0.0, x3 * x4, x2 * x4, x2 * x3;
            x3 * x4, 0.0, x1 * x4, x1 * x3;
            x2 * x4, x1 * x4, 0.0, x1 * x2;
            x2 * x3, x1 * x3, x1 * x2, 0.0
        ];
        hes -= product * v_ineq;

        for i in 0..4 {
            hes[(i, i)] += 2.0 * v_eq;
        }

        hes
    }
}

impl TestProblem for Hs071 {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![1.0, 5.0, 5.0, 1.0]]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![1.0, 4.742999, 3.821150, 1.379408]]
    }
}

/// Inequality constraint `25 - x1 x2 x3 x4 <= 0` of [`Hs071`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Hs071Ineq;

impl Constraints for Hs071Ineq {
    type Field = f64;
    type Jacobian = DMatrix<f64>;

    fn len(&self) -> usize {
        1
    }

    fn eval<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        dvector![25.0 - x.product()]
    }

    fn jacobian<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Jacobian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        dmatrix![
            -x[1] * x[2] * x[3],
            -x[0] * x[2] * x[3],
            -x[0] * x[1] * x[3],
            -x[0] * x[1] * x[2]
        ]
    }
}

/// Equality constraint `x1^2 + x2^2 + x3^2 + x4^2 - 40 = 0` of [`Hs071`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Hs071Eq;

impl Constraints for Hs071Eq {
    type Field = f64;
    type Jacobian = DMatrix<f64>;

    fn len(&self) -> usize {
        1
    }

    fn eval<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        dvector![x.norm_squared() - 40.0]
    }

    fn jacobian<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Jacobian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        DMatrix::from_fn(1, x.nrows(), |_, j| 2.0 * x[j])
    }
}

/// Random convex quadratic program
///
/// ```text
/// min  1/2 x^T Q x + c^T x
/// s.t. A x + b <= 0
///      |x|^2 - r^2 <= 0
///      -5 <= x <= 5
/// ```
///
/// with `Q` positive definite and `b < 0` so that the origin is strictly
/// feasible. The ball constraint is given by [`RandomQp::ball`] and the
/// Hessian of the Lagrangian assumes it is passed as the only nonlinear
/// inequality constraint.
#[derive(Debug, Clone)]
pub struct RandomQp {
    q: DMatrix<f64>,
    c: OVector<f64, Dyn>,
    a: DMatrix<f64>,
    b: OVector<f64, Dyn>,
    radius: f64,
}

impl RandomQp {
    /// Generates the problem with `n` variables and `m` linear inequality
    /// constraints.
    pub fn generate(rng: &mut fastrand::Rng, n: usize, m: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");

        let mut uniform = |scale: f64| (rng.f64() * 2.0 - 1.0) * scale;

        let factor = DMatrix::from_fn(n, n, |_, _| uniform(1.0));
        let q = factor.tr_mul(&factor) + DMatrix::identity(n, n);
        let c = DVector::from_fn(n, |_, _| uniform(3.0));
        let a = DMatrix::from_fn(m, n, |_, _| uniform(2.0));
        let b = DVector::from_fn(m, |_, _| -(1.5 + uniform(0.5)));

        Self {
            q,
            c,
            a,
            b,
            radius: 4.0,
        }
    }

    /// The linear inequality constraints in the `A x + b <= 0` form.
    pub fn linear_ineq(&self) -> (DMatrix<f64>, OVector<f64, Dyn>) {
        (self.a.clone(), self.b.clone())
    }

    /// The ball constraint.
    pub fn ball(&self) -> Ball {
        Ball {
            radius: self.radius,
        }
    }

    /// Number of multipliers when both the ball and the linear constraints
    /// are used.
    pub fn n_multipliers(&self) -> usize {
        1 + self.a.nrows() + 2 * self.q.nrows()
    }
}

impl Problem for RandomQp {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        let n = self.q.nrows();
        Domain::rect(vec![-5.0; n], vec![5.0; n])
    }
}

impl Objective for RandomQp {
    type Hessian = DMatrix<f64>;

    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        0.5 * x.dot(&(&self.q * x)) + self.c.dot(x)
    }

    fn gradient<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        &self.q * x + &self.c
    }

    fn hessian<Sx, Se, Si>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        _v_eq: &Vector<Self::Field, Dyn, Se>,
        v_ineq: &Vector<Self::Field, Dyn, Si>,
    ) -> Self::Hessian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Se: Storage<Self::Field, Dyn> + IsContiguous,
        Si: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let n = self.q.nrows();
        let v_ball = v_ineq.iter().next().copied().unwrap_or(0.0);
        &self.q + DMatrix::identity(n, n) * (2.0 * v_ball)
    }
}

impl TestProblem for RandomQp {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![DVector::zeros(self.q.nrows())]
    }
}

/// Constraint `|x|^2 - r^2 <= 0`.
#[derive(Debug, Clone, Copy)]
pub struct Ball {
    radius: f64,
}

impl Constraints for Ball {
    type Field = f64;
    type Jacobian = DMatrix<f64>;

    fn len(&self) -> usize {
        1
    }

    fn eval<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        dvector![x.norm_squared() - self.radius * self.radius]
    }

    fn jacobian<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Jacobian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        DMatrix::from_fn(1, x.nrows(), |_, j| 2.0 * x[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    fn finite_gradient<F: Objective<Field = f64>>(f: &F, x: &DVector<f64>) -> DVector<f64> {
        let h = 1e-6;
        DVector::from_fn(x.nrows(), |i, _| {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[i] += h;
            xm[i] -= h;
            (f.apply(&xp) - f.apply(&xm)) / (2.0 * h)
        })
    }

    #[test]
    fn hs071_derivatives() {
        let f = Hs071;
        let x = dvector![1.5, 2.5, 3.5, 1.2];

        assert_abs_diff_eq!(f.gradient(&x), finite_gradient(&f, &x), epsilon = 1e-6);

        let h = 1e-6;
        let (v_eq, v_ineq) = (dvector![0.7], dvector![1.3]);
        let hes = f.hessian(&x, &v_eq, &v_ineq);

        let lagrangian_gradient = |x: &DVector<f64>| {
            f.gradient(x)
                + Hs071Eq.jacobian(x).tr_mul(&v_eq)
                + Hs071Ineq.jacobian(x).tr_mul(&v_ineq)
        };

        for j in 0..4 {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[j] += h;
            xm[j] -= h;
            let column = (lagrangian_gradient(&xp) - lagrangian_gradient(&xm)) / (2.0 * h);
            assert_abs_diff_eq!(hes.column(j).clone_owned(), column, epsilon = 1e-5);
        }
    }

    #[test]
    fn hs071_optimum() {
        let f = Hs071;
        let x = &f.optima()[0];

        assert_abs_diff_eq!(f.apply(x), 17.014017, epsilon = 1e-4);
        assert!(Hs071Ineq.eval(x)[0] <= 1e-4);
        assert_abs_diff_eq!(Hs071Eq.eval(x)[0], 0.0, epsilon = 1e-4);
    }

    #[test]
    fn random_qp_origin_feasible() {
        let mut rng = fastrand::Rng::with_seed(1);

        for _ in 0..10 {
            let n = rng.usize(1..6);
            let m = rng.usize(0..5);
            let problem = RandomQp::generate(&mut rng, n, m);
            let x0 = &problem.initials()[0];
            let (a, b) = problem.linear_ineq();

            assert!((a * x0 + b).iter().all(|&ci| ci < 0.0));
            assert!(problem.ball().eval(x0)[0] < 0.0);
            assert_abs_diff_eq!(
                problem.gradient(x0),
                finite_gradient(&problem, x0),
                epsilon = 1e-6
            );
        }
    }
}
