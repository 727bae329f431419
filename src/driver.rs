//! High-level API for solving nonlinear programs.
//!
//! The [`InteriorPoint`] driver encapsulates the barrier continuation: it
//! solves a sequence of [barrier subproblems](crate::barrier) with decreasing
//! barrier parameter and inner tolerance by an [`Sqp`] solver, re-growing the
//! trust region and warm-starting the multipliers between the subproblems.
//!
//! The driver is created using the builder:
//!
//! ```rust
//! use ipsolver::driver::InteriorPoint;
//! use ipsolver::nalgebra::dmatrix;
//! # use ipsolver::nalgebra as na;
//! # use ipsolver::{Domain, Objective, Problem};
//! # use na::{Dyn, IsContiguous, DMatrix, OVector};
//! #
//! # struct Quadratic;
//! #
//! # impl Problem for Quadratic {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Objective for Quadratic {
//! #     type Hessian = DMatrix<f64>;
//! #
//! #     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         x.norm_squared()
//! #     }
//! #
//! #     fn gradient<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> OVector<f64, Dyn>
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         x * 2.0
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
//! #         DMatrix::identity(2, 2) * 2.0
//! #     }
//! # }
//!
//! let f = Quadratic;
//!
//! // x1 + x2 >= 1 written as -x1 - x2 + 1 <= 0.
//! let mut solver = InteriorPoint::builder(&f)
//!     .with_initial(vec![2.0, 2.0])
//!     .with_multipliers(vec![0.0])
//!     .with_linear_ineq(dmatrix![-1.0, -1.0], na::dvector![1.0])
//!     .build()
//!     .expect("invalid problem");
//!
//! let (x, diagnostics) = solver.solve().expect("solver error");
//! println!("x = {:?}, optimality = {}", x, diagnostics.optimality());
//! ```
//!
//! If you need more control over the outer iterations, call
//! [`InteriorPoint::next`] manually or pass a custom stopping criterion to
//! [`InteriorPoint::find`].

use getset::{CopyGetters, Getters, Setters};
use log::debug;
use nalgebra::{convert, ComplexField, DMatrix, DVector, Dyn, OVector, RealField};
use num_traits::Zero;

use crate::{
    algo::ByrdOmojokun,
    barrier::{BarrierLevel, BarrierSubproblem},
    core::{
        Constraints, Diagnostics, LinearConstraints, NoConstraints, Objective, ProblemError, Sqp,
        StepBounds,
    },
};

/// Fraction of the slack that a single step must keep, expressed as the lower
/// bound on the scaled slack step.
pub const BOUNDARY_PARAMETER: f64 = 0.995;

/// Factor by which the barrier parameter and the inner tolerance are
/// multiplied after each outer iteration.
pub const BARRIER_DECAY_RATIO: f64 = 0.2;

/// Factor by which the trust region size returned by the inner solver is
/// enlarged for the next outer iteration.
pub const TRUST_ENLARGEMENT: f64 = 5.0;

/// Options for [`InteriorPoint`] driver.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct InteriorPointOptions<T: RealField + Copy> {
    /// Initial barrier parameter. Default: `0.1`.
    barrier_parameter_init: T,
    /// Initial tolerance for the inner solves. Default: `0.1`.
    tolerance_init: T,
    /// Penalty of the merit function passed to every inner solve. Default:
    /// `1.0`.
    penalty_init: T,
    /// Initial trust region size, also the lower bound on the trust region
    /// size at the start of every inner solve. Default: `1.0`.
    trust_radius_init: T,
    /// Maximum number of iterations of one inner solve. Default: `1000`.
    max_inner_iter: usize,
}

impl<T: RealField + Copy> Default for InteriorPointOptions<T> {
    fn default() -> Self {
        Self {
            barrier_parameter_init: convert(0.1),
            tolerance_init: convert(0.1),
            penalty_init: convert(1.0),
            trust_radius_init: convert(1.0),
            max_inner_iter: 1000,
        }
    }
}

/// Control parameters of the barrier continuation.
#[derive(Debug, Clone, CopyGetters, Getters)]
pub struct OuterState<T: RealField + Copy> {
    /// Barrier level of the next inner solve.
    #[getset(get_copy = "pub")]
    level: BarrierLevel<T>,
    /// Trust region size for the next inner solve.
    #[getset(get_copy = "pub")]
    trust_radius: T,
    /// Multipliers estimate for the next inner solve.
    #[getset(get = "pub")]
    multipliers: OVector<T, Dyn>,
    /// Total number of inner iterations so far.
    #[getset(get_copy = "pub")]
    total_iter: usize,
}

impl<T: RealField + Copy> OuterState<T> {
    /// Creates the initial state.
    pub fn new(level: BarrierLevel<T>, trust_radius: T, multipliers: OVector<T, Dyn>) -> Self {
        Self {
            level,
            trust_radius,
            multipliers,
            total_iter: 0,
        }
    }

    /// Computes the state for the next outer iteration from the diagnostics
    /// of the last inner solve.
    ///
    /// The iterations count in `diagnostics` is replaced by the accumulated
    /// total.
    pub fn update(self, diagnostics: &mut Diagnostics<T>, trust_radius_init: T) -> Self {
        let total_iter = self.total_iter + diagnostics.niter();
        let trust_radius =
            trust_radius_init.max(convert::<_, T>(TRUST_ENLARGEMENT) * diagnostics.trust_radius());
        let level = self.level.decay(convert(BARRIER_DECAY_RATIO));

        diagnostics.set_niter(total_iter);

        Self {
            level,
            trust_radius,
            multipliers: diagnostics.multipliers().clone_owned(),
            total_iter,
        }
    }
}

/// The default stopping criterion of the outer iterations.
///
/// True when both the optimality and the constraints violation are under
/// `1e-8`, or when more than 1000 inner iterations were done in total.
pub fn default_stop<T: RealField + Copy>(diagnostics: &Diagnostics<T>) -> bool {
    let tolerance = convert(1e-8);
    (diagnostics.optimality() < tolerance && diagnostics.constr_violation() < tolerance)
        || diagnostics.niter() > 1000
}

/// Builder for the [`InteriorPoint`] driver.
pub struct InteriorPointBuilder<'a, F: Objective, I, E, A> {
    f: &'a F,
    ineq: I,
    eq: E,
    lin_ineq: Option<(DMatrix<F::Field>, OVector<F::Field, Dyn>)>,
    lin_eq: Option<(DMatrix<F::Field>, OVector<F::Field, Dyn>)>,
    x0: OVector<F::Field, Dyn>,
    v0: Option<OVector<F::Field, Dyn>>,
    options: InteriorPointOptions<F::Field>,
    algo: A,
}

impl<'a, F: Objective, I, E, A> InteriorPointBuilder<'a, F, I, E, A> {
    /// Sets the initial point from which the iterative process starts.
    pub fn with_initial(mut self, x0: Vec<F::Field>) -> Self {
        self.x0 = DVector::from_vec(x0);
        self
    }

    /// Sets the initial estimate of the Lagrange multipliers. It is required.
    ///
    /// The multipliers are ordered as nonlinear equality constraints, linear
    /// equality constraints, nonlinear inequality constraints, linear
    /// inequality constraints, finite upper bounds and finite lower bounds.
    pub fn with_multipliers(mut self, v0: Vec<F::Field>) -> Self {
        self.v0 = Some(DVector::from_vec(v0));
        self
    }

    /// Sets the nonlinear inequality constraints `c(x) <= 0`.
    pub fn with_ineq<I2>(self, ineq: I2) -> InteriorPointBuilder<'a, F, I2, E, A>
    where
        I2: Constraints<Field = F::Field>,
    {
        InteriorPointBuilder {
            f: self.f,
            ineq,
            eq: self.eq,
            lin_ineq: self.lin_ineq,
            lin_eq: self.lin_eq,
            x0: self.x0,
            v0: self.v0,
            options: self.options,
            algo: self.algo,
        }
    }

    /// Sets the nonlinear equality constraints `c(x) = 0`.
    pub fn with_eq<E2>(self, eq: E2) -> InteriorPointBuilder<'a, F, I, E2, A>
    where
        E2: Constraints<Field = F::Field>,
    {
        InteriorPointBuilder {
            f: self.f,
            ineq: self.ineq,
            eq,
            lin_ineq: self.lin_ineq,
            lin_eq: self.lin_eq,
            x0: self.x0,
            v0: self.v0,
            options: self.options,
            algo: self.algo,
        }
    }

    /// Sets the linear inequality constraints `A x + b <= 0`.
    pub fn with_linear_ineq(mut self, a: DMatrix<F::Field>, b: OVector<F::Field, Dyn>) -> Self {
        self.lin_ineq = Some((a, b));
        self
    }

    /// Sets the linear equality constraints `A x + b = 0`.
    pub fn with_linear_eq(mut self, a: DMatrix<F::Field>, b: OVector<F::Field, Dyn>) -> Self {
        self.lin_eq = Some((a, b));
        self
    }

    /// Sets the options.
    pub fn with_options(mut self, options: InteriorPointOptions<F::Field>) -> Self {
        self.options = options;
        self
    }

    /// Sets specific inner solver to be used.
    pub fn with_sqp<A2>(self, algo: A2) -> InteriorPointBuilder<'a, F, I, E, A2>
    where
        A2: Sqp<F::Field>,
    {
        InteriorPointBuilder {
            f: self.f,
            ineq: self.ineq,
            eq: self.eq,
            lin_ineq: self.lin_ineq,
            lin_eq: self.lin_eq,
            x0: self.x0,
            v0: self.v0,
            options: self.options,
            algo,
        }
    }
}

impl<'a, F, I, E, A> InteriorPointBuilder<'a, F, I, E, A>
where
    F: Objective,
    I: Constraints<Field = F::Field>,
    E: Constraints<Field = F::Field>,
    F::Hessian: 'a,
    I::Jacobian: 'a,
    E::Jacobian: 'a,
{
    /// Builds the [`InteriorPoint`] driver.
    ///
    /// Fails if the multipliers were not given or if dimensions of the problem
    /// parts are inconsistent.
    pub fn build(self) -> Result<InteriorPoint<'a, F, I, E, A>, ProblemError> {
        let Self {
            f,
            ineq,
            eq,
            lin_ineq,
            lin_eq,
            x0,
            v0,
            options,
            algo,
        } = self;

        let v0 = v0.ok_or(ProblemError::MissingMultipliers)?;
        let n = f.domain().dim();

        let linear = |lin: Option<(DMatrix<F::Field>, OVector<F::Field, Dyn>)>| match lin {
            Some((a, b)) => LinearConstraints::new(a, b),
            None => Ok(LinearConstraints::empty(n)),
        };

        let sub = BarrierSubproblem::new(
            f,
            ineq,
            eq,
            linear(lin_ineq)?,
            linear(lin_eq)?,
            x0,
            options.max_inner_iter(),
        )?;

        ProblemError::check("multipliers", sub.n_constraints(), v0.nrows())?;

        let inf = convert::<_, F::Field>(f64::INFINITY);
        let boundary = -convert::<_, F::Field>(BOUNDARY_PARAMETER);
        let lower = DVector::from_iterator(
            sub.dim(),
            std::iter::repeat(-inf)
                .take(sub.n_vars())
                .chain(std::iter::repeat(boundary).take(sub.n_slack())),
        );
        let upper = DVector::from_element(sub.dim(), inf);
        let bounds = StepBounds::new(lower, upper);

        let level = BarrierLevel::new(options.barrier_parameter_init(), options.tolerance_init());
        let state = OuterState::new(level, options.trust_radius_init(), v0);
        let z = sub.initial_iterate();

        Ok(InteriorPoint {
            sub,
            algo,
            options,
            bounds,
            state,
            z,
            last_level: None,
        })
    }
}

/// The driver for the interior point method.
///
/// Use [`InteriorPoint::builder`] to create it. For the usage of the driver,
/// see [module](self) documentation.
pub struct InteriorPoint<'a, F: Objective, I, E, A> {
    sub: BarrierSubproblem<'a, F, I, E>,
    algo: A,
    options: InteriorPointOptions<F::Field>,
    bounds: StepBounds<F::Field>,
    state: OuterState<F::Field>,
    z: OVector<F::Field, Dyn>,
    last_level: Option<BarrierLevel<F::Field>>,
}

impl<'a, F: Objective>
    InteriorPoint<'a, F, NoConstraints<F::Field>, NoConstraints<F::Field>, ByrdOmojokun<F::Field>>
{
    /// Returns the builder for specifying the problem and settings.
    pub fn builder(
        f: &'a F,
    ) -> InteriorPointBuilder<
        'a,
        F,
        NoConstraints<F::Field>,
        NoConstraints<F::Field>,
        ByrdOmojokun<F::Field>,
    > {
        let n = f.domain().dim();

        InteriorPointBuilder {
            f,
            ineq: NoConstraints::new(),
            eq: NoConstraints::new(),
            lin_ineq: None,
            lin_eq: None,
            x0: DVector::zeros(n),
            v0: None,
            options: InteriorPointOptions::default(),
            algo: ByrdOmojokun::new(),
        }
    }
}

impl<'a, F, I, E, A> InteriorPoint<'a, F, I, E, A>
where
    F: Objective,
    I: Constraints<Field = F::Field>,
    E: Constraints<Field = F::Field>,
    F::Hessian: 'a,
    I::Jacobian: 'a,
    E::Jacobian: 'a,
{
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        &self.z.as_slice()[..self.sub.n_vars()]
    }

    /// Returns reference to the current slack variables.
    pub fn slack(&self) -> &[F::Field] {
        &self.z.as_slice()[self.sub.n_vars()..]
    }

    /// Returns reference to the current combined iterate `[x; s]`.
    pub fn z(&self) -> &OVector<F::Field, Dyn> {
        &self.z
    }

    /// Returns the barrier level of the next outer iteration.
    pub fn level(&self) -> BarrierLevel<F::Field> {
        self.state.level()
    }

    /// Returns the barrier level of the last solved subproblem, if any.
    pub fn last_level(&self) -> Option<BarrierLevel<F::Field>> {
        self.last_level
    }

    /// Returns the trust region size for the next outer iteration.
    pub fn trust_radius(&self) -> F::Field {
        self.state.trust_radius()
    }

    /// Returns the current multipliers estimate.
    pub fn multipliers(&self) -> &OVector<F::Field, Dyn> {
        self.state.multipliers()
    }

    /// Returns the total number of inner iterations so far.
    pub fn total_iter(&self) -> usize {
        self.state.total_iter()
    }

    /// Returns the barrier subproblem.
    pub fn subproblem(&self) -> &BarrierSubproblem<'a, F, I, E> {
        &self.sub
    }

    /// Returns the options.
    pub fn options(&self) -> &InteriorPointOptions<F::Field> {
        &self.options
    }

    /// Returns the complementarity residual `max |s_i v_i|` over the slack
    /// variables and the corresponding multipliers.
    ///
    /// After an outer iteration the products `s_i v_i` approximate the barrier
    /// parameter of the [last solved level](InteriorPoint::last_level), so the
    /// residual goes to zero only as fast as the barrier parameter does. Keep
    /// calling [`next`](InteriorPoint::next) if a smaller residual is needed.
    pub fn complementarity(&self) -> F::Field {
        let offset = self.sub.n_eq() + self.sub.n_lin_eq();
        self.slack()
            .iter()
            .zip(self.state.multipliers().iter().skip(offset))
            .fold(F::Field::zero(), |acc, (&si, &vi)| acc.max((si * vi).abs()))
    }
}

impl<'a, F, I, E, A> InteriorPoint<'a, F, I, E, A>
where
    F: Objective,
    I: Constraints<Field = F::Field>,
    E: Constraints<Field = F::Field>,
    F::Hessian: 'a,
    I::Jacobian: 'a,
    E::Jacobian: 'a,
    A: Sqp<F::Field>,
{
    /// Does one outer iteration: solves the barrier subproblem at the current
    /// level and updates the barrier parameter, the tolerance, the trust region
    /// size and the multipliers estimate.
    ///
    /// The returned diagnostics contain the total number of inner iterations.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Diagnostics<F::Field>, A::Error> {
        let level = self.state.level();

        debug!(
            "outer iteration: barrier parameter = {}, tolerance = {}, trust radius = {}",
            level.barrier_parameter(),
            level.tolerance(),
            self.state.trust_radius()
        );

        let problem = self.sub.at(level);
        let mut diagnostics = self.algo.solve(
            &problem,
            &mut self.z,
            self.state.multipliers(),
            self.state.trust_radius(),
            &self.bounds,
            self.options.penalty_init(),
        )?;
        self.last_level = Some(level);

        debug!(
            "inner solve finished after {} iterations: optimality = {}, constraints violation = {}",
            diagnostics.niter(),
            diagnostics.optimality(),
            diagnostics.constr_violation()
        );

        self.state = self
            .state
            .clone()
            .update(&mut diagnostics, self.options.trust_radius_init());

        Ok(diagnostics)
    }

    /// Runs the outer iterations until given stopping criterion is satisfied.
    ///
    /// Returns the final point and the diagnostics of the last inner solve.
    pub fn find<C>(&mut self, stop: C) -> Result<(&[F::Field], Diagnostics<F::Field>), A::Error>
    where
        C: Fn(&Diagnostics<F::Field>) -> bool,
    {
        loop {
            let diagnostics = self.next()?;

            if stop(&diagnostics) {
                return Ok((self.x(), diagnostics));
            }
        }
    }

    /// Runs the outer iterations until the [default stopping
    /// criterion](default_stop) is satisfied.
    pub fn solve(&mut self) -> Result<(&[F::Field], Diagnostics<F::Field>), A::Error> {
        self.find(default_stop)
    }

    /// Returns the name of the used inner solver.
    pub fn name(&self) -> &str {
        A::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::testing::*;

    #[test]
    fn outer_state_decay_and_trust_floor() {
        let mut state = OuterState::new(BarrierLevel::new(0.1, 0.1), 1.0, dvector![0.0]);

        let mut rng = fastrand::Rng::with_seed(11);
        for k in 0..20 {
            let trust_radius = if k % 2 == 0 { rng.f64() * 1e-3 } else { rng.f64() * 10.0 };
            let mut diagnostics =
                Diagnostics::new(3, 1.0, 1.0, trust_radius, 1.0, dvector![k as f64]);

            let previous = state.clone();
            state = state.update(&mut diagnostics, 1.0);

            assert_eq!(
                state.level().barrier_parameter(),
                previous.level().barrier_parameter() * 0.2
            );
            assert_eq!(state.level().tolerance(), previous.level().tolerance() * 0.2);
            assert!(state.trust_radius() >= 1.0);
            assert_abs_diff_eq!(state.trust_radius(), (5.0 * trust_radius).max(1.0));
            assert_eq!(state.multipliers()[0], k as f64);
            assert_eq!(state.total_iter(), previous.total_iter() + 3);
            assert_eq!(diagnostics.niter(), state.total_iter());
        }
    }

    #[test]
    fn default_stopping_criterion() {
        let v = dvector![0.0];

        assert!(default_stop(&Diagnostics::new(10, 1e-9, 1e-9, 1.0, 1.0, v.clone())));
        assert!(!default_stop(&Diagnostics::new(10, 1e-7, 1e-9, 1.0, 1.0, v.clone())));
        assert!(!default_stop(&Diagnostics::new(10, 1e-9, 1e-7, 1.0, 1.0, v.clone())));
        assert!(default_stop(&Diagnostics::new(1001, 1.0, 1.0, 1.0, 1.0, v)));
    }

    #[test]
    fn missing_multipliers() {
        let f = BoundedParabola;
        let result = InteriorPoint::builder(&f).with_initial(vec![0.5]).build();

        assert_eq!(result.err(), Some(ProblemError::MissingMultipliers));
    }

    #[test]
    fn multipliers_dimension() {
        let f = BoundedParabola;
        let result = InteriorPoint::builder(&f)
            .with_initial(vec![0.5])
            .with_multipliers(vec![0.0])
            .build();

        assert_eq!(
            result.err(),
            Some(ProblemError::DimensionMismatch {
                what: "multipliers",
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn linear_offset_dimension() {
        let f = QuadraticHalfPlane;
        let result = InteriorPoint::builder(&f)
            .with_multipliers(vec![0.0])
            .with_linear_ineq(nalgebra::dmatrix![-1.0, -1.0], dvector![1.0, 2.0])
            .build();

        assert!(matches!(
            result.err(),
            Some(ProblemError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn initial_state() {
        let f = BoundedParabola;
        let solver = InteriorPoint::builder(&f)
            .with_initial(vec![0.5])
            .with_multipliers(vec![0.0, 0.0])
            .build()
            .unwrap();

        assert_eq!(solver.x(), &[0.5]);
        assert_eq!(solver.slack(), &[1.0, 1.0]);
        assert_eq!(solver.level(), BarrierLevel::new(0.1, 0.1));
        assert_eq!(solver.last_level(), None);
        assert_eq!(solver.trust_radius(), 1.0);
        assert_eq!(solver.name(), "Byrd-Omojokun");
        assert_eq!(solver.bounds.lower(), &dvector![f64::NEG_INFINITY, -0.995, -0.995]);
    }

    #[test]
    fn quadratic_half_plane() {
        let f = QuadraticHalfPlane;
        let (a, b) = QuadraticHalfPlane::linear_ineq();

        for x0 in f.initials() {
            let mut solver = InteriorPoint::builder(&f)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0])
                .with_linear_ineq(a.clone(), b.clone())
                .build()
                .unwrap();

            let (x, diagnostics) = solver.solve().unwrap();
            let x = DVector::from_row_slice(x);

            assert_abs_diff_eq!(x, dvector![0.5, 0.5], epsilon = 1e-4);
            assert_abs_diff_eq!(f.apply(&x), 0.5, epsilon = 1e-4);
            assert!(diagnostics.optimality() < 1e-6);
            assert!(diagnostics.constr_violation() < 1e-6);
        }
    }

    #[test]
    fn bounded_parabola() {
        let f = BoundedParabola;

        for x0 in f.initials() {
            let mut solver = InteriorPoint::builder(&f)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0, 0.0])
                .build()
                .unwrap();

            let (x, diagnostics) = solver.solve().unwrap();

            assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-4);
            assert!(diagnostics.optimality() < 1e-6);
            assert!(diagnostics.constr_violation() < 1e-6);

            let last = solver.last_level().unwrap();
            assert_abs_diff_eq!(
                solver.level().barrier_parameter(),
                last.barrier_parameter() * 0.2,
                epsilon = 1e-15
            );
            // The products s_i v_i settle at the barrier parameter.
            assert_abs_diff_eq!(
                solver.complementarity(),
                last.barrier_parameter(),
                epsilon = 0.1 * last.barrier_parameter()
            );

            while solver.last_level().unwrap().barrier_parameter() >= 1e-6 {
                let diagnostics = solver.next().unwrap();
                assert!(diagnostics.optimality() < 1e-6);
                assert!(diagnostics.constr_violation() < 1e-6);
            }

            assert_abs_diff_eq!(solver.x()[0], 1.0, epsilon = 1e-5);

            // Upper bound is active, lower bound is not.
            assert!(solver.multipliers()[0] > 0.0);
            assert_abs_diff_eq!(solver.multipliers()[0], 2.0, epsilon = 1e-3);
            assert!(solver.complementarity() < 1e-6);
        }
    }

    #[test]
    fn plane_with_bound() {
        let f = PlaneWithBound;
        let (a, b) = PlaneWithBound::linear_eq();

        for x0 in f.initials() {
            let mut solver = InteriorPoint::builder(&f)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0, 0.0])
                .with_linear_eq(a.clone(), b.clone())
                .build()
                .unwrap();

            assert_eq!(solver.subproblem().n_lin_eq(), 1);
            assert_eq!(solver.subproblem().n_slack(), 1);

            let (x, diagnostics) = solver.solve().unwrap();
            let x = DVector::from_row_slice(x);

            assert_abs_diff_eq!(x, f.optima()[0], epsilon = 1e-4);
            assert_abs_diff_eq!(x.sum(), 3.0, epsilon = 1e-6);
            assert!(diagnostics.optimality() < 1e-6);
            assert!(diagnostics.constr_violation() < 1e-6);

            // Equality multiplier first, then the upper bound of x1.
            assert_abs_diff_eq!(solver.multipliers()[0], -2.5, epsilon = 1e-3);
            assert_abs_diff_eq!(solver.multipliers()[1], 1.5, epsilon = 1e-3);
        }
    }

    #[test]
    fn hs071() {
        let f = Hs071;

        let mut solver = InteriorPoint::builder(&f)
            .with_initial(vec![1.0, 5.0, 5.0, 1.0])
            .with_multipliers(vec![0.0; 10])
            .with_ineq(Hs071Ineq)
            .with_eq(Hs071Eq)
            .build()
            .unwrap();

        let (x, _) = solver.solve().unwrap();
        let x = DVector::from_row_slice(x);

        assert_abs_diff_eq!(f.apply(&x), 17.014017, epsilon = 1e-3);
        assert_abs_diff_eq!(x, f.optima()[0], epsilon = 1e-2);
    }

    #[test]
    fn slacks_stay_positive() {
        let mut rng = fastrand::Rng::with_seed(42);

        for _ in 0..10 {
            let n = rng.usize(1..5);
            let m = rng.usize(0..4);
            let problem = RandomQp::generate(&mut rng, n, m);
            let (a, b) = problem.linear_ineq();
            let x0 = problem.initials().remove(0);

            let mut solver = InteriorPoint::builder(&problem)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0; problem.n_multipliers()])
                .with_ineq(problem.ball())
                .with_linear_ineq(a, b)
                .build()
                .unwrap();

            for _ in 0..6 {
                let diagnostics = solver.next().unwrap();

                assert!(solver.slack().iter().all(|&si| si > 0.0));

                if default_stop(&diagnostics) {
                    break;
                }
            }
        }
    }

    #[test]
    fn slacks_stay_positive_for_random_step_boxes() {
        let mut rng = fastrand::Rng::with_seed(5);

        for _ in 0..10 {
            let n = rng.usize(1..5);
            let m = rng.usize(0..4);
            let problem = RandomQp::generate(&mut rng, n, m);
            let (a, b) = problem.linear_ineq();

            let sub = BarrierSubproblem::new(
                &problem,
                problem.ball(),
                NoConstraints::new(),
                LinearConstraints::new(a, b).unwrap(),
                LinearConstraints::empty(n),
                problem.initials().remove(0),
                50,
            )
            .unwrap();

            // Fraction to the boundary between 0.5 and 0.999, upper bound on
            // the slack step either absent or between 1 and 10.
            let boundary = 0.5 + 0.499 * rng.f64();
            let lower = DVector::from_fn(sub.dim(), |i, _| {
                if i < n {
                    f64::NEG_INFINITY
                } else {
                    -boundary
                }
            });
            let upper = DVector::from_fn(sub.dim(), |i, _| {
                if i < n || rng.bool() {
                    f64::INFINITY
                } else {
                    1.0 + 9.0 * rng.f64()
                }
            });
            let bounds = StepBounds::new(lower, upper);

            let mut z = sub.initial_iterate();
            let mut v = DVector::zeros(sub.n_constraints());
            let mut level = BarrierLevel::new(0.1, 0.1);
            let mut sqp = ByrdOmojokun::new();

            for _ in 0..4 {
                let diagnostics = sqp
                    .solve(&sub.at(level), &mut z, &v, 1.0, &bounds, 1.0)
                    .unwrap();

                let (_, s) = sub.split(&z);
                assert!(s.iter().all(|&si| si > 0.0 && si.is_finite()));

                v = diagnostics.multipliers().clone_owned();
                level = level.decay(0.2);
            }
        }
    }
}
