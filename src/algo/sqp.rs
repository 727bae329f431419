//! Byrd-Omojokun trust region SQP method for equality constrained problems.
//!
//! Each step `d` is split into a *normal* step that reduces the linearized
//! constraints violation and a *tangential* step that reduces the quadratic
//! model of the Lagrangian while keeping the linearized constraints unchanged.
//! The normal step is computed by a dogleg method within a fraction of the
//! trust region, the tangential step by projected conjugate gradient within the
//! rest. Both respect bounds on the step, which is how the interior point
//! method implements the fraction to the boundary rule.
//!
//! The steps are accepted or rejected based on the reduction of the merit
//! function `f(z) + penalty ||c(z)||`, with the penalty parameter increased
//! whenever needed for the predicted reduction to be positive. Second order
//! corrections are not implemented.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [An Interior Point Algorithm for Large-Scale Nonlinear
//! Programming](https://doi.org/10.1137/S1052623497325107)
//!
//! \[3\] [Trust Region
//! Methods](https://epubs.siam.org/doi/book/10.1137/1.9780898719857)

mod projections;
mod qp;

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{convert, DVector, Dyn, OVector, RealField};
use thiserror::Error;

use crate::core::{Diagnostics, EqualityProblem, LinearOperator, Sqp, StepBounds};

use projections::Projections;
use qp::{modified_dogleg, projected_cg};

/// Options for [`ByrdOmojokun`] solver.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct ByrdOmojokunOptions<T: RealField + Copy> {
    /// Fraction of the predicted reduction that must be attributed to the
    /// constraints violation when adjusting the penalty. Default: `0.3`.
    penalty_factor: T,
    /// Reduction ratio above which the trust region is enlarged by
    /// `enlargement_large`. Default: `0.9`.
    large_reduction_ratio: T,
    /// Reduction ratio above which the trust region is enlarged by
    /// `enlargement_small`. Default: `0.3`.
    intermediary_reduction_ratio: T,
    /// Reduction ratio that needs to be reached to accept the step. Default:
    /// `1e-8`.
    sufficient_reduction_ratio: T,
    /// Default: `7`.
    enlargement_large: T,
    /// Default: `2`.
    enlargement_small: T,
    /// Largest allowed trust region reduction factor. Default: `0.5`.
    max_trust_reduction: T,
    /// Smallest allowed trust region reduction factor. Default: `0.1`.
    min_trust_reduction: T,
    /// Fraction of the trust region available for the normal step. Default:
    /// `0.8`.
    tr_factor: T,
    /// Fraction of the step bounds available for the normal step. Default:
    /// `0.5`.
    box_factor: T,
    /// Trust region size under which the solving stops. Default: `1e-8`.
    delta_min: T,
}

impl<T: RealField + Copy> Default for ByrdOmojokunOptions<T> {
    fn default() -> Self {
        Self {
            penalty_factor: convert(0.3),
            large_reduction_ratio: convert(0.9),
            intermediary_reduction_ratio: convert(0.3),
            sufficient_reduction_ratio: convert(1e-8),
            enlargement_large: convert(7.0),
            enlargement_small: convert(2.0),
            max_trust_reduction: convert(0.5),
            min_trust_reduction: convert(0.1),
            tr_factor: convert(0.8),
            box_factor: convert(0.5),
            delta_min: convert(1e-8),
        }
    }
}

/// Byrd-Omojokun trust region SQP solver.
///
/// See [module](self) documentation for more details.
#[derive(Debug, Clone)]
pub struct ByrdOmojokun<T: RealField + Copy> {
    options: ByrdOmojokunOptions<T>,
}

impl<T: RealField + Copy> ByrdOmojokun<T> {
    /// Initializes the solver with default options.
    pub fn new() -> Self {
        Self::with_options(ByrdOmojokunOptions::default())
    }

    /// Initializes the solver with given options.
    pub fn with_options(options: ByrdOmojokunOptions<T>) -> Self {
        Self { options }
    }

    /// Gets the options.
    pub fn options(&self) -> &ByrdOmojokunOptions<T> {
        &self.options
    }
}

impl<T: RealField + Copy> Default for ByrdOmojokun<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned from [`ByrdOmojokun`] solver.
#[derive(Debug, Error)]
pub enum SqpError {
    /// The constraints Jacobian does not have full row rank.
    #[error("constraints jacobian is rank deficient")]
    RankDeficientJacobian,
}

fn inf_norm<T: RealField + Copy>(x: &DVector<T>) -> T {
    x.iter().fold(T::zero(), |acc, xi| acc.max(xi.abs()))
}

impl<T: RealField + Copy> Sqp<T> for ByrdOmojokun<T> {
    const NAME: &'static str = "Byrd-Omojokun";

    type Error = SqpError;

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
        P: EqualityProblem<Field = T>,
    {
        let ByrdOmojokunOptions {
            penalty_factor,
            large_reduction_ratio,
            intermediary_reduction_ratio,
            sufficient_reduction_ratio,
            enlargement_large,
            enlargement_small,
            max_trust_reduction,
            min_trust_reduction,
            tr_factor,
            box_factor,
            delta_min,
        } = self.options;

        assert_eq!(bounds.dim(), p.dim(), "invalid step bounds dimension");

        let zero = T::zero();
        let one = T::one();
        let half = convert::<_, T>(0.5);
        let min_vpred = convert::<_, T>(1e-16);

        let mut trust_radius = trust_radius;
        let mut penalty = penalty;

        let lb_n = bounds.lower() * box_factor;
        let ub_n = bounds.upper() * box_factor;

        // Compute f(z), c(z), grad f(z) and A(z).
        let mut fz = p.objective(z);
        let mut b = p.constraints(z);
        let mut c = p.gradient(z);
        let mut a = p.jacobian(z).to_dense();
        let mut proj = Projections::new(&a)?;

        // The given multipliers are used only for the first Hessian, then the
        // least-squares estimates are used.
        let mut v_ls = -proj.least_squares(&c);
        let mut hes = p.lagrangian_hessian(z, v);

        let mut optimality = inf_norm(&(&c + a.tr_mul(&v_ls)));
        let mut constr_violation = inf_norm(&b);
        let mut niter = 0;

        let mut diagnostics = Diagnostics::new(
            niter,
            optimality,
            constr_violation,
            trust_radius,
            penalty,
            v_ls.clone(),
        );

        while !p.stop(&diagnostics) {
            if trust_radius < delta_min {
                debug!(
                    "trust region size {} fell below the minimum {}",
                    trust_radius, delta_min
                );
                break;
            }

            // Normal step.
            let dn = modified_dogleg(&a, &proj, &b, tr_factor * trust_radius, &lb_n, &ub_n);
            let dn_norm = dn.norm();

            // Tangential step.
            let c_t = hes.apply(&dn) + &c;
            let b_t = DVector::zeros(b.nrows());
            let trust_radius_t = (trust_radius * trust_radius - dn_norm * dn_norm)
                .max(zero)
                .sqrt();
            let lb_t = bounds.lower() - &dn;
            let ub_t = bounds.upper() - &dn;
            let (dt, cg_info) =
                projected_cg(&*hes, &c_t, &proj, &b_t, trust_radius_t, &lb_t, &ub_t);

            debug!(
                "tangential step: {} CG iterations, stop = {:?}, hits boundary = {}",
                cg_info.niter, cg_info.stop, cg_info.hits_boundary
            );

            let d = &dn + &dt;
            let d_norm = d.norm();

            // Predicted reduction of the merit function.
            let quadratic_model = half * hes.apply(&d).dot(&d) + c.dot(&d);
            let linearized_constr = &a * &d + &b;
            let b_norm = b.norm();
            let vpred = (b_norm - linearized_constr.norm()).max(min_vpred);

            let previous_penalty = penalty;
            if quadratic_model > zero {
                let new_penalty = quadratic_model / ((one - penalty_factor) * vpred);
                penalty = penalty.max(new_penalty);
            }
            let predicted_reduction = -quadratic_model + penalty * vpred;

            // Actual reduction of the merit function.
            let merit = fz + penalty * b_norm;
            let z_next = &*z + p.scaling(z).apply(&d);
            let fz_next = p.objective(&z_next);
            let b_next = p.constraints(&z_next);
            let merit_next = fz_next + penalty * b_next.norm();
            let actual_reduction = merit - merit_next;

            let reduction_ratio = actual_reduction / predicted_reduction;
            let reduction_ratio = if reduction_ratio.is_finite() {
                reduction_ratio
            } else {
                debug!("reduction ratio is not finite");
                -T::from_subset(&f64::INFINITY)
            };

            debug!(
                "reduction ratio = {} / {} = {} (|| d || = {}, penalty = {})",
                actual_reduction, predicted_reduction, reduction_ratio, d_norm, penalty
            );

            // Potentially update the size of the trust region.
            let trust_radius_old = trust_radius;
            if reduction_ratio >= large_reduction_ratio {
                trust_radius = trust_radius.max(enlargement_large * d_norm);
            } else if reduction_ratio >= intermediary_reduction_ratio {
                trust_radius = trust_radius.max(enlargement_small * d_norm);
            } else if reduction_ratio < sufficient_reduction_ratio {
                let trust_reduction =
                    (one - sufficient_reduction_ratio) / (one - reduction_ratio);
                let new_trust_radius = trust_reduction * d_norm;

                if new_trust_radius >= max_trust_reduction * trust_radius {
                    trust_radius *= max_trust_reduction;
                } else if new_trust_radius >= min_trust_reduction * trust_radius {
                    trust_radius = new_trust_radius;
                } else {
                    trust_radius *= min_trust_reduction;
                }
            }

            if trust_radius != trust_radius_old {
                debug!(
                    "trust region size changed from {} to {}",
                    trust_radius_old, trust_radius
                );
            }

            // Decide if the step is accepted or not.
            if reduction_ratio >= sufficient_reduction_ratio {
                z.copy_from(&z_next);
                fz = fz_next;
                b = b_next;

                c = p.gradient(z);
                a = p.jacobian(z).to_dense();
                proj = Projections::new(&a)?;
                v_ls = -proj.least_squares(&c);
                hes = p.lagrangian_hessian(z, &v_ls);

                optimality = inf_norm(&(&c + a.tr_mul(&v_ls)));
                constr_violation = inf_norm(&b);

                debug!(
                    "step accepted, optimality = {}, constraints violation = {}",
                    optimality, constr_violation
                );
            } else {
                penalty = previous_penalty;
                debug!("step rejected");
            }

            niter += 1;
            diagnostics = Diagnostics::new(
                niter,
                optimality,
                constr_violation,
                trust_radius,
                penalty,
                v_ls.clone(),
            );
        }

        Ok(diagnostics)
    }
}
