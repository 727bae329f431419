//! Trust region subproblems of the Byrd-Omojokun decomposition: the normal step
//! computed by a dogleg method and the tangential step computed by projected
//! conjugate gradient. Both respect a spherical trust region and a box.

use log::debug;
use nalgebra::{convert, DVector, RealField};

use super::projections::Projections;
use crate::core::LinearOperator;

const CLOSE_TO_ZERO: f64 = 1e-25;

fn infinity<T: RealField + Copy>() -> T {
    T::from_subset(&f64::INFINITY)
}

fn clip_segment<T: RealField + Copy>(ta: T, tb: T, entire_line: bool) -> Option<(T, T)> {
    if entire_line {
        Some((ta, tb))
    } else if tb < T::zero() || ta > T::one() {
        None
    } else {
        Some((ta.max(T::zero()), tb.min(T::one())))
    }
}

/// Finds the segment of the line `z + t d` inside the ball `||x|| <= delta`.
///
/// Unless `entire_line` is set, only `t` from `[0, 1]` is considered.
pub(crate) fn sphere_intersections<T: RealField + Copy>(
    z: &DVector<T>,
    d: &DVector<T>,
    trust_radius: T,
    entire_line: bool,
) -> Option<(T, T)> {
    let zero = T::zero();

    if d.norm() == zero {
        return None;
    }

    if !trust_radius.is_finite() {
        let inf = infinity::<T>();
        return Some(if entire_line { (-inf, inf) } else { (zero, inf) });
    }

    let two = convert::<_, T>(2.0);
    let four = convert::<_, T>(4.0);

    let a = d.dot(d);
    let b = two * z.dot(d);
    let c = z.dot(z) - trust_radius * trust_radius;

    let discriminant = b * b - four * a * c;
    if discriminant < zero {
        return None;
    }

    // Avoids the cancellation in the usual formula.
    let aux = b + discriminant.sqrt().copysign(b);
    let ta = -aux / (two * a);
    let tb = -two * c / aux;
    let (ta, tb) = if ta <= tb { (ta, tb) } else { (tb, ta) };

    clip_segment(ta, tb, entire_line)
}

/// Finds the segment of the line `z + t d` inside the box `lb <= x <= ub`.
///
/// Unless `entire_line` is set, only `t` from `[0, 1]` is considered.
pub(crate) fn box_intersections<T: RealField + Copy>(
    z: &DVector<T>,
    d: &DVector<T>,
    lb: &DVector<T>,
    ub: &DVector<T>,
    entire_line: bool,
) -> Option<(T, T)> {
    let zero = T::zero();

    if d.norm() == zero {
        return None;
    }

    let mut ta = -infinity::<T>();
    let mut tb = infinity::<T>();

    for i in 0..z.nrows() {
        if d[i] == zero {
            if z[i] < lb[i] || z[i] > ub[i] {
                return None;
            }
            continue;
        }

        let t_lb = (lb[i] - z[i]) / d[i];
        let t_ub = (ub[i] - z[i]) / d[i];
        ta = ta.max(t_lb.min(t_ub));
        tb = tb.min(t_lb.max(t_ub));
    }

    if ta > tb {
        return None;
    }

    clip_segment(ta, tb, entire_line)
}

/// Finds the segment of the line `z + t d` inside both the ball and the box.
pub(crate) fn box_sphere_intersections<T: RealField + Copy>(
    z: &DVector<T>,
    d: &DVector<T>,
    lb: &DVector<T>,
    ub: &DVector<T>,
    trust_radius: T,
    entire_line: bool,
) -> Option<(T, T)> {
    let (ta_b, tb_b) = box_intersections(z, d, lb, ub, entire_line)?;
    let (ta_s, tb_s) = sphere_intersections(z, d, trust_radius, entire_line)?;

    let ta = ta_b.max(ta_s);
    let tb = tb_b.min(tb_s);

    if ta <= tb {
        Some((ta, tb))
    } else {
        None
    }
}

pub(crate) fn inside_box_boundaries<T: RealField + Copy>(
    x: &DVector<T>,
    lb: &DVector<T>,
    ub: &DVector<T>,
) -> bool {
    x.iter()
        .zip(lb.iter().zip(ub.iter()))
        .all(|(xi, (li, ui))| li <= xi && xi <= ui)
}

pub(crate) fn reinforce_box_boundaries<T: RealField + Copy>(
    x: &DVector<T>,
    lb: &DVector<T>,
    ub: &DVector<T>,
) -> DVector<T> {
    DVector::from_iterator(
        x.nrows(),
        x.iter()
            .zip(lb.iter().zip(ub.iter()))
            .map(|(&xi, (&li, &ui))| xi.max(li).min(ui)),
    )
}

/// Furthest point of the segment from `z` to `z + d` within the ball and the
/// box, or `z` if there is none.
fn furthest_along<T: RealField + Copy>(
    z: &DVector<T>,
    d: &DVector<T>,
    lb: &DVector<T>,
    ub: &DVector<T>,
    trust_radius: T,
) -> DVector<T> {
    let alpha = box_sphere_intersections(z, d, lb, ub, trust_radius, false)
        .map(|(_, tb)| tb)
        .unwrap_or_else(T::zero);
    z + d * alpha
}

/// Approximately minimizes `||A x + b||` subject to `||x|| <= delta` and
/// `lb <= x <= ub` using a dogleg path between the Cauchy point and the
/// minimum norm Newton point.
///
/// The box must contain the origin.
pub(crate) fn modified_dogleg<T, A>(
    a: &A,
    proj: &Projections<T>,
    b: &DVector<T>,
    trust_radius: T,
    lb: &DVector<T>,
    ub: &DVector<T>,
) -> DVector<T>
where
    T: RealField + Copy,
    A: LinearOperator<T> + ?Sized,
{
    let newton = -proj.row_space(b);

    if inside_box_boundaries(&newton, lb, ub) && newton.norm() <= trust_radius {
        debug!("normal step: full Newton");
        return newton;
    }

    let origin = DVector::zeros(newton.nrows());
    let x2 = furthest_along(&origin, &newton, lb, ub, trust_radius);

    let g = a.tr_apply(b);
    let a_g = a.apply(&g);
    let a_g_norm2 = a_g.norm_squared();

    if a_g_norm2 == T::zero() {
        debug!("normal step: truncated Newton (zero gradient)");
        return x2;
    }

    let cauchy = &g * (-g.norm_squared() / a_g_norm2);
    let p = &newton - &cauchy;

    let x1 = match box_sphere_intersections(&cauchy, &p, lb, ub, trust_radius, false) {
        Some((_, alpha)) => &cauchy + &p * alpha,
        None => furthest_along(&origin, &cauchy, lb, ub, trust_radius),
    };

    let residual1 = (a.apply(&x1) + b).norm();
    let residual2 = (a.apply(&x2) + b).norm();

    if residual1 < residual2 {
        debug!("normal step: dogleg (|| A x + b || = {})", residual1);
        x1
    } else {
        debug!("normal step: truncated Newton (|| A x + b || = {})", residual2);
        x2
    }
}

/// Reason for termination of [`projected_cg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CgStop {
    /// Maximum number of iterations or infeasible iterations reached.
    MaxIter,
    /// The iterate reached the trust region boundary.
    TrustRegion,
    /// Direction of nonpositive curvature encountered.
    NegativeCurvature,
    /// The projected residual is small enough.
    Converged,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CgInfo {
    pub niter: usize,
    pub stop: CgStop,
    pub hits_boundary: bool,
}

/// Approximately minimizes `1/2 x^T H x + c^T x` subject to `A x + b = 0`,
/// `||x|| <= delta` and `lb <= x <= ub` using projected conjugate gradient.
#[allow(clippy::too_many_arguments)]
pub(crate) fn projected_cg<T, H>(
    h: &H,
    c: &DVector<T>,
    proj: &Projections<T>,
    b: &DVector<T>,
    trust_radius: T,
    lb: &DVector<T>,
    ub: &DVector<T>,
) -> (DVector<T>, CgInfo)
where
    T: RealField + Copy,
    H: LinearOperator<T> + ?Sized,
{
    let zero = T::zero();
    let close_to_zero = convert::<_, T>(CLOSE_TO_ZERO);

    let n = proj.nvars();
    let m = proj.nconstraints();
    let max_iter = n - m;
    let max_infeasible_iter = n - m;

    // Feasible initial point.
    let mut x = -proj.row_space(b);
    let mut r = proj.null_space(&(h.apply(&x) + c));
    let mut g = proj.null_space(&r);
    let mut p = -&g;
    let mut h_p = h.apply(&p);
    let mut rt_g = g.norm_squared();

    let tr_distance = trust_radius - x.norm();
    if tr_distance < close_to_zero {
        let info = CgInfo {
            niter: 0,
            stop: CgStop::TrustRegion,
            hits_boundary: true,
        };
        return (x, info);
    }

    let tol = (convert::<_, T>(0.01) * rt_g.sqrt())
        .min(convert::<_, T>(0.1) * rt_g)
        .max(close_to_zero);

    let mut info = CgInfo {
        niter: 0,
        stop: CgStop::MaxIter,
        hits_boundary: false,
    };
    let mut infeasible_iter = 0;
    let mut last_feasible_x = DVector::zeros(n);

    for _ in 0..max_iter {
        if rt_g < tol {
            info.stop = CgStop::Converged;
            break;
        }

        info.niter += 1;

        let pt_h_p = h_p.dot(&p);
        if pt_h_p <= zero {
            if let Some((_, alpha)) =
                box_sphere_intersections(&x, &p, lb, ub, trust_radius, true)
            {
                if alpha.is_finite() {
                    x += &p * alpha;
                }
            }
            x = reinforce_box_boundaries(&x, lb, ub);
            info.stop = CgStop::NegativeCurvature;
            info.hits_boundary = true;
            break;
        }

        let alpha = rt_g / pt_h_p;
        let alpha_p = &p * alpha;
        let x_next = &x + &alpha_p;

        if x_next.norm() >= trust_radius {
            if let Some((_, theta)) =
                box_sphere_intersections(&x, &alpha_p, lb, ub, trust_radius, false)
            {
                x += &alpha_p * theta;
            }
            x = reinforce_box_boundaries(&x, lb, ub);
            info.stop = CgStop::TrustRegion;
            info.hits_boundary = true;
            break;
        }

        if inside_box_boundaries(&x_next, lb, ub) {
            last_feasible_x.copy_from(&x_next);
            infeasible_iter = 0;
        } else {
            infeasible_iter += 1;
        }

        if infeasible_iter > max_infeasible_iter {
            break;
        }

        let r_next = &r + &h_p * alpha;
        let g_next = proj.null_space(&r_next);
        let rt_g_next = g_next.norm_squared();
        let beta = rt_g_next / rt_g;

        p = &p * beta - &g_next;
        x = x_next;
        r = g_next.clone();
        g = g_next;
        rt_g = g.norm_squared();
        h_p = h.apply(&p);
    }

    if !inside_box_boundaries(&x, lb, ub) {
        x = last_feasible_x;
        info.hits_boundary = true;
    }

    (x, info)
}
