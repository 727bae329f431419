use nalgebra::{storage::Storage, Dyn, IsContiguous, OVector, Vector};

use super::{base::Problem, operator::LinearOperator};

/// The trait for defining the objective function.
///
/// Besides the value and the gradient of the objective, the implementations
/// provide the Hessian of the Lagrangian
///
/// ```text
/// L(x, v_eq, v_ineq) = f(x) + v_eq^T c_eq(x) + v_ineq^T c_ineq(x)
/// ```
///
/// with respect to `x`, where `c_eq` and `c_ineq` are the *nonlinear*
/// equality and inequality constraints of the problem. Linear constraints and
/// bounds do not contribute to the Hessian. If the problem has no nonlinear
/// constraints, the multipliers slices are empty and the Hessian is just the
/// Hessian of the objective.
///
/// The Hessian is returned as a [`LinearOperator`] so that it does not have to
/// be formed explicitly. A dense [`DMatrix`](nalgebra::DMatrix) is a valid
/// choice for small problems.
pub trait Objective: Problem {
    /// Representation of the Hessian of the Lagrangian.
    type Hessian: LinearOperator<Self::Field>;

    /// Calculates the objective value.
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;

    /// Calculates the gradient of the objective.
    fn gradient<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;

    /// Calculates the Hessian of the Lagrangian at `x` with given multipliers
    /// of nonlinear equality and inequality constraints.
    fn hessian<Sx, Se, Si>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        v_eq: &Vector<Self::Field, Dyn, Se>,
        v_ineq: &Vector<Self::Field, Dyn, Si>,
    ) -> Self::Hessian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Se: Storage<Self::Field, Dyn> + IsContiguous,
        Si: Storage<Self::Field, Dyn> + IsContiguous;
}
