//! Abstractions for nonlinear and linear constraints.
//!
//! Nonlinear inequality constraints are expressed as `c(x) <= 0`, nonlinear
//! equality constraints as `c(x) = 0`. Linear constraints are given by a
//! matrix `A` and an offset `b` and are expressed as `A x + b <= 0` or
//! `A x + b = 0`, respectively. Note that the offset has the opposite sign than
//! in the usual `A x <= b` form.

use std::marker::PhantomData;

use nalgebra::{
    storage::Storage, DMatrix, DVector, Dyn, IsContiguous, OVector, RealField, Vector,
};

use super::{base::ProblemError, operator::LinearOperator};

/// The trait for defining a set of nonlinear constraints.
///
/// Whether the constraints are equalities or inequalities is determined by the
/// place where they are passed to the
/// [`InteriorPoint`](crate::driver::InteriorPoint) builder.
pub trait Constraints {
    /// Type of the field, usually f64 or f32.
    type Field: RealField + Copy;

    /// Representation of the Jacobian matrix.
    type Jacobian: LinearOperator<Self::Field>;

    /// Number of constraints.
    fn len(&self) -> usize;

    /// Determines whether there are no constraints.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calculates the values of the constraints.
    fn eval<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;

    /// Calculates the Jacobian matrix of the constraints. It has
    /// [`len`](Constraints::len) rows and as many columns as there are
    /// variables.
    fn jacobian<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Jacobian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

impl<C: Constraints + ?Sized> Constraints for &C {
    type Field = C::Field;
    type Jacobian = C::Jacobian;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn eval<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (**self).eval(x)
    }

    fn jacobian<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Jacobian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (**self).jacobian(x)
    }
}

/// Empty set of constraints.
#[derive(Debug, Clone, Copy)]
pub struct NoConstraints<T>(PhantomData<T>);

impl<T> NoConstraints<T> {
    /// Creates the empty set.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NoConstraints<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Copy> Constraints for NoConstraints<T> {
    type Field = T;
    type Jacobian = DMatrix<T>;

    fn len(&self) -> usize {
        0
    }

    fn eval<Sx>(&self, _x: &Vector<Self::Field, Dyn, Sx>) -> OVector<Self::Field, Dyn>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        DVector::zeros(0)
    }

    fn jacobian<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Jacobian
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        DMatrix::zeros(0, x.nrows())
    }
}

/// Linear constraints given by matrix `A` and offset `b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraints<T: RealField + Copy> {
    a: DMatrix<T>,
    b: OVector<T, Dyn>,
}

impl<T: RealField + Copy> LinearConstraints<T> {
    /// Creates the linear constraints `A x + b`.
    ///
    /// Fails if the number of rows of `A` does not match the length of `b`.
    pub fn new(a: DMatrix<T>, b: OVector<T, Dyn>) -> Result<Self, ProblemError> {
        ProblemError::check("linear constraints offset", a.nrows(), b.nrows())?;
        Ok(Self { a, b })
    }

    /// Creates an empty set of linear constraints on `dim` variables.
    pub fn empty(dim: usize) -> Self {
        Self {
            a: DMatrix::zeros(0, dim),
            b: DVector::zeros(0),
        }
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.b.nrows()
    }

    /// Determines whether there are no constraints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the matrix `A`.
    pub fn matrix(&self) -> &DMatrix<T> {
        &self.a
    }

    /// Calculates `A x + b`.
    pub fn residual<Sx>(&self, x: &Vector<T, Dyn, Sx>) -> OVector<T, Dyn>
    where
        Sx: Storage<T, Dyn>,
    {
        &self.a * x + &self.b
    }
}
