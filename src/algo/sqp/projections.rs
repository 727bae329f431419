use nalgebra::{convert, DMatrix, DVector, RealField};

use super::SqpError;

/// Projections onto the null space and the row space of the constraints
/// Jacobian `A` (m x n), computed from the QR factorization `A^T = Q R`.
pub(crate) struct Projections<T: RealField + Copy> {
    q: DMatrix<T>,
    r: DMatrix<T>,
}

impl<T: RealField + Copy> Projections<T> {
    /// Factorizes the Jacobian.
    ///
    /// Fails if the Jacobian does not have full row rank.
    pub fn new(a: &DMatrix<T>) -> Result<Self, SqpError> {
        let (m, n) = a.shape();

        if m > n {
            return Err(SqpError::RankDeficientJacobian);
        }

        if m == 0 {
            return Ok(Self {
                q: DMatrix::zeros(n, 0),
                r: DMatrix::zeros(0, 0),
            });
        }

        let qr = a.transpose().qr();
        let q = qr.q();
        let r = qr.r();

        let diag = r.diagonal();
        let max_diag = diag.iter().fold(T::zero(), |acc, rii| acc.max(rii.abs()));
        let tol = max_diag * convert(f64::EPSILON * n as f64);

        if max_diag == T::zero() || diag.iter().any(|rii| rii.abs() <= tol) {
            return Err(SqpError::RankDeficientJacobian);
        }

        Ok(Self { q, r })
    }

    /// Computes `x - A^T (A A^T)^-1 A x = x - Q Q^T x`.
    pub fn null_space(&self, x: &DVector<T>) -> DVector<T> {
        let qtx = self.q.tr_mul(x);
        x - &self.q * qtx
    }

    /// Computes the least-squares solution `y` of `A^T y = x`, that is,
    /// `R^-1 Q^T x`.
    pub fn least_squares(&self, x: &DVector<T>) -> DVector<T> {
        let mut y = self.q.tr_mul(x);
        self.r.solve_upper_triangular_mut(&mut y);
        y
    }

    /// Computes the minimum norm solution `x` of `A x = b`, that is,
    /// `Q R^-T b`.
    pub fn row_space(&self, b: &DVector<T>) -> DVector<T> {
        let mut y = b.clone_owned();
        self.r.tr_solve_upper_triangular_mut(&mut y);
        &self.q * y
    }

    /// Number of variables.
    pub fn nvars(&self) -> usize {
        self.q.nrows()
    }

    /// Number of constraints.
    pub fn nconstraints(&self) -> usize {
        self.q.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn projections_properties() {
        let a = dmatrix![1.0, 2.0, 0.0;
                         0.0, 1.0, 1.0];
        let proj = Projections::new(&a).unwrap();

        let x = dvector![1.0, -2.0, 3.0];
        let zx = proj.null_space(&x);
        assert_abs_diff_eq!(&a * &zx, dvector![0.0, 0.0], epsilon = 1e-12);
        assert_abs_diff_eq!(proj.null_space(&zx), zx, epsilon = 1e-12);

        let b = dvector![1.0, 4.0];
        let y = proj.row_space(&b);
        assert_abs_diff_eq!(&a * &y, b, epsilon = 1e-12);
        assert_abs_diff_eq!(proj.null_space(&y), dvector![0.0, 0.0, 0.0], epsilon = 1e-12);

        let g = a.transpose() * dvector![2.0, -1.0];
        assert_abs_diff_eq!(proj.least_squares(&g), dvector![2.0, -1.0], epsilon = 1e-12);
    }

    #[test]
    fn no_constraints() {
        let proj = Projections::new(&DMatrix::<f64>::zeros(0, 2)).unwrap();
        let x = dvector![1.0, 2.0];

        assert_eq!(proj.null_space(&x), x);
        assert_eq!(proj.row_space(&DVector::zeros(0)), dvector![0.0, 0.0]);
        assert_eq!(proj.least_squares(&x).nrows(), 0);
    }

    #[test]
    fn rank_deficient() {
        let a = dmatrix![1.0, 2.0;
                         2.0, 4.0];
        assert!(matches!(
            Projections::new(&a),
            Err(SqpError::RankDeficientJacobian)
        ));

        let a = dmatrix![1.0; 2.0];
        assert!(matches!(
            Projections::new(&a),
            Err(SqpError::RankDeficientJacobian)
        ));
    }
}
