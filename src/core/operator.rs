//! Matrix-free linear operators.
//!
//! Jacobian and Hessian matrices are never required to be formed explicitly.
//! Instead, they are represented by their action on a vector, which keeps the
//! memory proportional to the problem size. Dense matrices implement the
//! [`LinearOperator`] trait too, so the simple cases stay simple.
//!
//! Operators can be composed into block structures by [`BlockMatrix`] without
//! knowing the concrete types of the blocks.

use nalgebra::{DMatrix, DVector, Dyn, OVector, RealField};

/// Boxed linear operator, possibly borrowing data for `'a`.
pub type Operator<'a, T> = Box<dyn LinearOperator<T> + 'a>;

/// Linear operator with a fixed shape that can be applied to a vector.
pub trait LinearOperator<T: RealField + Copy> {
    /// Number of rows.
    fn nrows(&self) -> usize;

    /// Number of columns.
    fn ncols(&self) -> usize;

    /// Computes `y = A x`.
    ///
    /// The vector `x` has [`ncols`](LinearOperator::ncols) elements and `y`
    /// has [`nrows`](LinearOperator::nrows) elements.
    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>);

    /// Computes `y = A^T x`.
    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>);

    /// Returns the shape `(nrows, ncols)`.
    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Computes `A x` into a newly allocated vector.
    fn apply(&self, x: &OVector<T, Dyn>) -> OVector<T, Dyn> {
        let mut y = DVector::zeros(self.nrows());
        self.apply_mut(x, &mut y);
        y
    }

    /// Computes `A^T x` into a newly allocated vector.
    fn tr_apply(&self, x: &OVector<T, Dyn>) -> OVector<T, Dyn> {
        let mut y = DVector::zeros(self.ncols());
        self.tr_apply_mut(x, &mut y);
        y
    }

    /// Materializes the operator as a dense matrix.
    ///
    /// The default implementation applies the operator to all unit vectors.
    fn to_dense(&self) -> DMatrix<T> {
        let (m, n) = self.shape();
        let mut dense = DMatrix::zeros(m, n);
        let mut e = DVector::zeros(n);
        let mut col = DVector::zeros(m);

        for j in 0..n {
            e[j] = T::one();
            self.apply_mut(&e, &mut col);
            dense.set_column(j, &col);
            e[j] = T::zero();
        }

        dense
    }
}

impl<T: RealField + Copy> LinearOperator<T> for DMatrix<T> {
    fn nrows(&self) -> usize {
        self.shape().0
    }

    fn ncols(&self) -> usize {
        self.shape().1
    }

    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        self.mul_to(x, y);
    }

    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        self.tr_mul_to(x, y);
    }

    fn to_dense(&self) -> DMatrix<T> {
        self.clone()
    }
}

impl<T: RealField + Copy, O: LinearOperator<T> + ?Sized> LinearOperator<T> for &O {
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        (**self).apply_mut(x, y)
    }

    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        (**self).tr_apply_mut(x, y)
    }

    fn to_dense(&self) -> DMatrix<T> {
        (**self).to_dense()
    }
}

impl<T: RealField + Copy, O: LinearOperator<T> + ?Sized> LinearOperator<T> for Box<O> {
    fn nrows(&self) -> usize {
        (**self).nrows()
    }

    fn ncols(&self) -> usize {
        (**self).ncols()
    }

    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        (**self).apply_mut(x, y)
    }

    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        (**self).tr_apply_mut(x, y)
    }

    fn to_dense(&self) -> DMatrix<T> {
        (**self).to_dense()
    }
}

/// Diagonal operator `diag(d)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagonal<T: RealField + Copy> {
    diag: OVector<T, Dyn>,
}

impl<T: RealField + Copy> Diagonal<T> {
    /// Creates the operator from its diagonal elements.
    pub fn new(diag: OVector<T, Dyn>) -> Self {
        Self { diag }
    }

    /// Creates the identity operator of given dimension.
    pub fn identity(dim: usize) -> Self {
        Self::new(DVector::from_element(dim, T::one()))
    }
}

impl<T: RealField + Copy> LinearOperator<T> for Diagonal<T> {
    fn nrows(&self) -> usize {
        self.diag.nrows()
    }

    fn ncols(&self) -> usize {
        self.diag.nrows()
    }

    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        y.copy_from(x);
        y.component_mul_assign(&self.diag);
    }

    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        self.apply_mut(x, y)
    }

    fn to_dense(&self) -> DMatrix<T> {
        DMatrix::from_diagonal(&self.diag)
    }
}

/// Selected rows of the identity matrix multiplied by a sign.
///
/// Row `k` of the operator is `sign * e_{indices[k]}^T`. It is used for
/// expressing bound constraints on a subset of the variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T: RealField + Copy> {
    indices: Vec<usize>,
    ncols: usize,
    sign: T,
}

impl<T: RealField + Copy> Selection<T> {
    /// Creates the selection of given rows of the `ncols x ncols` identity.
    pub fn new(indices: Vec<usize>, ncols: usize, sign: T) -> Self {
        assert!(
            indices.iter().all(|&i| i < ncols),
            "selected index out of bounds"
        );
        Self {
            indices,
            ncols,
            sign,
        }
    }
}

impl<T: RealField + Copy> LinearOperator<T> for Selection<T> {
    fn nrows(&self) -> usize {
        self.indices.len()
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        for (k, &i) in self.indices.iter().enumerate() {
            y[k] = self.sign * x[i];
        }
    }

    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        y.fill(T::zero());
        for (k, &i) in self.indices.iter().enumerate() {
            y[i] += self.sign * x[k];
        }
    }
}

/// Block composition of linear operators.
///
/// The row and column partitions are fixed at construction. Blocks that are
/// not set act as zero blocks.
pub struct BlockMatrix<'a, T: RealField + Copy> {
    row_sizes: Vec<usize>,
    col_sizes: Vec<usize>,
    blocks: Vec<(usize, usize, Operator<'a, T>)>,
}

impl<'a, T: RealField + Copy> BlockMatrix<'a, T> {
    /// Creates a zero operator with given row and column partitions.
    pub fn zeros(row_sizes: Vec<usize>, col_sizes: Vec<usize>) -> Self {
        Self {
            row_sizes,
            col_sizes,
            blocks: Vec::new(),
        }
    }

    /// Sets the block in block row `i` and block column `j`.
    ///
    /// The shape of the operator must match the partitions.
    pub fn with_block(mut self, i: usize, j: usize, op: Operator<'a, T>) -> Self {
        assert!(
            i < self.row_sizes.len() && j < self.col_sizes.len(),
            "block index out of bounds"
        );
        assert_eq!(
            op.shape(),
            (self.row_sizes[i], self.col_sizes[j]),
            "block shape does not match the partition"
        );
        self.blocks.retain(|(bi, bj, _)| (*bi, *bj) != (i, j));
        self.blocks.push((i, j, op));
        self
    }

    /// Stacks operators with the same number of columns vertically.
    pub fn vstack(ncols: usize, ops: Vec<Operator<'a, T>>) -> Self {
        let row_sizes = ops.iter().map(|op| op.nrows()).collect();
        ops.into_iter()
            .enumerate()
            .fold(Self::zeros(row_sizes, vec![ncols]), |block, (i, op)| {
                block.with_block(i, 0, op)
            })
    }

    /// Composes square or rectangular operators into a block-diagonal operator.
    pub fn diagonal(ops: Vec<Operator<'a, T>>) -> Self {
        let row_sizes = ops.iter().map(|op| op.nrows()).collect();
        let col_sizes = ops.iter().map(|op| op.ncols()).collect();
        ops.into_iter()
            .enumerate()
            .fold(Self::zeros(row_sizes, col_sizes), |block, (i, op)| {
                block.with_block(i, i, op)
            })
    }

    fn offsets(sizes: &[usize]) -> Vec<usize> {
        sizes
            .iter()
            .scan(0, |offset, size| {
                let current = *offset;
                *offset += size;
                Some(current)
            })
            .collect()
    }
}

impl<'a, T: RealField + Copy> LinearOperator<T> for BlockMatrix<'a, T> {
    fn nrows(&self) -> usize {
        self.row_sizes.iter().sum()
    }

    fn ncols(&self) -> usize {
        self.col_sizes.iter().sum()
    }

    fn apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        let row_offsets = Self::offsets(&self.row_sizes);
        let col_offsets = Self::offsets(&self.col_sizes);

        y.fill(T::zero());

        for (i, j, op) in &self.blocks {
            let xj = x.rows(col_offsets[*j], self.col_sizes[*j]).clone_owned();
            let yi = op.apply(&xj);

            for (k, value) in yi.iter().enumerate() {
                y[row_offsets[*i] + k] += *value;
            }
        }
    }

    fn tr_apply_mut(&self, x: &OVector<T, Dyn>, y: &mut OVector<T, Dyn>) {
        let row_offsets = Self::offsets(&self.row_sizes);
        let col_offsets = Self::offsets(&self.col_sizes);

        y.fill(T::zero());

        for (i, j, op) in &self.blocks {
            let xi = x.rows(row_offsets[*i], self.row_sizes[*i]).clone_owned();
            let yj = op.tr_apply(&xi);

            for (k, value) in yj.iter().enumerate() {
                y[col_offsets[*j] + k] += *value;
            }
        }
    }

    fn to_dense(&self) -> DMatrix<T> {
        let row_offsets = Self::offsets(&self.row_sizes);
        let col_offsets = Self::offsets(&self.col_sizes);

        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());

        for (i, j, op) in &self.blocks {
            let block = op.to_dense();
            dense
                .view_mut(
                    (row_offsets[*i], col_offsets[*j]),
                    (self.row_sizes[*i], self.col_sizes[*j]),
                )
                .copy_from(&block);
        }

        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn diagonal_scales_elementwise() {
        let op = Diagonal::new(dvector![1.0, 2.0, 0.5]);
        let y = op.apply(&dvector![3.0, -1.0, 4.0]);

        assert_eq!(y, dvector![3.0, -2.0, 2.0]);
        assert_eq!(op.tr_apply(&dvector![3.0, -1.0, 4.0]), y);
    }

    #[test]
    fn selection_and_transpose() {
        let op = Selection::new(vec![2, 0], 3, -1.0);

        assert_eq!(op.apply(&dvector![1.0, 2.0, 3.0]), dvector![-3.0, -1.0]);
        assert_eq!(op.tr_apply(&dvector![1.0, 2.0]), dvector![-2.0, 0.0, -1.0]);
        assert_eq!(
            op.to_dense(),
            dmatrix![0.0, 0.0, -1.0;
                     -1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn block_matrix_matches_dense() {
        let a = dmatrix![1.0, 2.0;
                         3.0, 4.0];
        let b = dmatrix![5.0;
                         6.0];
        let c = dmatrix![7.0, 8.0];

        let block = BlockMatrix::zeros(vec![2, 1], vec![2, 1])
            .with_block(0, 0, Box::new(&a))
            .with_block(0, 1, Box::new(b.clone()))
            .with_block(1, 0, Box::new(c.clone()));

        let expected = dmatrix![1.0, 2.0, 5.0;
                                3.0, 4.0, 6.0;
                                7.0, 8.0, 0.0];

        assert_eq!(block.shape(), (3, 3));
        assert_eq!(block.to_dense(), expected);

        let x = dvector![1.0, -1.0, 2.0];
        assert_abs_diff_eq!(block.apply(&x), &expected * &x, epsilon = 1e-12);
        assert_abs_diff_eq!(
            block.tr_apply(&x),
            expected.transpose() * &x,
            epsilon = 1e-12
        );
    }

    #[test]
    fn block_diagonal_and_vstack() {
        let diag = BlockMatrix::diagonal(vec![
            Box::new(dmatrix![2.0]),
            Box::new(Diagonal::new(dvector![3.0, 4.0])),
        ]);
        assert_eq!(diag.apply(&dvector![1.0, 1.0, 1.0]), dvector![2.0, 3.0, 4.0]);

        let stack = BlockMatrix::vstack(
            2,
            vec![
                Box::new(dmatrix![1.0, 1.0]),
                Box::new(Selection::new(vec![1], 2, 1.0)),
            ],
        );
        assert_eq!(stack.apply(&dvector![2.0, 3.0]), dvector![5.0, 3.0]);
    }

    #[test]
    fn default_densification() {
        let sel = Selection::new(vec![1], 2, 2.0);
        let dense = LinearOperator::to_dense(&&sel);

        assert_eq!(dense, dmatrix![0.0, 2.0]);
    }

    #[test]
    fn empty_blocks() {
        let block: BlockMatrix<'_, f64> = BlockMatrix::zeros(vec![0, 2], vec![2]);

        assert_eq!(block.apply(&dvector![1.0, 2.0]), dvector![0.0, 0.0]);
        assert_eq!(block.tr_apply(&dvector![1.0, 2.0]), dvector![0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "block shape does not match the partition")]
    fn mismatching_block() {
        BlockMatrix::zeros(vec![1], vec![2]).with_block(0, 0, Box::new(dmatrix![1.0]));
    }
}
