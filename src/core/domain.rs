//! Problem domain definition (dimensionality, bounds).

use std::iter::FromIterator;

use nalgebra::{DimName, Dyn, OVector, RealField, U1};

/// Domain for a problem.
///
/// The domain is a rectangle given by lower and upper bounds of the variables.
/// Positive and negative infinity indicate that the variable is unbounded in
/// that direction.
#[derive(Debug, Clone)]
pub struct Domain<T: RealField + Copy> {
    lower: OVector<T, Dyn>,
    upper: OVector<T, Dyn>,
}

impl<T: RealField + Copy> Domain<T> {
    /// Creates unconstrained domain with given dimensionality.
    pub fn unconstrained(dim: usize) -> Self {
        assert!(dim > 0, "empty domain");

        let inf = T::from_subset(&f64::INFINITY);
        let n = Dyn(dim);

        Self {
            lower: OVector::from_element_generic(n, U1::name(), -inf),
            upper: OVector::from_element_generic(n, U1::name(), inf),
        }
    }

    /// Creates rectangular domain with given lower and upper bounds.
    ///
    /// Positive and negative infinity can be used to indicate a value unbounded
    /// in that dimension and direction. If the entire domain is unconstrained,
    /// use [`Domain::unconstrained`] instead.
    pub fn rect(lower: Vec<T>, upper: Vec<T>) -> Self {
        assert!(
            lower.len() == upper.len(),
            "lower and upper have different size"
        );

        let dim = lower.len();
        assert!(dim > 0, "empty domain");
        assert!(
            lower.iter().zip(upper.iter()).all(|(l, u)| l <= u),
            "lower bound greater than upper bound"
        );

        let dim = Dyn(dim);
        let lower = OVector::from_iterator_generic(dim, U1::name(), lower);
        let upper = OVector::from_iterator_generic(dim, U1::name(), upper);

        Self { lower, upper }
    }

    /// Gets the dimensionality of the domain.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Gets the lower bounds.
    pub fn lower(&self) -> &OVector<T, Dyn> {
        &self.lower
    }

    /// Gets the upper bounds.
    pub fn upper(&self) -> &OVector<T, Dyn> {
        &self.upper
    }

    /// Indices of variables with a finite lower bound.
    pub fn finite_lower(&self) -> Vec<usize> {
        finite_indices(&self.lower)
    }

    /// Indices of variables with a finite upper bound.
    pub fn finite_upper(&self) -> Vec<usize> {
        finite_indices(&self.upper)
    }
}

fn finite_indices<T: RealField + Copy>(bounds: &OVector<T, Dyn>) -> Vec<usize> {
    bounds
        .iter()
        .enumerate()
        .filter(|(_, bound)| bound.is_finite())
        .map(|(i, _)| i)
        .collect()
}

impl<T: RealField + Copy> FromIterator<(T, T)> for Domain<T> {
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let (lower, upper) = iter.into_iter().unzip();
        Self::rect(lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_bounds() {
        let inf = f64::INFINITY;
        let dom = Domain::rect(vec![0.0, -inf, -1.0], vec![inf, inf, 1.0]);

        assert_eq!(dom.dim(), 3);
        assert_eq!(dom.finite_lower(), vec![0, 2]);
        assert_eq!(dom.finite_upper(), vec![2]);
    }

    #[test]
    fn unconstrained() {
        let dom = Domain::<f64>::unconstrained(4);

        assert!(dom.finite_lower().is_empty());
        assert!(dom.finite_upper().is_empty());
    }

    #[test]
    fn from_pairs() {
        let dom: Domain<f64> = [(0.0, 1.0), (-2.0, 2.0)].into_iter().collect();

        assert_eq!(dom.lower().as_slice(), &[0.0, -2.0]);
        assert_eq!(dom.upper().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "lower bound greater than upper bound")]
    fn inverted_bounds() {
        Domain::rect(vec![1.0], vec![0.0]);
    }
}
