use ipsolver::nalgebra as na;
use ipsolver::{Constraints, Domain, InteriorPoint, Objective, Problem};
use na::{DMatrix, Dyn, IsContiguous, OVector};

// Problem 71 from the Hock-Schittkowski collection.
struct Hs071;

impl Problem for Hs071 {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::rect(vec![1.0; 4], vec![5.0; 4])
    }
}

impl Objective for Hs071 {
    type Hessian = DMatrix<f64>;

    fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        x[0] * x[3] * (x[0] + x[1] + x[2]) + x[2]
    }

    fn gradient<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> OVector<f64, Dyn>
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        let sum = x[0] + x[1] + x[2];
        na::dvector![
            x[3] * (x[0] + sum),
            x[0] * x[3],
            x[0] * x[3] + 1.0,
            x[0] * sum
        ]
    }

    fn hessian<Sx, Se, Si>(
        &self,
        x: &na::Vector<f64, Dyn, Sx>,
        v_eq: &na::Vector<f64, Dyn, Se>,
        v_ineq: &na::Vector<f64, Dyn, Si>,
    ) -> DMatrix<f64>
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
        Se: na::storage::Storage<f64, Dyn> + IsContiguous,
        Si: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        let (x1, x2, x3, x4) = (x[0], x[1], x[2], x[3]);
        let (ve, vi) = (v_eq[0], v_ineq[0]);

        let objective = na::dmatrix![
            2.0 * x4, x4, x4, 2.0 * x1 + x2 + x3;
            x4, 0.0, 0.0, x1;
            x4, 0.0, 0.0, x1;
            2.0 * x1 + x2 + x3, x1, x1, 0.0
        ];

        let product = na::dmatrix![
            0.0, x3 * x4, x2 * x4, x2 * x3;
            x3 * x4, 0.0, x1 * x4, x1 * x3;
            x2 * x4, x1 * x4, 0.0, x1 * x2;
            x2 * x3, x1 * x3, x1 * x2, 0.0
        ];

        objective - product * vi + DMatrix::identity(4, 4) * (2.0 * ve)
    }
}

// x1 x2 x3 x4 >= 25
struct Product;

impl Constraints for Product {
    type Field = f64;
    type Jacobian = DMatrix<f64>;

    fn len(&self) -> usize {
        1
    }

    fn eval<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> OVector<f64, Dyn>
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        na::dvector![25.0 - x.product()]
    }

    fn jacobian<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> DMatrix<f64>
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        DMatrix::from_fn(1, 4, |_, j| {
            -(0..4).filter(|&k| k != j).map(|k| x[k]).product::<f64>()
        })
    }
}

// x1^2 + x2^2 + x3^2 + x4^2 = 40
struct Sphere;

impl Constraints for Sphere {
    type Field = f64;
    type Jacobian = DMatrix<f64>;

    fn len(&self) -> usize {
        1
    }

    fn eval<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> OVector<f64, Dyn>
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        na::dvector![x.norm_squared() - 40.0]
    }

    fn jacobian<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> DMatrix<f64>
    where
        Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
    {
        DMatrix::from_fn(1, 4, |_, j| 2.0 * x[j])
    }
}

fn main() -> Result<(), String> {
    let f = Hs071;

    // Equality, inequality, four upper and four lower bounds.
    let mut solver = InteriorPoint::builder(&f)
        .with_initial(vec![1.0, 5.0, 5.0, 1.0])
        .with_multipliers(vec![0.0; 10])
        .with_ineq(Product)
        .with_eq(Sphere)
        .build()
        .map_err(|error| format!("{error}"))?;

    let tolerance = 1e-8;

    let (x, diagnostics) = solver
        .find(|diagnostics| {
            println!(
                "iter = {}\toptimality = {:e}\tviolation = {:e}",
                diagnostics.niter(),
                diagnostics.optimality(),
                diagnostics.constr_violation()
            );
            (diagnostics.optimality() < tolerance && diagnostics.constr_violation() < tolerance)
                || diagnostics.niter() >= 1000
        })
        .map_err(|error| format!("{error}"))?;

    println!("x = {:?}, f(x) = {}", x, f.apply(&na::DVector::from_row_slice(x)));

    if diagnostics.optimality() < tolerance && diagnostics.constr_violation() < tolerance {
        Ok(())
    } else {
        Err("did not converge".to_string())
    }
}
