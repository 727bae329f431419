use criterion::{criterion_group, criterion_main, Criterion};
use ipsolver::{
    driver::{default_stop, InteriorPoint},
    nalgebra as na,
    testing::*,
    Objective,
};

fn quadratic_half_plane(c: &mut Criterion) {
    let f = QuadraticHalfPlane;
    let (a, b) = QuadraticHalfPlane::linear_ineq();
    let x0 = &f.initials()[0];

    c.bench_function("interior point quadratic half plane", |bench| {
        bench.iter(|| {
            let mut solver = InteriorPoint::builder(&f)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0])
                .with_linear_ineq(a.clone(), b.clone())
                .build()
                .unwrap();

            let (_, diagnostics) = solver.find(default_stop).unwrap();
            assert!(diagnostics.optimality() < 1e-6);
        })
    });
}

fn bounded_parabola(c: &mut Criterion) {
    let f = BoundedParabola;
    let x0 = &f.initials()[0];

    c.bench_function("interior point bounded parabola", |bench| {
        bench.iter(|| {
            let mut solver = InteriorPoint::builder(&f)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0, 0.0])
                .build()
                .unwrap();

            let (x, _) = solver.find(default_stop).unwrap();
            assert!((x[0] - 1.0).abs() < 1e-4);
        })
    });
}

fn hs071(c: &mut Criterion) {
    let f = Hs071;
    let x0 = &f.initials()[0];

    c.bench_function("interior point hs071", |bench| {
        bench.iter(|| {
            let mut solver = InteriorPoint::builder(&f)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0; 10])
                .with_ineq(Hs071Ineq)
                .with_eq(Hs071Eq)
                .build()
                .unwrap();

            let (x, _) = solver.find(default_stop).unwrap();
            let x = na::DVector::from_row_slice(x);
            assert!((f.apply(&x) - 17.014017).abs() < 1e-3);
        })
    });
}

fn random_qp(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(2023);
    let problem = RandomQp::generate(&mut rng, 10, 5);
    let (a, b) = problem.linear_ineq();
    let x0 = &problem.initials()[0];

    c.bench_function("interior point random qp 10x5", |bench| {
        bench.iter(|| {
            let mut solver = InteriorPoint::builder(&problem)
                .with_initial(x0.as_slice().to_vec())
                .with_multipliers(vec![0.0; problem.n_multipliers()])
                .with_ineq(problem.ball())
                .with_linear_ineq(a.clone(), b.clone())
                .build()
                .unwrap();

            solver.find(default_stop).unwrap();
        })
    });
}

criterion_group!(
    interior_point,
    quadratic_half_plane,
    bounded_parabola,
    hs071,
    random_qp
);
criterion_main!(interior_point);
