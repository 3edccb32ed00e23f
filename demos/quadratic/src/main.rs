//! `f(x) = -||x - c||^2` on `[-1,1]^2`, `c = (0.3, -0.4)`. GPSO should land
//! within 0.05 of `c` inside a 50-evaluation budget.

use gpso::{Domain, OptimizerBuilder};

fn main() {
    let c = [0.3_f64, -0.4];
    let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();

    let mut optimizer = OptimizerBuilder::new(2)
        .n_max(50)
        .varsigma(3.0)
        .build(domain, move |x: &[f64]| -((x[0] - c[0]).powi(2) + (x[1] - c[1]).powi(2)))
        .unwrap();

    optimizer.run_to_completion().unwrap();
    let result = optimizer.finalize().unwrap();

    let (x_star, f_star) = &result.solution;
    println!("evaluations: {}", result.samples.len());
    println!("x* = {x_star:?}, f* = {f_star:.6}");
}
