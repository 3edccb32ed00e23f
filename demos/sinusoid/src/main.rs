//! `f(x) = sin(5x)` on `[0, pi]`. GPSO should land near `x* = 0.3142`
//! (`pi/10`) inside a 30-evaluation budget.

use gpso::{Domain, OptimizerBuilder};

fn main() {
    let domain = Domain::new(vec![0.0], vec![std::f64::consts::PI]).unwrap();

    let mut optimizer =
        OptimizerBuilder::new(1).n_max(30).varsigma(3.0).build(domain, |x: &[f64]| (5.0 * x[0]).sin()).unwrap();

    optimizer.run_to_completion().unwrap();
    let result = optimizer.finalize().unwrap();

    let (x_star, f_star) = &result.solution;
    println!("evaluations: {}", result.samples.len());
    println!("x* = {:.4}, f* = {:.6}", x_star[0], f_star);
}
