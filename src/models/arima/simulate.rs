//! Simulation of ARMA processes.

use rand::Rng;
use statrs::distribution::Normal;

/// Burn-in draws discarded before the returned sample.
const BURN_IN: usize = 100;

/// Simulate `n` values of a zero-mean ARMA process
/// `y_t = Σ φ_i y_{t-i} + ε_t + Σ θ_j ε_{t-j}` with `ε_t ~ N(0, sigma²)`.
///
/// A non-positive or non-finite `sigma` yields zeros.
pub fn simulate_arma<R: Rng + ?Sized>(
    ar: &[f64],
    ma: &[f64],
    n: usize,
    sigma: f64,
    rng: &mut R,
) -> Vec<f64> {
    let Ok(noise) = Normal::new(0.0, sigma) else {
        return vec![0.0; n];
    };
    if !(sigma > 0.0) {
        return vec![0.0; n];
    }

    let total = n + BURN_IN;
    let eps: Vec<f64> = (0..total).map(|_| rng.sample(noise)).collect();
    let mut y = vec![0.0; total];

    for t in 0..total {
        let ar_part: f64 = ar
            .iter()
            .enumerate()
            .filter(|(i, _)| t > *i)
            .map(|(i, phi)| phi * y[t - i - 1])
            .sum();
        let ma_part: f64 = ma
            .iter()
            .enumerate()
            .filter(|(j, _)| t > *j)
            .map(|(j, theta)| theta * eps[t - j - 1])
            .sum();
        y[t] = ar_part + eps[t] + ma_part;
    }

    y.split_off(BURN_IN)
}
