//! Unconstrained minimisers used for maximum-likelihood estimation.
//!
//! Both methods treat non-finite objective values as `+inf`, so an objective
//! can reject a point simply by returning `f64::INFINITY`.

/// Outcome of a minimisation run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the stopping tolerance was met before `max_iter`.
    pub converged: bool,
}

/// Minimisation method selection.
#[derive(Debug, Clone)]
pub enum Optimizer {
    /// Quasi-Newton with finite-difference gradients.
    Bfgs(BfgsConfig),
    /// Derivative-free simplex search.
    NelderMead(NelderMeadConfig),
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::Bfgs(BfgsConfig::default())
    }
}

impl Optimizer {
    /// Run the selected method from `initial`.
    pub fn minimize<F>(&self, objective: F, initial: &[f64]) -> OptimizationResult
    where
        F: Fn(&[f64]) -> f64,
    {
        match self {
            Optimizer::Bfgs(config) => bfgs(objective, initial, config),
            Optimizer::NelderMead(config) => nelder_mead(objective, initial, config),
        }
    }

    pub fn max_iter(&self) -> usize {
        match self {
            Optimizer::Bfgs(c) => c.max_iter,
            Optimizer::NelderMead(c) => c.max_iter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Optimizer::Bfgs(_) => "BFGS",
            Optimizer::NelderMead(_) => "Nelder-Mead",
        }
    }
}

fn finite_or_inf(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

/// Configuration for BFGS.
#[derive(Debug, Clone)]
pub struct BfgsConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop when the relative objective change falls below this value.
    pub tolerance: f64,
    /// Stop when the largest gradient component falls below this value.
    pub gradient_tolerance: f64,
    /// Relative step of the central-difference gradient.
    pub diff_step: f64,
    /// Maximum number of step halvings in the line search.
    pub max_backtracks: usize,
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tolerance: 1e-8,
            gradient_tolerance: 1e-6,
            diff_step: 1e-6,
            max_backtracks: 40,
        }
    }
}

impl BfgsConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Central-difference gradient, one-sided where a neighbour is infeasible.
fn numerical_gradient<F>(objective: &F, x: &[f64], fx: f64, rel_step: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let h = rel_step * x[i].abs().max(1.0);
            probe[i] = x[i] + h;
            let fp = finite_or_inf(objective(&probe));
            probe[i] = x[i] - h;
            let fm = finite_or_inf(objective(&probe));
            probe[i] = x[i];

            match (fp.is_finite(), fm.is_finite()) {
                (true, true) => (fp - fm) / (2.0 * h),
                (true, false) => (fp - fx) / h,
                (false, true) => (fx - fm) / h,
                (false, false) => 0.0,
            }
        })
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Minimise `objective` with BFGS and a backtracking Armijo line search.
///
/// The inverse Hessian approximation starts at the identity and is reset
/// whenever the search direction stops being a descent direction.
///
/// # Example
/// ```
/// use anofox_tsa::utils::optimization::{bfgs, BfgsConfig};
///
/// let result = bfgs(
///     |x| (x[0] - 2.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     &BfgsConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-4);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-4);
/// ```
pub fn bfgs<F>(objective: F, initial: &[f64], config: &BfgsConfig) -> OptimizationResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let mut x = initial.to_vec();
    let mut fx = finite_or_inf(objective(&x));

    if n == 0 || !fx.is_finite() {
        return OptimizationResult {
            optimal_point: x,
            optimal_value: fx,
            iterations: 0,
            converged: n == 0 && fx.is_finite(),
        };
    }

    let mut g = numerical_gradient(&objective, &x, fx, config.diff_step);
    let mut h_inv = identity(n);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        if g.iter().fold(0.0_f64, |m, v| m.max(v.abs())) < config.gradient_tolerance {
            converged = true;
            break;
        }
        iterations += 1;

        let mut direction: Vec<f64> = (0..n).map(|i| -dot(&h_inv[i], &g)).collect();
        let mut slope = dot(&g, &direction);
        if slope >= 0.0 {
            h_inv = identity(n);
            direction = g.iter().map(|v| -v).collect();
            slope = dot(&g, &direction);
        }

        // First step along the raw gradient is scaled to unit length
        let mut alpha = if iterations == 1 {
            let g_max = g.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            (1.0 / g_max).min(1.0)
        } else {
            1.0
        };

        let mut accepted = None;
        for _ in 0..config.max_backtracks {
            let candidate: Vec<f64> = x
                .iter()
                .zip(&direction)
                .map(|(xi, di)| xi + alpha * di)
                .collect();
            let f_candidate = finite_or_inf(objective(&candidate));
            if f_candidate.is_finite() && f_candidate <= fx + 1e-4 * alpha * slope {
                accepted = Some((candidate, f_candidate));
                break;
            }
            alpha *= 0.5;
        }

        let Some((x_new, f_new)) = accepted else {
            // No decrease along the search direction: treat as stationary if
            // the step had already become negligible.
            converged = alpha * direction.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
                < config.tolerance.sqrt();
            break;
        };

        let g_new = numerical_gradient(&objective, &x_new, f_new, config.diff_step);
        let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);

        if sy > 1e-12 {
            let hy: Vec<f64> = (0..n).map(|i| dot(&h_inv[i], &y)).collect();
            let yhy = dot(&y, &hy);
            let scale = (sy + yhy) / (sy * sy);
            for i in 0..n {
                for j in 0..n {
                    h_inv[i][j] += scale * s[i] * s[j] - (hy[i] * s[j] + s[i] * hy[j]) / sy;
                }
            }
        }

        let rel_change = (fx - f_new).abs() / fx.abs().max(f_new.abs()).max(1.0);
        x = x_new;
        fx = f_new;
        g = g_new;

        if rel_change < config.tolerance {
            converged = true;
            break;
        }
    }

    OptimizationResult {
        optimal_point: x,
        optimal_value: fx,
        iterations,
        converged,
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of simplex values; the simplex
    /// must also be smaller than its square root.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.05).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Perform Nelder-Mead simplex minimisation.
///
/// # Example
/// ```
/// use anofox_tsa::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: &NelderMeadConfig) -> OptimizationResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |x: &[f64]| finite_or_inf(objective(x));

    if n == 0 {
        let value = eval(initial);
        return OptimizationResult {
            optimal_point: vec![],
            optimal_value: value,
            iterations: 0,
            converged: value.is_finite(),
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);

        // Level values alone can come from a wide simplex straddling the
        // minimum, so the vertices must also have drawn together.
        let size = simplex
            .iter()
            .map(|v| distance(v, &simplex[best]))
            .fold(0.0, f64::max);
        // inf - inf is NaN and never satisfies the test
        let level = values[worst] - values[best] < config.tolerance;
        if values[best].is_finite()
            && ((level && size < config.tolerance.sqrt()) || size < config.tolerance)
        {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);

        let reflected = along(&centroid, &simplex[worst], -config.alpha);
        let f_reflected = eval(&reflected);

        if f_reflected < values[best] {
            let expanded = along(&centroid, &reflected, config.gamma);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            }
            continue;
        }
        if f_reflected < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = f_reflected;
            continue;
        }

        let (contracted, f_contracted, threshold) = if f_reflected < values[worst] {
            let c = along(&centroid, &reflected, config.rho);
            let fc = eval(&c);
            (c, fc, f_reflected)
        } else {
            let c = along(&centroid, &simplex[worst], config.rho);
            let fc = eval(&c);
            (c, fc, values[worst])
        };
        if f_contracted < threshold {
            simplex[worst] = contracted;
            values[worst] = f_contracted;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in (0..=n).filter(|&i| i != best) {
            simplex[i] = along(&anchor, &simplex[i], config.sigma);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    OptimizationResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dim = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dim];
    for vertex in simplex.iter().enumerate().filter(|(i, _)| *i != exclude).map(|(_, v)| v) {
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v / count;
        }
    }
    centroid
}

/// `origin + t * (point - origin)`
fn along(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rosenbrock(x: &[f64]) -> f64 {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2)
    }

    #[test]
    fn bfgs_quadratic_2d() {
        let result = bfgs(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            &BfgsConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-4);
        assert!(result.optimal_value < 1e-8);
    }

    #[test]
    fn bfgs_rosenbrock() {
        let config = BfgsConfig::default().with_tolerance(1e-14);
        let result = bfgs(rosenbrock, &[-1.2, 1.0], &config);

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 2e-2);
    }

    #[test]
    fn bfgs_avoids_infeasible_region() {
        // Objective undefined for x <= 0; minimum of x - ln(x) is at x = 1
        let result = bfgs(
            |x| if x[0] > 0.0 { x[0] - x[0].ln() } else { f64::INFINITY },
            &[4.0],
            &BfgsConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn bfgs_infeasible_start_is_reported() {
        let result = bfgs(|_| f64::NAN, &[0.5], &BfgsConfig::default());
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert!(!result.optimal_value.is_finite());
    }

    #[test]
    fn bfgs_respects_max_iter() {
        let config = BfgsConfig::default().with_max_iter(2).with_tolerance(0.0);
        let result = bfgs(rosenbrock, &[-1.2, 1.0], &config);
        assert!(result.iterations <= 2);
        assert!(!result.converged);
    }

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            &NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-10,
            ..Default::default()
        };
        let result = nelder_mead(rosenbrock, &[0.0, 0.0], &config);

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_treats_nan_as_infeasible() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.5).powi(2) },
            &[0.1],
            &NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_keeps_going_on_level_simplex() {
        // Both starting vertices sit at x² = 0.25 on either side of the minimum
        let config = NelderMeadConfig {
            initial_step: 2.0,
            ..Default::default()
        };
        let result = nelder_mead(|x| x[0] * x[0], &[-0.5], &config);

        assert!(result.converged);
        assert!(result.iterations > 1);
        assert_relative_eq!(result.optimal_point[0], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn optimizer_dispatch() {
        let objective = |x: &[f64]| (x[0] + 1.0).powi(2);
        for optimizer in [
            Optimizer::default(),
            Optimizer::NelderMead(NelderMeadConfig::default()),
        ] {
            let result = optimizer.minimize(objective, &[3.0]);
            assert_relative_eq!(result.optimal_point[0], -1.0, epsilon = 1e-3);
        }
        assert_eq!(Optimizer::default().name(), "BFGS");
        assert_eq!(Optimizer::default().max_iter(), 200);
    }

    #[test]
    fn empty_parameter_vector() {
        let result = bfgs(|_| 3.0, &[], &BfgsConfig::default());
        assert!(result.converged);
        assert_eq!(result.optimal_value, 3.0);

        let result = nelder_mead(|_| 3.0, &[], &NelderMeadConfig::default());
        assert!(result.converged);
    }
}
