//! Lag polynomial helpers.
//!
//! Polynomials are coefficient vectors in ascending powers of the backshift
//! operator `B`, constant term first. AR blocks use the convention
//! `y_t = Σ φ_i y_{t-i} + ...`, i.e. the polynomial `1 - φ_1 B - ... - φ_p B^p`;
//! MA blocks use `1 + θ_1 B + ... + θ_q B^q`.

/// Multiply two polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign·(c_1 B^step + c_2 B^{2·step} + ...)`.
fn lag_polynomial(coefs: &[f64], sign: f64, step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Coefficients `φ*` of the expanded AR polynomial `φ(B)Φ(B^s)`, returned in
/// the `y_t = Σ φ*_k y_{t-k}` convention (length `p + s·P`).
pub fn expand_ar(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
    let poly = multiply(
        &lag_polynomial(ar, -1.0, 1),
        &lag_polynomial(seasonal_ar, -1.0, period.max(1)),
    );
    poly[1..].iter().map(|c| -c).collect()
}

/// Coefficients `θ*` of the expanded MA polynomial `θ(B)Θ(B^s)` (length
/// `q + s·Q`).
pub fn expand_ma(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
    let poly = multiply(
        &lag_polynomial(ma, 1.0, 1),
        &lag_polynomial(seasonal_ma, 1.0, period.max(1)),
    );
    poly[1..].to_vec()
}

/// Partial autocorrelations closer to ±1 than this count as a unit root.
/// The step-down division rounds exact boundary cases like `[0.7, 0.3]`
/// to just under one.
const UNIT_ROOT_MARGIN: f64 = 1e-10;

/// Partial autocorrelations of an AR block by the Schur-Cohn step-down
/// recursion, or `None` when a root lies on or inside the unit circle.
///
/// `φ_j^{(k-1)} = (φ_j^{(k)} + a_k φ_{k-j}^{(k)}) / (1 - a_k²)` with
/// `a_k = φ_k^{(k)}`; the block is stationary iff every
/// `|a_k| < 1 - UNIT_ROOT_MARGIN`.
pub fn step_down(ar: &[f64]) -> Option<Vec<f64>> {
    let mut current = ar.to_vec();
    let mut pacf = vec![0.0; ar.len()];

    for k in (1..=ar.len()).rev() {
        let a = current[k - 1];
        if !a.is_finite() || a.abs() >= 1.0 - UNIT_ROOT_MARGIN {
            return None;
        }
        pacf[k - 1] = a;

        let denom = 1.0 - a * a;
        let next: Vec<f64> = (0..k - 1)
            .map(|j| (current[j] + a * current[k - 2 - j]) / denom)
            .collect();
        current = next;
    }

    Some(pacf)
}

/// Inverse of [`step_down`]: AR coefficients from partial autocorrelations
/// (Durbin-Levinson order recursion).
pub fn from_pacf(pacf: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(pacf.len());
    for (k, &a) in pacf.iter().enumerate() {
        let prev = phi.clone();
        for j in 0..k {
            phi[j] = prev[j] - a * prev[k - 1 - j];
        }
        phi.push(a);
    }
    phi
}

/// AR block is stationary (all roots of `1 - Σ φ_i B^i` outside the unit circle).
pub fn is_stationary(ar: &[f64]) -> bool {
    step_down(ar).is_some()
}

/// MA block is invertible (all roots of `1 + Σ θ_i B^i` outside the unit circle).
pub fn is_invertible(ma: &[f64]) -> bool {
    let negated: Vec<f64> = ma.iter().map(|t| -t).collect();
    is_stationary(&negated)
}

/// Yule-Walker AR(`order`) fit from autocovariances `γ_0..γ_order` by the
/// Durbin-Levinson recursion. Returns coefficients and innovation variance.
pub fn durbin_levinson(autocov: &[f64], order: usize) -> Option<(Vec<f64>, f64)> {
    if autocov.len() <= order || autocov[0] <= 0.0 {
        return None;
    }

    let mut phi: Vec<f64> = Vec::with_capacity(order);
    let mut v = autocov[0];
    for k in 1..=order {
        let acc: f64 = (1..k).map(|j| phi[j - 1] * autocov[k - j]).sum();
        let a = (autocov[k] - acc) / v;
        if !a.is_finite() || a.abs() >= 1.0 - UNIT_ROOT_MARGIN {
            return None;
        }

        let prev = phi.clone();
        for j in 0..k - 1 {
            phi[j] = prev[j] - a * prev[k - 2 - j];
        }
        phi.push(a);
        v *= 1.0 - a * a;
    }

    Some((phi, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn multiply_polynomials() {
        // (1 - 0.5B)(1 + 2B) = 1 + 1.5B - B^2
        assert_eq!(multiply(&[1.0, -0.5], &[1.0, 2.0]), vec![1.0, 1.5, -1.0]);
    }

    #[test]
    fn expand_multiplicative_ar() {
        // (1 - 0.5B)(1 - 0.3B^4): φ* = [0.5, 0, 0, 0.3, -0.15]
        let phi = expand_ar(&[0.5], &[0.3], 4);
        let expected = [0.5, 0.0, 0.0, 0.3, -0.15];
        assert_eq!(phi.len(), 5);
        for (a, b) in phi.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn expand_multiplicative_ma() {
        // (1 + 0.4B)(1 - 0.6B^12): θ*_1 = 0.4, θ*_12 = -0.6, θ*_13 = -0.24
        let theta = expand_ma(&[0.4], &[-0.6], 12);
        assert_eq!(theta.len(), 13);
        assert_relative_eq!(theta[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(theta[11], -0.6, epsilon = 1e-12);
        assert_relative_eq!(theta[12], -0.24, epsilon = 1e-12);
        assert!(theta[1..11].iter().all(|t| *t == 0.0));
    }

    #[test]
    fn expand_empty_blocks() {
        assert!(expand_ar(&[], &[], 12).is_empty());
        assert!(expand_ma(&[], &[], 1).is_empty());
    }

    #[test]
    fn step_down_ar2_triangle() {
        assert!(is_stationary(&[0.5, 0.3]));
        assert!(is_stationary(&[-1.2, -0.5]));
        // φ1 + φ2 >= 1 is outside the stationary triangle
        assert!(!is_stationary(&[0.7, 0.3]));
        assert!(!is_stationary(&[0.0, 1.0]));
        assert!(!is_stationary(&[1.0]));
        assert!(is_stationary(&[]));
    }

    #[test]
    fn boundary_polynomials_are_rejected() {
        // Each has a root exactly at B = 1
        for ar in [[0.7, 0.3], [0.5, 0.5], [1.3, -0.3], [0.9, 0.1]] {
            assert!(step_down(&ar).is_none(), "{:?} accepted", ar);
        }
        assert!(!is_invertible(&[-0.7, -0.3]));
        assert!(!is_invertible(&[-0.5, -0.5]));
        // Just inside the triangle stays admissible
        assert!(is_stationary(&[0.7, 0.29]));
    }

    #[test]
    fn pacf_round_trip() {
        let pacf = vec![0.6, -0.3, 0.2];
        let phi = from_pacf(&pacf);
        let back = step_down(&phi).unwrap();
        for (a, b) in pacf.iter().zip(back.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn invertibility_uses_ma_sign_convention() {
        assert!(is_invertible(&[0.9]));
        assert!(!is_invertible(&[-1.0]));
        // 1 + 1.5B + 0.5B^2 = (1 + B)(1 + 0.5B) has a unit root
        assert!(!is_invertible(&[1.5, 0.5]));
    }

    #[test]
    fn durbin_levinson_recovers_ar1() {
        // AR(1) with φ = 0.6, σ² = 1: γ_k = 0.6^k / (1 - 0.36)
        let gamma: Vec<f64> = (0..4).map(|k| 0.6f64.powi(k) / 0.64).collect();
        let (phi, v) = durbin_levinson(&gamma, 3).unwrap();

        assert_relative_eq!(phi[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(phi[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(phi[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn durbin_levinson_rejects_degenerate_input() {
        assert!(durbin_levinson(&[0.0, 0.0], 1).is_none());
        assert!(durbin_levinson(&[1.0], 2).is_none());
    }
}
