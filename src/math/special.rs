//! Special functions used by the distribution catalog.
//!
//! Thin, panic-free wrappers around `statrs` (incomplete gamma/beta, erf) plus
//! a few compositions that statrs does not ship: log-space normal CDF, Owen's T
//! and the noncentral chi-square distribution.
//!
//! Invalid arguments produce `NaN` rather than panicking; callers treat a
//! non-finite density as "outside the support".

use std::f64::consts::{PI, SQRT_2};

use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::{beta, erf, gamma};

use crate::math::quad::integrate;

/// `ln(sqrt(2π))`
pub const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

pub fn ln_gamma(x: f64) -> f64 {
    if !(x.is_finite() && x > 0.0) {
        return f64::NAN;
    }
    gamma::ln_gamma(x)
}

/// Regularized lower incomplete gamma `P(a, x)`.
pub fn gamma_p(a: f64, x: f64) -> f64 {
    if !(a.is_finite() && a > 0.0) || x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    gamma::checked_gamma_lr(a, x).unwrap_or(f64::NAN)
}

/// Regularized upper incomplete gamma `Q(a, x) = 1 - P(a, x)`.
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if !(a.is_finite() && a > 0.0) || x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    gamma::checked_gamma_ur(a, x).unwrap_or(f64::NAN)
}

/// Regularized incomplete beta `I_x(a, b)`.
pub fn beta_reg(a: f64, b: f64, x: f64) -> f64 {
    if !(a > 0.0 && b > 0.0) || x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    beta::checked_beta_reg(a, b, x).unwrap_or(f64::NAN)
}

pub fn erf(x: f64) -> f64 {
    erf::erf(x)
}

pub fn erfc(x: f64) -> f64 {
    erf::erfc(x)
}

/// `ln(erfc(x))`, asymptotic for large `x` where `erfc` underflows.
pub fn ln_erfc(x: f64) -> f64 {
    if x < 25.0 {
        return erfc(x).ln();
    }
    // erfc(x) ~ exp(-x²) / (x √π) · (1 - 1/(2x²) + 3/(4x⁴))
    let inv2 = 1.0 / (x * x);
    -x * x - (x * PI.sqrt()).ln() + (1.0 - 0.5 * inv2 + 0.75 * inv2 * inv2).ln()
}

pub fn norm_logpdf(z: f64) -> f64 {
    -0.5 * z * z - LN_SQRT_2PI
}

/// Standard normal CDF `Φ(z)`.
pub fn norm_cdf(z: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |n| n.cdf(z))
}

/// `ln Φ(z)`, accurate in the far left tail.
pub fn norm_logcdf(z: f64) -> f64 {
    ln_erfc(-z / SQRT_2) - std::f64::consts::LN_2
}

/// `a · ln(x)` with `0 · ln(0) = 0`.
pub fn xlogy(a: f64, x: f64) -> f64 {
    if a == 0.0 && !x.is_nan() {
        0.0
    } else {
        a * x.ln()
    }
}

/// Stable `ln(1 + e^t)`.
pub fn softplus(t: f64) -> f64 {
    if t > 0.0 {
        t + (-t).exp().ln_1p()
    } else {
        t.exp().ln_1p()
    }
}

/// Stable `ln(e^a + e^b)`.
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Owen's T function `T(h, a) = 1/(2π) ∫₀ᵃ exp(-h²(1+x²)/2) / (1+x²) dx`.
pub fn owens_t(h: f64, a: f64) -> f64 {
    if !(h.is_finite() && a.is_finite()) {
        return f64::NAN;
    }
    if a < 0.0 {
        return -owens_t(h, -a);
    }
    if a == 0.0 {
        return 0.0;
    }
    let h = h.abs();
    if a > 1.0 {
        // Reflection keeps the integration range within [0, 1].
        let ah = a * h;
        let (ph, pah) = (norm_cdf(h), norm_cdf(ah));
        return 0.5 * (ph + pah) - ph * pah - owens_t(ah, 1.0 / a);
    }
    let hh = 0.5 * h * h;
    integrate(|x| (-hh * (1.0 + x * x)).exp() / (1.0 + x * x), 0.0, a) / (2.0 * PI)
}

/// Log-density of the central chi-square distribution.
pub fn chi2_logpdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return if x == 0.0 && df == 2.0 {
            -std::f64::consts::LN_2
        } else if x == 0.0 && df < 2.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    let k = 0.5 * df;
    xlogy(k - 1.0, x) - 0.5 * x - k * std::f64::consts::LN_2 - ln_gamma(k)
}

/// Poisson weights `e^{-μ} μ^j / j!` for the noncentral chi-square mixture,
/// visited in increasing `j` until they are negligible past the mode.
fn poisson_mixture<F: FnMut(f64, f64)>(mu: f64, mut visit: F) {
    const MAX_TERMS: usize = 20_000;
    let ln_mu = mu.ln();
    let mode = mu.floor();
    for j in 0..MAX_TERMS {
        let jf = j as f64;
        let ln_w = -mu + jf * ln_mu - ln_gamma(jf + 1.0);
        visit(jf, ln_w);
        if jf > mode && ln_w < -40.0 {
            break;
        }
    }
}

/// CDF of the noncentral chi-square distribution with `df` degrees of freedom
/// and noncentrality `nc`.
pub fn ncx2_cdf(x: f64, df: f64, nc: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if nc == 0.0 {
        return gamma_p(0.5 * df, 0.5 * x);
    }
    let mut total = 0.0;
    poisson_mixture(0.5 * nc, |j, ln_w| {
        total += ln_w.exp() * gamma_p(0.5 * df + j, 0.5 * x);
    });
    total.clamp(0.0, 1.0)
}

/// Log-density of the noncentral chi-square distribution.
pub fn ncx2_logpdf(x: f64, df: f64, nc: f64) -> f64 {
    if nc == 0.0 {
        return chi2_logpdf(x, df);
    }
    if x <= 0.0 {
        return chi2_logpdf(x, df);
    }
    let mut acc = f64::NEG_INFINITY;
    poisson_mixture(0.5 * nc, |j, ln_w| {
        acc = log_add_exp(acc, ln_w + chi2_logpdf(x, df + 2.0 * j));
    });
    acc
}
