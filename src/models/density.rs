//! Standardized densities and CDFs (loc = 0, scale = 1) for every family.
//!
//! Callers go through `Family::log_pdf` / `Family::cdf`, which apply the
//! location-scale transform and clip `z` to the support first. The functions
//! here therefore only see `z` inside `[lo, hi]` and shapes that passed
//! `Family::shapes_valid`; they may still return `±∞` at the support edges.

use std::f64::consts::{FRAC_2_PI, LN_2, PI, SQRT_2};

use crate::math::quad::integrate;
use crate::math::special::{
    beta_reg, erf, gamma_p, gamma_q, ln_erfc, ln_gamma, log_add_exp, ncx2_cdf, ncx2_logpdf,
    norm_cdf, norm_logcdf, norm_logpdf, owens_t, softplus, xlogy, LN_SQRT_2PI,
};
use crate::models::Family;

/// Shapes below this magnitude are treated as zero where a family has a
/// separate limiting form (`genextreme`, `pearson3`).
const ZERO_SHAPE: f64 = 1e-9;

/// Standardized log-density.
pub fn log_pdf(family: Family, z: f64, s: &[f64]) -> f64 {
    use Family::*;
    match family {
        Arcsine => -PI.ln() - 0.5 * z.ln() - 0.5 * (1.0 - z).ln(),
        Bradford => s[0].ln() - s[0].ln_1p().ln() - (s[0] * z).ln_1p(),
        Burr => {
            let (c, d) = (s[0], s[1]);
            let lz = z.ln();
            c.ln() + d.ln() - (c + 1.0) * lz - (d + 1.0) * softplus(-c * lz)
        }
        Cauchy => -PI.ln() - (z * z).ln_1p(),
        Chi => {
            let df = s[0];
            xlogy(df - 1.0, z) - 0.5 * z * z - (0.5 * df - 1.0) * LN_2 - ln_gamma(0.5 * df)
        }
        Chi2 => {
            let k = 0.5 * s[0];
            xlogy(k - 1.0, z) - 0.5 * z - k * LN_2 - ln_gamma(k)
        }
        Dgamma => {
            let a = s[0];
            xlogy(a - 1.0, z.abs()) - z.abs() - LN_2 - ln_gamma(a)
        }
        Dweibull => {
            let c = s[0];
            (0.5 * c).ln() + xlogy(c - 1.0, z.abs()) - z.abs().powf(c)
        }
        Expon => -z,
        Exponnorm => {
            let k = s[0];
            let inv_k = 1.0 / k;
            -(2.0 * k).ln() + 0.5 * inv_k * inv_k - z * inv_k + ln_erfc((inv_k - z) / SQRT_2)
        }
        Exponweib => {
            let (a, c) = (s[0], s[1]);
            let zc = z.powf(c);
            a.ln() + c.ln() + xlogy(a - 1.0, -(-zc).exp_m1()) - zc + xlogy(c - 1.0, z)
        }
        Exponpow => {
            let b = s[0];
            let zb = z.powf(b);
            b.ln() + xlogy(b - 1.0, z) + 1.0 + zb - zb.exp()
        }
        Fatiguelife => {
            let c = s[0];
            (z + 1.0).ln() - (2.0 * c).ln() - LN_SQRT_2PI - 1.5 * z.ln()
                - (z - 1.0).powi(2) / (2.0 * z * c * c)
        }
        Fisk => {
            let c = s[0];
            let lz = z.ln();
            c.ln() + xlogy(c - 1.0, z) - 2.0 * softplus(c * lz)
        }
        Foldnorm => {
            let c = s[0];
            log_add_exp(norm_logpdf(z - c), norm_logpdf(z + c))
        }
        Genlogistic => s[0].ln() - z - (s[0] + 1.0) * softplus(-z),
        Gennorm => {
            let b = s[0];
            b.ln() - LN_2 - ln_gamma(1.0 / b) - z.abs().powf(b)
        }
        Genexpon => {
            let (a, b, c) = (s[0], s[1], s[2]);
            let g = -(-c * z).exp_m1();
            (a + b * g).ln() + (-a * z - b * z + b / c * g)
        }
        Genextreme => {
            let c = s[0];
            if c.abs() < ZERO_SHAPE {
                -z - (-z).exp()
            } else {
                let t = 1.0 - c * z;
                if t <= 0.0 {
                    return f64::NEG_INFINITY;
                }
                let lt = t.ln();
                (1.0 / c - 1.0) * lt - (lt / c).exp()
            }
        }
        Gausshyper => {
            let (a, b, c, w) = (s[0], s[1], s[2], s[3]);
            gausshyper_kernel(z, a, b, c, w) - gausshyper_norm(a, b, c, w).ln()
        }
        Gamma => {
            let a = s[0];
            xlogy(a - 1.0, z) - z - ln_gamma(a)
        }
        Gengamma => {
            let (a, c) = (s[0], s[1]);
            c.abs().ln() + xlogy(c * a - 1.0, z) - z.powf(c) - ln_gamma(a)
        }
        Genhalflogistic => {
            let c = s[0];
            let t = 1.0 - c * z;
            if t <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let lt = t.ln();
            LN_2 + (1.0 / c - 1.0) * lt - 2.0 * (lt / c).exp().ln_1p()
        }
        Gilbrat => {
            let lz = z.ln();
            -lz - LN_SQRT_2PI - 0.5 * lz * lz
        }
        Gompertz => {
            let c = s[0];
            c.ln() + z - c * z.exp_m1()
        }
        GumbelR => -z - (-z).exp(),
        GumbelL => z - z.exp(),
        Halflogistic => LN_2 - z - 2.0 * (-z).exp().ln_1p(),
        Halfnorm => 0.5 * FRAC_2_PI.ln() - 0.5 * z * z,
        Halfgennorm => {
            let b = s[0];
            b.ln() - ln_gamma(1.0 / b) - z.powf(b)
        }
        Hypsecant => -PI.ln() - ln_cosh(z),
        Invgauss => invgauss_log_pdf(z, s[0]),
        Johnsonsb => {
            let (a, b) = (s[0], s[1]);
            let t = a + b * (z / (1.0 - z)).ln();
            b.ln() - (z * (1.0 - z)).ln() + norm_logpdf(t)
        }
        Johnsonsu => {
            let (a, b) = (s[0], s[1]);
            let t = a + b * z.asinh();
            b.ln() - 0.5 * (z * z).ln_1p() + norm_logpdf(t)
        }
        Kstwobign => kstwobign_pdf(z).ln(),
        Laplace => -LN_2 - z.abs(),
        Logistic => -z - 2.0 * softplus(-z),
        Loggamma => {
            let c = s[0];
            c * z - z.exp() - ln_gamma(c)
        }
        Lognorm => {
            let sd = s[0];
            let lz = z.ln();
            -sd.ln() - lz - LN_SQRT_2PI - lz * lz / (2.0 * sd * sd)
        }
        Maxwell => 0.5 * FRAC_2_PI.ln() + 2.0 * z.ln() - 0.5 * z * z,
        Nakagami => {
            let nu = s[0];
            LN_2 + nu * nu.ln() - ln_gamma(nu) + xlogy(2.0 * nu - 1.0, z) - nu * z * z
        }
        Ncx2 => ncx2_logpdf(z, s[0], s[1]),
        Norm => norm_logpdf(z),
        Pearson3 => {
            let skew = s[0];
            if skew.abs() < ZERO_SHAPE {
                return norm_logpdf(z);
            }
            let (alpha, beta, zeta) = pearson3_params(skew);
            let t = beta * (z - zeta);
            if t <= 0.0 {
                return f64::NEG_INFINITY;
            }
            beta.abs().ln() + xlogy(alpha - 1.0, t) - t - ln_gamma(alpha)
        }
        Powerlaw => {
            let a = s[0];
            a.ln() + xlogy(a - 1.0, z)
        }
        Rayleigh => z.ln() - 0.5 * z * z,
        Rice => {
            let b = s[0];
            (2.0 * z).ln() + ncx2_logpdf(z * z, 2.0, b * b)
        }
        Recipinvgauss => {
            let mu = s[0];
            -0.5 * (2.0 * PI * z).ln() - (1.0 - mu * z).powi(2) / (2.0 * z * mu * mu)
        }
        Skewnorm => LN_2 + norm_logpdf(z) + norm_logcdf(s[0] * z),
        T => {
            let df = s[0];
            ln_gamma(0.5 * (df + 1.0))
                - ln_gamma(0.5 * df)
                - 0.5 * (df * PI).ln()
                - 0.5 * (df + 1.0) * (z * z / df).ln_1p()
        }
        Triang => {
            let c = s[0];
            if z < c {
                (2.0 * z / c).ln()
            } else {
                (2.0 * (1.0 - z) / (1.0 - c)).ln()
            }
        }
        Truncexpon => -z - (-(-s[0]).exp_m1()).ln(),
        Wald => invgauss_log_pdf(z, 1.0),
        WeibullMin => {
            let c = s[0];
            c.ln() + xlogy(c - 1.0, z) - z.powf(c)
        }
        WeibullMax => {
            let c = s[0];
            let m = -z;
            c.ln() + xlogy(c - 1.0, m) - m.powf(c)
        }
    }
}

/// Standardized CDF.
pub fn cdf(family: Family, z: f64, s: &[f64]) -> f64 {
    use Family::*;
    match family {
        Arcsine => FRAC_2_PI * z.sqrt().asin(),
        Bradford => (s[0] * z).ln_1p() / s[0].ln_1p(),
        Burr => (-s[1] * softplus(-s[0] * z.ln())).exp(),
        Cauchy => 0.5 + z.atan() / PI,
        Chi => gamma_p(0.5 * s[0], 0.5 * z * z),
        Chi2 => gamma_p(0.5 * s[0], 0.5 * z),
        Dgamma => {
            let q = 0.5 * gamma_q(s[0], z.abs());
            if z > 0.0 { 1.0 - q } else { q }
        }
        Dweibull => {
            let tail = 0.5 * (-z.abs().powf(s[0])).exp();
            if z > 0.0 { 1.0 - tail } else { tail }
        }
        Expon => -(-z).exp_m1(),
        Exponnorm => {
            let inv_k = 1.0 / s[0];
            norm_cdf(z) - (0.5 * inv_k * inv_k - z * inv_k + norm_logcdf(z - inv_k)).exp()
        }
        Exponweib => (-(-z.powf(s[1])).exp_m1()).powf(s[0]),
        Exponpow => -(-z.powf(s[0]).exp_m1()).exp_m1(),
        Fatiguelife => {
            let r = z.sqrt();
            norm_cdf((r - 1.0 / r) / s[0])
        }
        Fisk => 1.0 / (1.0 + (-s[0] * z.ln()).exp()),
        Foldnorm => norm_cdf(z - s[0]) + norm_cdf(z + s[0]) - 1.0,
        Genlogistic => (-s[0] * softplus(-z)).exp(),
        Gennorm => {
            let half = 0.5 * gamma_p(1.0 / s[0], z.abs().powf(s[0]));
            if z >= 0.0 { 0.5 + half } else { 0.5 - half }
        }
        Genexpon => {
            let (a, b, c) = (s[0], s[1], s[2]);
            let g = -(-c * z).exp_m1();
            -(-a * z - b * z + b / c * g).exp_m1()
        }
        Genextreme => {
            let c = s[0];
            if c.abs() < ZERO_SHAPE {
                (-(-z).exp()).exp()
            } else {
                let t = 1.0 - c * z;
                if t <= 0.0 {
                    return if c > 0.0 { 1.0 } else { 0.0 };
                }
                (-(t.ln() / c).exp()).exp()
            }
        }
        Gausshyper => {
            let (a, b, c, w) = (s[0], s[1], s[2], s[3]);
            let norm = gausshyper_norm(a, b, c, w);
            integrate(|x| gausshyper_kernel(x, a, b, c, w).exp(), 0.0, z) / norm
        }
        Gamma => gamma_p(s[0], z),
        Gengamma => {
            let (a, c) = (s[0], s[1]);
            let t = z.powf(c);
            if c > 0.0 { gamma_p(a, t) } else { gamma_q(a, t) }
        }
        Genhalflogistic => {
            let c = s[0];
            let t = (1.0 - c * z).max(0.0).powf(1.0 / c);
            (1.0 - t) / (1.0 + t)
        }
        Gilbrat => norm_cdf(z.ln()),
        Gompertz => -(-s[0] * z.exp_m1()).exp_m1(),
        GumbelR => (-(-z).exp()).exp(),
        GumbelL => -(-z.exp()).exp_m1(),
        Halflogistic => (0.5 * z).tanh(),
        Halfnorm => erf(z / SQRT_2),
        Halfgennorm => gamma_p(1.0 / s[0], z.powf(s[0])),
        Hypsecant => FRAC_2_PI * z.exp().atan(),
        Invgauss => invgauss_cdf(z, s[0]),
        Johnsonsb => norm_cdf(s[0] + s[1] * (z / (1.0 - z)).ln()),
        Johnsonsu => norm_cdf(s[0] + s[1] * z.asinh()),
        Kstwobign => kstwobign_cdf(z),
        Laplace => {
            if z < 0.0 {
                0.5 * z.exp()
            } else {
                1.0 - 0.5 * (-z).exp()
            }
        }
        Logistic => 1.0 / (1.0 + (-z).exp()),
        Loggamma => gamma_p(s[0], z.exp()),
        Lognorm => norm_cdf(z.ln() / s[0]),
        Maxwell => gamma_p(1.5, 0.5 * z * z),
        Nakagami => gamma_p(s[0], s[0] * z * z),
        Ncx2 => ncx2_cdf(z, s[0], s[1]),
        Norm => norm_cdf(z),
        Pearson3 => {
            let skew = s[0];
            if skew.abs() < ZERO_SHAPE {
                return norm_cdf(z);
            }
            let (alpha, beta, zeta) = pearson3_params(skew);
            let t = beta * (z - zeta);
            if skew > 0.0 {
                gamma_p(alpha, t)
            } else {
                gamma_q(alpha, t)
            }
        }
        Powerlaw => z.powf(s[0]),
        Rayleigh => -(-0.5 * z * z).exp_m1(),
        Rice => ncx2_cdf(z * z, 2.0, s[0] * s[0]),
        Recipinvgauss => {
            let mu = s[0];
            let r = z.sqrt();
            let first = norm_cdf(-(1.0 / mu - z) / r);
            let second = (2.0 / mu + norm_logcdf(-(1.0 / mu + z) / r)).exp();
            first - second
        }
        Skewnorm => norm_cdf(z) - 2.0 * owens_t(z, s[0]),
        T => {
            let df = s[0];
            let tail = 0.5 * beta_reg(0.5 * df, 0.5, df / (df + z * z));
            if z < 0.0 { tail } else { 1.0 - tail }
        }
        Triang => {
            let c = s[0];
            if z < c {
                z * z / c
            } else {
                1.0 - (1.0 - z).powi(2) / (1.0 - c)
            }
        }
        Truncexpon => (-z).exp_m1() / (-s[0]).exp_m1(),
        Wald => invgauss_cdf(z, 1.0),
        WeibullMin => -(-z.powf(s[0])).exp_m1(),
        WeibullMax => (-(-z).powf(s[0])).exp(),
    }
}

/// `α`, `β`, `ζ` of the shifted gamma behind `pearson3` (unit variance).
pub(crate) fn pearson3_params(skew: f64) -> (f64, f64, f64) {
    let beta = 2.0 / skew;
    let alpha = beta * beta;
    let zeta = -alpha / beta;
    (alpha, beta, zeta)
}

fn ln_cosh(z: f64) -> f64 {
    let a = z.abs();
    a + (-2.0 * a).exp().ln_1p() - LN_2
}

fn invgauss_log_pdf(z: f64, mu: f64) -> f64 {
    -LN_SQRT_2PI - 1.5 * z.ln() - (z - mu).powi(2) / (2.0 * z * mu * mu)
}

fn invgauss_cdf(z: f64, mu: f64) -> f64 {
    let r = z.sqrt();
    let first = norm_cdf((z / mu - 1.0) / r);
    let second = (2.0 / mu + norm_logcdf(-(z / mu + 1.0) / r)).exp();
    first + second
}

/// Log of the unnormalized Gauss hypergeometric density on (0, 1).
fn gausshyper_kernel(x: f64, a: f64, b: f64, c: f64, w: f64) -> f64 {
    xlogy(a - 1.0, x) + xlogy(b - 1.0, 1.0 - x) - c * (w * x).ln_1p()
}

fn gausshyper_norm(a: f64, b: f64, c: f64, w: f64) -> f64 {
    integrate(|x| gausshyper_kernel(x, a, b, c, w).exp(), 0.0, 1.0)
}

/// Limiting Kolmogorov–Smirnov distribution. Two series are used: the Jacobi
/// theta form for small `x` and the alternating series for large `x`.
fn kstwobign_cdf(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < 1.0 {
        let mut total = 0.0;
        for k in 1..=20 {
            let m = (2 * k - 1) as f64;
            total += (-m * m * PI * PI / (8.0 * x * x)).exp();
        }
        (2.0 * PI).sqrt() / x * total
    } else {
        let mut total = 0.0;
        for k in 1..=100 {
            let kf = k as f64;
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            let term = (-2.0 * kf * kf * x * x).exp();
            total += sign * term;
            if term < 1e-18 {
                break;
            }
        }
        1.0 - 2.0 * total
    }
}

fn kstwobign_pdf(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < 1.0 {
        let mut total = 0.0;
        let x2 = x * x;
        for k in 1..=20 {
            let m = (2 * k - 1) as f64;
            let ck = m * m * PI * PI / 8.0;
            total += (-ck / x2).exp() * (2.0 * ck / (x2 * x2) - 1.0 / x2);
        }
        (2.0 * PI).sqrt() * total
    } else {
        let mut total = 0.0;
        for k in 1..=100 {
            let kf = k as f64;
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            let term = kf * kf * (-2.0 * kf * kf * x * x).exp();
            total += sign * term;
            if term < 1e-18 {
                break;
            }
        }
        8.0 * x * total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kstwobign_series_agree_at_switch() {
        // Both series are valid around x = 1; evaluate just either side.
        let below = kstwobign_cdf(1.0 - 1e-9);
        let above = kstwobign_cdf(1.0);
        assert!((below - above).abs() < 1e-8);
        // K(1) = 1 - 2(e^-2 - e^-8 + e^-18 - ...)
        assert!((above - 0.730_000_3).abs() < 1e-6);
    }

    #[test]
    fn pearson3_zero_skew_is_normal() {
        let z = 0.7;
        assert!((cdf(Family::Pearson3, z, &[0.0]) - norm_cdf(z)).abs() < 1e-15);
    }

    #[test]
    fn skewnorm_zero_shape_is_normal() {
        let z = -0.4;
        assert!((cdf(Family::Skewnorm, z, &[0.0]) - norm_cdf(z)).abs() < 1e-12);
        assert!((log_pdf(Family::Skewnorm, z, &[0.0]) - norm_logpdf(z)).abs() < 1e-12);
    }

    #[test]
    fn wald_is_invgauss_with_unit_mean() {
        let z = 1.3;
        assert!((cdf(Family::Wald, z, &[]) - cdf(Family::Invgauss, z, &[1.0])).abs() < 1e-15);
    }
}
