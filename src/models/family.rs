//! The catalog of candidate continuous families.
//!
//! Every family is a location-scale family over a standardized density with
//! zero or more shape parameters. `Family` carries the metadata the fitter
//! needs (shape names, admissible domains, starting values and the
//! standardized support); the formulas themselves live in `density`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DistParams;
use crate::models::density;

/// A candidate continuous distribution family.
///
/// Variants are listed in catalog order; this order is the tie-breaker when
/// two families reach the same p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Arcsine,
    Bradford,
    Burr,
    Cauchy,
    Chi,
    Chi2,
    Dgamma,
    Dweibull,
    Expon,
    Exponnorm,
    Exponweib,
    Exponpow,
    Fatiguelife,
    Fisk,
    Foldnorm,
    Genlogistic,
    Gennorm,
    Genexpon,
    Genextreme,
    Gausshyper,
    Gamma,
    Gengamma,
    Genhalflogistic,
    Gilbrat,
    Gompertz,
    GumbelR,
    GumbelL,
    Halflogistic,
    Halfnorm,
    Halfgennorm,
    Hypsecant,
    Invgauss,
    Johnsonsb,
    Johnsonsu,
    Kstwobign,
    Laplace,
    Logistic,
    Loggamma,
    Lognorm,
    Maxwell,
    Nakagami,
    Ncx2,
    Norm,
    Pearson3,
    Powerlaw,
    Rayleigh,
    Rice,
    Recipinvgauss,
    Skewnorm,
    T,
    Triang,
    Truncexpon,
    Wald,
    WeibullMin,
    WeibullMax,
}

/// Admissible values for a shape parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDomain {
    /// `(0, ∞)`
    Positive,
    /// Any finite value.
    Real,
    /// `(0, 1)`
    UnitOpen,
    /// `(a, ∞)`
    Above(f64),
}

impl ShapeDomain {
    pub fn contains(self, v: f64) -> bool {
        if !v.is_finite() {
            return false;
        }
        match self {
            ShapeDomain::Positive => v > 0.0,
            ShapeDomain::Real => true,
            ShapeDomain::UnitOpen => v > 0.0 && v < 1.0,
            ShapeDomain::Above(a) => v > a,
        }
    }
}

/// Name, domain and starting value of one shape parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub name: &'static str,
    pub domain: ShapeDomain,
    pub start: f64,
}

const fn positive(name: &'static str, start: f64) -> ShapeSpec {
    ShapeSpec {
        name,
        domain: ShapeDomain::Positive,
        start,
    }
}

const fn real(name: &'static str, start: f64) -> ShapeSpec {
    ShapeSpec {
        name,
        domain: ShapeDomain::Real,
        start,
    }
}

const REAL_LINE: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);
const HALF_LINE: (f64, f64) = (0.0, f64::INFINITY);
const UNIT: (f64, f64) = (0.0, 1.0);

impl Family {
    pub const ALL: [Family; 55] = [
        Family::Arcsine,
        Family::Bradford,
        Family::Burr,
        Family::Cauchy,
        Family::Chi,
        Family::Chi2,
        Family::Dgamma,
        Family::Dweibull,
        Family::Expon,
        Family::Exponnorm,
        Family::Exponweib,
        Family::Exponpow,
        Family::Fatiguelife,
        Family::Fisk,
        Family::Foldnorm,
        Family::Genlogistic,
        Family::Gennorm,
        Family::Genexpon,
        Family::Genextreme,
        Family::Gausshyper,
        Family::Gamma,
        Family::Gengamma,
        Family::Genhalflogistic,
        Family::Gilbrat,
        Family::Gompertz,
        Family::GumbelR,
        Family::GumbelL,
        Family::Halflogistic,
        Family::Halfnorm,
        Family::Halfgennorm,
        Family::Hypsecant,
        Family::Invgauss,
        Family::Johnsonsb,
        Family::Johnsonsu,
        Family::Kstwobign,
        Family::Laplace,
        Family::Logistic,
        Family::Loggamma,
        Family::Lognorm,
        Family::Maxwell,
        Family::Nakagami,
        Family::Ncx2,
        Family::Norm,
        Family::Pearson3,
        Family::Powerlaw,
        Family::Rayleigh,
        Family::Rice,
        Family::Recipinvgauss,
        Family::Skewnorm,
        Family::T,
        Family::Triang,
        Family::Truncexpon,
        Family::Wald,
        Family::WeibullMin,
        Family::WeibullMax,
    ];

    /// Catalog name used on the command line and in reports.
    pub fn name(self) -> &'static str {
        use Family::*;
        match self {
            Arcsine => "arcsine",
            Bradford => "bradford",
            Burr => "burr",
            Cauchy => "cauchy",
            Chi => "chi",
            Chi2 => "chi2",
            Dgamma => "dgamma",
            Dweibull => "dweibull",
            Expon => "expon",
            Exponnorm => "exponnorm",
            Exponweib => "exponweib",
            Exponpow => "exponpow",
            Fatiguelife => "fatiguelife",
            Fisk => "fisk",
            Foldnorm => "foldnorm",
            Genlogistic => "genlogistic",
            Gennorm => "gennorm",
            Genexpon => "genexpon",
            Genextreme => "genextreme",
            Gausshyper => "gausshyper",
            Gamma => "gamma",
            Gengamma => "gengamma",
            Genhalflogistic => "genhalflogistic",
            Gilbrat => "gilbrat",
            Gompertz => "gompertz",
            GumbelR => "gumbel_r",
            GumbelL => "gumbel_l",
            Halflogistic => "halflogistic",
            Halfnorm => "halfnorm",
            Halfgennorm => "halfgennorm",
            Hypsecant => "hypsecant",
            Invgauss => "invgauss",
            Johnsonsb => "johnsonsb",
            Johnsonsu => "johnsonsu",
            Kstwobign => "kstwobign",
            Laplace => "laplace",
            Logistic => "logistic",
            Loggamma => "loggamma",
            Lognorm => "lognorm",
            Maxwell => "maxwell",
            Nakagami => "nakagami",
            Ncx2 => "ncx2",
            Norm => "norm",
            Pearson3 => "pearson3",
            Powerlaw => "powerlaw",
            Rayleigh => "rayleigh",
            Rice => "rice",
            Recipinvgauss => "recipinvgauss",
            Skewnorm => "skewnorm",
            T => "t",
            Triang => "triang",
            Truncexpon => "truncexpon",
            Wald => "wald",
            WeibullMin => "weibull_min",
            WeibullMax => "weibull_max",
        }
    }

    /// Shape parameters in positional order (empty for pure location-scale families).
    pub fn shapes(self) -> &'static [ShapeSpec] {
        use Family::*;
        match self {
            Arcsine | Cauchy | Expon | Gilbrat | GumbelR | GumbelL | Halflogistic | Halfnorm
            | Hypsecant | Kstwobign | Laplace | Logistic | Maxwell | Norm | Rayleigh | Wald => &[],
            Bradford | Fisk | Genhalflogistic | Gompertz | Loggamma | WeibullMin | WeibullMax
            | Dweibull | Fatiguelife | Foldnorm | Genlogistic => {
                const C: [ShapeSpec; 1] = [positive("c", 1.0)];
                &C
            }
            Burr => {
                const S: [ShapeSpec; 2] = [positive("c", 1.0), positive("d", 1.0)];
                &S
            }
            Chi | Chi2 => {
                const S: [ShapeSpec; 1] = [positive("df", 1.0)];
                &S
            }
            T => {
                const S: [ShapeSpec; 1] = [positive("df", 5.0)];
                &S
            }
            Dgamma | Gamma | Powerlaw => {
                const S: [ShapeSpec; 1] = [positive("a", 1.0)];
                &S
            }
            Exponnorm => {
                const S: [ShapeSpec; 1] = [positive("K", 1.0)];
                &S
            }
            Exponweib => {
                const S: [ShapeSpec; 2] = [positive("a", 1.0), positive("c", 1.0)];
                &S
            }
            Exponpow => {
                const S: [ShapeSpec; 1] = [positive("b", 1.0)];
                &S
            }
            Gennorm => {
                const S: [ShapeSpec; 1] = [positive("beta", 2.0)];
                &S
            }
            Halfgennorm => {
                const S: [ShapeSpec; 1] = [positive("beta", 1.0)];
                &S
            }
            Genexpon => {
                const S: [ShapeSpec; 3] =
                    [positive("a", 1.0), positive("b", 1.0), positive("c", 1.0)];
                &S
            }
            Genextreme => {
                const S: [ShapeSpec; 1] = [real("c", 0.1)];
                &S
            }
            Gausshyper => {
                const S: [ShapeSpec; 4] = [
                    positive("a", 1.0),
                    positive("b", 1.0),
                    real("c", 1.0),
                    ShapeSpec {
                        name: "z",
                        domain: ShapeDomain::Above(-1.0),
                        start: 1.0,
                    },
                ];
                &S
            }
            Gengamma => {
                const S: [ShapeSpec; 2] = [positive("a", 1.0), real("c", 1.0)];
                &S
            }
            Invgauss | Recipinvgauss => {
                const S: [ShapeSpec; 1] = [positive("mu", 1.0)];
                &S
            }
            Johnsonsb | Johnsonsu => {
                const S: [ShapeSpec; 2] = [real("a", 0.0), positive("b", 1.0)];
                &S
            }
            Lognorm => {
                const S: [ShapeSpec; 1] = [positive("s", 1.0)];
                &S
            }
            Nakagami => {
                const S: [ShapeSpec; 1] = [positive("nu", 1.0)];
                &S
            }
            Ncx2 => {
                const S: [ShapeSpec; 2] = [positive("df", 1.0), positive("nc", 1.0)];
                &S
            }
            Pearson3 => {
                const S: [ShapeSpec; 1] = [real("skew", 0.5)];
                &S
            }
            Rice => {
                const S: [ShapeSpec; 1] = [positive("b", 1.0)];
                &S
            }
            Skewnorm => {
                const S: [ShapeSpec; 1] = [real("a", 0.5)];
                &S
            }
            Triang => {
                const S: [ShapeSpec; 1] = [ShapeSpec {
                    name: "c",
                    domain: ShapeDomain::UnitOpen,
                    start: 0.5,
                }];
                &S
            }
            Truncexpon => {
                const S: [ShapeSpec; 1] = [positive("b", 1.0)];
                &S
            }
        }
    }

    pub fn shape_count(self) -> usize {
        self.shapes().len()
    }

    /// Starting shape values for the optimizer.
    pub fn start_shapes(self) -> Vec<f64> {
        self.shapes().iter().map(|s| s.start).collect()
    }

    /// Whether `shapes` has the right length and every value is admissible.
    pub fn shapes_valid(self, shapes: &[f64]) -> bool {
        if shapes.len() != self.shape_count() {
            return false;
        }
        let in_domain = self
            .shapes()
            .iter()
            .zip(shapes)
            .all(|(spec, &v)| spec.domain.contains(v));
        match self {
            Family::Gengamma => in_domain && shapes[1] != 0.0,
            _ => in_domain,
        }
    }

    /// Whether `params` describe a valid member of this family.
    pub fn params_valid(self, params: &DistParams) -> bool {
        params.loc.is_finite()
            && params.scale.is_finite()
            && params.scale > 0.0
            && self.shapes_valid(&params.shapes)
    }

    /// Support of the standardized distribution (`loc = 0`, `scale = 1`).
    pub fn standard_support(self, shapes: &[f64]) -> (f64, f64) {
        use Family::*;
        match self {
            Arcsine | Bradford | Gausshyper | Johnsonsb | Powerlaw | Triang => UNIT,
            Cauchy | Dgamma | Dweibull | Exponnorm | Genlogistic | Gennorm | GumbelR | GumbelL
            | Hypsecant | Johnsonsu | Laplace | Logistic | Loggamma | Norm | Skewnorm | T => {
                REAL_LINE
            }
            Burr | Chi | Chi2 | Expon | Exponweib | Exponpow | Fatiguelife | Fisk | Foldnorm
            | Genexpon | Gamma | Gengamma | Gilbrat | Gompertz | Halflogistic | Halfnorm
            | Halfgennorm | Invgauss | Kstwobign | Lognorm | Maxwell | Nakagami | Ncx2
            | Rayleigh | Rice | Recipinvgauss | Wald | WeibullMin => HALF_LINE,
            WeibullMax => (f64::NEG_INFINITY, 0.0),
            Genhalflogistic => (0.0, 1.0 / shapes[0]),
            Truncexpon => (0.0, shapes[0]),
            Genextreme => {
                let c = shapes[0];
                if c > 0.0 {
                    (f64::NEG_INFINITY, 1.0 / c)
                } else if c < 0.0 {
                    (1.0 / c, f64::INFINITY)
                } else {
                    REAL_LINE
                }
            }
            Pearson3 => {
                let skew = shapes[0];
                if skew > 0.0 {
                    (-2.0 / skew, f64::INFINITY)
                } else if skew < 0.0 {
                    (f64::NEG_INFINITY, -2.0 / skew)
                } else {
                    REAL_LINE
                }
            }
        }
    }

    /// Support of the distribution with the given location and scale.
    pub fn support(self, params: &DistParams) -> (f64, f64) {
        let (lo, hi) = self.standard_support(&params.shapes);
        (params.loc + params.scale * lo, params.loc + params.scale * hi)
    }

    /// Log-density at `x`; `-∞` outside the support or for invalid parameters.
    pub fn log_pdf(self, x: f64, params: &DistParams) -> f64 {
        if !self.params_valid(params) || x.is_nan() {
            return f64::NAN;
        }
        let z = (x - params.loc) / params.scale;
        let (lo, hi) = self.standard_support(&params.shapes);
        if z < lo || z > hi {
            return f64::NEG_INFINITY;
        }
        density::log_pdf(self, z, &params.shapes) - params.scale.ln()
    }

    /// Cumulative distribution function at `x`.
    pub fn cdf(self, x: f64, params: &DistParams) -> f64 {
        if !self.params_valid(params) || x.is_nan() {
            return f64::NAN;
        }
        let z = (x - params.loc) / params.scale;
        self.standard_cdf(z, &params.shapes)
    }

    fn standard_cdf(self, z: f64, shapes: &[f64]) -> f64 {
        let (lo, hi) = self.standard_support(shapes);
        if z <= lo {
            return 0.0;
        }
        if z >= hi {
            return 1.0;
        }
        let p = density::cdf(self, z, shapes);
        if p.is_nan() { p } else { p.clamp(0.0, 1.0) }
    }

    /// Quantile function (inverse CDF) by bisection on the standardized CDF.
    pub fn ppf(self, p: f64, params: &DistParams) -> f64 {
        if !self.params_valid(params) || !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        let shapes = &params.shapes;
        let (lo, hi) = self.standard_support(shapes);
        let z = if p == 0.0 {
            lo
        } else if p == 1.0 {
            hi
        } else {
            self.standard_ppf(p, shapes, lo, hi)
        };
        params.loc + params.scale * z
    }

    fn standard_ppf(self, p: f64, shapes: &[f64], lo: f64, hi: f64) -> f64 {
        const MAX_EXPANSIONS: usize = 1100;
        const MAX_BISECTIONS: usize = 200;

        let mut a = lo;
        if !a.is_finite() {
            let anchor = hi.min(0.0);
            let mut step = 1.0;
            a = anchor - step;
            for _ in 0..MAX_EXPANSIONS {
                if self.standard_cdf(a, shapes) <= p {
                    break;
                }
                step *= 2.0;
                a = anchor - step;
            }
        }
        let mut b = hi;
        if !b.is_finite() {
            let anchor = lo.max(0.0);
            let mut step = 1.0;
            b = anchor + step;
            for _ in 0..MAX_EXPANSIONS {
                if self.standard_cdf(b, shapes) >= p {
                    break;
                }
                step *= 2.0;
                b = anchor + step;
            }
        }

        for _ in 0..MAX_BISECTIONS {
            let mid = 0.5 * (a + b);
            if b - a <= 1e-12 * (1.0 + a.abs() + b.abs()) {
                return mid;
            }
            if self.standard_cdf(mid, shapes) < p {
                a = mid;
            } else {
                b = mid;
            }
        }
        0.5 * (a + b)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Family::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown distribution family '{needle}' (see `histfit families`)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_params(family: Family) -> DistParams {
        DistParams {
            shapes: family.start_shapes(),
            loc: 0.0,
            scale: 1.0,
        }
    }

    #[test]
    fn names_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for family in Family::ALL {
            assert!(seen.insert(family.name()), "duplicate {family}");
            assert_eq!(family.name().parse::<Family>().unwrap(), family);
        }
        assert_eq!(seen.len(), 55);
        assert!("not_a_family".parse::<Family>().is_err());
    }

    #[test]
    fn serde_names_match_catalog_names() {
        for family in Family::ALL {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.name()));
        }
    }

    #[test]
    fn start_shapes_are_valid() {
        for family in Family::ALL {
            assert!(family.shapes_valid(&family.start_shapes()), "{family}");
        }
    }

    #[test]
    fn cdf_derivative_matches_density_at_quartiles() {
        for family in Family::ALL {
            let params = start_params(family);
            for &q in &[0.25, 0.5, 0.75] {
                let x = family.ppf(q, &params);
                assert!(x.is_finite(), "{family} ppf({q}) = {x}");
                assert!((family.cdf(x, &params) - q).abs() < 1e-6, "{family} ppf/cdf at {q}");

                let h = 1e-5 * (1.0 + x.abs());
                let slope = (family.cdf(x + h, &params) - family.cdf(x - h, &params)) / (2.0 * h);
                let density = family.log_pdf(x, &params).exp();
                let rel = (slope - density).abs() / density.max(1e-12);
                assert!(rel < 1e-3, "{family} at q={q}: slope {slope} vs pdf {density}");
            }
        }
    }

    #[test]
    fn cdf_is_monotone() {
        for family in Family::ALL {
            let params = start_params(family);
            let a = family.ppf(0.01, &params);
            let b = family.ppf(0.99, &params);
            let mut prev = 0.0;
            for i in 0..=50 {
                let x = a + (b - a) * i as f64 / 50.0;
                let p = family.cdf(x, &params);
                assert!(p >= prev - 1e-12, "{family} not monotone at {x}");
                prev = p;
            }
        }
    }

    #[test]
    fn outside_support_has_zero_density() {
        let params = DistParams {
            shapes: vec![],
            loc: 2.0,
            scale: 3.0,
        };
        assert_eq!(Family::Expon.log_pdf(1.0, &params), f64::NEG_INFINITY);
        assert_eq!(Family::Expon.cdf(1.0, &params), 0.0);
        assert_eq!(Family::Expon.support(&params), (2.0, f64::INFINITY));
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let params = DistParams {
            shapes: vec![],
            loc: 0.0,
            scale: 0.0,
        };
        assert!(Family::Norm.log_pdf(0.0, &params).is_nan());
        assert!(!Family::Norm.params_valid(&params));
    }

    #[test]
    fn gengamma_rejects_zero_power() {
        assert!(!Family::Gengamma.shapes_valid(&[1.0, 0.0]));
        assert!(Family::Gengamma.shapes_valid(&[1.0, -0.5]));
    }
}
