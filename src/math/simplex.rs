//! Nelder–Mead simplex minimization.
//!
//! Used to maximize likelihoods that have no closed form. The objective may
//! return `+∞` for infeasible points (outside the support); such vertices are
//! simply ranked worst and get replaced.
//!
//! Defaults mirror the classic `fmin` settings: 5% initial perturbation of
//! non-zero coordinates, absolute tolerances of `1e-4` on both the simplex
//! spread and the objective spread.

use std::time::Instant;

use nalgebra::DVector;

/// Optimizer settings.
#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iterations: usize,
    pub xatol: f64,
    pub fatol: f64,
    /// Abort once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            xatol: 1e-4,
            fatol: 1e-4,
            deadline: None,
        }
    }
}

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: DVector<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexError {
    /// The objective is not finite at the starting point.
    InfeasibleStart,
    /// The deadline passed before convergence.
    DeadlineExceeded { iterations: usize },
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const NONZERO_DELTA: f64 = 0.05;
const ZERO_DELTA: f64 = 0.000_25;

impl NelderMead {
    pub fn minimize<F>(&self, f: F, x0: DVector<f64>) -> Result<Minimum, SimplexError>
    where
        F: Fn(&DVector<f64>) -> f64,
    {
        let f0 = f(&x0);
        if !f0.is_finite() {
            return Err(SimplexError::InfeasibleStart);
        }

        let n = x0.len();
        if n == 0 {
            return Ok(Minimum {
                x: x0,
                value: f0,
                iterations: 0,
                converged: true,
            });
        }

        let mut vertices: Vec<(DVector<f64>, f64)> = Vec::with_capacity(n + 1);
        vertices.push((x0.clone(), f0));
        for i in 0..n {
            let mut v = x0.clone();
            v[i] = if v[i] != 0.0 {
                (1.0 + NONZERO_DELTA) * v[i]
            } else {
                ZERO_DELTA
            };
            let fv = f(&v);
            vertices.push((v, fv));
        }
        sort_vertices(&mut vertices);

        let mut iterations = 0;
        while iterations < self.max_iterations {
            if self.converged(&vertices) {
                let (x, value) = vertices.swap_remove(0);
                return Ok(Minimum {
                    x,
                    value,
                    iterations,
                    converged: true,
                });
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(SimplexError::DeadlineExceeded { iterations });
                }
            }
            iterations += 1;

            // Centroid of all vertices but the worst.
            let mut centroid = DVector::<f64>::zeros(n);
            for (v, _) in &vertices[..n] {
                centroid += v;
            }
            centroid /= n as f64;

            let worst = vertices[n].clone();
            let best_value = vertices[0].1;
            let second_worst = vertices[n - 1].1;

            let xr = &centroid + (&centroid - &worst.0) * REFLECT;
            let fr = f(&xr);

            if fr < best_value {
                let xe = &centroid + (&xr - &centroid) * EXPAND;
                let fe = f(&xe);
                vertices[n] = if fe < fr { (xe, fe) } else { (xr, fr) };
            } else if fr < second_worst {
                vertices[n] = (xr, fr);
            } else {
                // Contraction: outside if the reflection improved on the worst.
                let (xc, fc) = if fr < worst.1 {
                    let xc = &centroid + (&xr - &centroid) * CONTRACT;
                    let fc = f(&xc);
                    (xc, fc)
                } else {
                    let xc = &centroid + (&worst.0 - &centroid) * CONTRACT;
                    let fc = f(&xc);
                    (xc, fc)
                };

                if fc < fr.min(worst.1) {
                    vertices[n] = (xc, fc);
                } else {
                    let best = vertices[0].0.clone();
                    for (v, fv) in vertices.iter_mut().skip(1) {
                        *v = &best + (&*v - &best) * SHRINK;
                        *fv = f(v);
                    }
                }
            }
            sort_vertices(&mut vertices);
        }

        let (x, value) = vertices.swap_remove(0);
        Ok(Minimum {
            x,
            value,
            iterations,
            converged: false,
        })
    }

    fn converged(&self, vertices: &[(DVector<f64>, f64)]) -> bool {
        let (best, best_value) = &vertices[0];
        let mut x_spread = 0.0_f64;
        let mut f_spread = 0.0_f64;
        for (v, fv) in &vertices[1..] {
            x_spread = x_spread.max((v - best).amax());
            f_spread = f_spread.max((fv - best_value).abs());
        }
        x_spread <= self.xatol && f_spread <= self.fatol
    }
}

/// Order vertices by objective; NaN sorts last.
fn sort_vertices(vertices: &mut [(DVector<f64>, f64)]) {
    vertices.sort_by(|a, b| {
        let fa = if a.1.is_nan() { f64::INFINITY } else { a.1 };
        let fb = if b.1.is_nan() { f64::INFINITY } else { b.1 };
        fa.total_cmp(&fb)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_shifted_quadratic() {
        let f = |x: &DVector<f64>| (x[0] - 3.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2);
        let opt = NelderMead {
            xatol: 1e-8,
            fatol: 1e-10,
            ..NelderMead::default()
        };
        let min = opt.minimize(f, DVector::from_vec(vec![0.0, 0.0])).unwrap();
        assert!(min.converged);
        assert!((min.x[0] - 3.0).abs() < 1e-4);
        assert!((min.x[1] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn minimizes_rosenbrock() {
        let f = |x: &DVector<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let opt = NelderMead {
            max_iterations: 5000,
            xatol: 1e-8,
            fatol: 1e-12,
            ..NelderMead::default()
        };
        let min = opt.minimize(f, DVector::from_vec(vec![-1.2, 1.0])).unwrap();
        assert!((min.x[0] - 1.0).abs() < 1e-3, "x = {}", min.x);
        assert!((min.x[1] - 1.0).abs() < 1e-3, "x = {}", min.x);
    }

    #[test]
    fn infeasible_regions_are_avoided() {
        // Minimum of x² restricted to x > 1 sits at the boundary.
        let f = |x: &DVector<f64>| if x[0] > 1.0 { x[0] * x[0] } else { f64::INFINITY };
        let min = NelderMead::default()
            .minimize(f, DVector::from_vec(vec![4.0]))
            .unwrap();
        assert!(min.x[0] > 1.0 && min.x[0] < 1.01);
    }

    #[test]
    fn infeasible_start_is_an_error() {
        let f = |_: &DVector<f64>| f64::INFINITY;
        let err = NelderMead::default()
            .minimize(f, DVector::from_vec(vec![0.0]))
            .unwrap_err();
        assert_eq!(err, SimplexError::InfeasibleStart);
    }

    #[test]
    fn past_deadline_is_an_error() {
        let f = |x: &DVector<f64>| x[0] * x[0] + x[1] * x[1];
        let opt = NelderMead {
            deadline: Some(Instant::now()),
            ..NelderMead::default()
        };
        let err = opt.minimize(f, DVector::from_vec(vec![5.0, 5.0])).unwrap_err();
        assert!(matches!(err, SimplexError::DeadlineExceeded { .. }));
    }
}
