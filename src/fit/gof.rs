//! Pearson's chi-square goodness-of-fit test.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::domain::ChiSquare;
use crate::error::FitError;

/// Chi-square test of `observed` against `expected`.
///
/// `labels` only serve to name an offending bin. Degrees of freedom are
/// `k − 1 − ddof`. Totals of observed and expected are not required to match.
pub fn chi_square(
    labels: &[i64],
    observed: &[u64],
    expected: &[f64],
    ddof: usize,
) -> Result<ChiSquare, FitError> {
    if observed.len() != expected.len() {
        return Err(FitError::InvalidParams(format!(
            "observed has {} bins but expected has {}",
            observed.len(),
            expected.len()
        )));
    }

    let dof = observed.len() as i64 - 1 - ddof as i64;
    if dof < 1 {
        return Err(FitError::DegreesOfFreedom(dof));
    }

    let mut statistic = 0.0;
    for (i, (&o, &e)) in observed.iter().zip(expected).enumerate() {
        if !(e.is_finite() && e > 0.0) {
            let label = labels.get(i).copied().unwrap_or(i as i64);
            return Err(FitError::InvalidExpected { label, value: e });
        }
        let d = o as f64 - e;
        statistic += d * d / e;
    }

    let p_value = ChiSquared::new(dof as f64)
        .map_err(|e| FitError::InvalidParams(e.to_string()))?
        .sf(statistic);
    if !p_value.is_finite() {
        return Err(FitError::NonFinite);
    }

    Ok(ChiSquare {
        statistic,
        dof: dof as usize,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_case_matches_closed_form() {
        // dof = 2, so p = exp(-stat / 2).
        let result = chi_square(&[0, 1, 2], &[10, 20, 30], &[20.0, 20.0, 20.0], 0).unwrap();
        assert!((result.statistic - 10.0).abs() < 1e-12);
        assert_eq!(result.dof, 2);
        assert!((result.p_value - (-5.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn four_degrees_of_freedom_match_closed_form() {
        // dof = 4: p = exp(-x/2) (1 + x/2).
        let result = chi_square(
            &[0, 1, 2, 3, 4],
            &[10, 20, 30, 20, 20],
            &[20.0; 5],
            0,
        )
        .unwrap();
        assert!((result.statistic - 10.0).abs() < 1e-12);
        assert_eq!(result.dof, 4);
        assert!((result.p_value - 6.0 * (-5.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn perfect_fit_has_p_value_one() {
        let result = chi_square(&[0, 1], &[5, 5], &[5.0, 5.0], 0).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_expected_names_the_bin() {
        let err = chi_square(&[7, 8, 9], &[1, 2, 3], &[1.0, 0.0, 3.0], 0).unwrap_err();
        assert_eq!(err, FitError::InvalidExpected { label: 8, value: 0.0 });
    }

    #[test]
    fn too_few_bins_is_rejected() {
        let err = chi_square(&[0], &[3], &[3.0], 0).unwrap_err();
        assert_eq!(err, FitError::DegreesOfFreedom(0));
        let err = chi_square(&[0, 1, 2], &[1, 2, 3], &[1.0, 2.0, 3.0], 2).unwrap_err();
        assert_eq!(err, FitError::DegreesOfFreedom(0));
    }
}
