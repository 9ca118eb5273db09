//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed test counts: `o`
//! - expected frequencies of a fitted family: `-` line

use crate::domain::{FamilyFit, ReportFile};
use crate::models::Family;

/// Render observed counts against a fitted family's expected frequencies.
pub fn render_ascii_plot(
    labels: &[i64],
    observed: &[u64],
    fit: &FamilyFit,
    width: usize,
    height: usize,
) -> String {
    let points = to_points(labels, observed.iter().map(|&c| c as f64));
    let curve = to_points(labels, fit.expected.iter().copied());
    render_plot(fit.family, &points, &curve, width, height)
}

/// Render the plot for `family` from a saved report, if it was fitted there.
pub fn render_ascii_plot_from_report(
    report: &ReportFile,
    family: Family,
    width: usize,
    height: usize,
) -> Option<String> {
    let fit = report.fit_for(family)?;
    Some(render_ascii_plot(
        &report.labels,
        &report.observed,
        fit,
        width,
        height,
    ))
}

fn to_points(labels: &[i64], values: impl Iterator<Item = f64>) -> Vec<(f64, f64)> {
    labels
        .iter()
        .zip(values)
        .map(|(&label, v)| (label as f64, v))
        .filter(|(_, v)| v.is_finite())
        .collect()
}

fn render_plot(
    family: Family,
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the expected line first so observed points overlay it.
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {family} | label=[{x_min}, {x_max}] | count=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in points.iter().chain(curve) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points.iter().chain(curve) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChiSquare, DistParams, FitMethod};

    fn fit_with_expected(expected: Vec<f64>) -> FamilyFit {
        FamilyFit {
            family: Family::Norm,
            params: DistParams::new(vec![], 2.0, 1.0),
            log_likelihood: -4.0,
            method: FitMethod::ClosedForm,
            iterations: 0,
            converged: true,
            expected,
            chi_square: ChiSquare {
                statistic: 0.0,
                dof: 1,
                p_value: 1.0,
            },
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let fit = fit_with_expected(vec![0.0, 10.0]);
        let txt = render_ascii_plot(&[0, 4], &[0, 10], &fit, 10, 5);
        let expected = concat!(
            "Plot: norm | label=[0, 4] | count=[-0.50, 10.50]\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn plot_from_report_requires_a_fitted_family() {
        let report = ReportFile {
            tool: "histfit".into(),
            generated_at: chrono::Utc::now(),
            train_path: "a.csv".into(),
            test_path: "b.csv".into(),
            labels: vec![0, 1, 2],
            observed: vec![1, 4, 2],
            outcomes: vec![crate::domain::FamilyOutcome::Fitted(fit_with_expected(vec![
                1.5, 3.0, 1.5,
            ]))],
            best: Some(Family::Norm),
        };
        let txt = render_ascii_plot_from_report(&report, Family::Norm, 20, 6).unwrap();
        assert_eq!(txt.lines().count(), 7);
        assert!(txt.contains('o'));
        assert!(render_ascii_plot_from_report(&report, Family::Gamma, 20, 6).is_none());
    }
}
