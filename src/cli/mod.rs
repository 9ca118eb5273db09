//! Command-line parsing for histfit.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code. `app` turns the parsed arguments into plain config structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::Family;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "histfit",
    version,
    about = "Fit distribution families to binned counts and rank them by chi-square p-value"
)]
pub struct Cli {
    /// Log at DEBUG level (default INFO). Logs go to stderr.
    #[arg(short, long, global = true, env = "HISTFIT_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit continuous families to a training histogram and score them on a test histogram.
    Continuous(ContinuousArgs),
    /// Fit a multinomial model to categorical training counts and test it.
    Discrete(DiscreteArgs),
    /// List the family catalog with shape-parameter names.
    Families,
    /// Draw a binned synthetic histogram from a family.
    Generate(GenerateArgs),
    /// Plot observed vs expected from an exported JSON report.
    Plot(PlotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ContinuousArgs {
    /// Training histogram (CSV: label,count).
    #[arg(long, default_value = "training intervals.csv")]
    pub train: PathBuf,

    /// Test histogram (CSV: label,count).
    #[arg(long, default_value = "fitting intervals.csv")]
    pub test: PathBuf,

    /// Families to try, comma-separated (default: the whole catalog).
    #[arg(long, value_delimiter = ',', env = "HISTFIT_FAMILIES")]
    pub families: Vec<Family>,

    /// Iterations per Nelder-Mead minimization.
    #[arg(long, default_value_t = 2000, env = "HISTFIT_MAX_ITER")]
    pub max_iter: usize,

    /// Wall-clock limit per family fit, in milliseconds (0 disables it).
    #[arg(long, default_value_t = 10_000, env = "HISTFIT_FIT_TIMEOUT_MS")]
    pub fit_timeout_ms: u64,

    /// Skip families whose optimizer exhausts its iterations.
    #[arg(long)]
    pub strict_convergence: bool,

    /// Extra degrees of freedom to subtract in the chi-square test.
    #[arg(long, default_value_t = 0)]
    pub ddof: usize,

    /// Worker threads for the per-family fits (0 = one per core).
    #[arg(long, default_value_t = 0, env = "HISTFIT_JOBS")]
    pub jobs: usize,

    /// Print expected frequencies for every fitted family.
    #[arg(long)]
    pub show_expected: bool,

    /// Render an ASCII plot of observed vs expected for the best family.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the full run (all outcomes) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_report: Option<PathBuf>,

    /// Export expected frequencies of fitted families to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_expected: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DiscreteArgs {
    /// Training counts per category (CSV: label,count).
    #[arg(long, default_value = "train_12.csv")]
    pub train: PathBuf,

    /// Test counts per category (CSV: label,count).
    #[arg(long, default_value = "test_12.csv")]
    pub test: PathBuf,

    /// Extra degrees of freedom to subtract in the chi-square test.
    #[arg(long, default_value_t = 0)]
    pub ddof: usize,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Family to draw from.
    #[arg(long)]
    pub family: Family,

    /// Shape parameters, comma-separated, in catalog order.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub shapes: Vec<f64>,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub loc: f64,

    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Number of values to draw.
    #[arg(long, default_value_t = 1000)]
    pub count: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (label,count, no header).
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// JSON report produced by `histfit continuous --export-report`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Family to plot (default: the report's best family).
    #[arg(long)]
    pub family: Option<Family>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Rewrite argv so `histfit` defaults to `histfit continuous`.
///
/// Rules:
/// - `histfit`                        -> `histfit continuous`
/// - `histfit --train a.csv ...`      -> `histfit continuous --train a.csv ...`
/// - `histfit --help/--version/-h`    -> unchanged (show top-level help/version)
pub fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("continuous".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "continuous" | "discrete" | "families" | "generate" | "plot"
    );
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "continuous".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(rewrite_args(argv(args))).unwrap()
    }

    #[test]
    fn bare_and_flag_first_invocations_run_continuous() {
        assert_eq!(rewrite_args(argv(&["histfit"])), argv(&["histfit", "continuous"]));
        assert_eq!(
            rewrite_args(argv(&["histfit", "--train", "a.csv"])),
            argv(&["histfit", "continuous", "--train", "a.csv"])
        );
        assert_eq!(rewrite_args(argv(&["histfit", "--help"])), argv(&["histfit", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["histfit", "discrete"])),
            argv(&["histfit", "discrete"])
        );
    }

    #[test]
    fn continuous_defaults() {
        let cli = parse(&["histfit"]);
        let Command::Continuous(args) = cli.command else {
            panic!("expected continuous");
        };
        assert_eq!(args.train, PathBuf::from("training intervals.csv"));
        assert_eq!(args.test, PathBuf::from("fitting intervals.csv"));
        assert_eq!(args.max_iter, 2000);
        assert_eq!(args.fit_timeout_ms, 10_000);
        assert_eq!(args.ddof, 0);
        assert!(!args.plot);
    }

    #[test]
    fn families_are_comma_separated_and_case_insensitive() {
        let cli = parse(&["histfit", "continuous", "--families", "norm,Gamma,weibull_min"]);
        let Command::Continuous(args) = cli.command else {
            panic!("expected continuous");
        };
        assert_eq!(
            args.families,
            vec![Family::Norm, Family::Gamma, Family::WeibullMin]
        );
    }

    #[test]
    fn unknown_family_is_rejected() {
        let err = Cli::try_parse_from(argv(&["histfit", "continuous", "--families", "norm,nope"]))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn generate_accepts_negative_shapes_and_loc() {
        let cli = parse(&[
            "histfit", "generate", "--family", "skewnorm", "--shapes", "-2.5", "--loc", "-3",
            "--scale", "2", "--out", "g.csv",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.family, Family::Skewnorm);
        assert_eq!(args.shapes, vec![-2.5]);
        assert_eq!(args.loc, -3.0);
        assert_eq!(args.count, 1000);
    }

    #[test]
    fn verbose_is_global() {
        let cli = parse(&["histfit", "discrete", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Discrete(_)));
    }
}
