//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the tracing subscriber
//! - runs the selected analysis
//! - prints reports/plots and writes optional exports

use std::time::Duration;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Command, ContinuousArgs, DiscreteArgs, GenerateArgs, PlotArgs, rewrite_args};
use crate::domain::{ContinuousConfig, DiscreteConfig, DistParams, FitBudget, GenerateConfig};
use crate::error::{AppError, EXIT_NO_DATA};

pub mod pipeline;

/// Entry point for the `histfit` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `histfit` and `histfit --train a.csv` behave like `histfit continuous ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    setup_logging(cli.verbose);

    match cli.command {
        Command::Continuous(args) => handle_continuous(&args),
        Command::Discrete(args) => handle_discrete(&args),
        Command::Families => {
            print!("{}", crate::report::format_families());
            Ok(())
        }
        Command::Generate(args) => handle_generate(&args),
        Command::Plot(args) => handle_plot(&args),
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn handle_continuous(args: &ContinuousArgs) -> Result<(), AppError> {
    let config = continuous_config_from_args(args);
    let run = pipeline::run_continuous(&config)?;

    println!(
        "{}",
        crate::report::format_continuous_summary(
            &run.train,
            &run.test,
            &run.ranking,
            config.show_expected
        )
    );

    if config.plot
        && let Some(best) = run.ranking.best_fit()
    {
        let plot = crate::plot::render_ascii_plot(
            &run.train.labels(),
            &run.test.counts(),
            best,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_report {
        let report = crate::io::report::build_report(&run.train, &run.test, &run.ranking);
        crate::io::report::write_report_json(path, &report)?;
    }
    if let Some(path) = &config.export_expected {
        crate::io::export::write_expected_csv(
            path,
            &run.train.labels(),
            &run.test.counts(),
            &run.ranking.outcomes,
        )?;
    }

    Ok(())
}

fn handle_discrete(args: &DiscreteArgs) -> Result<(), AppError> {
    let config = DiscreteConfig {
        train_path: args.train.clone(),
        test_path: args.test.clone(),
        ddof: args.ddof,
    };
    let run = pipeline::run_discrete(&config)?;
    println!(
        "{}",
        crate::report::format_discrete_summary(&run.train, &run.test, &run.fit)
    );
    Ok(())
}

fn handle_generate(args: &GenerateArgs) -> Result<(), AppError> {
    let config = generate_config_from_args(args);
    let bins = pipeline::run_generate(&config)?;
    println!(
        "Wrote {} bins ({} values) to {}",
        bins.len(),
        config.count,
        config.output.display()
    );
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let report = crate::io::report::read_report_json(&args.report)?;

    let Some(family) = args.family.or(report.best) else {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("Report '{}' has no fitted family.", args.report.display()),
        ));
    };
    let plot = crate::plot::render_ascii_plot_from_report(&report, family, args.width, args.height)
        .ok_or_else(|| {
            AppError::input(format!(
                "Family {family} was not fitted in report '{}'.",
                args.report.display()
            ))
        })?;

    println!("{plot}");
    Ok(())
}

pub fn continuous_config_from_args(args: &ContinuousArgs) -> ContinuousConfig {
    ContinuousConfig {
        train_path: args.train.clone(),
        test_path: args.test.clone(),
        families: args.families.clone(),
        budget: FitBudget {
            max_iterations: args.max_iter,
            time_limit: (args.fit_timeout_ms > 0).then(|| Duration::from_millis(args.fit_timeout_ms)),
            strict_convergence: args.strict_convergence,
        },
        ddof: args.ddof,
        jobs: args.jobs,
        show_expected: args.show_expected,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_report: args.export_report.clone(),
        export_expected: args.export_expected.clone(),
    }
}

pub fn generate_config_from_args(args: &GenerateArgs) -> GenerateConfig {
    GenerateConfig {
        family: args.family,
        params: DistParams::new(args.shapes.clone(), args.loc, args.scale),
        count: args.count,
        seed: args.seed,
        output: args.out.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Family;

    fn continuous_args(extra: &[&str]) -> ContinuousArgs {
        let mut argv = vec!["histfit", "continuous"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Continuous(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn timeout_zero_disables_the_time_limit() {
        let config = continuous_config_from_args(&continuous_args(&["--fit-timeout-ms", "0"]));
        assert_eq!(config.budget.time_limit, None);

        let config = continuous_config_from_args(&continuous_args(&[]));
        assert_eq!(config.budget.time_limit, Some(Duration::from_secs(10)));
        assert_eq!(config.budget.max_iterations, 2000);
        assert!(config.families.is_empty());
    }

    #[test]
    fn strict_convergence_reaches_the_budget() {
        let config = continuous_config_from_args(&continuous_args(&[
            "--strict-convergence",
            "--max-iter",
            "50",
        ]));
        assert!(config.budget.strict_convergence);
        assert_eq!(config.budget.max_iterations, 50);
    }

    #[test]
    fn generate_config_orders_params() {
        let cli = Cli::try_parse_from([
            "histfit", "generate", "--family", "gamma", "--shapes", "2", "--loc", "1", "--scale",
            "3", "--out", "g.csv",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = generate_config_from_args(&args);
        assert_eq!(config.family, Family::Gamma);
        assert_eq!(config.params.as_tuple(), vec![2.0, 1.0, 3.0]);
    }
}
