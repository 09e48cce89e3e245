use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use liftrs::config::AppConfig;
use liftrs::error::{AnalysisError, ErrorSeverity, ImportError, LiftRsError};
use liftrs::import::csv::{write_records, write_records_to_file};
use liftrs::import::structured::{aggregate, expand_per_set, parse_log, StructuredLogValidator};
use liftrs::logging::{init_logging, LogFormat};
use liftrs::metrics::{self, OneRepMaxFormula, SeriesSummary};
use liftrs::overload::{OverloadAssessment, OverloadDetector};
use liftrs::trend;
use liftrs::zones::ZoneAnalyzer;
use liftrs::{ImportManager, RecordStore, SeriesPoint};

/// liftrs - Strength Training Analytics CLI
///
/// Estimates one-rep maxes, tracks volume and strength progression, detects
/// progressive overload and fits trends over logged workouts.
#[derive(Parser)]
#[command(name = "liftrs")]
#[command(version)]
#[command(about = "Strength training analytics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Input selection shared by the analysis commands
#[derive(Args)]
struct DataArgs {
    /// Workout file or directory (defaults to the configured data file)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Only include workouts on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only include workouts on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only include sets with at least this many reps
    #[arg(long)]
    min_reps: Option<u32>,

    /// Only include sets with at most this many reps
    #[arg(long)]
    max_reps: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrendMetric {
    /// Total volume per session
    Volume,
    /// Best estimated 1RM per session
    OneRm,
    /// Heaviest weight per session
    MaxWeight,
    /// Mean reps per set
    Reps,
}

impl TrendMetric {
    fn label(&self) -> &'static str {
        match self {
            TrendMetric::Volume => "volume",
            TrendMetric::OneRm => "estimated 1RM",
            TrendMetric::MaxWeight => "max weight",
            TrendMetric::Reps => "average reps",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a one-rep max from a single set
    OneRm {
        /// Weight lifted (kg)
        weight: f64,

        /// Reps performed
        reps: u32,

        /// Estimation formula (epley, brzycki, lombardi)
        #[arg(short, long)]
        formula: Option<OneRepMaxFormula>,

        /// Show the estimate of every formula
        #[arg(short, long)]
        all: bool,
    },

    /// Total volume per exercise, or per session for one exercise
    Volume {
        /// Restrict to one exercise
        #[arg(short, long)]
        exercise: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Strength progression and personal records for an exercise
    Strength {
        /// Exercise name (case-insensitive)
        exercise: String,

        /// Estimation formula (epley, brzycki, lombardi)
        #[arg(short, long)]
        formula: Option<OneRepMaxFormula>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Best estimated 1RM of a single session
    Session {
        /// Exercise name (case-insensitive)
        exercise: String,

        /// Session date (YYYY-MM-DD)
        date: NaiveDate,

        /// Estimation formula (epley, brzycki, lombardi)
        #[arg(short, long)]
        formula: Option<OneRepMaxFormula>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Detect progressive overload
    Overload {
        /// Restrict to one exercise (all exercises otherwise)
        #[arg(short, long)]
        exercise: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Linear trend, moving average and projection for an exercise
    Trend {
        /// Exercise name (case-insensitive)
        exercise: String,

        /// Series to analyze
        #[arg(short, long, value_enum, default_value_t = TrendMetric::Volume)]
        metric: TrendMetric,

        /// Moving average window in sessions
        #[arg(short, long)]
        window: Option<usize>,

        /// Days ahead to project
        #[arg(short, long)]
        days: Option<u32>,

        /// Estimation formula for the one-rm metric
        #[arg(short, long)]
        formula: Option<OneRepMaxFormula>,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Dataset overview, rep zones and training gaps
    Summary {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Convert a structured JSON log to canonical CSV
    Convert {
        /// Structured log file
        input: PathBuf,

        /// Emit one row per set instead of one row per exercise entry
        #[arg(long)]
        per_set: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Tabled)]
struct FormulaRow {
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Estimated 1RM")]
    estimate: String,
}

#[derive(Tabled)]
struct VolumeRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Total volume")]
    volume: String,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Moving avg")]
    moving_average: String,
}

#[derive(Tabled)]
struct StrengthRow {
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Top weight")]
    max_weight: String,
    #[tabled(rename = "Reps")]
    reps: u32,
    #[tabled(rename = "Est. 1RM")]
    estimated_1rm: String,
    #[tabled(rename = "PR")]
    personal_record: &'static str,
}

#[derive(Tabled)]
struct OverloadRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Progression")]
    kind: String,
    #[tabled(rename = "Weight slope")]
    weight_slope: String,
    #[tabled(rename = "Volume slope")]
    volume_slope: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct ExerciseRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Total volume")]
    volume: String,
    #[tabled(rename = "Avg reps")]
    average_reps: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "In zone")]
    in_zone: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(err);
            ExitCode::FAILURE
        }
    }
}

/// Print library errors through their user-facing message, anything else with its context chain
fn report_error(err: anyhow::Error) {
    let err = match err.downcast::<AnalysisError>() {
        Ok(analysis) => LiftRsError::from(analysis),
        Err(err) => match err.downcast::<ImportError>() {
            Ok(import) => LiftRsError::from(import),
            Err(err) => {
                eprintln!("{} {:#}", "Error:".red().bold(), err);
                return;
            }
        },
    };

    tracing::debug!(
        severity = ?err.severity(),
        user_error = err.is_user_error(),
        error = %err,
        "Command failed"
    );

    let label = match err.severity() {
        ErrorSeverity::Warning => "Warning:".yellow().bold(),
        _ => "Error:".red().bold(),
    };
    eprintln!("{} {}", label, err.user_message());
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default()?,
    };

    let mut log_config = config.logging.clone().with_verbosity(cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::OneRm {
            weight,
            reps,
            formula,
            all,
        } => one_rm_command(&config, weight, reps, formula, all),
        Commands::Volume { exercise, data } => volume_command(&config, exercise.as_deref(), &data),
        Commands::Strength {
            exercise,
            formula,
            data,
        } => strength_command(&config, &exercise, formula, &data),
        Commands::Session {
            exercise,
            date,
            formula,
            data,
        } => session_command(&config, &exercise, date, formula, &data),
        Commands::Overload { exercise, data } => overload_command(&config, exercise.as_deref(), &data),
        Commands::Trend {
            exercise,
            metric,
            window,
            days,
            formula,
            data,
        } => trend_command(&config, &exercise, metric, window, days, formula, &data),
        Commands::Summary { data } => summary_command(&config, &data),
        Commands::Convert {
            input,
            per_set,
            output,
        } => convert_command(&input, per_set, output),
    }
}

/// Load, sort and filter the workout data selected by `data`
fn load_store(config: &AppConfig, data: &DataArgs) -> Result<RecordStore> {
    let path = data
        .input
        .clone()
        .unwrap_or_else(|| config.import.default_input());

    let manager = ImportManager::new();
    let store = if path.is_dir() {
        manager.import_directory(&path)
    } else {
        manager.import_file(&path)
    }
    .with_context(|| format!("Failed to load workout data from {}", path.display()))?;

    let store = store
        .filter_by_date_range(data.from, data.to)
        .filter_by_rep_range(data.min_reps, data.max_reps);

    if store.is_empty() {
        bail!("No workout records found in {}", path.display());
    }

    info!(records = store.len(), path = %path.display(), "Workout data loaded");
    Ok(store)
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

fn print_series_summary(label: &str, summary: Option<SeriesSummary>) {
    if let Some(summary) = summary {
        let change = format!("{:+.1} ({:+.1}%)", summary.change, summary.change_pct);
        let change = if summary.change >= 0.0 {
            change.green()
        } else {
            change.red()
        };
        println!(
            "  {} start {:.1}, end {:.1}, average {:.1}, change {}",
            label.bold(),
            summary.start,
            summary.end,
            summary.average,
            change
        );
    }
}

fn one_rm_command(
    config: &AppConfig,
    weight: f64,
    reps: u32,
    formula: Option<OneRepMaxFormula>,
    all: bool,
) -> Result<()> {
    if all {
        let rows = OneRepMaxFormula::ALL
            .iter()
            .map(|formula| {
                let estimate = metrics::estimate_one_rep_max(weight, reps, *formula)
                    .map(|v| format!("{:.1} kg", v))
                    .unwrap_or_else(|e| e.to_string());
                FormulaRow {
                    formula: formula.to_string(),
                    estimate,
                }
            })
            .collect::<Vec<_>>();

        println!("{}", format!("{:.1} kg x {} reps", weight, reps).bold());
        println!("{}", Table::new(rows).with(Style::rounded()));
        return Ok(());
    }

    let formula = formula.unwrap_or(config.analysis.default_formula);
    let estimate = metrics::estimate_one_rep_max(weight, reps, formula)?;
    println!(
        "{} {:.1} kg ({}, {:.1} kg x {})",
        "Estimated 1RM:".green().bold(),
        estimate,
        formula,
        weight,
        reps
    );
    Ok(())
}

fn volume_command(config: &AppConfig, exercise: Option<&str>, data: &DataArgs) -> Result<()> {
    let store = load_store(config, data)?;

    let Some(exercise) = exercise else {
        let by_exercise = metrics::aggregate_volume_by_exercise(store.records());
        let total: f64 = by_exercise.values().sum();

        let mut totals: Vec<(String, f64)> = by_exercise.into_iter().collect();
        totals.sort_by(|a, b| b.1.total_cmp(&a.1));

        let rows = totals
            .into_iter()
            .map(|(exercise, volume)| VolumeRow {
                exercise,
                volume: format!("{:.0}", volume),
                share: if total > 0.0 {
                    format!("{:.1}%", volume / total * 100.0)
                } else {
                    "-".to_string()
                },
            })
            .collect::<Vec<_>>();

        println!("{}", "Volume by exercise".cyan().bold());
        println!("{}", Table::new(rows).with(Style::rounded()));
        println!("  {} {:.0}", "Total volume:".bold(), total);
        return Ok(());
    };

    let series = metrics::volume_over_time(store.records(), Some(exercise));
    if series.is_empty() {
        return Err(AnalysisError::not_found(exercise, None).into());
    }

    println!("{}", format!("Volume over time: {}", exercise).cyan().bold());
    print_series_table(&series, config.analysis.moving_average_window, 0)?;
    print_series_summary("Volume", SeriesSummary::from_series(&series));
    Ok(())
}

fn print_series_table(series: &[SeriesPoint], window: usize, precision: usize) -> Result<()> {
    let averages = trend::moving_average(series, window)?;
    let rows = series
        .iter()
        .zip(averages)
        .map(|(point, average)| SeriesRow {
            date: point.date,
            value: format!("{:.*}", precision, point.value),
            moving_average: fmt_optional(average, 1),
        })
        .collect::<Vec<_>>();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn strength_command(
    config: &AppConfig,
    exercise: &str,
    formula: Option<OneRepMaxFormula>,
    data: &DataArgs,
) -> Result<()> {
    let store = load_store(config, data)?;
    let formula = formula.unwrap_or(config.analysis.default_formula);

    let progression = metrics::strength_progression(store.records(), exercise, formula)?;
    if progression.is_empty() {
        return Err(AnalysisError::not_found(exercise, None).into());
    }

    let prs: BTreeSet<NaiveDate> = metrics::personal_records(&progression)
        .iter()
        .map(|point| point.date)
        .collect();

    let rows = progression
        .iter()
        .map(|point| StrengthRow {
            date: point.date,
            max_weight: format!("{:.1}", point.max_weight),
            reps: point.reps,
            estimated_1rm: format!("{:.1}", point.estimated_1rm),
            personal_record: if prs.contains(&point.date) { "*" } else { "" },
        })
        .collect::<Vec<_>>();

    println!(
        "{}",
        format!("Strength progression: {} ({})", exercise, formula).cyan().bold()
    );
    println!("{}", Table::new(rows).with(Style::rounded()));

    let estimates: Vec<f64> = progression.iter().map(|p| p.estimated_1rm).collect();
    print_series_summary("Estimated 1RM", SeriesSummary::from_values(&estimates));
    println!("  {} {}", "Personal records:".bold(), prs.len());
    Ok(())
}

fn session_command(
    config: &AppConfig,
    exercise: &str,
    date: NaiveDate,
    formula: Option<OneRepMaxFormula>,
    data: &DataArgs,
) -> Result<()> {
    let store = load_store(config, data)?;
    let formula = formula.unwrap_or(config.analysis.default_formula);

    let estimate = metrics::estimate_1rm_from_session(store.records(), exercise, date, formula)?;
    println!(
        "{} {:.1} kg ({} on {}, {})",
        "Session 1RM:".green().bold(),
        estimate,
        exercise,
        date,
        formula
    );
    Ok(())
}

fn overload_row(exercise: String, assessment: &OverloadAssessment) -> OverloadRow {
    OverloadRow {
        exercise,
        sessions: assessment.sessions,
        kind: assessment.kind.to_string(),
        weight_slope: fmt_optional(assessment.weight_slope, 2),
        volume_slope: fmt_optional(assessment.volume_slope, 2),
        detail: assessment.detail.clone(),
    }
}

fn overload_command(config: &AppConfig, exercise: Option<&str>, data: &DataArgs) -> Result<()> {
    let store = load_store(config, data)?;
    let detector = OverloadDetector::with_thresholds(config.analysis.overload);

    let Some(exercise) = exercise else {
        let results = detector.detect_all(&store);
        let progressing = results.iter().filter(|(_, a)| a.has_overload).count();
        let rows = results
            .iter()
            .map(|(name, assessment)| overload_row(name.clone(), assessment))
            .collect::<Vec<_>>();

        println!("{}", "Progressive overload".cyan().bold());
        println!("{}", Table::new(rows).with(Style::rounded()));
        println!(
            "  {} {} of {} exercises",
            "Progressing:".bold(),
            progressing,
            results.len()
        );
        return Ok(());
    };

    let assessment = detector.detect(store.records(), exercise);
    if assessment.sessions == 0 {
        return Err(AnalysisError::not_found(exercise, None).into());
    }

    let status = if assessment.has_overload {
        format!("{} overload", assessment.kind).green().bold()
    } else {
        "no overload".yellow().bold()
    };
    println!("{} {}: {}", exercise.bold(), status, assessment.detail);
    println!("{}", Table::new([overload_row(exercise.to_string(), &assessment)]).with(Style::rounded()));
    Ok(())
}

fn trend_command(
    config: &AppConfig,
    exercise: &str,
    metric: TrendMetric,
    window: Option<usize>,
    days: Option<u32>,
    formula: Option<OneRepMaxFormula>,
    data: &DataArgs,
) -> Result<()> {
    let store = load_store(config, data)?;
    let records = store.records();
    let formula = formula.unwrap_or(config.analysis.default_formula);

    let series: Vec<SeriesPoint> = match metric {
        TrendMetric::Volume => metrics::volume_over_time(records, Some(exercise)),
        TrendMetric::Reps => metrics::average_reps_over_time(records, exercise),
        TrendMetric::OneRm | TrendMetric::MaxWeight => {
            metrics::strength_progression(records, exercise, formula)?
                .into_iter()
                .map(|point| match metric {
                    TrendMetric::MaxWeight => SeriesPoint::new(point.date, point.max_weight),
                    _ => SeriesPoint::new(point.date, point.estimated_1rm),
                })
                .collect()
        }
    };

    if series.is_empty() {
        return Err(AnalysisError::not_found(exercise, None).into());
    }

    let fit = trend::linear_trend(&series)?;
    let projection = trend::project_next(&series, days.unwrap_or(config.analysis.projection_days))?;

    println!(
        "{}",
        format!("Trend: {} {}", exercise, metric.label()).cyan().bold()
    );
    print_series_table(
        &series,
        window.unwrap_or(config.analysis.moving_average_window),
        1,
    )?;

    let direction = if fit.slope > 0.0 {
        "increasing".green()
    } else if fit.slope < 0.0 {
        "decreasing".red()
    } else {
        "flat".yellow()
    };
    println!(
        "  {} {:+.3} per day ({}), r² {:.3}, p {:.4}, std err {:.3}",
        "Slope:".bold(),
        fit.slope,
        direction,
        fit.r_squared,
        fit.p_value,
        fit.std_err
    );
    println!(
        "  {} {:.1} on {}",
        "Projection:".bold(),
        projection.value,
        projection.date
    );

    let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
    for gap in trend::training_gaps(&dates, config.analysis.gap_threshold_days) {
        println!(
            "  {} {} days between {} and {}",
            "Gap:".yellow().bold(),
            gap.days,
            gap.from,
            gap.to
        );
    }
    Ok(())
}

fn summary_command(config: &AppConfig, data: &DataArgs) -> Result<()> {
    let store = load_store(config, data)?;
    let Some(summary) = store.summary() else {
        bail!("No workout records loaded");
    };

    println!("{}", "Workout summary".cyan().bold());
    println!(
        "  {} {} records, {} exercises",
        "Dataset:".bold(),
        summary.total_records,
        summary.unique_exercises
    );
    println!(
        "  {} {} to {} ({} days)",
        "Period:".bold(),
        summary.date_range.0,
        summary.date_range.1,
        summary.total_days
    );

    let mut rows = Vec::with_capacity(summary.exercises.len());
    for exercise in &summary.exercises {
        let volume = metrics::volume_over_time(store.records(), Some(exercise));
        let distribution = ZoneAnalyzer::rep_distribution(store.records(), exercise)?;

        rows.push(ExerciseRow {
            exercise: exercise.clone(),
            sessions: volume.len(),
            volume: format!("{:.0}", volume.iter().map(|p| p.value).sum::<f64>()),
            average_reps: format!("{:.1}", distribution.average_reps),
            zone: format!("{}-{}", distribution.zone.min_reps, distribution.zone.max_reps),
            in_zone: format!("{:.0}%", distribution.in_zone_pct),
        });
    }
    println!("{}", Table::new(rows).with(Style::rounded()));

    let dates: Vec<NaiveDate> = store
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let gaps = trend::training_gaps(&dates, config.analysis.gap_threshold_days);
    if gaps.is_empty() {
        println!(
            "  {} none longer than {} days",
            "Training gaps:".bold(),
            config.analysis.gap_threshold_days
        );
    } else {
        for gap in gaps {
            println!(
                "  {} {} days between {} and {}",
                "Gap:".yellow().bold(),
                gap.days,
                gap.from,
                gap.to
            );
        }
    }
    Ok(())
}

fn convert_command(input: &Path, per_set: bool, output: Option<PathBuf>) -> Result<()> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read structured log: {}", input.display()))?;
    let entries = parse_log(&json)
        .with_context(|| format!("Failed to parse structured log: {}", input.display()))?;

    let outcome = StructuredLogValidator::validate_and_fix(&entries);
    for fix in &outcome.fixes {
        eprintln!("{} {}", "fixed:".dimmed(), fix);
    }
    for warning in &outcome.report.warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    if !outcome.report.is_valid() {
        for error in &outcome.report.errors {
            eprintln!("{} {}", "error:".red().bold(), error);
        }
        bail!(
            "Structured log failed validation with {} error(s)",
            outcome.report.errors.len()
        );
    }

    let records = if per_set {
        expand_per_set(&outcome.entries)?
    } else {
        aggregate(&outcome.entries)?
    };

    match output {
        Some(path) => {
            write_records_to_file(&records, &path)?;
            eprintln!(
                "{} {} rows written to {}",
                "Converted:".green().bold(),
                records.len(),
                path.display()
            );
        }
        None => write_records(&records, std::io::stdout().lock())?,
    }

    info!(entries = entries.len(), rows = records.len(), per_set, "Structured log converted");
    Ok(())
}
