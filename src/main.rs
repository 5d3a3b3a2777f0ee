use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use intervalrs::config::AppConfig;
use intervalrs::import::ImportManager;
use intervalrs::logging::init_logging;
use intervalrs::metrics::{format_duration, WorkoutMetrics};
use intervalrs::models::{Interval, Workout};
use intervalrs::session::EditorSession;
use intervalrs::zones::{time_in_zones, PowerZone};

/// IntervalRS - Structured cycling workout builder
///
/// Compose interval workouts, compute NP, IF and TSS, and read or write
/// MRC course files.
#[derive(Parser)]
#[command(name = "intervalrs")]
#[command(author = "IntervalRS Contributors")]
#[command(version)]
#[command(about = "Structured cycling workout builder", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show training metrics for a course file
    Metrics {
        /// Course file (.mrc)
        file: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a course file from interval specs
    Build {
        /// Interval as DURATION@START[-END], e.g. 5:00@100 or 600@60-90
        #[arg(short, long = "interval", value_name = "SPEC", required = true)]
        intervals: Vec<String>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// File name written into the course header
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (KEY=VALUE)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

#[derive(Tabled)]
struct IntervalRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Interval")]
    label: String,
    #[tabled(rename = "Zones")]
    zones: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Time")]
    time: String,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Serialize)]
struct MetricsReport<'a> {
    file_name: &'a str,
    intervals: usize,
    metrics: WorkoutMetrics,
    time_in_zones: BTreeMap<PowerZone, u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = if cli.config.is_some() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::load_or_default()
    };

    init_logging(&config.logging.clone().with_verbosity(cli.verbose, cli.quiet))
        .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Metrics { file, json } => show_metrics(&config, &file, json),
        Commands::Build {
            intervals,
            output,
            name,
        } => build_course(&config, &intervals, &output, name),
        Commands::Config { list, set, get } => {
            manage_config(&mut config, &config_path, list, set, get)
        }
    }
}

fn show_metrics(config: &AppConfig, file: &Path, json: bool) -> Result<()> {
    let importer = ImportManager::new(config.editor.limits());
    let course = importer
        .import_file(file)
        .map_err(|err| anyhow!(err.user_message()))
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let calculator = config.metrics.calculator();
    let metrics = calculator.summarize(&course.workout);
    let zones = time_in_zones(&course.workout);

    if json {
        let report = MetricsReport {
            file_name: &course.header.file_name,
            intervals: course.workout.len(),
            metrics,
            time_in_zones: zones,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Course:".bold(),
        course.header.file_name.cyan().bold()
    );
    if !course.header.description.is_empty() {
        println!("  {}", course.header.description.dimmed());
    }

    println!("{}", interval_table(&course.workout));
    print_metrics(&metrics);

    let rows: Vec<ZoneRow> = zones
        .into_iter()
        .map(|(zone, seconds)| {
            let (r, g, b) = zone.rgb();
            ZoneRow {
                zone: format!("Z{} {}", zone.number(), zone).truecolor(r, g, b).to_string(),
                time: format_duration(seconds),
            }
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    Ok(())
}

fn build_course(config: &AppConfig, specs: &[String], output: &Path, name: Option<String>) -> Result<()> {
    let limits = config.editor.limits();
    let mut session = EditorSession::new(config)?;

    if let Some(name) = name {
        let mut header = session.header().clone();
        header.file_name = name;
        session.set_header(header);
    }

    for spec in specs {
        let (duration, start, end) = parse_interval_spec(spec)?;
        let interval = Interval::with_shape(start, end, duration, &limits);
        if (interval.start_power, interval.end_power, interval.duration) != (start, end, duration) {
            eprintln!(
                "{} {} clamped to {}",
                "warning:".yellow().bold(),
                spec,
                interval.label()
            );
        }
        session.insert_interval(interval);
    }

    session
        .export_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", interval_table(session.workout()));
    print_metrics(&session.metrics());
    println!(
        "{} {}",
        "✓ Course written to".green(),
        output.display().to_string().green().bold()
    );
    Ok(())
}

fn manage_config(
    config: &mut AppConfig,
    path: &Path,
    list: bool,
    set: Option<String>,
    get: Option<String>,
) -> Result<()> {
    if let Some(key_value) = set {
        let (key, value) = key_value
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got {}", key_value))?;
        config.set_value(key.trim(), value.trim())?;
        config.save_to_file(path)?;
        println!("{} {} = {}", "✓ Set".green(), key.trim().bold(), value.trim());
    } else if let Some(key) = get {
        println!("{}", config.get_value(&key)?);
    } else if list {
        let rows: Vec<SettingRow> = config
            .list_values()?
            .into_iter()
            .map(|(key, value)| SettingRow { key, value })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
        println!("{} {}", "Config file:".dimmed(), path.display().to_string().dimmed());
    } else {
        bail!("Nothing to do: pass --list, --get KEY or --set KEY=VALUE");
    }
    Ok(())
}

fn interval_table(workout: &Workout) -> String {
    let rows: Vec<IntervalRow> = workout
        .iter()
        .enumerate()
        .map(|(index, interval)| IntervalRow {
            index: index + 1,
            label: interval.label(),
            zones: PowerZone::spanned(interval.start_power, interval.end_power)
                .iter()
                .map(|zone| format!("Z{}", zone.number()))
                .collect::<Vec<_>>()
                .join(" → "),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_metrics(metrics: &WorkoutMetrics) {
    let value = |v: f64, precision: usize| {
        if v.is_finite() {
            format!("{:.*}", precision, v)
        } else {
            "--".to_string()
        }
    };

    println!("{}", "Training load".blue().bold());
    println!("  Duration:  {}", metrics.formatted_duration());
    println!("  Avg power: {}%", value(metrics.average_power, 0));
    println!("  NP:        {}%", value(metrics.normalized_power, 0));
    println!("  IF:        {}", value(metrics.intensity_factor, 2));
    println!("  TSS:       {}", value(metrics.training_stress_score, 1));
}

/// Parse `DURATION@START[-END]` where DURATION is seconds or `M:SS`
fn parse_interval_spec(spec: &str) -> Result<(u32, u16, u16)> {
    let (duration, power) = spec
        .split_once('@')
        .ok_or_else(|| anyhow!("Interval '{}' must look like DURATION@START[-END]", spec))?;

    let duration = match duration.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes
                .trim()
                .parse()
                .with_context(|| format!("Invalid minutes in '{}'", spec))?;
            let seconds: u32 = seconds
                .trim()
                .parse()
                .with_context(|| format!("Invalid seconds in '{}'", spec))?;
            if seconds >= 60 {
                bail!("Seconds must be below 60 in '{}'", spec);
            }
            minutes
                .checked_mul(60)
                .and_then(|total| total.checked_add(seconds))
                .ok_or_else(|| anyhow!("Duration is too long in '{}'", spec))?
        }
        None => duration
            .trim()
            .parse()
            .with_context(|| format!("Invalid duration in '{}'", spec))?,
    };

    let parse_power = |text: &str| -> Result<u16> {
        text.trim()
            .trim_end_matches('%')
            .parse()
            .with_context(|| format!("Invalid power '{}' in '{}'", text, spec))
    };

    let (start, end) = match power.split_once('-') {
        Some((start, end)) => (parse_power(start)?, parse_power(end)?),
        None => {
            let steady = parse_power(power)?;
            (steady, steady)
        }
    };

    Ok((duration, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steady_spec() {
        assert_eq!(parse_interval_spec("300@100").unwrap(), (300, 100, 100));
        assert_eq!(parse_interval_spec("5:00@95%").unwrap(), (300, 95, 95));
    }

    #[test]
    fn test_parse_ramp_spec() {
        assert_eq!(parse_interval_spec("10:30@50-120").unwrap(), (630, 50, 120));
    }

    #[test]
    fn test_parse_invalid_specs() {
        assert!(parse_interval_spec("300").is_err());
        assert!(parse_interval_spec("5:75@100").is_err());
        assert!(parse_interval_spec("abc@100").is_err());
        assert!(parse_interval_spec("300@high").is_err());
    }

    #[test]
    fn test_parse_overlong_duration() {
        let err = parse_interval_spec("4000000000:00@100").unwrap_err();
        assert!(err.to_string().contains("4000000000:00@100"), "{}", err);
        assert!(parse_interval_spec("71582788:16@100").is_err());
        assert_eq!(parse_interval_spec("71582788:15@100").unwrap().0, u32::MAX);
    }

    #[test]
    fn test_cli_parses_build_command() {
        let cli = Cli::try_parse_from([
            "intervalrs", "build", "-i", "300@100", "-i", "60@150", "-o", "out.mrc",
        ])
        .unwrap();
        match cli.command {
            Commands::Build { intervals, output, name } => {
                assert_eq!(intervals.len(), 2);
                assert_eq!(output, PathBuf::from("out.mrc"));
                assert!(name.is_none());
            }
            _ => panic!("expected build command"),
        }
    }
}
