//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - runs calibration or conversion
//! - prints reports

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::cli::{CalibrateArgs, Cli, Command, ConvertArgs, MixerArgs, RegistryArg, ShowArgs};
use crate::convert::{ParameterRequest, apply};
use crate::error::AppError;
use crate::harvest::{first_number, parse_display, read_catalog_json};
use crate::mixer::{ChannelKind, MixerMapper};
use crate::registry::{DEFAULT_REFRESH_INTERVAL, JsonFileSource, RefreshingRegistry, stored_version, write_registry_json};

pub mod pipeline;

/// Environment variable naming the default registry file.
pub const REGISTRY_ENV: &str = "PCAL_REGISTRY";

/// Entry point for the `pcal` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Calibrate(args) => handle_calibrate(args),
        Command::Convert(args) => handle_convert(args),
        Command::Mixer(args) => handle_mixer(args),
        Command::Show(args) => handle_show(args),
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout stays a clean report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn handle_calibrate(args: CalibrateArgs) -> Result<(), AppError> {
    let out = registry_path(args.out.clone())?;
    let catalog = read_catalog_json(&args.presets)?;
    let previous = stored_version(&out)?;

    let run = pipeline::run_calibration(&catalog, &args.config(), previous, !args.no_mixer)?;
    write_registry_json(&out, &run.snapshot)?;
    info!(path = %out.display(), version = run.snapshot.version, "registry written");

    println!("{}", crate::report::format_calibration_summary(&run.results, run.snapshot.version));
    Ok(())
}

fn handle_convert(args: ConvertArgs) -> Result<(), AppError> {
    let registry = open_registry(&args.registry)?;
    let snapshot = registry.snapshot();
    let model = snapshot.parameter(&args.device, &args.parameter)?;

    let request = match (&args.normalized, &args.display) {
        (Some(x), _) => ParameterRequest::normalized(*x),
        (None, Some(text)) => {
            let (value, parsed_unit) = parse_display(text);
            ParameterRequest::display(value, args.unit.clone().or(parsed_unit))
        }
        (None, None) => return Err(AppError::new(2, "Pass --normalized or --display.")),
    };

    let resolved = apply(model, &request)?;
    println!(
        "{}",
        crate::report::format_resolved(&resolved, model.descriptor.unit.as_deref())
    );
    Ok(())
}

fn handle_mixer(args: MixerArgs) -> Result<(), AppError> {
    let mapper = mixer_mapper(&args.registry)?;
    let kind = ChannelKind::from(args.channel);

    let resolved = match (&args.db, args.normalized) {
        (Some(text), _) => mapper.db_to_normalized(kind, parse_db(text)?)?,
        (None, Some(x)) => mapper.normalized_to_db(kind, x)?,
        (None, None) => return Err(AppError::new(2, "Pass --db or --normalized.")),
    };
    println!("{}", crate::report::format_resolved(&resolved, Some("dB")));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let registry = open_registry(&args.registry)?;
    println!("{}", crate::report::format_snapshot(&registry.snapshot()));
    Ok(())
}

/// Explicit path, else `$PCAL_REGISTRY`.
fn registry_path(explicit: Option<PathBuf>) -> Result<PathBuf, AppError> {
    explicit
        .or_else(|| std::env::var_os(REGISTRY_ENV).map(PathBuf::from))
        .ok_or_else(|| AppError::new(2, format!("No registry file given (use --registry or set {REGISTRY_ENV}).")))
}

fn open_registry(arg: &RegistryArg) -> Result<RefreshingRegistry<JsonFileSource>, AppError> {
    let path = registry_path(arg.registry.clone())?;
    RefreshingRegistry::open(JsonFileSource::new(path), DEFAULT_REFRESH_INTERVAL)
}

/// Channel tables from the registry when one is configured, else the reference tables.
fn mixer_mapper(arg: &RegistryArg) -> Result<MixerMapper, AppError> {
    let Ok(path) = registry_path(arg.registry.clone()) else {
        return Ok(MixerMapper::standard()?);
    };
    let registry = RefreshingRegistry::open(JsonFileSource::new(path), DEFAULT_REFRESH_INTERVAL)?;
    let snapshot = registry.snapshot();
    if snapshot.channels.is_empty() {
        return Ok(MixerMapper::standard()?);
    }
    Ok(MixerMapper::from_tables(snapshot.channels.iter().cloned()))
}

/// Parse a dB level; `-inf` (with or without a unit) is silence.
fn parse_db(text: &str) -> Result<f64, AppError> {
    let trimmed = text.trim();
    if trimmed.to_ascii_lowercase().starts_with("-inf") {
        return Ok(f64::NEG_INFINITY);
    }
    first_number(trimmed).ok_or_else(|| AppError::new(2, format!("'{text}' is not a dB level.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_levels_parse_with_units_and_silence() {
        assert_eq!(parse_db("-6 dB").unwrap(), -6.0);
        assert_eq!(parse_db("-inf dB").unwrap(), f64::NEG_INFINITY);
        assert_eq!(parse_db("-INF").unwrap(), f64::NEG_INFINITY);
        assert_eq!(parse_db("loud").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn explicit_registry_path_wins() {
        let path = registry_path(Some(PathBuf::from("/tmp/r.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/r.json"));
    }
}
