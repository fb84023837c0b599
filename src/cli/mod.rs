//! Command-line parsing for the parameter calibration tool.
//!
//! Argument parsing and command dispatch stay separate from the fitting and
//! conversion code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{
    CalibrationConfig, DEFAULT_LOG_EPSILON, DEFAULT_MAX_QUANTIZED_STATES, DEFAULT_MIN_SAMPLES, DEFAULT_R2_THRESHOLD,
};
use crate::mixer::ChannelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pcal", version, about = "Calibrate and convert device parameter values")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every parameter of a preset catalog and publish a new registry version.
    Calibrate(CalibrateArgs),
    /// Convert one parameter value between normalized and display space.
    Convert(ConvertArgs),
    /// Convert a mixer channel level between dB and normalized.
    Mixer(MixerArgs),
    /// Print the contents of a registry file.
    Show(ShowArgs),
}

/// Registry location shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RegistryArg {
    /// Registry JSON file (defaults to $PCAL_REGISTRY).
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CalibrateArgs {
    /// Preset catalog JSON.
    #[arg(long, value_name = "JSON")]
    pub presets: PathBuf,

    /// Registry JSON to write (defaults to $PCAL_REGISTRY).
    #[arg(long, value_name = "JSON")]
    pub out: Option<PathBuf>,

    /// Minimum harvested samples before regression is attempted.
    #[arg(long, default_value_t = DEFAULT_MIN_SAMPLES)]
    pub min_samples: usize,

    /// R² a family must reach to be published.
    #[arg(long, default_value_t = DEFAULT_R2_THRESHOLD)]
    pub r2_threshold: f64,

    /// Numeric parameters with at most this many distinct values are quantized.
    #[arg(long, default_value_t = DEFAULT_MAX_QUANTIZED_STATES)]
    pub max_states: usize,

    /// Publish a tabulated curve for monotone data no family fits.
    #[arg(long)]
    pub point_based: bool,

    /// Smallest normalized value the log families accept.
    #[arg(long, default_value_t = DEFAULT_LOG_EPSILON)]
    pub log_epsilon: f64,

    /// Leave the mixer channel tables out of the registry.
    #[arg(long)]
    pub no_mixer: bool,
}

impl CalibrateArgs {
    pub fn config(&self) -> CalibrationConfig {
        CalibrationConfig {
            min_samples: self.min_samples,
            r2_threshold: self.r2_threshold,
            max_quantized_states: self.max_states,
            allow_point_based: self.point_based,
            log_epsilon: self.log_epsilon,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub registry: RegistryArg,

    /// Device name.
    #[arg(long)]
    pub device: String,

    /// Parameter name.
    #[arg(long = "param")]
    pub parameter: String,

    /// Normalized value to convert to display.
    #[arg(long, conflicts_with = "display", required_unless_present = "display", allow_hyphen_values = true)]
    pub normalized: Option<f64>,

    /// Display value (number or label) to convert to normalized.
    #[arg(long, allow_hyphen_values = true)]
    pub display: Option<String>,

    /// Unit of `--display`, when it differs from the text.
    #[arg(long)]
    pub unit: Option<String>,
}

/// Mixer channel names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    Volume,
    Sends,
    Cue,
}

impl From<ChannelArg> for ChannelKind {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Volume => ChannelKind::Volume,
            ChannelArg::Sends => ChannelKind::Sends,
            ChannelArg::Cue => ChannelKind::Cue,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct MixerArgs {
    #[command(flatten)]
    pub registry: RegistryArg,

    #[arg(long, value_enum, default_value_t = ChannelArg::Volume)]
    pub channel: ChannelArg,

    /// Level in dB (`-inf` selects the bottom of the fader).
    #[arg(long, conflicts_with = "normalized", required_unless_present = "normalized", allow_hyphen_values = true)]
    pub db: Option<String>,

    /// Normalized fader position.
    #[arg(long)]
    pub normalized: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub registry: RegistryArg,
}
