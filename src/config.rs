//! Configuration loading and validation.
//!
//! Settings come from two places, merged with the command line winning:
//!
//! 1. An optional TOML file, by default at
//!    `$XDG_CONFIG_HOME/solarshift/solarshift.toml` (or `--config <PATH>`)
//! 2. Command-line options (see [`crate::args::Args`])
//!
//! ```toml
//! latitude = 52.52              # Degrees, north positive
//! longitude = 13.40             # Degrees, east positive
//! day_temp = 6500               # Kelvin
//! night_temp = 3400             # Kelvin
//! gamma = "1.0:0.95:0.9"        # R:G:B, or a single value for all channels
//! method = "wayland"            # "wayland" or "dummy"
//! output = 0                    # Output index, all outputs when omitted
//! transition_speed = 100        # Kelvin per second
//! sample_interval = 5           # Seconds between samples
//! elevation_low = -6.0          # Full night at or below this solar elevation
//! elevation_high = 3.0          # Full day at or above this solar elevation
//! ```
//!
//! All values are checked once, in [`Settings::resolve`]. Everything after
//! that point works with validated types and never re-checks ranges.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::args::Args;
use crate::backend::{Method, OutputSelector, RgbGamma};
use crate::constants::*;
use crate::geo::Geolocation;
use crate::logger::Log;
use crate::scheduler::{RunMode, ScheduleParams};
use crate::temperature::{TemperaturePreset, TwilightBand};

/// Gamma may be written as a plain number or as an `R:G:B` string.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum GammaValue {
    Uniform(f64),
    Text(String),
}

impl GammaValue {
    fn resolve(&self) -> Result<RgbGamma> {
        match self {
            GammaValue::Uniform(value) => RgbGamma::new(*value, *value, *value),
            GammaValue::Text(text) => RgbGamma::parse(text),
        }
    }
}

/// Raw contents of the configuration file. Every key is optional.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub day_temp: Option<u32>,
    pub night_temp: Option<u32>,
    pub gamma: Option<GammaValue>,
    pub method: Option<String>,
    pub screen: Option<usize>,
    pub output: Option<usize>,
    pub transition_speed: Option<u32>, // Kelvin per second
    pub sample_interval: Option<u64>,  // seconds
    pub elevation_low: Option<f64>,    // degrees
    pub elevation_high: Option<f64>,   // degrees
}

impl Config {
    /// Default location of the configuration file.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("solarshift").join("solarshift.toml"))
    }

    /// Load and parse a configuration file that must exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file not found at specified path: {}",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load the configuration, returning it with the path it came from.
    ///
    /// An explicit path must exist. The default path is optional: when it is
    /// missing an empty configuration is returned with no source path.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from_path(path)?, Some(path.to_path_buf())));
        }

        let path = Self::get_config_path()?;
        if path.exists() {
            Ok((Self::load_from_path(&path)?, Some(path)))
        } else {
            Ok((Self::default(), None))
        }
    }
}

/// Fully validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub location: Geolocation,
    pub preset: TemperaturePreset,
    pub gamma: RgbGamma,
    pub method: Method,
    pub selector: OutputSelector,
    pub band: TwilightBand,
    pub transition_speed: u32,
    pub sample_interval: Duration,
    pub mode: RunMode,
    pub verbosity: u8,
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Merge command-line options over the file configuration and validate.
    ///
    /// # Errors
    /// Returns an error for malformed or out-of-range values and when no
    /// location is configured anywhere.
    pub fn resolve(args: &Args, config: &Config, source: Option<PathBuf>) -> Result<Self> {
        let location = resolve_location(args, config, source.as_deref())?;

        let preset = match &args.temps {
            Some(temps) => TemperaturePreset::parse(temps)?,
            None => TemperaturePreset::new(
                config.day_temp.unwrap_or(DEFAULT_DAY_TEMP),
                config.night_temp.unwrap_or(DEFAULT_NIGHT_TEMP),
            )?,
        };

        let gamma = match (&args.gamma, &config.gamma) {
            (Some(gamma), _) => RgbGamma::parse(gamma)?,
            (None, Some(gamma)) => gamma.resolve()?,
            (None, None) => RgbGamma::NEUTRAL,
        };

        let method = match args.method.as_deref().or(config.method.as_deref()) {
            Some(method) => method.parse::<Method>()?,
            None => DEFAULT_METHOD,
        };

        let selector = OutputSelector {
            screen: args.screen.or(config.screen),
            output: args.crtc.or(config.output),
        };

        let band = TwilightBand::new(
            config.elevation_low.unwrap_or(DEFAULT_ELEVATION_LOW),
            config.elevation_high.unwrap_or(DEFAULT_ELEVATION_HIGH),
        )?;

        let transition_speed = args
            .speed
            .or(config.transition_speed)
            .unwrap_or(DEFAULT_TRANSITION_SPEED);
        if !(MINIMUM_TRANSITION_SPEED..=MAXIMUM_TRANSITION_SPEED).contains(&transition_speed) {
            anyhow::bail!(
                "Transition speed ({} K/s) must be between {} and {} K/s",
                transition_speed,
                MINIMUM_TRANSITION_SPEED,
                MAXIMUM_TRANSITION_SPEED
            );
        }

        let sample_interval = config.sample_interval.unwrap_or(DEFAULT_SAMPLE_INTERVAL);
        if !(MINIMUM_SAMPLE_INTERVAL..=MAXIMUM_SAMPLE_INTERVAL).contains(&sample_interval) {
            anyhow::bail!(
                "Sample interval ({} seconds) must be between {} and {} seconds",
                sample_interval,
                MINIMUM_SAMPLE_INTERVAL,
                MAXIMUM_SAMPLE_INTERVAL
            );
        }

        Ok(Self {
            location,
            preset,
            gamma,
            method,
            selector,
            band,
            transition_speed,
            sample_interval: Duration::from_secs(sample_interval),
            mode: if args.oneshot {
                RunMode::OneShot
            } else {
                RunMode::Continuous
            },
            verbosity: args.verbose,
            source,
        })
    }

    /// The subset of settings the scheduler works from.
    pub fn schedule_params(&self) -> ScheduleParams {
        ScheduleParams {
            location: self.location,
            preset: self.preset,
            band: self.band,
            gamma: self.gamma,
            transition_speed: self.transition_speed,
            sample_interval: self.sample_interval,
        }
    }

    pub fn log_settings(&self) {
        match &self.source {
            Some(path) => Log::log_block_start(&format!(
                "Loaded configuration from {}",
                crate::utils::path_for_display(path)
            )),
            None => Log::log_block_start("No configuration file, using command line and defaults"),
        }
        Log::log_indented(&format!("Location: {}", self.location));
        Log::log_indented(&format!(
            "Temperatures: {}K day, {}K night",
            self.preset.day(),
            self.preset.night()
        ));
        Log::log_indented(&format!("Gamma: {}", self.gamma));
        Log::log_indented(&format!("Method: {}", self.method));
        if let Some(output) = self.selector.output {
            Log::log_indented(&format!("Output: {}", output));
        }
        if let Some(screen) = self.selector.screen {
            Log::log_indented(&format!("Screen: {}", screen));
        }
        Log::log_indented(&format!(
            "Twilight band: {}° to {}°",
            self.band.low(),
            self.band.high()
        ));
        Log::log_indented(&format!(
            "Transition speed: {} K/s",
            self.transition_speed
        ));
        Log::log_indented(&format!(
            "Sample interval: {} second{}",
            self.sample_interval.as_secs(),
            if self.sample_interval.as_secs() == 1 { "" } else { "s" }
        ));
    }
}

fn resolve_location(args: &Args, config: &Config, source: Option<&Path>) -> Result<Geolocation> {
    if let Some(latlon) = &args.latlon {
        return Geolocation::parse(latlon);
    }

    match (config.latitude, config.longitude) {
        (Some(latitude), Some(longitude)) => Geolocation::new(latitude, longitude),
        (Some(_), None) | (None, Some(_)) => anyhow::bail!(
            "Both latitude and longitude must be set in {}",
            source.map_or_else(|| "the configuration".to_string(), crate::utils::path_for_display)
        ),
        (None, None) => anyhow::bail!(
            "No location configured. Pass --latlon LAT:LON or set latitude and longitude in {}",
            source
                .map(Path::to_path_buf)
                .or_else(|| Config::get_config_path().ok())
                .map_or_else(
                    || "the configuration file".to_string(),
                    |path| crate::utils::path_for_display(&path)
                )
        ),
    }
}
