//! # Solarshift
//!
//! Follows the sun with your display's color temperature: warm at night,
//! neutral by day, with a smooth rate-limited transition in between.
//!
//! ## Architecture
//!
//! - **geo**: Validated geolocation and the solar elevation calculator
//! - **temperature**: Elevation to target temperature mapping across a twilight band
//! - **backend**: Gamma backend trait, ramp generation, Wayland and dummy backends
//! - **scheduler**: Rate-limited, cancellable adjustment loop and one-shot mode
//! - **time_source**: Wall-clock abstraction used by the scheduler
//! - **signals**: Cancellation token and shutdown signal handling
//! - **args** / **config**: Command line and TOML configuration, validated into `Settings`
//! - **lock**: Single-instance lock for continuous sessions
//! - **constants**: Application-wide constants and defaults
//! - **logger**: Structured logging with visual formatting
//! - **utils**: Interpolation and parsing helpers

pub mod args;
pub mod backend;
pub mod config;
pub mod constants;
pub mod geo;
pub mod lock;
pub mod logger;
pub mod scheduler;
pub mod signals;
pub mod temperature;
pub mod time_source;
pub mod utils;

// Re-export important types for easier access
pub use backend::{BackendError, GammaBackend, Method, OutputSelector, RgbGamma, create_backend};
pub use config::{Config, Settings};
pub use geo::{Geolocation, solar_elevation};
pub use logger::{Log, LogLevel};
pub use scheduler::{RunMode, ScheduleParams, Scheduler, SchedulerState};
pub use signals::CancellationToken;
pub use temperature::{TemperaturePreset, TwilightBand, calc_temperature};
pub use time_source::{Clock, SystemClock};
