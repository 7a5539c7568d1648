//! Application constants and default values for solarshift.
//!
//! This module contains the configuration defaults, validation limits,
//! and operational constants used throughout the application.

use crate::backend::Method;

// ═══ Application Configuration Defaults ═══
// These values are used when options are not given on the command line or in the config file

pub const DEFAULT_DAY_TEMP: u32 = 6500; // Kelvin - close to natural sunlight
pub const DEFAULT_NIGHT_TEMP: u32 = 3400; // Kelvin - warm, comfortable for night viewing
pub const DEFAULT_GAMMA: f64 = 1.0; // Per-channel gamma multiplier
pub const DEFAULT_METHOD: Method = Method::Wayland;
pub const DEFAULT_TRANSITION_SPEED: u32 = 100; // Kelvin per second
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 5; // seconds between samples in continuous mode

// ═══ Twilight Band ═══
// Solar elevations (degrees) bounding the day/night interpolation

pub const DEFAULT_ELEVATION_LOW: f64 = -6.0; // Civil twilight, full night below this
pub const DEFAULT_ELEVATION_HIGH: f64 = 3.0; // Full day above this

// ═══ Validation Limits ═══
// These limits ensure user inputs are within reasonable and safe ranges

// Temperature limits (Kelvin scale)
pub const MINIMUM_TEMP: u32 = 1000; // Very warm candlelight-like
pub const MAXIMUM_TEMP: u32 = 25000; // Very cool blue light

// Neutral white point, also what a freshly initialized backend reports
pub const NEUTRAL_TEMP: u32 = 6500;

// Gamma multiplier limits (per channel)
pub const MINIMUM_GAMMA: f64 = 0.1;
pub const MAXIMUM_GAMMA: f64 = 10.0;

// Transition speed limits
pub const MINIMUM_TRANSITION_SPEED: u32 = 1; // K/s
pub const MAXIMUM_TRANSITION_SPEED: u32 = 25000; // K/s (effectively instant)

// Sample interval limits
pub const MINIMUM_SAMPLE_INTERVAL: u64 = 1; // seconds
pub const MAXIMUM_SAMPLE_INTERVAL: u64 = 300; // seconds

// Geographic limits
pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

// ═══ Operational Timing Constants ═══

pub const SLEEP_DETECTION_THRESHOLD_SECS: f64 = 300.0; // 5 minutes - detect system sleep/resume
pub const LOCK_FILE_NAME: &str = "solarshift.lock";

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1; // General failure

// ═══ Test Constants ═══
// Common values used in tests for consistency
#[cfg(test)]
pub mod test_constants {
    pub const TEST_LATITUDE: f64 = 45.0;
    pub const TEST_LONGITUDE: f64 = 0.0;
    pub const TEST_DAY_TEMP: u32 = 6500;
    pub const TEST_NIGHT_TEMP: u32 = 3400;
}
