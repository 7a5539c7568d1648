//! Mapping from solar elevation to a target color temperature.
//!
//! The sky is split into three periods by a [`TwilightBand`]: full night
//! below the low threshold, full day above the high one, and a linear blend
//! in between. The blend is continuous at both edges and, when the day
//! temperature is at least the night temperature, monotonic in elevation.

use anyhow::Result;

use crate::constants::{
    DEFAULT_DAY_TEMP, DEFAULT_ELEVATION_HIGH, DEFAULT_ELEVATION_LOW, DEFAULT_NIGHT_TEMP,
    MAXIMUM_TEMP, MINIMUM_TEMP,
};
use crate::logger::Log;
use crate::utils::interpolate_u32;

/// Day and night color temperatures in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperaturePreset {
    day: u32,
    night: u32,
}

impl TemperaturePreset {
    /// Create a preset, checking both values against the supported range.
    ///
    /// A night temperature above the day temperature is unusual but allowed;
    /// it is reported as a warning only.
    pub fn new(day: u32, night: u32) -> Result<Self> {
        for (label, value) in [("Day", day), ("Night", night)] {
            if !(MINIMUM_TEMP..=MAXIMUM_TEMP).contains(&value) {
                anyhow::bail!(
                    "{} temperature ({}) must be between {} and {} Kelvin",
                    label,
                    value,
                    MINIMUM_TEMP,
                    MAXIMUM_TEMP
                );
            }
        }
        if night > day {
            Log::log_warning(&format!(
                "Night temperature ({}K) is higher than day temperature ({}K)",
                night, day
            ));
        }
        Ok(Self { day, night })
    }

    /// Parse the `DAY:NIGHT` form used on the command line.
    pub fn parse(value: &str) -> Result<Self> {
        let (day, night) = crate::utils::split_pair(value).ok_or_else(|| {
            anyhow::anyhow!("Temperatures must be given as DAY:NIGHT, got '{}'", value)
        })?;
        let day: u32 = day
            .parse()
            .map_err(|_| anyhow::anyhow!("Malformed day temperature '{}'", day))?;
        let night: u32 = night
            .parse()
            .map_err(|_| anyhow::anyhow!("Malformed night temperature '{}'", night))?;
        Self::new(day, night)
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn night(&self) -> u32 {
        self.night
    }
}

impl Default for TemperaturePreset {
    fn default() -> Self {
        Self {
            day: DEFAULT_DAY_TEMP,
            night: DEFAULT_NIGHT_TEMP,
        }
    }
}

/// Elevation thresholds (degrees) bounding the day/night blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwilightBand {
    low: f64,
    high: f64,
}

impl TwilightBand {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() {
            anyhow::bail!("Twilight elevations must be finite numbers");
        }
        if !(-90.0..=90.0).contains(&low) || !(-90.0..=90.0).contains(&high) {
            anyhow::bail!(
                "Twilight elevations ({}°, {}°) must be between -90 and 90 degrees",
                low,
                high
            );
        }
        if low >= high {
            anyhow::bail!(
                "Low twilight elevation ({}°) must be below the high elevation ({}°)",
                low,
                high
            );
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Fraction of the way from night to day, clamped to [0, 1].
    pub fn progress(&self, elevation: f64) -> f64 {
        if elevation <= self.low {
            0.0
        } else if elevation >= self.high {
            1.0
        } else {
            (elevation - self.low) / (self.high - self.low)
        }
    }

    /// Classify an elevation into the period it falls in.
    pub fn period(&self, elevation: f64) -> Period {
        if elevation >= self.high {
            Period::Day
        } else if elevation <= self.low {
            Period::Night
        } else {
            Period::Twilight {
                progress: self.progress(elevation),
            }
        }
    }
}

impl Default for TwilightBand {
    fn default() -> Self {
        Self {
            low: DEFAULT_ELEVATION_LOW,
            high: DEFAULT_ELEVATION_HIGH,
        }
    }
}

/// Which part of the day an elevation belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Period {
    Night,
    Twilight { progress: f64 }, // 0.0 = night edge, 1.0 = day edge
    Day,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Night => write!(f, "night"),
            Period::Twilight { progress } => {
                write!(f, "transition ({:.2}% day)", progress * 100.0)
            }
            Period::Day => write!(f, "daytime"),
        }
    }
}

/// Target color temperature for a solar elevation.
///
/// Returns the day temperature at or above the band's high threshold, the
/// night temperature at or below the low threshold, and a linear blend in
/// between. The result is clamped to the supported hardware range.
///
/// # Examples
/// ```
/// use solarshift::temperature::{TemperaturePreset, TwilightBand, calc_temperature};
/// let preset = TemperaturePreset::new(6500, 3400).unwrap();
/// assert_eq!(calc_temperature(-1.5, preset, TwilightBand::default()), 4950);
/// ```
pub fn calc_temperature(elevation: f64, preset: TemperaturePreset, band: TwilightBand) -> u32 {
    let progress = band.progress(elevation);
    interpolate_u32(preset.night, preset.day, progress).clamp(MINIMUM_TEMP, MAXIMUM_TEMP)
}
