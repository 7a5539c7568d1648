//! Color temperature to gamma ramp conversion.
//!
//! Every backend shares this code: a blackbody white point is computed for
//! the requested temperature, combined with the user's per-channel gamma,
//! and expanded into three 16-bit lookup tables.

use anyhow::Result;

use crate::constants::{DEFAULT_GAMMA, MAXIMUM_GAMMA, MAXIMUM_TEMP, MINIMUM_GAMMA, MINIMUM_TEMP};

/// Per-channel gamma multiplier applied on top of the temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbGamma {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl RgbGamma {
    pub const NEUTRAL: RgbGamma = RgbGamma {
        red: DEFAULT_GAMMA,
        green: DEFAULT_GAMMA,
        blue: DEFAULT_GAMMA,
    };

    /// Create a validated gamma triple.
    pub fn new(red: f64, green: f64, blue: f64) -> Result<Self> {
        for (channel, value) in [("red", red), ("green", green), ("blue", blue)] {
            if !value.is_finite() || !(MINIMUM_GAMMA..=MAXIMUM_GAMMA).contains(&value) {
                anyhow::bail!(
                    "Gamma value {} for {} must be between {} and {}",
                    value,
                    channel,
                    MINIMUM_GAMMA,
                    MAXIMUM_GAMMA
                );
            }
        }
        Ok(Self { red, green, blue })
    }

    /// Parse `R:G:B`, or a single value applied to all three channels.
    pub fn parse(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.split(':').map(str::trim).collect();
        let parse_one = |s: &str| -> Result<f64> {
            s.parse::<f64>()
                .map_err(|_| anyhow::anyhow!("Malformed gamma value '{}'", s))
        };
        match parts.as_slice() {
            [all] => {
                let g = parse_one(all)?;
                Self::new(g, g, g)
            }
            [r, g, b] => Self::new(parse_one(r)?, parse_one(g)?, parse_one(b)?),
            _ => anyhow::bail!("Gamma must be given as R:G:B or a single value, got '{}'", value),
        }
    }

    fn as_array(&self) -> [f64; 3] {
        [self.red, self.green, self.blue]
    }
}

impl Default for RgbGamma {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl std::fmt::Display for RgbGamma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}:{:.2}:{:.2}", self.red, self.green, self.blue)
    }
}

/// Convert a color temperature to a normalized RGB white point.
///
/// Uses the usual curve fit to blackbody radiation (the same approximation
/// found in wlsunset, redshift and friends). Each channel is in [0, 1].
pub fn temperature_to_rgb(temperature: u32) -> [f64; 3] {
    let temp = temperature.clamp(MINIMUM_TEMP, MAXIMUM_TEMP) as f64 / 100.0;

    let (red, green, blue) = if temp >= 66.0 {
        // Daylight and cooler: red and green fall off, blue saturates
        let red = 329.698727446 * (temp - 60.0).powf(-0.1332047592);
        let green = 288.1221695283 * (temp - 60.0).powf(-0.0755148492);
        (red, green, 255.0)
    } else {
        let green = 99.4708025861 * temp.ln() - 161.1195681661;
        let blue = if temp <= 19.0 {
            0.0
        } else {
            138.5177312231 * (temp - 10.0).ln() - 305.0447927307
        };
        (255.0, green, blue)
    };

    [
        (red / 255.0).clamp(0.0, 1.0),
        (green / 255.0).clamp(0.0, 1.0),
        (blue / 255.0).clamp(0.0, 1.0),
    ]
}

/// Three 16-bit lookup tables of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaRamps {
    pub red: Vec<u16>,
    pub green: Vec<u16>,
    pub blue: Vec<u16>,
}

impl GammaRamps {
    pub fn size(&self) -> usize {
        self.red.len()
    }

    /// Concatenate red, green and blue tables as native-endian bytes.
    ///
    /// This is the layout `wlr-gamma-control-unstable-v1` expects.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.size() * 3 * 2);
        for value in self.red.iter().chain(&self.green).chain(&self.blue) {
            data.extend_from_slice(&value.to_ne_bytes());
        }
        data
    }
}

/// Build one channel's lookup table.
///
/// Entry `i` is `(i / (size - 1) * white) ^ (1 / gamma)` scaled to 0..=65535.
pub fn generate_gamma_table(size: usize, white: f64, gamma: f64) -> Vec<u16> {
    if size == 0 {
        return Vec::new();
    }
    if size == 1 {
        return vec![(white.powf(1.0 / gamma) * 65535.0).round() as u16];
    }
    (0..size)
        .map(|i| {
            let input = i as f64 / (size - 1) as f64;
            let output = (input * white).powf(1.0 / gamma);
            (output * 65535.0).round().clamp(0.0, 65535.0) as u16
        })
        .collect()
}

/// Build complete RGB ramps of `size` entries for a temperature and gamma.
pub fn fill_gamma_ramps(size: usize, temperature: u32, gamma: RgbGamma) -> GammaRamps {
    let white = temperature_to_rgb(temperature);
    let gammas = gamma.as_array();
    GammaRamps {
        red: generate_gamma_table(size, white[0], gammas[0]),
        green: generate_gamma_table(size, white[1], gammas[1]),
        blue: generate_gamma_table(size, white[2], gammas[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_to_rgb_daylight() {
        let [r, g, b] = temperature_to_rgb(6500);
        // Daylight should be fairly neutral
        assert!((r - 1.0).abs() < 0.05);
        assert!((g - 1.0).abs() < 0.05);
        assert!((b - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_temperature_to_rgb_warm() {
        let [r, g, b] = temperature_to_rgb(3000);
        // Warm light should be red-heavy, blue-light
        assert!(r > g);
        assert!(g > b);
        assert!(b < 0.7);
    }

    #[test]
    fn test_temperature_to_rgb_candle_has_no_blue() {
        let [r, _, b] = temperature_to_rgb(1000);
        assert_eq!(r, 1.0);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_temperature_to_rgb_cool() {
        let [r, g, b] = temperature_to_rgb(10000);
        assert_eq!(b, 1.0);
        assert!(b > g);
        assert!(r < g);
    }

    #[test]
    fn test_gamma_table_generation() {
        let table = generate_gamma_table(256, 1.0, 1.0);
        assert_eq!(table.len(), 256);
        assert_eq!(table[0], 0);
        assert_eq!(table[255], 65535);
        assert!(table.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_gamma_table_scales_with_white_point() {
        let table = generate_gamma_table(256, 0.5, 1.0);
        assert_eq!(table[255], 32768);
    }

    #[test]
    fn test_gamma_table_degenerate_sizes() {
        assert!(generate_gamma_table(0, 1.0, 1.0).is_empty());
        assert_eq!(generate_gamma_table(1, 1.0, 1.0), vec![65535]);
    }

    #[test]
    fn test_fill_gamma_ramps_applies_channel_gamma() {
        let gamma = RgbGamma::new(1.0, 2.0, 0.5).unwrap();
        let ramps = fill_gamma_ramps(1024, 6500, gamma);
        assert_eq!(ramps.size(), 1024);
        // Higher gamma lifts mid-tones, lower gamma darkens them
        let mid = 512;
        assert!(ramps.green[mid] > ramps.red[mid]);
        assert!(ramps.blue[mid] < ramps.red[mid]);
    }

    #[test]
    fn test_ramp_bytes_layout() {
        let ramps = fill_gamma_ramps(256, 6500, RgbGamma::NEUTRAL);
        let bytes = ramps.to_ne_bytes();
        assert_eq!(bytes.len(), 256 * 3 * 2);
        let first_green = u16::from_ne_bytes([bytes[512], bytes[513]]);
        assert_eq!(first_green, ramps.green[0]);
    }

    #[test]
    fn test_rgb_gamma_parse() {
        assert_eq!(RgbGamma::parse("0.8").unwrap(), RgbGamma::new(0.8, 0.8, 0.8).unwrap());
        assert_eq!(
            RgbGamma::parse("0.8:0.7:0.9").unwrap(),
            RgbGamma::new(0.8, 0.7, 0.9).unwrap()
        );
        assert!(RgbGamma::parse("0.8:0.7").is_err());
        assert!(RgbGamma::parse("bright").is_err());
        assert!(RgbGamma::parse("0.01").is_err());
        assert!(RgbGamma::parse("1:1:11").is_err());
    }
}
