//! Geographic location handling.
//!
//! A [`Geolocation`] is validated once when the configuration is resolved and
//! is immutable afterwards. The solar calculations in [`solar`] take it by
//! value and never re-check the ranges.

use anyhow::Result;

use crate::constants::{MAXIMUM_LATITUDE, MAXIMUM_LONGITUDE, MINIMUM_LATITUDE, MINIMUM_LONGITUDE};

pub mod solar;

pub use solar::solar_elevation;

/// Latitude and longitude in signed degrees (north and east positive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geolocation {
    latitude: f64,
    longitude: f64,
}

impl Geolocation {
    /// Create a validated location.
    ///
    /// # Errors
    /// Returns an error if either coordinate is not finite or lies outside
    /// [-90, 90] (latitude) or [-180, 180] (longitude).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&latitude) {
            anyhow::bail!(
                "Invalid latitude: {}. Must be between {} and {} degrees",
                latitude,
                MINIMUM_LATITUDE,
                MAXIMUM_LATITUDE
            );
        }
        if !longitude.is_finite() || !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&longitude)
        {
            anyhow::bail!(
                "Invalid longitude: {}. Must be between {} and {} degrees",
                longitude,
                MINIMUM_LONGITUDE,
                MAXIMUM_LONGITUDE
            );
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Parse the `LAT:LON` form used on the command line.
    pub fn parse(value: &str) -> Result<Self> {
        let (lat, lon) = crate::utils::split_pair(value)
            .ok_or_else(|| anyhow::anyhow!("Location must be given as LAT:LON, got '{}'", value))?;
        let lat: f64 = lat
            .parse()
            .map_err(|_| anyhow::anyhow!("Malformed latitude '{}'", lat))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| anyhow::anyhow!("Malformed longitude '{}'", lon))?;
        Self::new(lat, lon)
    }
}

impl std::fmt::Display for Geolocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geolocation_accepts_bounds() {
        assert!(Geolocation::new(90.0, 180.0).is_ok());
        assert!(Geolocation::new(-90.0, -180.0).is_ok());
        assert!(Geolocation::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_geolocation_rejects_out_of_range() {
        assert!(Geolocation::new(90.01, 0.0).is_err());
        assert!(Geolocation::new(-91.0, 0.0).is_err());
        assert!(Geolocation::new(0.0, 180.5).is_err());
        assert!(Geolocation::new(0.0, -200.0).is_err());
        assert!(Geolocation::new(f64::NAN, 0.0).is_err());
        assert!(Geolocation::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_geolocation_parse() {
        let loc = Geolocation::parse("55.7:12.6").unwrap();
        assert_eq!(loc.latitude(), 55.7);
        assert_eq!(loc.longitude(), 12.6);

        let loc = Geolocation::parse("-33.9:-70.7").unwrap();
        assert_eq!(loc.latitude(), -33.9);
        assert_eq!(loc.longitude(), -70.7);

        assert!(Geolocation::parse("55.7").is_err());
        assert!(Geolocation::parse("north:12").is_err());
        assert!(Geolocation::parse("95:12").is_err());
    }

    #[test]
    fn test_geolocation_display() {
        let loc = Geolocation::new(40.7128, -74.006).unwrap();
        assert_eq!(loc.to_string(), "40.7128°N, 74.0060°W");
    }
}
