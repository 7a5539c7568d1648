//! Solar position calculations.
//!
//! Computes the sun's elevation above the local horizon from a UTC timestamp
//! using the standard low-precision series (mean longitude, mean anomaly,
//! equation of center, obliquity, equation of time). Accuracy is a small
//! fraction of a degree for dates within a few centuries of J2000, which is
//! far finer than the twilight band the temperature mapper works with.
//!
//! All angles at the public interface are degrees. Trigonometry converts to
//! radians at the point of use.

use super::Geolocation;

const SECONDS_PER_DAY: f64 = 86_400.0;
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;
const J2000_JULIAN_DAY: f64 = 2_451_545.0;
const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Julian day number for a Unix timestamp (seconds, fractional allowed).
pub fn julian_day(timestamp: f64) -> f64 {
    timestamp / SECONDS_PER_DAY + UNIX_EPOCH_JULIAN_DAY
}

/// Julian centuries elapsed since the J2000.0 epoch.
pub fn julian_centuries(timestamp: f64) -> f64 {
    (julian_day(timestamp) - J2000_JULIAN_DAY) / DAYS_PER_JULIAN_CENTURY
}

/// Geometric mean longitude of the sun, degrees in [0, 360).
fn mean_longitude(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + t * 0.0003032)).rem_euclid(360.0)
}

/// Geometric mean anomaly of the sun, degrees in [0, 360).
fn mean_anomaly(t: f64) -> f64 {
    (357.52911 + t * (35999.05029 - t * 0.0001537)).rem_euclid(360.0)
}

fn orbit_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

/// Equation of center, degrees.
fn equation_of_center(t: f64) -> f64 {
    let m = mean_anomaly(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289
}

/// Longitude of the ascending node of the moon's orbit, degrees.
fn lunar_node(t: f64) -> f64 {
    125.04 - 1934.136 * t
}

/// Apparent ecliptic longitude of the sun, degrees.
fn apparent_longitude(t: f64) -> f64 {
    let true_longitude = mean_longitude(t) + equation_of_center(t);
    true_longitude - 0.00569 - 0.00478 * lunar_node(t).to_radians().sin()
}

/// Corrected obliquity of the ecliptic, degrees.
fn obliquity(t: f64) -> f64 {
    let seconds = 21.448 - t * (46.815 + t * (0.00059 - t * 0.001813));
    let mean = 23.0 + (26.0 + seconds / 60.0) / 60.0;
    mean + 0.00256 * lunar_node(t).to_radians().cos()
}

/// Solar declination, degrees.
pub fn declination(t: f64) -> f64 {
    let epsilon = obliquity(t).to_radians();
    let lambda = apparent_longitude(t).to_radians();
    (epsilon.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time, minutes (apparent minus mean solar time).
pub fn equation_of_time(t: f64) -> f64 {
    let epsilon = obliquity(t).to_radians();
    let l0 = mean_longitude(t).to_radians();
    let e = orbit_eccentricity(t);
    let m = mean_anomaly(t).to_radians();
    let y = (epsilon / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * e * m.sin()
        + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * eq.to_degrees()
}

/// Solar hour angle in degrees, zero at local apparent noon.
fn hour_angle(timestamp: f64, longitude: f64, eot_minutes: f64) -> f64 {
    let minutes_of_day = timestamp.rem_euclid(SECONDS_PER_DAY) / 60.0;
    let true_solar_minutes = minutes_of_day + eot_minutes + 4.0 * longitude;
    true_solar_minutes / 4.0 - 180.0
}

/// Elevation of the sun above the horizon, in degrees.
///
/// Negative values mean the sun is below the horizon. The result is always
/// within [-90, 90] for finite timestamps.
///
/// # Arguments
/// * `timestamp` - UTC seconds since the Unix epoch, fractional allowed
/// * `location` - Validated observer position
pub fn solar_elevation(timestamp: f64, location: Geolocation) -> f64 {
    let t = julian_centuries(timestamp);
    let decl = declination(t).to_radians();
    let ha = hour_angle(timestamp, location.longitude(), equation_of_time(t)).to_radians();
    let lat = location.latitude().to_radians();

    let sin_elevation = lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha.cos();
    sin_elevation.clamp(-1.0, 1.0).asin().to_degrees()
}
