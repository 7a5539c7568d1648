//! Utility functions shared across the codebase.
//!
//! This module provides the interpolation helper and the small string parsing
//! routines used by the command line and config file layers.

/// Interpolate between two u32 values based on progress (0.0 to 1.0).
///
/// Used for the day/night color temperature blend across the twilight band.
///
/// # Arguments
/// * `start` - Starting value (returned when progress = 0.0)
/// * `end` - Ending value (returned when progress = 1.0)
/// * `progress` - Interpolation progress, automatically clamped to [0.0, 1.0]
///
/// # Returns
/// Interpolated value rounded to the nearest integer
///
/// # Examples
/// ```
/// use solarshift::utils::interpolate_u32;
/// assert_eq!(interpolate_u32(3400, 6500, 0.5), 4950);
/// assert_eq!(interpolate_u32(6000, 3000, 0.25), 5250);
/// ```
pub fn interpolate_u32(start: u32, end: u32, progress: f64) -> u32 {
    let start_f = start as f64;
    let end_f = end as f64;
    let result = start_f + (end_f - start_f) * progress.clamp(0.0, 1.0);
    result.round() as u32
}

/// Split a `A:B` pair into its two trimmed halves.
///
/// Returns `None` unless there is exactly one separator and both halves are
/// non-empty.
///
/// # Examples
/// ```
/// use solarshift::utils::split_pair;
/// assert_eq!(split_pair("6500:3400"), Some(("6500", "3400")));
/// assert_eq!(split_pair("6500"), None);
/// ```
pub fn split_pair(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split(':').map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => Some((a, b)),
        _ => None,
    }
}

/// Format a path for display, replacing the home directory with `~`.
pub fn path_for_display(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_u32_basic() {
        assert_eq!(interpolate_u32(1000, 2000, 0.0), 1000);
        assert_eq!(interpolate_u32(1000, 2000, 1.0), 2000);
        assert_eq!(interpolate_u32(1000, 2000, 0.5), 1500);
    }

    #[test]
    fn test_interpolate_u32_extreme_values() {
        assert_eq!(interpolate_u32(1000, 25000, 0.0), 1000);
        assert_eq!(interpolate_u32(1000, 25000, 1.0), 25000);
        assert_eq!(interpolate_u32(1000, 25000, 0.5), 13000);

        assert_eq!(interpolate_u32(5000, 5000, 0.5), 5000);

        // Night warmer than day is allowed, just inverted
        assert_eq!(interpolate_u32(6000, 3000, 0.0), 6000);
        assert_eq!(interpolate_u32(6000, 3000, 1.0), 3000);
        assert_eq!(interpolate_u32(6000, 3000, 0.5), 4500);
    }

    #[test]
    fn test_interpolate_u32_clamping() {
        assert_eq!(interpolate_u32(1000, 2000, -0.5), 1000);
        assert_eq!(interpolate_u32(1000, 2000, 1.5), 2000);
        assert_eq!(interpolate_u32(1000, 2000, -100.0), 1000);
        assert_eq!(interpolate_u32(1000, 2000, 100.0), 2000);
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("1:2"), Some(("1", "2")));
        assert_eq!(split_pair(" 1 : 2 "), Some(("1", "2")));
        assert_eq!(split_pair("1:2:3"), None);
        assert_eq!(split_pair(":2"), None);
        assert_eq!(split_pair("1:"), None);
        assert_eq!(split_pair(""), None);
    }
}
