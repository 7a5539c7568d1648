//! Command-line argument parsing.
//!
//! Options mirror the configuration file keys and take precedence over them.
//! Compound values (`LAT:LON`, `DAY:NIGHT`, `R:G:B`) are kept as strings here
//! and validated together with the file values in [`crate::config`], so both
//! sources produce the same error messages.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default, Clone, PartialEq)]
#[command(name = "solarshift")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Output (CRTC) index to adjust; all outputs when omitted
    #[arg(short = 'c', long = "crtc", value_name = "N")]
    pub crtc: Option<usize>,

    /// Additional gamma correction, as R:G:B or a single value
    #[arg(short, long, value_name = "R:G:B")]
    pub gamma: Option<String>,

    /// Location as LAT:LON in degrees (north and east positive)
    #[arg(short, long, value_name = "LAT:LON", allow_hyphen_values = true)]
    pub latlon: Option<String>,

    /// Gamma adjustment method (wayland, dummy)
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Apply the current temperature once and exit
    #[arg(short, long)]
    pub oneshot: bool,

    /// Transition speed in Kelvin per second
    #[arg(short = 'r', long = "speed", value_name = "K/s")]
    pub speed: Option<u32>,

    /// Screen index to adjust
    #[arg(short, long, value_name = "N")]
    pub screen: Option<usize>,

    /// Day and night color temperatures as DAY:NIGHT
    #[arg(short, long, value_name = "DAY:NIGHT")]
    pub temps: Option<String>,

    /// Verbosity level (0 = normal, 1 = per-sample detail)
    #[arg(short, long, value_name = "LEVEL", default_value_t = 0)]
    pub verbose: u8,

    /// Path to a configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("solarshift").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_arguments() {
        let args = parse(&[]);
        assert_eq!(args, Args::default());
    }

    #[test]
    fn test_short_options() {
        let args = parse(&[
            "-l", "45.5:-73.6", "-t", "6500:3400", "-g", "0.9:0.9:1.0", "-m", "dummy", "-r",
            "50", "-s", "0", "-c", "1", "-v", "1", "-o",
        ]);
        assert_eq!(args.latlon.as_deref(), Some("45.5:-73.6"));
        assert_eq!(args.temps.as_deref(), Some("6500:3400"));
        assert_eq!(args.gamma.as_deref(), Some("0.9:0.9:1.0"));
        assert_eq!(args.method.as_deref(), Some("dummy"));
        assert_eq!(args.speed, Some(50));
        assert_eq!(args.screen, Some(0));
        assert_eq!(args.crtc, Some(1));
        assert_eq!(args.verbose, 1);
        assert!(args.oneshot);
    }

    #[test]
    fn test_negative_latitude_is_a_value() {
        let args = parse(&["--latlon", "-33.9:18.4"]);
        assert_eq!(args.latlon.as_deref(), Some("-33.9:18.4"));
    }

    #[test]
    fn test_long_options() {
        let args = parse(&["--speed", "200", "--config", "/tmp/solarshift.toml", "--oneshot"]);
        assert_eq!(args.speed, Some(200));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/solarshift.toml")));
        assert!(args.oneshot);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let argv = ["solarshift", "--speed", "fast"];
        assert!(Args::try_parse_from(argv).is_err());
        let argv = ["solarshift", "--crtc", "-1"];
        assert!(Args::try_parse_from(argv).is_err());
    }
}
