//! Backend abstraction layer for display gamma control.
//!
//! This module provides a unified interface for color temperature control
//! across display APIs through the [`GammaBackend`] trait. The scheduler only
//! ever talks to this trait and never branches on which backend is active.
//!
//! ## Supported Backends
//!
//! - **Wayland Backend**: Direct implementation of wlr-gamma-control-unstable-v1
//! - **Dummy Backend**: Touches no hardware, only logs what it would apply
//!
//! ## Backend Selection
//!
//! The backend is chosen once at startup from the `method` option through
//! [`create_backend`]. It is not switchable while a session runs.
//!
//! ## Lifecycle
//!
//! Construction acquires the platform resources (the `initialize` step). A
//! constructed backend may apply temperatures any number of times and must be
//! released exactly once, which restores the default gamma ramps.

use thiserror::Error;

pub mod dummy;
pub mod gamma;
pub mod wayland;

pub use gamma::RgbGamma;

/// Errors reported by gamma backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The platform API is missing, the selector is out of range, or the
    /// gamma control is already exclusively held by another client.
    #[error("Gamma backend unavailable: {0}")]
    Unavailable(String),

    /// A single ramp commit failed. Not fatal to a running session.
    #[error("Failed to apply gamma ramps: {0}")]
    ApplyFailed(String),

    /// Restoring the default ramps failed during shutdown.
    #[error("Failed to restore gamma ramps: {0}")]
    ReleaseFailed(String),
}

/// Display gamma control method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Generic Wayland compositor using wlr-gamma-control-unstable-v1 protocol.
    Wayland,
    /// No hardware access, for headless runs and trying out settings.
    Dummy,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Wayland => "wayland",
            Method::Dummy => "dummy",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wayland" | "wlr" => Ok(Method::Wayland),
            "dummy" => Ok(Method::Dummy),
            "randr" | "vidmode" | "wingdi" => anyhow::bail!(
                "Method '{}' is not supported by this build. Available methods: wayland, dummy",
                value
            ),
            _ => anyhow::bail!(
                "Unknown method '{}'. Available methods: wayland, dummy",
                value
            ),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which screen and output (CRTC) a backend should drive.
///
/// `None` means "all" for outputs and "default" for screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputSelector {
    pub screen: Option<usize>,
    pub output: Option<usize>,
}

/// Capability interface over a display's gamma ramps.
///
/// Implementations are owned exclusively by one scheduler session and need
/// not be thread-safe.
#[cfg_attr(any(test, feature = "testing-support"), mockall::automock)]
pub trait GammaBackend {
    /// Human-readable name of this backend (e.g. "Wayland").
    fn backend_name(&self) -> &'static str;

    /// Best-effort read-back of the applied temperature.
    ///
    /// Backends without hardware read-back return the last value they
    /// applied themselves, or the neutral temperature before the first one.
    fn get_temperature(&self) -> u32;

    /// Convert `temperature` to gamma ramps, apply `gamma`, and commit them.
    ///
    /// Reapplying the same values has no visible effect.
    fn set_temperature(&mut self, temperature: u32, gamma: RgbGamma) -> Result<(), BackendError>;

    /// Restore the default ramps and free platform resources.
    fn release(&mut self) -> Result<(), BackendError>;
}

impl<B: GammaBackend + ?Sized> GammaBackend for Box<B> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn get_temperature(&self) -> u32 {
        (**self).get_temperature()
    }

    fn set_temperature(&mut self, temperature: u32, gamma: RgbGamma) -> Result<(), BackendError> {
        (**self).set_temperature(temperature, gamma)
    }

    fn release(&mut self) -> Result<(), BackendError> {
        (**self).release()
    }
}

/// Create a backend instance for the configured method.
///
/// This is the `initialize` step: it acquires whatever platform resources
/// the method needs.
///
/// # Errors
/// Returns [`BackendError::Unavailable`] if the platform API is absent, the
/// selector is out of range, or the resource is already held.
pub fn create_backend(
    method: Method,
    selector: OutputSelector,
) -> Result<Box<dyn GammaBackend>, BackendError> {
    match method {
        Method::Wayland => Ok(Box::new(wayland::WaylandBackend::new(selector)?)),
        Method::Dummy => Ok(Box::new(dummy::DummyBackend::new(selector))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("wayland".parse::<Method>().unwrap(), Method::Wayland);
        assert_eq!("Wayland".parse::<Method>().unwrap(), Method::Wayland);
        assert_eq!("DUMMY".parse::<Method>().unwrap(), Method::Dummy);
        assert!("randr".parse::<Method>().is_err());
        assert!("VidMode".parse::<Method>().is_err());
        assert!("carrier-pigeon".parse::<Method>().is_err());
    }

    #[test]
    fn test_create_dummy_backend() {
        let backend = create_backend(Method::Dummy, OutputSelector::default()).unwrap();
        assert_eq!(backend.backend_name(), "Dummy");
        assert_eq!(backend.get_temperature(), crate::constants::NEUTRAL_TEMP);
    }

    #[test]
    fn test_boxed_backend_forwards_calls() {
        let mut mock = MockGammaBackend::new();
        mock.expect_set_temperature()
            .withf(|temp, _| *temp == 4000)
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_get_temperature().return_const(4000u32);

        let mut boxed: Box<dyn GammaBackend> = Box::new(mock);
        boxed.set_temperature(4000, RgbGamma::NEUTRAL).unwrap();
        assert_eq!(boxed.get_temperature(), 4000);
    }
}
