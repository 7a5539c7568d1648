//! Backend that touches no hardware.
//!
//! Useful on machines without a supported display API and for checking what
//! a configuration would do. Every application is logged and remembered so
//! read-back behaves like a real backend without hardware read-back.

use crate::backend::{BackendError, GammaBackend, OutputSelector, RgbGamma};
use crate::constants::NEUTRAL_TEMP;
use crate::logger::Log;

pub struct DummyBackend {
    current_temp: u32,
    released: bool,
}

impl DummyBackend {
    pub fn new(selector: OutputSelector) -> Self {
        Log::log_decorated("Using dummy gamma backend, the display will not change");
        if selector.screen.is_some() || selector.output.is_some() {
            Log::log_indented("Screen and output selection have no effect on the dummy backend");
        }
        Self {
            current_temp: NEUTRAL_TEMP,
            released: false,
        }
    }
}

impl GammaBackend for DummyBackend {
    fn backend_name(&self) -> &'static str {
        "Dummy"
    }

    fn get_temperature(&self) -> u32 {
        self.current_temp
    }

    fn set_temperature(&mut self, temperature: u32, gamma: RgbGamma) -> Result<(), BackendError> {
        if self.released {
            return Err(BackendError::ApplyFailed(
                "dummy backend was already released".to_string(),
            ));
        }
        Log::log_verbose(&format!("Dummy backend: {}K, gamma {}", temperature, gamma));
        self.current_temp = temperature;
        Ok(())
    }

    fn release(&mut self) -> Result<(), BackendError> {
        Log::log_decorated("Dummy backend: restoring neutral gamma");
        self.current_temp = NEUTRAL_TEMP;
        self.released = true;
        Ok(())
    }
}
