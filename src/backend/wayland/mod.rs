//! Wayland backend using the wlr-gamma-control-unstable-v1 protocol.
//!
//! Works with wlroots-based compositors (Sway, river, Wayfire, Hyprland,
//! niri and others that expose `zwlr_gamma_control_manager_v1`). A gamma
//! control object is acquired for every selected output. Destroying the
//! control makes the compositor restore the output's original ramps, which
//! is how [`GammaBackend::release`] returns the display to neutral.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::os::fd::AsFd;

use wayland_client::protocol::{wl_output, wl_registry};
use wayland_client::{Connection, Dispatch, EventQueue, QueueHandle};
use wayland_protocols_wlr::gamma_control::v1::client::{
    zwlr_gamma_control_manager_v1::{self, ZwlrGammaControlManagerV1},
    zwlr_gamma_control_v1::{self, ZwlrGammaControlV1},
};

use crate::backend::gamma::{GammaRamps, fill_gamma_ramps};
use crate::backend::{BackendError, GammaBackend, OutputSelector, RgbGamma};
use crate::constants::NEUTRAL_TEMP;
use crate::logger::Log;

const GAMMA_MANAGER_INTERFACE: &str = "zwlr_gamma_control_manager_v1";
const OUTPUT_INTERFACE: &str = "wl_output";

/// Per-output protocol state.
struct OutputState {
    index: usize,
    output: wl_output::WlOutput,
    name: Option<String>,
    control: Option<ZwlrGammaControlV1>,
    ramp_size: Option<u32>,
    failed: bool,
}

impl OutputState {
    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} (output {})", name, self.index),
            None => format!("output {}", self.index),
        }
    }
}

/// Dispatch target for the backend's event queue.
#[derive(Default)]
struct WaylandState {
    outputs: Vec<OutputState>,
    manager: Option<ZwlrGammaControlManagerV1>,
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match interface.as_str() {
                OUTPUT_INTERFACE => {
                    let index = state.outputs.len();
                    let output =
                        registry.bind::<wl_output::WlOutput, _, _>(name, version.min(4), qh, index);
                    state.outputs.push(OutputState {
                        index,
                        output,
                        name: None,
                        control: None,
                        ramp_size: None,
                        failed: false,
                    });
                }
                GAMMA_MANAGER_INTERFACE => {
                    let manager =
                        registry.bind::<ZwlrGammaControlManagerV1, _, _>(name, 1, qh, ());
                    state.manager = Some(manager);
                }
                _ => {}
            }
        }
    }
}

impl Dispatch<wl_output::WlOutput, usize> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        index: &usize,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_output::Event::Name { name } = event {
            if let Some(output) = state.outputs.get_mut(*index) {
                output.name = Some(name);
            }
        }
    }
}

impl Dispatch<ZwlrGammaControlManagerV1, ()> for WaylandState {
    fn event(
        _: &mut Self,
        _: &ZwlrGammaControlManagerV1,
        _: zwlr_gamma_control_manager_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        // The manager has no events
    }
}

impl Dispatch<ZwlrGammaControlV1, usize> for WaylandState {
    fn event(
        state: &mut Self,
        _: &ZwlrGammaControlV1,
        event: zwlr_gamma_control_v1::Event,
        index: &usize,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(output) = state.outputs.get_mut(*index) else {
            return;
        };
        match event {
            zwlr_gamma_control_v1::Event::GammaSize { size } => output.ramp_size = Some(size),
            zwlr_gamma_control_v1::Event::Failed => output.failed = true,
            _ => {}
        }
    }
}

/// Resolve the output selector against the number of outputs found.
fn select_outputs(count: usize, selector: OutputSelector) -> Result<Vec<usize>, BackendError> {
    if count == 0 {
        return Err(BackendError::Unavailable(
            "the compositor reported no outputs".to_string(),
        ));
    }
    match selector.output {
        Some(index) if index >= count => Err(BackendError::Unavailable(format!(
            "output {} does not exist, {} output(s) available (valid range 0-{})",
            index,
            count,
            count - 1
        ))),
        Some(index) => Ok(vec![index]),
        None => Ok((0..count).collect()),
    }
}

/// Write ramps to an anonymous file positioned at its start.
fn ramp_file(ramps: &GammaRamps) -> std::io::Result<File> {
    let mut file = tempfile::tempfile()?;
    file.write_all(&ramps.to_ne_bytes())?;
    file.flush()?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

/// Wayland backend implementation using wlr-gamma-control-unstable-v1.
pub struct WaylandBackend {
    connection: Connection,
    event_queue: EventQueue<WaylandState>,
    state: WaylandState,
    current_temp: u32,
    released: bool,
}

impl WaylandBackend {
    /// Connect to the compositor and acquire gamma controls.
    ///
    /// # Errors
    /// Returns [`BackendError::Unavailable`] if:
    /// - Not running on Wayland (WAYLAND_DISPLAY not set)
    /// - The compositor doesn't support wlr-gamma-control-unstable-v1
    /// - The selected output index is out of range
    /// - Another client already holds gamma control of a selected output
    pub fn new(selector: OutputSelector) -> Result<Self, BackendError> {
        if std::env::var("WAYLAND_DISPLAY").is_err() {
            return Err(BackendError::Unavailable(
                "WAYLAND_DISPLAY is not set. Are you running on Wayland?".to_string(),
            ));
        }

        if let Some(screen) = selector.screen.filter(|screen| *screen != 0) {
            Log::log_warning(&format!(
                "Wayland has no separate screens, ignoring screen {}",
                screen
            ));
        }

        Log::log_decorated("Initializing Wayland gamma control backend...");

        let connection = Connection::connect_to_env().map_err(|e| {
            BackendError::Unavailable(format!("failed to connect to Wayland display: {}", e))
        })?;
        let mut event_queue = connection.new_event_queue();
        let qh = event_queue.handle();
        let _registry = connection.display().get_registry(&qh, ());

        let mut state = WaylandState::default();
        // The first roundtrip binds globals, the second delivers output names
        for _ in 0..2 {
            event_queue.roundtrip(&mut state).map_err(|e| {
                BackendError::Unavailable(format!("Wayland protocol error: {}", e))
            })?;
        }

        let manager = state.manager.clone().ok_or_else(|| {
            BackendError::Unavailable(
                "the compositor does not support wlr-gamma-control-unstable-v1".to_string(),
            )
        })?;

        let selected = select_outputs(state.outputs.len(), selector)?;
        for &index in &selected {
            let control = manager.get_gamma_control(&state.outputs[index].output, &qh, index);
            state.outputs[index].control = Some(control);
        }

        event_queue
            .roundtrip(&mut state)
            .map_err(|e| BackendError::Unavailable(format!("Wayland protocol error: {}", e)))?;

        for &index in &selected {
            let output = &state.outputs[index];
            if output.failed {
                return Err(BackendError::Unavailable(format!(
                    "gamma control for {} is already in use by another client",
                    output.label()
                )));
            }
            match output.ramp_size {
                Some(size) if size > 0 => {
                    Log::log_indented(&format!("{}: {} gamma entries", output.label(), size));
                }
                _ => {
                    return Err(BackendError::Unavailable(format!(
                        "{} does not support gamma adjustment",
                        output.label()
                    )));
                }
            }
        }

        Log::log_decorated("Wayland backend initialized successfully");

        Ok(Self {
            connection,
            event_queue,
            state,
            current_temp: NEUTRAL_TEMP,
            released: false,
        })
    }
}

impl GammaBackend for WaylandBackend {
    fn backend_name(&self) -> &'static str {
        "Wayland"
    }

    fn get_temperature(&self) -> u32 {
        // The protocol offers no read-back
        self.current_temp
    }

    fn set_temperature(&mut self, temperature: u32, gamma: RgbGamma) -> Result<(), BackendError> {
        if self.released {
            return Err(BackendError::ApplyFailed(
                "Wayland backend was already released".to_string(),
            ));
        }

        // Files stay open until the compositor has received every descriptor
        let mut files = Vec::new();
        for output in &self.state.outputs {
            let (Some(control), Some(size)) = (&output.control, output.ramp_size) else {
                continue;
            };
            let ramps = fill_gamma_ramps(size as usize, temperature, gamma);
            let file = ramp_file(&ramps).map_err(|e| {
                BackendError::ApplyFailed(format!(
                    "could not write gamma table for {}: {}",
                    output.label(),
                    e
                ))
            })?;
            control.set_gamma(file.as_fd());
            files.push(file);
        }

        if files.is_empty() {
            return Err(BackendError::ApplyFailed(
                "no outputs with a usable gamma control remain".to_string(),
            ));
        }

        self.event_queue
            .roundtrip(&mut self.state)
            .map_err(|e| BackendError::ApplyFailed(format!("Wayland protocol error: {}", e)))?;
        drop(files);

        // A failed control is dead; drop it so the remaining outputs keep working
        let mut rejected = Vec::new();
        for output in &mut self.state.outputs {
            if output.failed {
                if let Some(control) = output.control.take() {
                    control.destroy();
                    rejected.push(output.label());
                }
            }
        }
        if !rejected.is_empty() {
            return Err(BackendError::ApplyFailed(format!(
                "compositor rejected gamma tables for {}",
                rejected.join(", ")
            )));
        }

        self.current_temp = temperature;
        Ok(())
    }

    fn release(&mut self) -> Result<(), BackendError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        for output in &mut self.state.outputs {
            if let Some(control) = output.control.take() {
                control.destroy();
            }
        }
        if let Some(manager) = self.state.manager.take() {
            manager.destroy();
        }
        self.current_temp = NEUTRAL_TEMP;

        self.connection
            .flush()
            .map_err(|e| BackendError::ReleaseFailed(format!("Wayland flush failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_select_all_outputs_by_default() {
        let selected = select_outputs(3, OutputSelector::default()).unwrap();
        assert_eq!(selected, vec![0, 1, 2]);
    }

    #[test]
    fn test_select_single_output() {
        let selector = OutputSelector {
            screen: None,
            output: Some(1),
        };
        assert_eq!(select_outputs(2, selector).unwrap(), vec![1]);
    }

    #[test]
    fn test_select_out_of_range_output() {
        let selector = OutputSelector {
            screen: None,
            output: Some(2),
        };
        assert!(matches!(
            select_outputs(2, selector),
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(
            select_outputs(0, OutputSelector::default()),
            Err(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn test_ramp_file_contents() {
        use std::io::Read;

        let ramps = fill_gamma_ramps(16, 5000, RgbGamma::NEUTRAL);
        let mut file = ramp_file(&ramps).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, ramps.to_ne_bytes());
    }

    #[test]
    #[serial]
    fn test_unavailable_without_wayland_display() {
        let original = std::env::var("WAYLAND_DISPLAY").ok();
        unsafe {
            std::env::remove_var("WAYLAND_DISPLAY");
        }

        let result = WaylandBackend::new(OutputSelector::default());

        unsafe {
            if let Some(val) = original {
                std::env::set_var("WAYLAND_DISPLAY", val);
            }
        }

        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }
}
