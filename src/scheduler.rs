//! Transition scheduler driving a gamma backend from the sun's position.
//!
//! A [`Scheduler`] owns one backend for one session. It moves through
//! `Idle -> Running -> (Cancelled | Completed)` and can be run only once.
//!
//! ## Continuous mode
//!
//! Every sample period the scheduler reads the clock, computes the solar
//! elevation and the target temperature, and steps the applied temperature
//! toward the target by at most `transition_speed * elapsed` Kelvin. The
//! applied value never overshoots the target.
//!
//! The first value applied is whatever the backend reports through
//! [`GammaBackend::get_temperature`], so a fresh backend starts at neutral and
//! eases toward the target, and a backend that was already driven by an
//! earlier session resumes from where it was left.
//!
//! ## One-shot mode
//!
//! The target is computed once and applied directly without rate limiting.
//!
//! ## Cancellation
//!
//! The [`CancellationToken`] is checked at the top of every iteration and
//! also ends the sampling wait early. Once it is observed no further
//! temperature is applied. The backend is released exactly once on every
//! exit path, including drops during unwinding.

use std::mem::discriminant;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::backend::{BackendError, GammaBackend, RgbGamma};
use crate::constants::SLEEP_DETECTION_THRESHOLD_SECS;
use crate::geo::{Geolocation, solar_elevation};
use crate::logger::Log;
use crate::signals::CancellationToken;
use crate::temperature::{Period, TemperaturePreset, TwilightBand, calc_temperature};
use crate::time_source::Clock;

/// Lifecycle of a scheduler session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Cancelled,
    Completed,
}

impl SchedulerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SchedulerState::Cancelled | SchedulerState::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Apply the current target once, then complete.
    OneShot,
    /// Keep tracking the sun until cancelled.
    Continuous,
}

/// Everything the scheduler needs to compute and pace targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleParams {
    pub location: Geolocation,
    pub preset: TemperaturePreset,
    pub band: TwilightBand,
    pub gamma: RgbGamma,
    /// Maximum change in Kelvin per second.
    pub transition_speed: u32,
    pub sample_interval: Duration,
}

/// One step of rate-limited movement from `current` toward `target`.
///
/// The step is `floor(speed * elapsed)` Kelvin at most. Negative or
/// non-finite elapsed times allow no movement.
///
/// # Examples
/// ```
/// use solarshift::scheduler::step_toward;
/// assert_eq!(step_toward(6500, 3400, 100, 5.0), 6000);
/// assert_eq!(step_toward(3450, 3400, 100, 5.0), 3400);
/// assert_eq!(step_toward(6500, 3400, 100, -5.0), 6500);
/// ```
pub fn step_toward(current: u32, target: u32, speed: u32, elapsed: f64) -> u32 {
    if !elapsed.is_finite() || elapsed <= 0.0 {
        return current;
    }
    let max_step = (f64::from(speed) * elapsed).floor().min(f64::from(u32::MAX)) as u32;
    if target > current {
        current + (target - current).min(max_step)
    } else {
        current - (current - target).min(max_step)
    }
}

/// Releases the backend once, explicitly or on drop.
struct ReleaseGuard<B: GammaBackend> {
    backend: B,
    released: bool,
}

impl<B: GammaBackend> ReleaseGuard<B> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            released: false,
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.backend.release() {
            Ok(()) => Log::log_decorated("Gamma ramps restored"),
            Err(e) => Log::log_error(&e.to_string()),
        }
    }
}

impl<B: GammaBackend> Drop for ReleaseGuard<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Per-session bookkeeping for continuous mode.
#[derive(Debug)]
struct Session {
    current: u32,
    applied_once: bool,
    last_sample: Option<f64>,
    last_period: Option<Period>,
}

/// Single-use scheduler session over a gamma backend.
pub struct Scheduler<B: GammaBackend, C: Clock> {
    guard: ReleaseGuard<B>,
    clock: C,
    params: ScheduleParams,
    cancel: CancellationToken,
    state: SchedulerState,
    current: Option<u32>,
}

impl<B: GammaBackend, C: Clock> Scheduler<B, C> {
    /// Create an idle scheduler. The backend must already be initialized.
    pub fn new(backend: B, clock: C, params: ScheduleParams, cancel: CancellationToken) -> Self {
        Self {
            guard: ReleaseGuard::new(backend),
            clock,
            params,
            cancel,
            state: SchedulerState::Idle,
            current: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The last temperature successfully applied in this session.
    pub fn current_temperature(&self) -> Option<u32> {
        self.current
    }

    pub fn backend(&self) -> &B {
        &self.guard.backend
    }

    /// Target temperature for a timestamp, together with its elevation.
    pub fn target_at(&self, timestamp: f64) -> (f64, u32) {
        let elevation = solar_elevation(timestamp, self.params.location);
        let target = calc_temperature(elevation, self.params.preset, self.params.band);
        (elevation, target)
    }

    /// Run the session to a terminal state and release the backend.
    ///
    /// # Errors
    /// Returns an error if the scheduler was already run, or if the single
    /// application in one-shot mode fails. Apply failures in continuous mode
    /// are logged and retried on the next sample instead.
    pub fn run(&mut self, mode: RunMode) -> Result<SchedulerState> {
        if self.state != SchedulerState::Idle {
            anyhow::bail!(
                "Scheduler session already {:?}; create a new scheduler for a new session",
                self.state
            );
        }
        self.state = SchedulerState::Running;

        let outcome = match mode {
            RunMode::OneShot => self.run_oneshot(),
            RunMode::Continuous => {
                self.run_continuous();
                Ok(())
            }
        };

        self.guard.release();
        outcome?;
        Ok(self.state)
    }

    fn run_oneshot(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            self.state = SchedulerState::Cancelled;
            return Ok(());
        }

        let (elevation, target) = self.target_at(self.clock.now());
        Log::log_decorated(&format!("Solar elevation: {:.2}°", elevation));
        Log::log_decorated(&format!("Color temperature: {}K", target));

        // Terminal either way; there is nothing to retry in one-shot mode
        self.state = SchedulerState::Completed;
        self.guard
            .backend
            .set_temperature(target, self.params.gamma)
            .context("Temperature adjustment failed")?;
        self.current = Some(target);
        Ok(())
    }

    fn run_continuous(&mut self) {
        let mut session = Session {
            current: self.guard.backend.get_temperature(),
            applied_once: false,
            last_sample: None,
            last_period: None,
        };
        Log::log_block_start(&format!(
            "Starting continuous adjustment from {}K (max {} K/s)",
            session.current, self.params.transition_speed
        ));

        loop {
            if self.cancel.is_cancelled() {
                self.state = SchedulerState::Cancelled;
                Log::log_block_start("Adjustment cancelled");
                break;
            }

            self.sample(&mut session);

            self.clock.wait(self.params.sample_interval, &self.cancel);
        }
    }

    fn sample(&mut self, session: &mut Session) {
        let now = self.clock.now();
        let (elevation, target) = self.target_at(now);

        let next = match session.last_sample {
            None => session.current,
            Some(previous) => {
                let elapsed = now - previous;
                if elapsed > SLEEP_DETECTION_THRESHOLD_SECS {
                    Log::log_pipe();
                    Log::log_decorated(&format!(
                        "Large time jump detected ({} minutes). System may have resumed from sleep.",
                        (elapsed / 60.0).round()
                    ));
                } else if elapsed < 0.0 {
                    Log::log_warning(&format!(
                        "System clock moved backwards by {:.1} seconds",
                        -elapsed
                    ));
                }
                step_toward(
                    session.current,
                    target,
                    self.params.transition_speed,
                    elapsed,
                )
            }
        };
        session.last_sample = Some(now);

        let period = self.params.band.period(elevation);
        if session
            .last_period
            .is_none_or(|last| discriminant(&last) != discriminant(&period))
        {
            Log::log_block_start(&format!("Entering {}", period));
        }
        session.last_period = Some(period);

        if !session.applied_once || next != session.current {
            match self.apply(next) {
                Ok(()) => {
                    session.current = next;
                    session.applied_once = true;
                }
                Err(e) => {
                    Log::log_warning(&e.to_string());
                    Log::log_indented("Will retry on next sample...");
                }
            }
        }

        Log::log_verbose(&format!(
            "Elevation {:.2}° ({}), target {}K, applied {}K",
            elevation, period, target, session.current
        ));
    }

    fn apply(&mut self, temperature: u32) -> Result<(), BackendError> {
        self.guard
            .backend
            .set_temperature(temperature, self.params.gamma)?;
        self.current = Some(temperature);
        Ok(())
    }
}
