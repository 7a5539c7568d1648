//! Shared fixtures for scheduler integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use solarshift::backend::{BackendError, GammaBackend, RgbGamma};
use solarshift::time_source::{Clock, ManualClock};

/// One `set_temperature` call as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
    pub temperature: u32,
    pub waits: usize,
    pub time: f64,
    pub ok: bool,
}

#[derive(Debug, Default)]
pub struct Record {
    pub calls: Vec<Applied>,
    pub releases: usize,
}

impl Record {
    pub fn successful(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter(|call| call.ok)
            .map(|call| call.temperature)
            .collect()
    }
}

/// Backend that remembers every call and can be told to fail some of them.
pub struct RecordingBackend {
    clock: ManualClock,
    current: u32,
    fail_calls: HashSet<usize>,
    record: Arc<Mutex<Record>>,
}

impl RecordingBackend {
    /// `reported` is what the backend claims is applied before the session.
    pub fn new(clock: ManualClock, reported: u32) -> (Self, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        (
            Self {
                clock,
                current: reported,
                fail_calls: HashSet::new(),
                record: record.clone(),
            },
            record,
        )
    }

    /// Fail the `set_temperature` calls with these zero-based indices.
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_calls = calls.into_iter().collect();
        self
    }
}

impl GammaBackend for RecordingBackend {
    fn backend_name(&self) -> &'static str {
        "Recording"
    }

    fn get_temperature(&self) -> u32 {
        self.current
    }

    fn set_temperature(&mut self, temperature: u32, _gamma: RgbGamma) -> Result<(), BackendError> {
        let mut record = self.record.lock().unwrap();
        let ok = !self.fail_calls.contains(&record.calls.len());
        record.calls.push(Applied {
            temperature,
            waits: self.clock.waits(),
            time: self.clock.now(),
            ok,
        });
        if ok {
            self.current = temperature;
            Ok(())
        } else {
            Err(BackendError::ApplyFailed("simulated failure".to_string()))
        }
    }

    fn release(&mut self) -> Result<(), BackendError> {
        self.record.lock().unwrap().releases += 1;
        Ok(())
    }
}

/// 2024-06-21 00:00 UTC, solar midnight at longitude 0.
pub fn summer_midnight() -> f64 {
    Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap().timestamp() as f64
}

/// 2024-06-21 12:00 UTC, close to solar noon at longitude 0.
pub fn summer_noon() -> f64 {
    Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap().timestamp() as f64
}
