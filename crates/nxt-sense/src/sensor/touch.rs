//! Touch switch sensor.
//!
//! The NXT touch switch pulls its analog line low while pressed, so the
//! readout compares the raw sample against a threshold and renders a
//! binary pressed flag. The threshold is a per-instance attribute that can
//! be tuned at runtime; `raw_sample` exposes the unthresholded value for
//! calibration.

use std::io;
use std::sync::{Mutex, MutexGuard, TryLockError};

use nxt_sense_core::readout::flag_line;
use nxt_sense_core::Port;

use crate::error::{SensorError, SensorResult};
use crate::sensor::PortBinding;

/// Threshold a fresh touch instance starts with, the middle of the
/// 12-bit sample range.
pub const DEFAULT_THRESHOLD: u16 = 2048;

struct TouchState {
    threshold: u16,
}

/// A touch switch attached to one port.
pub struct TouchSensor {
    binding: PortBinding,
    state: Mutex<TouchState>,
}

impl TouchSensor {
    pub(crate) fn new(binding: PortBinding) -> Self {
        Self {
            binding,
            state: Mutex::new(TouchState { threshold: DEFAULT_THRESHOLD }),
        }
    }

    /// Port the switch is attached to.
    #[must_use]
    pub fn port(&self) -> Port {
        self.binding.port()
    }

    /// Open the switch for a single readout.
    ///
    /// Fails with [`SensorError::Busy`] while another readout is open.
    pub fn open(&self) -> Result<TouchFile<'_>, SensorError> {
        let state = try_lock(&self.state)?;
        Ok(TouchFile { sensor: self, state, consumed: false })
    }

    /// Current pressed threshold.
    ///
    /// Fails with [`SensorError::Busy`] while a readout is open.
    pub fn threshold(&self) -> SensorResult<u16> {
        let state = try_lock(&self.state)?;
        Ok(state.threshold)
    }

    /// Replace the pressed threshold.
    ///
    /// Blocks until any open readout closes. Samples are 12 bits, so a
    /// threshold above 4095 makes the switch read as always pressed.
    pub fn set_threshold(&self, threshold: u16) -> SensorResult<()> {
        let mut state = self.state.lock().map_err(|_| SensorError::Locked)?;
        state.threshold = threshold;
        tracing::debug!(port = self.port().index(), threshold, "touch threshold set");
        Ok(())
    }

    /// Sample the port once without applying the threshold.
    ///
    /// Fails with [`SensorError::Busy`] while a readout is open.
    pub fn raw_sample(&self) -> SensorResult<u16> {
        let _state = try_lock(&self.state)?;
        Ok(self.binding.sample()?)
    }
}

fn try_lock(state: &Mutex<TouchState>) -> Result<MutexGuard<'_, TouchState>, SensorError> {
    state.try_lock().map_err(|err| match err {
        TryLockError::WouldBlock => SensorError::Busy,
        TryLockError::Poisoned(_) => SensorError::Locked,
    })
}

/// An open touch readout.
pub struct TouchFile<'a> {
    sensor: &'a TouchSensor,
    state: MutexGuard<'a, TouchState>,
    consumed: bool,
}

impl io::Read for TouchFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.consumed {
            return Ok(0);
        }

        let sample = self
            .sensor
            .binding
            .sample()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, SensorError::Adc(err)))?;

        let line = flag_line(sample < self.state.threshold);
        let payload = line.as_bytes();
        let count = payload.len().min(buf.len());
        buf[..count].copy_from_slice(&payload[..count]);
        self.consumed = true;
        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================
