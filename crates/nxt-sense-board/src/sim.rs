//! In-process simulated backend
//!
//! Stands in for the SPI bus and the GPIO chip when no board is present:
//! unit tests script it, and the CLI uses it as its default backend so
//! every command can be exercised on a developer machine.
//!
//! [`SimBus`] answers exchanges from a per-channel value table and keeps
//! every transmitted frame for inspection. [`SimGpio`] tracks claims,
//! levels, and an event log, and can inject claim or drive failures on
//! selected lines. Both are cheap clones around shared state, so a test
//! can hand one clone to the engine and keep another for scripting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nxt_sense_core::frame::{ADDRESS_SHIFT, FRAME_LEN};
use nxt_sense_core::types::AdcChannel;

use crate::gpio::{GpioError, GpioProvider, OutputHandle};
use crate::transport::{AdcTransport, TransferFault};

// ============================================================================
// Simulated SPI bus
// ============================================================================

/// Scriptable stand-in for the ADC bus peripheral.
#[derive(Clone, Default)]
pub struct SimBus {
    state: Arc<Mutex<BusState>>,
}

#[derive(Default)]
struct BusState {
    channels: [u16; AdcChannel::COUNT],
    frames: Vec<[u8; FRAME_LEN]>,
    controller_lost: bool,
    fault: Option<i32>,
}

impl SimBus {
    /// Create a bus with all channels reading zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the value a channel converts to.
    pub fn set_channel(&self, channel: AdcChannel, value: u16) {
        if let Ok(mut state) = self.state.lock() {
            state.channels[channel.index()] = value;
        }
    }

    /// Simulate the bus controller going away (or coming back).
    pub fn set_controller_present(&self, present: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.controller_lost = !present;
        }
    }

    /// Make the next exchange fail with `code`. One-shot.
    pub fn inject_fault(&self, code: i32) {
        if let Ok(mut state) = self.state.lock() {
            state.fault = Some(code);
        }
    }

    /// Every frame transmitted so far, oldest first.
    #[must_use]
    pub fn frames(&self) -> Vec<[u8; FRAME_LEN]> {
        self.state
            .lock()
            .map(|state| state.frames.clone())
            .unwrap_or_default()
    }

    /// The most recently transmitted frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<[u8; FRAME_LEN]> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.frames.last().copied())
    }
}

impl AdcTransport for SimBus {
    fn controller_present(&self) -> bool {
        self.state
            .lock()
            .map(|state| !state.controller_lost)
            .unwrap_or(false)
    }

    fn exchange(
        &mut self,
        tx: &[u8; FRAME_LEN],
        rx: &mut [u8; FRAME_LEN],
    ) -> Result<(), TransferFault> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TransferFault { code: -5 })?;

        state.frames.push(*tx);
        if let Some(code) = state.fault.take() {
            return Err(TransferFault { code });
        }

        // Decode the address bits the way the converter does.
        let index = usize::from(tx[0] >> ADDRESS_SHIFT) & (AdcChannel::COUNT - 1);
        let value = state.channels[index];
        *rx = [0, 0, (value >> 8) as u8, (value & 0xFF) as u8];
        Ok(())
    }
}

// ============================================================================
// Simulated GPIO chip
// ============================================================================

/// Event recorded by the simulated GPIO chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimGpioEvent {
    /// A line was claimed as an output
    Claim(u32),
    /// A claimed line was released
    Release(u32),
    /// A claimed line was driven to a level
    Drive(u32, bool),
}

/// Scriptable stand-in for the GPIO chip.
#[derive(Clone, Default)]
pub struct SimGpio {
    state: Arc<Mutex<GpioState>>,
}

#[derive(Default)]
struct GpioState {
    lines: HashMap<u32, LineRecord>,
    events: Vec<SimGpioEvent>,
    claim_failures: HashMap<u32, i32>,
    drive_failures: HashMap<u32, i32>,
}

struct LineRecord {
    label: &'static str,
    level: bool,
}

impl SimGpio {
    /// Create a chip with no lines claimed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a line is currently claimed.
    #[must_use]
    pub fn is_claimed(&self, line: u32) -> bool {
        self.state
            .lock()
            .map(|state| state.lines.contains_key(&line))
            .unwrap_or(false)
    }

    /// Current level of a claimed line.
    #[must_use]
    pub fn level(&self, line: u32) -> Option<bool> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.lines.get(&line).map(|record| record.level))
    }

    /// Consumer label of a claimed line.
    #[must_use]
    pub fn label(&self, line: u32) -> Option<&'static str> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.lines.get(&line).map(|record| record.label))
    }

    /// Every claim, release, and drive so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SimGpioEvent> {
        self.state
            .lock()
            .map(|state| state.events.clone())
            .unwrap_or_default()
    }

    /// Make claims of `line` fail with `code` until cleared.
    pub fn fail_claim(&self, line: u32, code: i32) {
        if let Ok(mut state) = self.state.lock() {
            state.claim_failures.insert(line, code);
        }
    }

    /// Make drives of `line` fail with `code` until cleared.
    pub fn fail_drive(&self, line: u32, code: i32) {
        if let Ok(mut state) = self.state.lock() {
            state.drive_failures.insert(line, code);
        }
    }

    /// Clear all injected failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.claim_failures.clear();
            state.drive_failures.clear();
        }
    }
}

impl GpioProvider for SimGpio {
    fn claim_output(
        &self,
        line: u32,
        label: &'static str,
        initial_high: bool,
    ) -> Result<Box<dyn OutputHandle>, GpioError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GpioError::Locked { line })?;

        if let Some(code) = state.claim_failures.get(&line).copied() {
            return Err(GpioError::Claim { line, code });
        }
        if state.lines.contains_key(&line) {
            return Err(GpioError::Claim { line, code: -16 }); // EBUSY
        }

        state.lines.insert(line, LineRecord { label, level: initial_high });
        state.events.push(SimGpioEvent::Claim(line));

        Ok(Box::new(SimOutput {
            line,
            state: Arc::clone(&self.state),
        }))
    }
}

struct SimOutput {
    line: u32,
    state: Arc<Mutex<GpioState>>,
}

impl OutputHandle for SimOutput {
    fn set(&mut self, high: bool) -> Result<(), GpioError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GpioError::Locked { line: self.line })?;

        if let Some(code) = state.drive_failures.get(&self.line).copied() {
            return Err(GpioError::Drive { line: self.line, code });
        }
        match state.lines.get_mut(&self.line) {
            Some(record) => record.level = high,
            None => return Err(GpioError::Drive { line: self.line, code: -19 }), // ENODEV
        }
        state.events.push(SimGpioEvent::Drive(self.line, high));
        Ok(())
    }
}

impl Drop for SimOutput {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if state.lines.remove(&self.line).is_some() {
                state.events.push(SimGpioEvent::Release(self.line));
            }
        }
    }
}
