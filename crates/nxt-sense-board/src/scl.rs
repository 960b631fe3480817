//! Claimed SCL line for one sensor port
//!
//! Each port carries a digital SCL pin next to its analog line. Sensors
//! that take a control signal drive it through [`SclLine`]: the light
//! sensor powers its floodlight LED with it, and detaching a sensor
//! parks the line low again.
//!
//! The toggle command needs the last driven level, so the line tracks it;
//! the hardware pin is write-only from this side.

use std::sync::Mutex;

use nxt_sense_core::types::{Port, SclCommand};

use crate::gpio::{GpioError, GpioProvider, OutputHandle};

/// One claimed SCL line with its last driven level.
pub struct SclLine {
    line: u32,
    state: Mutex<SclState>,
}

struct SclState {
    handle: Box<dyn OutputHandle>,
    level: bool,
}

impl SclLine {
    /// Claim a line as an SCL output, parked low.
    pub fn claim(
        provider: &dyn GpioProvider,
        line: u32,
        label: &'static str,
    ) -> Result<Self, GpioError> {
        let handle = provider.claim_output(line, label, false)?;
        Ok(Self {
            line,
            state: Mutex::new(SclState { handle, level: false }),
        })
    }

    /// Claim the SCL line belonging to `port`.
    pub fn for_port(provider: &dyn GpioProvider, port: Port) -> Result<Self, GpioError> {
        Self::claim(provider, port.scl_line(), port.scl_label())
    }

    /// Drive the line according to `command`.
    ///
    /// The tracked level is only updated after the pin accepted the
    /// drive, so a failed toggle does not lose the real line state.
    pub fn drive(&self, command: SclCommand) -> Result<(), GpioError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GpioError::Locked { line: self.line })?;

        let target = match command {
            SclCommand::Low => false,
            SclCommand::High => true,
            SclCommand::Toggle => !state.level,
        };
        state.handle.set(target)?;
        state.level = target;
        Ok(())
    }

    /// Last level successfully driven onto the line.
    pub fn level(&self) -> Result<bool, GpioError> {
        let state = self
            .state
            .lock()
            .map_err(|_| GpioError::Locked { line: self.line })?;
        Ok(state.level)
    }

    /// GPIO line number behind this SCL pin.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}
