//! GPIO claim seam
//!
//! GPIO lines on this board are claimed for a purpose, driven, and given
//! back: the level-shifter output enables are claimed only while a
//! consumer holds the shifter active, and the SCL lines are claimed for
//! the lifetime of the port registry. [`GpioProvider::claim_output`]
//! models the claim; dropping the returned [`OutputHandle`] releases the
//! line again.
//!
//! A claim configures the line as an output and drives it to the given
//! initial level in one step, so a line is never observable in an
//! unconfigured state between request and first drive.

use thiserror::Error;

/// Errors from a GPIO provider or a claimed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GpioError {
    /// Claiming the line failed (already taken, unknown line, backend fault)
    #[error("gpio line {line} claim failed (code {code})")]
    Claim {
        /// GPIO line number
        line: u32,
        /// Backend error code
        code: i32,
    },
    /// Driving an already claimed line failed
    #[error("gpio line {line} drive failed (code {code})")]
    Drive {
        /// GPIO line number
        line: u32,
        /// Backend error code
        code: i32,
    },
    /// State lock for the line was poisoned
    #[error("gpio line {line} lock poisoned")]
    Locked {
        /// GPIO line number
        line: u32,
    },
}

/// A claimed GPIO output line.
///
/// Dropping the handle releases the underlying line.
pub trait OutputHandle: Send {
    /// Drive the line high or low.
    fn set(&mut self, high: bool) -> Result<(), GpioError>;
}

/// Source of claimable GPIO output lines.
pub trait GpioProvider: Send + Sync {
    /// Claim `line` as an output driven to `initial_high`.
    ///
    /// The label travels to the backend where it supports one; the Linux
    /// character device reports it as the line consumer.
    fn claim_output(
        &self,
        line: u32,
        label: &'static str,
        initial_high: bool,
    ) -> Result<Box<dyn OutputHandle>, GpioError>;
}

/// Adapter exposing an `embedded-hal` output pin as an [`OutputHandle`].
///
/// HAL pins are already claimed by construction, so the adapter only
/// forwards drives. The line number is carried for error reporting.
pub struct PinOutput<P> {
    pin: P,
    line: u32,
}

impl<P> PinOutput<P> {
    /// Wrap an already configured output pin.
    pub fn new(pin: P, line: u32) -> Self {
        Self { pin, line }
    }
}

impl<P> OutputHandle for PinOutput<P>
where
    P: embedded_hal::digital::OutputPin + Send,
{
    fn set(&mut self, high: bool) -> Result<(), GpioError> {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| GpioError::Drive { line: self.line, code: -5 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, OutputPin};

    #[derive(Default)]
    struct RecordedPin {
        high: bool,
        sets: usize,
    }

    impl ErrorType for RecordedPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordedPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.sets += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.sets += 1;
            Ok(())
        }
    }

    #[test]
    fn test_pin_output_forwards_levels() {
        let mut handle = PinOutput::new(RecordedPin::default(), 42);
        handle.set(true).unwrap();
        handle.set(false).unwrap();
        assert!(!handle.pin.high);
        assert_eq!(handle.pin.sets, 2);
    }
}
