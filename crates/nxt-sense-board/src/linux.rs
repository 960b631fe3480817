//! Backend over the Linux SPI and GPIO character devices
//!
//! [`LinuxSpi`] talks to the converter through `/dev/spidevB.C`,
//! configured for this board (mode 0, 8 bits per word, 3 MHz ceiling).
//! [`LinuxGpio`] claims output lines through a `gpiochip` device; the
//! kernel releases a line when its handle drops, which matches the claim
//! semantics of the [`GpioProvider`] seam.
//!
//! Fault codes forwarded upwards are negative errnos, the same alphabet
//! the simulator uses.

use std::io;
use std::sync::Mutex;

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use nxt_sense_core::frame::{FRAME_LEN, SPI_BITS_PER_WORD, SPI_MAX_HZ};

use crate::gpio::{GpioError, GpioProvider, OutputHandle};
use crate::transport::{AdcTransport, TransferFault};

/// Bus the converter sits on (bus 1, chip select 0).
pub const DEFAULT_SPIDEV_PATH: &str = "/dev/spidev1.0";

/// GPIO chip carrying the shifter and SCL lines.
pub const DEFAULT_GPIOCHIP_PATH: &str = "/dev/gpiochip0";

/// Walk an error chain for the underlying errno, negated.
fn errno_of(err: &(dyn std::error::Error + 'static)) -> i32 {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = cause {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            if let Some(code) = io_err.raw_os_error() {
                return -code;
            }
        }
        cause = current.source();
    }
    -5 // EIO
}

// ============================================================================
// SPI transport
// ============================================================================

/// ADC transport over a Linux `spidev` character device.
pub struct LinuxSpi {
    dev: Spidev,
}

impl LinuxSpi {
    /// Open and configure the converter's bus device.
    pub fn open(path: &str) -> io::Result<Self> {
        let mut dev = Spidev::open(path)?;
        let options = SpidevOptions::new()
            .bits_per_word(SPI_BITS_PER_WORD)
            .max_speed_hz(SPI_MAX_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&options)?;
        tracing::info!(path, "spidev opened");
        Ok(Self { dev })
    }
}

impl AdcTransport for LinuxSpi {
    fn exchange(
        &mut self,
        tx: &[u8; FRAME_LEN],
        rx: &mut [u8; FRAME_LEN],
    ) -> Result<(), TransferFault> {
        let mut transfer = SpidevTransfer::read_write(tx, rx);
        self.dev.transfer(&mut transfer).map_err(|err| {
            tracing::warn!(%err, "spidev transfer failed");
            TransferFault {
                code: err.raw_os_error().map_or(-5, |code| -code),
            }
        })
    }
}

// ============================================================================
// GPIO provider
// ============================================================================

/// GPIO provider over a Linux `gpiochip` character device.
pub struct LinuxGpio {
    chip: Mutex<Chip>,
}

impl LinuxGpio {
    /// Open a GPIO chip device.
    pub fn open(path: &str) -> Result<Self, gpio_cdev::Error> {
        let chip = Chip::new(path)?;
        tracing::info!(path, "gpiochip opened");
        Ok(Self { chip: Mutex::new(chip) })
    }
}

impl GpioProvider for LinuxGpio {
    fn claim_output(
        &self,
        line: u32,
        label: &'static str,
        initial_high: bool,
    ) -> Result<Box<dyn OutputHandle>, GpioError> {
        let mut chip = self.chip.lock().map_err(|_| GpioError::Locked { line })?;

        let handle = chip
            .get_line(line)
            .and_then(|found| {
                found.request(LineRequestFlags::OUTPUT, u8::from(initial_high), label)
            })
            .map_err(|err| {
                tracing::warn!(line, label, %err, "gpio line claim failed");
                GpioError::Claim { line, code: errno_of(&err) }
            })?;

        tracing::debug!(line, label, "gpio line claimed");
        Ok(Box::new(LinuxLine { line, handle }))
    }
}

struct LinuxLine {
    line: u32,
    handle: LineHandle,
}

impl OutputHandle for LinuxLine {
    fn set(&mut self, high: bool) -> Result<(), GpioError> {
        self.handle.set_value(u8::from(high)).map_err(|err| {
            tracing::warn!(line = self.line, %err, "gpio line drive failed");
            GpioError::Drive { line: self.line, code: errno_of(&err) }
        })
    }
}
