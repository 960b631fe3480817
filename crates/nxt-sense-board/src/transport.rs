//! SPI transport seam for the ADC transaction engine
//!
//! The engine does not talk to a bus directly; it drives whatever
//! implements [`AdcTransport`]. The trait is object safe so the engine
//! can hold the bound peripheral as a boxed trait object and swap it at
//! runtime when the bus device comes and goes.
//!
//! [`SpiDeviceTransport`] adapts any `embedded-hal` [`SpiDevice`] to the
//! seam, which covers most HAL crates out of the box. The Linux character
//! device backend and the in-process simulator implement the trait
//! directly.

use embedded_hal::spi::{Error as SpiError, ErrorKind, SpiDevice};

use nxt_sense_core::frame::FRAME_LEN;

/// Fault forwarded from a failed bus exchange.
///
/// The code follows negative-errno conventions where the backend has
/// one; other backends pick the closest match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFault {
    /// Bus-specific error code
    pub code: i32,
}

/// Full-duplex exchange with the board ADC, one transaction per call.
///
/// Implementations transmit and receive exactly [`FRAME_LEN`] bytes and
/// must not split the exchange into multiple bus transactions; the chip
/// select frames one conversion.
pub trait AdcTransport: Send {
    /// Whether the controller servicing this peripheral is still present.
    ///
    /// Most transports are inseparable from their controller and keep the
    /// default. Hot-pluggable backends override this so the engine can
    /// distinguish a missing controller from a missing peripheral.
    fn controller_present(&self) -> bool {
        true
    }

    /// Run one full-duplex exchange.
    fn exchange(
        &mut self,
        tx: &[u8; FRAME_LEN],
        rx: &mut [u8; FRAME_LEN],
    ) -> Result<(), TransferFault>;
}

/// Adapter exposing any `embedded-hal` SPI device as an [`AdcTransport`].
pub struct SpiDeviceTransport<D> {
    device: D,
}

impl<D> SpiDeviceTransport<D> {
    /// Wrap an SPI device.
    pub fn new(device: D) -> Self {
        Self { device }
    }

    /// Give the wrapped device back.
    pub fn into_inner(self) -> D {
        self.device
    }
}

impl<D> AdcTransport for SpiDeviceTransport<D>
where
    D: SpiDevice<u8> + Send,
{
    fn exchange(
        &mut self,
        tx: &[u8; FRAME_LEN],
        rx: &mut [u8; FRAME_LEN],
    ) -> Result<(), TransferFault> {
        self.device
            .transfer(rx, tx)
            .map_err(|err| TransferFault { code: fault_code(err.kind()) })
    }
}

/// Map an `embedded-hal` SPI error kind to an errno-flavored fault code.
fn fault_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Overrun => -75,        // EOVERFLOW
        ErrorKind::ModeFault => -71,      // EPROTO
        ErrorKind::FrameFormat => -84,    // EILSEQ
        ErrorKind::ChipSelectFault => -6, // ENXIO
        _ => -5,                          // EIO
    }
}
