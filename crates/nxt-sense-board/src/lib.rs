//! NXT Sense Board - Hardware tier for the GumstixNXT sensor board
//!
//! This crate drives the two shared hardware resources on the board and
//! defines the seams they are reached through:
//! - The 8-channel SPI ADC, behind a mutex-serialized transaction engine
//!   with a hot-pluggable bus peripheral
//! - The U3 level-shifter bank, behind a reference-counting registry that
//!   claims and releases the output-enable GPIOs
//! - The per-port SCL lines used by sensors that take a control signal
//!
//! Hardware access goes through two object-safe traits, [`AdcTransport`]
//! and [`GpioProvider`], so the same engine runs against the Linux SPI and
//! GPIO character devices, any `embedded-hal` implementation, or the
//! in-process simulator in [`sim`].
//!
//! # Modules
//!
//! - [`adc`]: ADC transaction engine
//! - [`shifter`]: Level-shifter registry and the analog path lease
//! - [`scl`]: Claimed SCL line with toggle tracking
//! - [`transport`]: SPI transport seam and `embedded-hal` adapter
//! - [`gpio`]: GPIO claim seam and `embedded-hal` adapter
//! - [`sim`]: In-process simulated backend for tests and demos
//!
//! # Features
//!
//! - `linux-hw`: Backend over the Linux `spidev` and `gpiochip` character
//!   devices (the [`linux`] module)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use nxt_sense_board::adc::AdcEngine;
//! use nxt_sense_board::sim::SimBus;
//! use nxt_sense_core::types::AdcChannel;
//!
//! let bus = SimBus::new();
//! bus.set_channel(AdcChannel::In2, 731);
//!
//! let engine = Arc::new(AdcEngine::new());
//! engine.bind(Box::new(bus.clone())).unwrap();
//! assert_eq!(engine.sample(2), Ok(731));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod adc;
pub mod gpio;
pub mod scl;
pub mod shifter;
pub mod sim;
pub mod transport;

/// Backend over the Linux SPI and GPIO character devices (requires `linux-hw` feature)
#[cfg(feature = "linux-hw")]
pub mod linux;

// Re-export key types
pub use adc::AdcEngine;
pub use gpio::{GpioError, GpioProvider, OutputHandle, PinOutput};
pub use scl::SclLine;
pub use shifter::{AnalogPath, ShifterBank, ShifterError};
pub use transport::{AdcTransport, SpiDeviceTransport, TransferFault};
