//! NXT Sense Core - `no_std` compatible board vocabulary for the GumstixNXT
//!
//! This crate provides the foundational types shared by every tier of the
//! GumstixNXT sensor stack: ADC channel and sensor port identifiers, the
//! level-shifter tags with their fixed GPIO assignments, the 4-byte SPI
//! frame codec spoken to the board ADC, and the sampling error taxonomy.
//! It is designed to work in `no_std` environments (the board firmware
//! side) as well as `std` environments (the host-side tooling).
//!
//! # Modules
//!
//! - [`types`]: Channel, port, shifter, and sensor-kind identifiers
//! - [`frame`]: SPI command frame build and sample extraction
//! - [`readout`]: Fixed-capacity rendering of sensor readouts
//! - [`error`]: Sampling error taxonomy shared across tiers
//!
//! # Features
//!
//! - `std`: Enable standard library support
//! - `defmt`: Enable `defmt` formatting for embedded logging
//!
//! # Example
//!
//! ```rust
//! use nxt_sense_core::frame::{command_frame, parse_sample, FRAME_LEN};
//! use nxt_sense_core::types::AdcChannel;
//!
//! // Build the transmit frame addressing channel 2.
//! let tx = command_frame(AdcChannel::In2);
//! assert_eq!(tx, [2 << 3, 0, 0, 0]);
//!
//! // The converter answers in bytes 2 and 3 of the response frame.
//! let rx = [0u8, 0, 0x0A, 0x3C];
//! assert_eq!(parse_sample(&rx), 0x0A3C);
//! assert_eq!(FRAME_LEN, 4);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod frame;
pub mod readout;
pub mod types;

// Re-export commonly used types at crate root
pub use error::AdcError;
pub use frame::{command_frame, parse_sample, FRAME_LEN, SAMPLE_MAX};
pub use types::{AdcChannel, Port, PortStatus, SclCommand, SensorKind, ShifterId};
