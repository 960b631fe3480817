//! NXT Sense - sensor port registry for the GumstixNXT
//!
//! This crate sits on top of the board tier and manages the four external
//! sensor ports: attaching and detaching touch and light sensor instances,
//! applying textual 4-port configurations as validated best-effort batches,
//! and exposing the read-once device-node readouts for sensors, raw ADC
//! channels, and the board supply voltage.
//!
//! # Modules
//!
//! - [`registry`]: The four-port registry with attach/detach and batch
//!   configuration
//! - [`sensor`]: Touch and light sensor instances and their readouts
//! - [`config`]: Textual configuration words and status rendering
//! - [`node`]: Raw per-channel readout nodes
//! - [`voltage`]: Board supply voltage readout
//! - [`error`]: Port, configuration, and sensor error taxonomies
//!
//! # Example
//!
//! ```rust
//! use std::io::Read;
//! use std::sync::Arc;
//!
//! use nxt_sense::{PortConfig, PortRegistry};
//! use nxt_sense_board::sim::{SimBus, SimGpio};
//! use nxt_sense_board::AdcEngine;
//! use nxt_sense_core::{AdcChannel, Port};
//!
//! let bus = SimBus::new();
//! let engine = Arc::new(AdcEngine::new());
//! engine.bind(Box::new(bus.clone())).unwrap();
//! bus.set_channel(AdcChannel::In0, 512);
//!
//! let gpio = SimGpio::new();
//! let registry = PortRegistry::new(Arc::clone(&engine), &gpio).unwrap();
//! registry.configure(&"1 0 0 0".parse::<PortConfig>().unwrap()).unwrap();
//!
//! // The switch reads pressed while the sample sits below the threshold.
//! let touch = registry.sensor(Port::P0).unwrap().unwrap();
//! let mut readout = String::new();
//! touch.open().unwrap().read_to_string(&mut readout).unwrap();
//! assert_eq!(readout, "1\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod node;
pub mod registry;
pub mod sensor;
pub mod voltage;

// Re-export commonly used types at crate root
pub use config::{status_line, PortConfig};
pub use error::{ConfigError, PortError, PortResult, SensorError, SensorResult};
pub use node::{AdcFile, AdcNode};
pub use registry::PortRegistry;
pub use sensor::{
    LightFile, LightSensor, PortBinding, Sensor, SensorFile, TouchFile, TouchSensor,
    DEFAULT_THRESHOLD,
};
pub use voltage::VoltageMonitor;
