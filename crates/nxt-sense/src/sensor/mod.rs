//! Sensor instances bound to the four external ports.
//!
//! Each attached sensor owns a [`PortBinding`]: the port identity together
//! with handles to the ADC engine and the port's SCL output. The binding is
//! handed over at attach time, so a sensor never resolves its sampling or
//! control path through a shared lookup table.
//!
//! Dispatch across sensor types goes through the [`Sensor`] enum. Opening a
//! sensor yields a [`SensorFile`], a readout that honors the "single read,
//! then EOF" contract of the device nodes.

use std::io;
use std::sync::Arc;

use nxt_sense_board::{AdcEngine, SclLine};
use nxt_sense_core::{AdcError, Port, SensorKind};

use crate::error::SensorError;

mod light;
mod touch;

pub use light::{LightFile, LightSensor};
pub use touch::{TouchFile, TouchSensor, DEFAULT_THRESHOLD};

// ============================================================================
// Port binding
// ============================================================================

/// Sampling and control capabilities of one port, fixed at attach time.
pub struct PortBinding {
    port: Port,
    engine: Arc<AdcEngine>,
    scl: Arc<SclLine>,
}

impl PortBinding {
    pub(crate) fn new(port: Port, engine: Arc<AdcEngine>, scl: Arc<SclLine>) -> Self {
        Self { port, engine, scl }
    }

    /// Port this binding belongs to.
    #[must_use]
    pub fn port(&self) -> Port {
        self.port
    }

    /// Sample the port's wired ADC channel once.
    pub fn sample(&self) -> Result<u16, AdcError> {
        self.engine.sample_channel(self.port.adc_channel())
    }

    /// The port's SCL output.
    #[must_use]
    pub fn scl(&self) -> &SclLine {
        &self.scl
    }
}

// ============================================================================
// Sensor dispatch
// ============================================================================

/// A sensor instance attached to one port.
pub enum Sensor {
    /// Touch switch read as a binary pressed flag
    Touch(TouchSensor),
    /// Light sensor with a switchable illumination LED
    Light(LightSensor),
}

impl Sensor {
    /// Kind of the attached sensor.
    #[must_use]
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Touch(_) => SensorKind::Touch,
            Self::Light(_) => SensorKind::Light,
        }
    }

    /// Port the sensor is attached to.
    #[must_use]
    pub fn port(&self) -> Port {
        match self {
            Self::Touch(sensor) => sensor.port(),
            Self::Light(sensor) => sensor.port(),
        }
    }

    /// Open the sensor for a single readout.
    ///
    /// Only one readout may be open at a time; a second open fails with
    /// [`SensorError::Busy`] instead of queueing.
    pub fn open(&self) -> Result<SensorFile<'_>, SensorError> {
        match self {
            Self::Touch(sensor) => sensor.open().map(SensorFile::Touch),
            Self::Light(sensor) => sensor.open().map(SensorFile::Light),
        }
    }
}

/// An open sensor readout.
///
/// The first [`io::Read::read`] samples the port and yields the rendered
/// payload; every later read reports end of file. Dropping the file closes
/// the instance and releases the open slot.
pub enum SensorFile<'a> {
    /// Open touch readout
    Touch(TouchFile<'a>),
    /// Open light readout
    Light(LightFile<'a>),
}

impl io::Read for SensorFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Touch(file) => file.read(buf),
            Self::Light(file) => file.read(buf),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use nxt_sense_board::sim::{SimBus, SimGpio};
    use nxt_sense_core::AdcChannel;

    fn binding_on(port: Port) -> (PortBinding, SimBus) {
        let bus = SimBus::new();
        let engine = Arc::new(AdcEngine::new());
        engine.bind(Box::new(bus.clone())).unwrap();

        let gpio = SimGpio::new();
        let scl = Arc::new(SclLine::for_port(&gpio, port).unwrap());
        (PortBinding::new(port, engine, scl), bus)
    }

    #[test]
    fn test_binding_samples_the_ports_channel() {
        let (binding, bus) = binding_on(Port::P2);
        bus.set_channel(AdcChannel::In2, 901);

        assert_eq!(binding.sample(), Ok(901));
        assert_eq!(binding.port(), Port::P2);
    }

    #[test]
    fn test_sensor_enum_reports_kind_and_port() {
        let (binding, _bus) = binding_on(Port::P1);
        let sensor = Sensor::Touch(TouchSensor::new(binding));

        assert_eq!(sensor.kind(), SensorKind::Touch);
        assert_eq!(sensor.port(), Port::P1);
    }

    #[test]
    fn test_open_dispatches_to_the_attached_type() {
        let (binding, bus) = binding_on(Port::P0);
        bus.set_channel(AdcChannel::In0, 123);
        let sensor = Sensor::Light(LightSensor::new(binding));

        let mut file = sensor.open().unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        assert_eq!(out, "123\n");
    }
}
