//! Light sensor with a switchable illumination LED.
//!
//! The readout is the raw ADC sample rendered as a decimal line. The
//! sensor's LED sits on the port's SCL output; the `led` attribute drives
//! it for reflected-light measurements. Differential sampling around an
//! LED pulse is left to userspace, which can toggle the attribute between
//! two reads.

use std::io;
use std::sync::{Mutex, MutexGuard, TryLockError};

use nxt_sense_core::readout::decimal_line;
use nxt_sense_core::{Port, SclCommand};

use crate::error::{SensorError, SensorResult};
use crate::sensor::PortBinding;

struct LightState {
    led: bool,
}

/// A light sensor attached to one port.
pub struct LightSensor {
    binding: PortBinding,
    state: Mutex<LightState>,
}

impl LightSensor {
    /// The SCL line is parked low at attach, so the LED starts off.
    pub(crate) fn new(binding: PortBinding) -> Self {
        Self {
            binding,
            state: Mutex::new(LightState { led: false }),
        }
    }

    /// Port the sensor is attached to.
    #[must_use]
    pub fn port(&self) -> Port {
        self.binding.port()
    }

    /// Open the sensor for a single readout.
    ///
    /// Fails with [`SensorError::Busy`] while another readout is open.
    pub fn open(&self) -> Result<LightFile<'_>, SensorError> {
        let state = try_lock(&self.state)?;
        Ok(LightFile { sensor: self, _state: state, consumed: false })
    }

    /// Whether the illumination LED is on.
    ///
    /// Fails with [`SensorError::Busy`] while a readout is open.
    pub fn led(&self) -> SensorResult<bool> {
        let state = try_lock(&self.state)?;
        Ok(state.led)
    }

    /// Switch the illumination LED.
    ///
    /// Drives the port's SCL line and records the new state only once the
    /// line accepted the drive. Blocks until any open readout closes.
    pub fn set_led(&self, on: bool) -> SensorResult<()> {
        let mut state = self.state.lock().map_err(|_| SensorError::Locked)?;
        let command = if on { SclCommand::High } else { SclCommand::Low };
        self.binding.scl().drive(command)?;
        state.led = on;
        tracing::debug!(port = self.port().index(), on, "light sensor led switched");
        Ok(())
    }
}

fn try_lock(state: &Mutex<LightState>) -> Result<MutexGuard<'_, LightState>, SensorError> {
    state.try_lock().map_err(|err| match err {
        TryLockError::WouldBlock => SensorError::Busy,
        TryLockError::Poisoned(_) => SensorError::Locked,
    })
}

/// An open light readout.
pub struct LightFile<'a> {
    sensor: &'a LightSensor,
    _state: MutexGuard<'a, LightState>,
    consumed: bool,
}

impl io::Read for LightFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.consumed {
            return Ok(0);
        }

        let sample = self
            .sensor
            .binding
            .sample()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, SensorError::Adc(err)))?;

        let line = decimal_line(sample);
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

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;
    use std::sync::Arc;

    use nxt_sense_board::sim::{SimBus, SimGpio};
    use nxt_sense_board::{AdcEngine, SclLine};
    use nxt_sense_core::AdcChannel;

    fn light_on(port: Port) -> (LightSensor, SimBus, SimGpio) {
        let bus = SimBus::new();
        let engine = Arc::new(AdcEngine::new());
        engine.bind(Box::new(bus.clone())).unwrap();

        let gpio = SimGpio::new();
        let scl = Arc::new(SclLine::for_port(&gpio, port).unwrap());
        let sensor = LightSensor::new(PortBinding::new(port, engine, scl));
        (sensor, bus, gpio)
    }

    fn read_line(sensor: &LightSensor) -> String {
        let mut out = String::new();
        sensor.open().unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_read_renders_raw_sample() {
        let (sensor, bus, _gpio) = light_on(Port::P2);

        bus.set_channel(AdcChannel::In2, 1234);
        assert_eq!(read_line(&sensor), "1234\n");

        bus.set_channel(AdcChannel::In2, 0);
        assert_eq!(read_line(&sensor), "0\n");
    }

    #[test]
    fn test_single_read_then_eof() {
        let (sensor, bus, _gpio) = light_on(Port::P0);
        bus.set_channel(AdcChannel::In0, 42);

        let mut file = sensor.open().unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"42\n");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_second_open_is_busy() {
        let (sensor, _bus, _gpio) = light_on(Port::P1);

        let file = sensor.open().unwrap();
        assert!(matches!(sensor.open(), Err(SensorError::Busy)));
        assert_eq!(sensor.led(), Err(SensorError::Busy));

        drop(file);
        assert_eq!(sensor.led(), Ok(false));
    }

    #[test]
    fn test_led_starts_off_and_follows_the_attribute() {
        let (sensor, _bus, gpio) = light_on(Port::P3);
        let line = Port::P3.scl_line();

        assert_eq!(sensor.led(), Ok(false));
        assert_eq!(gpio.level(line), Some(false));

        sensor.set_led(true).unwrap();
        assert_eq!(sensor.led(), Ok(true));
        assert_eq!(gpio.level(line), Some(true));

        sensor.set_led(false).unwrap();
        assert_eq!(sensor.led(), Ok(false));
        assert_eq!(gpio.level(line), Some(false));
    }

    #[test]
    fn test_failed_led_drive_keeps_the_recorded_state() {
        let (sensor, _bus, gpio) = light_on(Port::P0);
        let line = Port::P0.scl_line();

        gpio.fail_drive(line, -5);
        assert!(matches!(sensor.set_led(true), Err(SensorError::Gpio(_))));
        assert_eq!(sensor.led(), Ok(false));

        gpio.clear_failures();
        sensor.set_led(true).unwrap();
        assert_eq!(sensor.led(), Ok(true));
    }
}
