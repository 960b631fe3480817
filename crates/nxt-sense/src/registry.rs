//! The four-port sensor registry.
//!
//! The registry owns one slot per external port. Each slot carries the
//! port's SCL output, claimed once at construction, and the currently
//! attached sensor instance, if any. All slot transitions run under a
//! single registry lock, separate from the ADC engine's lock, so a
//! reconfiguration and a concurrent sample only meet at the engine.
//!
//! A port whose attach or detach fails latches into the failed state and
//! is skipped by batch reconfiguration until an explicit
//! [`PortRegistry::reset_port`] clears it.
//!
//! # Example
//!
//! ```rust,ignore
//! use nxt_sense::{PortConfig, PortRegistry};
//!
//! let registry = PortRegistry::new(engine, &gpio)?;
//! registry.configure(&"1 0 2 0".parse::<PortConfig>()?)?;
//!
//! let touch = registry.sensor(Port::P0)?.unwrap();
//! let mut readout = touch.open()?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use nxt_sense_board::{AdcEngine, GpioError, GpioProvider, SclLine};
use nxt_sense_core::{Port, PortStatus, SclCommand, SensorKind};

use crate::config::PortConfig;
use crate::error::{ConfigError, PortError, PortResult};
use crate::sensor::{LightSensor, PortBinding, Sensor, TouchSensor};

struct PortSlot {
    scl: Arc<SclLine>,
    state: SlotState,
}

enum SlotState {
    Empty,
    Failed,
    Attached(Arc<Sensor>),
}

impl PortSlot {
    fn status(&self) -> PortStatus {
        match &self.state {
            SlotState::Empty => PortStatus::Empty,
            SlotState::Failed => PortStatus::Failed,
            SlotState::Attached(sensor) => PortStatus::from_kind(sensor.kind()),
        }
    }
}

/// Registry of the four external sensor ports.
pub struct PortRegistry {
    engine: Arc<AdcEngine>,
    slots: Mutex<[PortSlot; Port::COUNT]>,
}

impl PortRegistry {
    /// Build the registry, claiming all four SCL lines parked low.
    ///
    /// Claiming is all-or-nothing: if any line is taken, the ones already
    /// claimed are released again and the error is returned.
    pub fn new(engine: Arc<AdcEngine>, provider: &dyn GpioProvider) -> Result<Self, GpioError> {
        let slots = [
            Self::claim_slot(provider, Port::P0)?,
            Self::claim_slot(provider, Port::P1)?,
            Self::claim_slot(provider, Port::P2)?,
            Self::claim_slot(provider, Port::P3)?,
        ];
        tracing::info!("port registry ready, scl lines claimed");
        Ok(Self { engine, slots: Mutex::new(slots) })
    }

    fn claim_slot(provider: &dyn GpioProvider, port: Port) -> Result<PortSlot, GpioError> {
        let scl = Arc::new(SclLine::for_port(provider, port)?);
        Ok(PortSlot { scl, state: SlotState::Empty })
    }

    fn lock(&self) -> Result<MutexGuard<'_, [PortSlot; Port::COUNT]>, PortError> {
        self.slots.lock().map_err(|_| PortError::Locked)
    }

    /// Current status of every port, in port order.
    pub fn status(&self) -> PortResult<[PortStatus; Port::COUNT]> {
        let slots = self.lock()?;
        Ok(std::array::from_fn(|index| slots[index].status()))
    }

    /// Handle to the sensor attached to `port`, if any.
    ///
    /// The handle stays valid after a later detach; it drains once every
    /// clone is dropped.
    pub fn sensor(&self, port: Port) -> PortResult<Option<Arc<Sensor>>> {
        let slots = self.lock()?;
        match &slots[port.index()].state {
            SlotState::Attached(sensor) => Ok(Some(Arc::clone(sensor))),
            SlotState::Empty | SlotState::Failed => Ok(None),
        }
    }

    /// Attach a sensor of `kind` to an empty `port`.
    ///
    /// Attaching [`SensorKind::None`] is a no-op. The port's SCL line is
    /// parked low before the instance is created; a line fault latches the
    /// port into the failed state.
    pub fn attach(&self, port: Port, kind: SensorKind) -> PortResult<()> {
        let mut slots = self.lock()?;
        Self::attach_slot(&self.engine, &mut slots[port.index()], port, kind)
    }

    /// Detach whatever sensor is attached to `port`.
    ///
    /// Detaching an empty port is a no-op; a failed port must be reset
    /// instead. The SCL line is driven low as the defined teardown state,
    /// and a fault there latches the port into the failed state.
    pub fn detach(&self, port: Port) -> PortResult<()> {
        let mut slots = self.lock()?;
        Self::detach_slot(&mut slots[port.index()], port)
    }

    /// Clear `port` from the failed state back to empty.
    ///
    /// The SCL line must accept being parked low again; until it does the
    /// port stays failed. Resetting an empty port is a no-op, resetting an
    /// occupied one is refused.
    pub fn reset_port(&self, port: Port) -> PortResult<()> {
        let mut slots = self.lock()?;
        let slot = &mut slots[port.index()];
        match slot.state {
            SlotState::Attached(_) => Err(PortError::Occupied { port }),
            SlotState::Empty => Ok(()),
            SlotState::Failed => {
                slot.scl.drive(SclCommand::Low)?;
                slot.state = SlotState::Empty;
                tracing::info!(port = port.index(), "port reset from failed state");
                Ok(())
            }
        }
    }

    /// Apply a 4-port configuration as a best-effort batch.
    ///
    /// Ports whose requested kind matches the current one are left alone,
    /// as are ports latched in the failed state. Every other port is
    /// detached and then attached with the requested kind. A failure
    /// latches that port and processing continues with its siblings; the
    /// aggregate is reported as [`ConfigError::Partial`] without rolling
    /// back the ports that did reconfigure.
    pub fn configure(&self, config: &PortConfig) -> Result<(), ConfigError> {
        let mut slots = self.slots.lock().map_err(|_| ConfigError::Locked)?;
        let mut failures = Vec::new();

        for port in Port::ALL {
            let slot = &mut slots[port.index()];
            let current = match &slot.state {
                SlotState::Empty => SensorKind::None,
                SlotState::Attached(sensor) => sensor.kind(),
                SlotState::Failed => continue,
            };
            let requested = config.kind(port);
            if current == requested {
                continue;
            }

            if let Err(err) = Self::detach_slot(slot, port) {
                failures.push((port, err));
                continue;
            }
            if let Err(err) = Self::attach_slot(&self.engine, slot, port, requested) {
                failures.push((port, err));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(failed = failures.len(), "configuration applied partially");
            Err(ConfigError::Partial { failures })
        }
    }

    fn attach_slot(
        engine: &Arc<AdcEngine>,
        slot: &mut PortSlot,
        port: Port,
        kind: SensorKind,
    ) -> PortResult<()> {
        match slot.state {
            SlotState::Attached(_) => return Err(PortError::Occupied { port }),
            SlotState::Failed => return Err(PortError::Failed { port }),
            SlotState::Empty => {}
        }
        if kind == SensorKind::None {
            return Ok(());
        }

        if let Err(err) = slot.scl.drive(SclCommand::Low) {
            slot.state = SlotState::Failed;
            tracing::warn!(port = port.index(), %err, "attach failed, port latched");
            return Err(err.into());
        }

        let binding = PortBinding::new(port, Arc::clone(engine), Arc::clone(&slot.scl));
        let sensor = if kind == SensorKind::Touch {
            Sensor::Touch(TouchSensor::new(binding))
        } else {
            Sensor::Light(LightSensor::new(binding))
        };
        slot.state = SlotState::Attached(Arc::new(sensor));
        tracing::info!(port = port.index(), kind = kind.name(), "sensor attached");
        Ok(())
    }

    fn detach_slot(slot: &mut PortSlot, port: Port) -> PortResult<()> {
        match slot.state {
            SlotState::Empty => Ok(()),
            SlotState::Failed => Err(PortError::Failed { port }),
            SlotState::Attached(_) => {
                if let Err(err) = slot.scl.drive(SclCommand::Low) {
                    slot.state = SlotState::Failed;
                    tracing::warn!(port = port.index(), %err, "detach failed, port latched");
                    return Err(err.into());
                }
                slot.state = SlotState::Empty;
                tracing::info!(port = port.index(), "sensor detached");
                Ok(())
            }
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

    fn registry() -> (PortRegistry, SimBus, SimGpio) {
        let bus = SimBus::new();
        let engine = Arc::new(AdcEngine::new());
        engine.bind(Box::new(bus.clone())).unwrap();

        let gpio = SimGpio::new();
        let registry = PortRegistry::new(engine, &gpio).unwrap();
        (registry, bus, gpio)
    }

    fn config(word: &str) -> PortConfig {
        word.parse().unwrap()
    }

    #[test]
    fn test_new_claims_all_scl_lines_parked_low() {
        let (_registry, _bus, gpio) = registry();

        for port in Port::ALL {
            assert!(gpio.is_claimed(port.scl_line()));
            assert_eq!(gpio.level(port.scl_line()), Some(false));
            assert_eq!(gpio.label(port.scl_line()), Some(port.scl_label()));
        }
    }

    #[test]
    fn test_new_rolls_back_on_claim_failure() {
        let gpio = SimGpio::new();
        gpio.fail_claim(Port::P2.scl_line(), -16);

        let engine = Arc::new(AdcEngine::new());
        assert!(PortRegistry::new(engine, &gpio).is_err());

        for port in Port::ALL {
            assert!(!gpio.is_claimed(port.scl_line()));
        }
    }

    #[test]
    fn test_attach_detach_roundtrip() {
        let (registry, _bus, _gpio) = registry();

        registry.attach(Port::P1, SensorKind::Touch).unwrap();
        assert_eq!(
            registry.status().unwrap(),
            [PortStatus::Empty, PortStatus::Touch, PortStatus::Empty, PortStatus::Empty]
        );

        registry.detach(Port::P1).unwrap();
        assert_eq!(registry.status().unwrap(), [PortStatus::Empty; Port::COUNT]);
    }

    #[test]
    fn test_attach_occupied_port_is_refused() {
        let (registry, _bus, _gpio) = registry();

        registry.attach(Port::P0, SensorKind::Light).unwrap();
        assert_eq!(
            registry.attach(Port::P0, SensorKind::Touch),
            Err(PortError::Occupied { port: Port::P0 })
        );
    }

    #[test]
    fn test_attach_none_is_a_noop() {
        let (registry, _bus, gpio) = registry();
        let before = gpio.events().len();

        registry.attach(Port::P3, SensorKind::None).unwrap();
        assert_eq!(registry.status().unwrap()[3], PortStatus::Empty);
        assert_eq!(gpio.events().len(), before);
    }

    #[test]
    fn test_detach_empty_port_is_a_noop() {
        let (registry, _bus, _gpio) = registry();
        registry.detach(Port::P2).unwrap();
    }

    #[test]
    fn test_configure_applies_a_mixed_batch() {
        let (registry, _bus, _gpio) = registry();

        registry.configure(&config("1 0 2 0")).unwrap();
        assert_eq!(
            registry.status().unwrap(),
            [PortStatus::Touch, PortStatus::Empty, PortStatus::Light, PortStatus::Empty]
        );

        let touch = registry.sensor(Port::P0).unwrap().unwrap();
        assert_eq!(touch.kind(), SensorKind::Touch);
        let light = registry.sensor(Port::P2).unwrap().unwrap();
        assert_eq!(light.kind(), SensorKind::Light);
        assert!(registry.sensor(Port::P1).unwrap().is_none());
    }

    #[test]
    fn test_configure_twice_does_no_work_the_second_time() {
        let (registry, _bus, gpio) = registry();

        registry.configure(&config("1 2 0 1")).unwrap();
        let events_after_first = gpio.events().len();

        registry.configure(&config("1 2 0 1")).unwrap();
        assert_eq!(gpio.events().len(), events_after_first);
    }

    #[test]
    fn test_configure_swaps_sensor_kinds() {
        let (registry, _bus, _gpio) = registry();

        registry.configure(&config("2 0 0 0")).unwrap();
        registry.configure(&config("1 0 0 0")).unwrap();

        let sensor = registry.sensor(Port::P0).unwrap().unwrap();
        assert_eq!(sensor.kind(), SensorKind::Touch);
    }

    #[test]
    fn test_failed_attach_latches_the_port() {
        let (registry, _bus, gpio) = registry();
        gpio.fail_drive(Port::P0.scl_line(), -5);

        assert!(matches!(
            registry.attach(Port::P0, SensorKind::Touch),
            Err(PortError::Gpio(_))
        ));
        assert_eq!(registry.status().unwrap()[0], PortStatus::Failed);

        // Latched ports refuse further attaches until reset.
        gpio.clear_failures();
        assert_eq!(
            registry.attach(Port::P0, SensorKind::Touch),
            Err(PortError::Failed { port: Port::P0 })
        );
    }

    #[test]
    fn test_failed_detach_latches_and_drops_the_instance() {
        let (registry, _bus, gpio) = registry();

        registry.attach(Port::P1, SensorKind::Light).unwrap();
        gpio.fail_drive(Port::P1.scl_line(), -5);

        assert!(registry.detach(Port::P1).is_err());
        assert_eq!(registry.status().unwrap()[1], PortStatus::Failed);
        assert!(registry.sensor(Port::P1).unwrap().is_none());
    }

    #[test]
    fn test_configure_skips_failed_ports() {
        let (registry, _bus, gpio) = registry();

        gpio.fail_drive(Port::P0.scl_line(), -5);
        let _ = registry.attach(Port::P0, SensorKind::Touch);
        gpio.clear_failures();

        registry.configure(&config("1 1 0 0")).unwrap();
        assert_eq!(
            registry.status().unwrap(),
            [PortStatus::Failed, PortStatus::Touch, PortStatus::Empty, PortStatus::Empty]
        );
    }

    #[test]
    fn test_configure_reports_partial_failure_and_keeps_going() {
        let (registry, _bus, gpio) = registry();
        gpio.fail_drive(Port::P1.scl_line(), -5);

        let err = registry.configure(&config("1 1 1 0")).unwrap_err();
        match err {
            ConfigError::Partial { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, Port::P1);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }

        // Siblings were still applied.
        let status = registry.status().unwrap();
        assert_eq!(status[0], PortStatus::Touch);
        assert_eq!(status[1], PortStatus::Failed);
        assert_eq!(status[2], PortStatus::Touch);
    }

    #[test]
    fn test_reset_clears_only_failed_ports() {
        let (registry, _bus, gpio) = registry();

        gpio.fail_drive(Port::P2.scl_line(), -5);
        let _ = registry.attach(Port::P2, SensorKind::Touch);
        assert_eq!(registry.status().unwrap()[2], PortStatus::Failed);

        // The line still faults, so the reset does not take.
        assert!(registry.reset_port(Port::P2).is_err());
        assert_eq!(registry.status().unwrap()[2], PortStatus::Failed);

        gpio.clear_failures();
        registry.reset_port(Port::P2).unwrap();
        assert_eq!(registry.status().unwrap()[2], PortStatus::Empty);

        registry.attach(Port::P2, SensorKind::Light).unwrap();
        assert_eq!(
            registry.reset_port(Port::P2),
            Err(PortError::Occupied { port: Port::P2 })
        );

        registry.reset_port(Port::P3).unwrap();
    }

    #[test]
    fn test_touch_end_to_end_with_single_open() {
        let (registry, bus, _gpio) = registry();
        bus.set_channel(AdcChannel::In0, 100);

        registry.configure(&config("1 0 0 0")).unwrap();
        let touch = registry.sensor(Port::P0).unwrap().unwrap();

        let mut file = touch.open().unwrap();
        assert!(matches!(touch.open(), Err(crate::SensorError::Busy)));

        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        assert_eq!(out, "1\n");
        drop(file);

        bus.set_channel(AdcChannel::In0, 3000);
        let mut out = String::new();
        touch.open().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "0\n");
    }

    #[test]
    fn test_light_cycle_returns_the_port_to_empty() {
        let (registry, _bus, gpio) = registry();

        registry.configure(&config("2 0 0 0")).unwrap();
        let light = registry.sensor(Port::P0).unwrap().unwrap();
        match light.as_ref() {
            Sensor::Light(sensor) => sensor.set_led(true).unwrap(),
            Sensor::Touch(_) => panic!("expected a light sensor"),
        }
        assert_eq!(gpio.level(Port::P0.scl_line()), Some(true));

        registry.configure(&config("0 0 0 0")).unwrap();
        assert_eq!(registry.status().unwrap()[0], PortStatus::Empty);
        assert_eq!(gpio.level(Port::P0.scl_line()), Some(false));
    }

    #[test]
    fn test_unbound_engine_fails_every_read_without_blocking() {
        let engine = Arc::new(AdcEngine::new());
        let gpio = SimGpio::new();
        let registry = PortRegistry::new(Arc::clone(&engine), &gpio).unwrap();

        registry.attach(Port::P0, SensorKind::Touch).unwrap();
        let sensor = registry.sensor(Port::P0).unwrap().unwrap();

        for _ in 0..3 {
            let mut buf = [0u8; 8];
            assert!(sensor.open().unwrap().read(&mut buf).is_err());
        }
    }

    #[test]
    fn test_sensor_handle_survives_detach() {
        let (registry, bus, _gpio) = registry();
        bus.set_channel(AdcChannel::In0, 77);

        registry.configure(&config("2 0 0 0")).unwrap();
        let sensor = registry.sensor(Port::P0).unwrap().unwrap();

        registry.detach(Port::P0).unwrap();
        assert!(registry.sensor(Port::P0).unwrap().is_none());

        let mut out = String::new();
        sensor.open().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "77\n");
    }
}
