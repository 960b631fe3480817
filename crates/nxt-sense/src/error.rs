//! Error types for the port registry and sensor instances.

use thiserror::Error;

use nxt_sense_board::GpioError;
use nxt_sense_core::{AdcError, Port};

// ============================================================================
// Port errors
// ============================================================================

/// Errors from attaching, detaching, or resetting a single port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    /// The port already carries a sensor instance
    #[error("port {} already has a sensor attached", .port.index())]
    Occupied {
        /// Port that rejected the operation
        port: Port,
    },

    /// The port is latched in the failed state and needs a reset
    #[error("port {} is in the failed state", .port.index())]
    Failed {
        /// Port that rejected the operation
        port: Port,
    },

    /// Driving the port's SCL line failed
    #[error(transparent)]
    Gpio(#[from] GpioError),

    /// The registry lock is poisoned
    #[error("port registry lock is poisoned")]
    Locked,
}

/// Result type for single-port operations.
pub type PortResult<T> = Result<T, PortError>;

// ============================================================================
// Configuration errors
// ============================================================================

/// Errors from parsing or applying a 4-port configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A sensor-type code outside the known range
    #[error("unknown sensor code {code}")]
    InvalidCode {
        /// Code as given in the request
        code: i32,
    },

    /// The request does not carry exactly one code per port
    #[error("configuration needs exactly {} sensor codes", Port::COUNT)]
    Malformed,

    /// Some ports could not be reconfigured; the rest were applied
    #[error("{} port(s) failed to reconfigure", .failures.len())]
    Partial {
        /// Ports that latched into the failed state, with their causes
        failures: Vec<(Port, PortError)>,
    },

    /// The registry lock is poisoned
    #[error("port registry lock is poisoned")]
    Locked,
}

// ============================================================================
// Sensor errors
// ============================================================================

/// Errors from sensor instance opens, reads, and attribute access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    /// The instance is already open
    #[error("sensor is busy")]
    Busy,

    /// Sampling the bound ADC channel failed
    #[error("sampling failed: {0}")]
    Adc(AdcError),

    /// Driving the port's SCL line failed
    #[error(transparent)]
    Gpio(#[from] GpioError),

    /// The sensor state lock is poisoned
    #[error("sensor state lock is poisoned")]
    Locked,
}

impl From<AdcError> for SensorError {
    fn from(err: AdcError) -> Self {
        Self::Adc(err)
    }
}

/// Result type for sensor instance operations.
pub type SensorResult<T> = Result<T, SensorError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_messages_name_the_port() {
        let occupied = PortError::Occupied { port: Port::P2 };
        assert!(occupied.to_string().contains("port 2"));

        let failed = PortError::Failed { port: Port::P3 };
        assert!(failed.to_string().contains("port 3"));
    }

    #[test]
    fn test_gpio_error_is_transparent() {
        let gpio = GpioError::Drive { line: 73, code: -5 };
        let port: PortError = gpio.into();
        assert_eq!(port.to_string(), gpio.to_string());
    }

    #[test]
    fn test_partial_reports_failure_count() {
        let err = ConfigError::Partial {
            failures: vec![
                (Port::P0, PortError::Failed { port: Port::P0 }),
                (Port::P2, PortError::Failed { port: Port::P2 }),
            ],
        };
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_sensor_error_wraps_adc_error() {
        let err: SensorError = AdcError::NotBound.into();
        assert!(matches!(err, SensorError::Adc(AdcError::NotBound)));
        assert!(err.to_string().contains("sampling failed"));
    }
}
