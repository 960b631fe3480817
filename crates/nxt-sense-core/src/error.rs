//! Sampling error taxonomy shared across tiers
//!
//! The ADC engine reports every failure mode a sample request can hit.
//! The variants mirror the stages of a request: a peripheral must be
//! bound, its controller must still be present, and the exchange itself
//! must complete. Transport-level faults forward the underlying bus code
//! so callers can log the cause without the core depending on any
//! particular bus implementation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors from the ADC transaction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdcError {
    /// No bus peripheral is currently bound to the engine
    NotBound,
    /// A peripheral is bound but its bus controller is gone
    NoController,
    /// The full-duplex exchange failed
    Transfer {
        /// Fault code forwarded from the bus layer
        code: i32,
    },
    /// The engine lock was poisoned by a panicking holder
    Locked,
}

impl fmt::Display for AdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBound => write!(f, "no ADC peripheral bound to the bus"),
            Self::NoController => write!(f, "bound ADC peripheral has no bus controller"),
            Self::Transfer { code } => write!(f, "ADC transfer failed with bus code {code}"),
            Self::Locked => write!(f, "ADC engine lock poisoned"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AdcError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotBound => defmt::write!(f, "NotBound"),
            Self::NoController => defmt::write!(f, "NoController"),
            Self::Transfer { code } => defmt::write!(f, "Transfer(code={})", code),
            Self::Locked => defmt::write!(f, "Locked"),
        }
    }
}
