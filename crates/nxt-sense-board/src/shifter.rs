//! Level-shifter registry
//!
//! The two output-enable nets of the U3 bank are shared hardware: the
//! analog sampling path and any future digital sensor path each need a
//! half active, independently of one another. The registry reference
//! counts every use so the GPIO is claimed exactly when the first user
//! arrives and released exactly when the last one leaves.
//!
//! Invariant per slot: the line is claimed if and only if the reference
//! count is positive.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use nxt_sense_core::types::ShifterId;

use crate::gpio::{GpioError, GpioProvider, OutputHandle};

/// Errors from the level-shifter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShifterError {
    /// A numeric tag did not name a known shifter half
    #[error("unknown level shifter tag {tag}")]
    UnknownTag {
        /// The rejected tag value
        tag: u8,
    },
    /// Release was requested for a half with no registered users
    #[error("level shifter {} is not active", .id.label())]
    NotActive {
        /// The half that was not active
        id: ShifterId,
    },
    /// The GPIO claim or drive failed
    #[error(transparent)]
    Gpio(#[from] GpioError),
    /// The registry lock was poisoned by a panicking holder
    #[error("level shifter registry lock poisoned")]
    Locked,
}

/// Reference-counting registry over the U3 level-shifter halves.
///
/// One long-lived instance is shared by every subsystem that needs a
/// half active. Registration on a count of zero claims the output-enable
/// line and drives it low (the shifter outputs enable); the final
/// release gives the line back.
pub struct ShifterBank {
    provider: Arc<dyn GpioProvider>,
    slots: Mutex<[Slot; ShifterId::COUNT]>,
}

#[derive(Default)]
struct Slot {
    handle: Option<Box<dyn OutputHandle>>,
    refs: u32,
}

impl ShifterBank {
    /// Create a registry with both halves inactive.
    #[must_use]
    pub fn new(provider: Arc<dyn GpioProvider>) -> Self {
        Self {
            provider,
            slots: Mutex::new(std::array::from_fn(|_| Slot::default())),
        }
    }

    /// Register one use of a shifter half, activating it on first use.
    ///
    /// A failed claim leaves the count untouched, so a later attempt
    /// starts from a clean slate.
    pub fn register(&self, id: ShifterId) -> Result<(), ShifterError> {
        let mut slots = self.slots.lock().map_err(|_| ShifterError::Locked)?;
        let slot = &mut slots[id.index()];

        if slot.refs == 0 {
            let handle = self
                .provider
                .claim_output(id.gpio_line(), id.label(), false)?;
            slot.handle = Some(handle);
            tracing::info!(line = id.gpio_line(), label = id.label(), "level shifter activated");
        }
        slot.refs += 1;
        Ok(())
    }

    /// Register one use by numeric tag.
    ///
    /// Entry point for callers holding the external tag alphabet; unknown
    /// tags are rejected without touching any state.
    pub fn register_tag(&self, tag: u8) -> Result<(), ShifterError> {
        let id = ShifterId::from_tag(tag).ok_or(ShifterError::UnknownTag { tag })?;
        self.register(id)
    }

    /// Release one use of a shifter half, deactivating it on last use.
    ///
    /// Releasing a half with no registered users reports
    /// [`ShifterError::NotActive`] and performs no GPIO traffic; the
    /// count never goes below zero.
    pub fn release(&self, id: ShifterId) -> Result<(), ShifterError> {
        let mut slots = self.slots.lock().map_err(|_| ShifterError::Locked)?;
        let slot = &mut slots[id.index()];

        if slot.refs == 0 {
            return Err(ShifterError::NotActive { id });
        }
        slot.refs -= 1;
        if slot.refs == 0 {
            slot.handle = None;
            tracing::info!(line = id.gpio_line(), label = id.label(), "level shifter deactivated");
        }
        Ok(())
    }

    /// Release one use by numeric tag.
    pub fn release_tag(&self, tag: u8) -> Result<(), ShifterError> {
        let id = ShifterId::from_tag(tag).ok_or(ShifterError::UnknownTag { tag })?;
        self.release(id)
    }

    /// Current reference count for a half.
    pub fn refs(&self, id: ShifterId) -> Result<u32, ShifterError> {
        let slots = self.slots.lock().map_err(|_| ShifterError::Locked)?;
        let slot = &slots[id.index()];
        debug_assert_eq!(slot.handle.is_some(), slot.refs > 0);
        Ok(slot.refs)
    }

    /// Whether a half is currently active.
    pub fn is_active(&self, id: ShifterId) -> Result<bool, ShifterError> {
        Ok(self.refs(id)? > 0)
    }
}

impl Drop for ShifterBank {
    fn drop(&mut self) {
        if let Ok(slots) = self.slots.get_mut() {
            for (slot, id) in slots.iter().zip(ShifterId::ALL) {
                if slot.refs > 0 {
                    tracing::warn!(
                        label = id.label(),
                        refs = slot.refs,
                        "level shifter still active at registry teardown"
                    );
                }
            }
        }
    }
}

/// Lease on both shifter halves, held while the analog path is in service.
///
/// The sampling path needs the whole bank enabled. Enabling takes one
/// registration on each half; dropping the lease releases both again.
/// A partial failure rolls the first registration back before reporting.
pub struct AnalogPath {
    bank: Arc<ShifterBank>,
}

impl AnalogPath {
    /// Register the analog path's use of both halves.
    pub fn enable(bank: Arc<ShifterBank>) -> Result<Self, ShifterError> {
        bank.register(ShifterId::U31)?;
        if let Err(err) = bank.register(ShifterId::U32) {
            let _ = bank.release(ShifterId::U31);
            return Err(err);
        }
        tracing::info!("analog path enabled");
        Ok(Self { bank })
    }
}

impl Drop for AnalogPath {
    fn drop(&mut self) {
        for id in [ShifterId::U32, ShifterId::U31] {
            if let Err(err) = self.bank.release(id) {
                tracing::warn!(label = id.label(), %err, "analog path release failed at teardown");
            }
        }
    }
}
