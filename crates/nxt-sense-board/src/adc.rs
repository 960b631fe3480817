//! ADC transaction engine
//!
//! All sampling on the board funnels through one [`AdcEngine`] instance.
//! The engine owns the transmit and receive buffers together with the
//! bound bus peripheral behind a single mutex, so concurrent callers
//! serialize and an exchange never sees a half-written buffer.
//!
//! The peripheral is hot-pluggable: bus probe binds it, bus removal
//! unbinds it, and every sample request re-checks the binding before it
//! touches the bus.

use std::sync::Mutex;

use nxt_sense_core::error::AdcError;
use nxt_sense_core::frame::{command_frame, parse_sample, FRAME_LEN};
use nxt_sense_core::types::AdcChannel;

use crate::transport::AdcTransport;

/// Mutex-serialized transaction engine for the board ADC.
///
/// One long-lived instance is constructed at startup and shared by
/// reference with every sampling collaborator.
pub struct AdcEngine {
    inner: Mutex<EngineInner>,
}

struct EngineInner {
    transport: Option<Box<dyn AdcTransport>>,
    tx: [u8; FRAME_LEN],
    rx: [u8; FRAME_LEN],
}

impl AdcEngine {
    /// Create an engine with no bus peripheral bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                transport: None,
                tx: [0; FRAME_LEN],
                rx: [0; FRAME_LEN],
            }),
        }
    }

    /// Bind the bus peripheral, replacing any previous binding.
    ///
    /// Called from the bus-probe path; also the way tests and the
    /// simulator hand their transport to the engine.
    pub fn bind(&self, transport: Box<dyn AdcTransport>) -> Result<(), AdcError> {
        let mut inner = self.inner.lock().map_err(|_| AdcError::Locked)?;
        if inner.transport.is_some() {
            tracing::warn!("replacing an already bound ADC bus peripheral");
        }
        inner.transport = Some(transport);
        tracing::info!("ADC bus peripheral bound");
        Ok(())
    }

    /// Drop the bus peripheral binding.
    ///
    /// Called from the bus-removal path. Sampling keeps failing cleanly
    /// with [`AdcError::NotBound`] until a new peripheral is bound.
    pub fn unbind(&self) -> Result<(), AdcError> {
        let mut inner = self.inner.lock().map_err(|_| AdcError::Locked)?;
        if inner.transport.take().is_some() {
            tracing::info!("ADC bus peripheral unbound");
        }
        Ok(())
    }

    /// Whether a bus peripheral is currently bound.
    pub fn is_bound(&self) -> Result<bool, AdcError> {
        let inner = self.inner.lock().map_err(|_| AdcError::Locked)?;
        Ok(inner.transport.is_some())
    }

    /// Sample one converter channel by number.
    ///
    /// Blocks on the engine mutex, so callers serialize here. Channel
    /// numbers above 7 address channel 0; longstanding callers rely on
    /// that fallback, so it is part of the contract.
    pub fn sample(&self, channel: u8) -> Result<u16, AdcError> {
        let mut inner = self.inner.lock().map_err(|_| AdcError::Locked)?;
        let EngineInner { transport, tx, rx } = &mut *inner;

        let Some(transport) = transport.as_mut() else {
            tracing::warn!(channel, "sample request with no bus peripheral bound");
            return Err(AdcError::NotBound);
        };
        if !transport.controller_present() {
            tracing::warn!(channel, "bound bus peripheral has no controller");
            return Err(AdcError::NoController);
        }

        let selected = AdcChannel::from_number(channel).unwrap_or(AdcChannel::In0);
        *tx = command_frame(selected);
        *rx = [0; FRAME_LEN];

        transport
            .exchange(tx, rx)
            .map_err(|fault| AdcError::Transfer { code: fault.code })?;

        let value = parse_sample(rx);
        tracing::trace!(channel = selected.number(), value, "sampled");
        Ok(value)
    }

    /// Sample one converter channel by typed identifier.
    pub fn sample_channel(&self, channel: AdcChannel) -> Result<u16, AdcError> {
        self.sample(channel.number())
    }
}

impl Default for AdcEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBus;
    use crate::transport::TransferFault;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_sample_without_binding_fails() {
        let engine = AdcEngine::new();
        for channel in 0..8 {
            assert_eq!(engine.sample(channel), Err(AdcError::NotBound));
        }
    }

    #[test]
    fn test_sample_after_unbind_fails() {
        let engine = AdcEngine::new();
        engine.bind(Box::new(SimBus::new())).unwrap();
        assert!(engine.sample(0).is_ok());

        engine.unbind().unwrap();
        assert_eq!(engine.sample(0), Err(AdcError::NotBound));
        assert_eq!(engine.is_bound(), Ok(false));
    }

    #[test]
    fn test_sample_addresses_requested_channel() {
        let bus = SimBus::new();
        for channel in AdcChannel::ALL {
            bus.set_channel(channel, 100 + u16::from(channel.number()));
        }

        let engine = AdcEngine::new();
        engine.bind(Box::new(bus.clone())).unwrap();

        for channel in AdcChannel::ALL {
            let value = engine.sample(channel.number()).unwrap();
            assert_eq!(value, 100 + u16::from(channel.number()));
            assert_eq!(bus.last_frame(), Some(command_frame(channel)));
        }
    }

    #[test]
    fn test_out_of_range_channel_falls_back_to_zero() {
        let bus = SimBus::new();
        bus.set_channel(AdcChannel::In0, 1234);

        let engine = AdcEngine::new();
        engine.bind(Box::new(bus.clone())).unwrap();

        for bogus in [8, 9, 99, u8::MAX] {
            assert_eq!(engine.sample(bogus), Ok(1234));
            assert_eq!(bus.last_frame(), Some([0, 0, 0, 0]));
        }
    }

    #[test]
    fn test_controller_loss_is_distinguished() {
        let bus = SimBus::new();
        let engine = AdcEngine::new();
        engine.bind(Box::new(bus.clone())).unwrap();

        bus.set_controller_present(false);
        assert_eq!(engine.sample(0), Err(AdcError::NoController));

        bus.set_controller_present(true);
        assert!(engine.sample(0).is_ok());
    }

    #[test]
    fn test_transfer_fault_code_is_forwarded() {
        let bus = SimBus::new();
        let engine = AdcEngine::new();
        engine.bind(Box::new(bus.clone())).unwrap();

        bus.inject_fault(-71);
        assert_eq!(engine.sample(3), Err(AdcError::Transfer { code: -71 }));

        // Faults are one-shot; the next exchange succeeds.
        assert!(engine.sample(3).is_ok());
    }

    #[test]
    fn test_rebind_replaces_peripheral() {
        let first = SimBus::new();
        first.set_channel(AdcChannel::In1, 11);
        let second = SimBus::new();
        second.set_channel(AdcChannel::In1, 22);

        let engine = AdcEngine::new();
        engine.bind(Box::new(first)).unwrap();
        assert_eq!(engine.sample(1), Ok(11));

        engine.bind(Box::new(second)).unwrap();
        assert_eq!(engine.sample(1), Ok(22));
    }

    /// Transport that detects overlapping exchanges.
    struct ReentryDetector {
        busy: Arc<AtomicBool>,
        overlaps: Arc<AtomicUsize>,
    }

    impl AdcTransport for ReentryDetector {
        fn exchange(
            &mut self,
            _tx: &[u8; FRAME_LEN],
            rx: &mut [u8; FRAME_LEN],
        ) -> Result<(), TransferFault> {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(2));
            rx[2] = 0x01;
            rx[3] = 0x02;
            self.busy.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_concurrent_samples_never_interleave() {
        let overlaps = Arc::new(AtomicUsize::new(0));
        let detector = ReentryDetector {
            busy: Arc::new(AtomicBool::new(false)),
            overlaps: Arc::clone(&overlaps),
        };

        let engine = Arc::new(AdcEngine::new());
        engine.bind(Box::new(detector)).unwrap();

        let mut workers = Vec::new();
        for worker in 0u8..4 {
            let engine = Arc::clone(&engine);
            workers.push(thread::spawn(move || {
                for _ in 0..5 {
                    assert_eq!(engine.sample(worker), Ok(0x0102));
                }
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
