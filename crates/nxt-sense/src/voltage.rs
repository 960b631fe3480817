//! Board supply voltage readout.
//!
//! The board routes its supply rail through a divider onto ADC channel 4,
//! the one wired channel without a sensor port. The monitor is a fixed
//! readout node on that channel.

use std::sync::Arc;

use nxt_sense_board::AdcEngine;
use nxt_sense_core::{AdcChannel, AdcError};

use crate::node::{AdcFile, AdcNode};

/// Readout for the board supply voltage.
pub struct VoltageMonitor {
    node: AdcNode,
}

impl VoltageMonitor {
    /// Monitor sampling the voltage channel through `engine`.
    #[must_use]
    pub fn new(engine: Arc<AdcEngine>) -> Self {
        Self {
            node: AdcNode::new(engine, AdcChannel::VOLTAGE),
        }
    }

    /// Sample the voltage channel once.
    pub fn sample(&self) -> Result<u16, AdcError> {
        self.node.sample()
    }

    /// Open a read-once voltage readout.
    #[must_use]
    pub fn open(&self) -> AdcFile<'_> {
        self.node.open()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use nxt_sense_board::sim::SimBus;
    use nxt_sense_core::frame::ADDRESS_SHIFT;

    #[test]
    fn test_monitor_reads_channel_four() {
        let bus = SimBus::new();
        let engine = Arc::new(AdcEngine::new());
        engine.bind(Box::new(bus.clone())).unwrap();
        bus.set_channel(AdcChannel::VOLTAGE, 3301);

        let monitor = VoltageMonitor::new(engine);
        assert_eq!(monitor.sample(), Ok(3301));
        assert_eq!(bus.last_frame().unwrap()[0], 4 << ADDRESS_SHIFT);

        let mut out = String::new();
        monitor.open().read_to_string(&mut out).unwrap();
        assert_eq!(out, "3301\n");
    }
}
