//! Raw per-channel readout nodes.
//!
//! One node per wired ADC channel, independent of the sensor ports. A node
//! readout renders the raw sample as a decimal line and then reports end
//! of file, the same contract the sensor readouts honor. Nodes have no
//! open exclusivity; concurrent readers are serialized at the ADC engine.

use std::io;
use std::sync::Arc;

use nxt_sense_board::AdcEngine;
use nxt_sense_core::readout::decimal_line;
use nxt_sense_core::{AdcChannel, AdcError};

use crate::error::SensorError;

/// A readout node for one ADC channel.
pub struct AdcNode {
    engine: Arc<AdcEngine>,
    channel: AdcChannel,
}

impl AdcNode {
    /// Node reading `channel` through `engine`.
    #[must_use]
    pub fn new(engine: Arc<AdcEngine>, channel: AdcChannel) -> Self {
        Self { engine, channel }
    }

    /// Nodes for every wired channel, in channel order.
    #[must_use]
    pub fn wired(engine: &Arc<AdcEngine>) -> Vec<Self> {
        AdcChannel::ALL[..AdcChannel::WIRED_COUNT]
            .iter()
            .map(|&channel| Self::new(Arc::clone(engine), channel))
            .collect()
    }

    /// Channel this node reads.
    #[must_use]
    pub fn channel(&self) -> AdcChannel {
        self.channel
    }

    /// Sample the channel once.
    pub fn sample(&self) -> Result<u16, AdcError> {
        self.engine.sample_channel(self.channel)
    }

    /// Open a readout. Nodes are not exclusive; each open file carries
    /// its own read-once cursor.
    #[must_use]
    pub fn open(&self) -> AdcFile<'_> {
        AdcFile { node: self, consumed: false }
    }
}

/// An open channel readout.
pub struct AdcFile<'a> {
    node: &'a AdcNode,
    consumed: bool,
}

impl io::Read for AdcFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.consumed {
            return Ok(0);
        }

        let sample = self
            .node
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
