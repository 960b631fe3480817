//! SPI frame codec for the board ADC
//!
//! Every conversion is one fixed-length full-duplex exchange: the first
//! transmitted byte addresses the input channel, the remaining bytes clock
//! the conversion out of the chip. The 12-bit result arrives in the last
//! two response bytes, high byte first.
//!
//! Frame layout (4 bytes each direction):
//!
//! ```text
//! tx: [ channel << 3 | 0x00 | 0x00 | 0x00 ]
//! rx: [   ----       |  --  |  hi  |  lo  ]
//! ```
//!
//! The codec is pure and allocation free; bus access lives in the board
//! tier behind the transport seam.

use crate::types::AdcChannel;

/// Length in bytes of one exchange, each direction
pub const FRAME_LEN: usize = 4;

/// Bit position of the channel address within the command byte
pub const ADDRESS_SHIFT: u8 = 3;

/// Largest sample the 12-bit converter can report
pub const SAMPLE_MAX: u16 = (1 << 12) - 1;

/// Offset of the high sample byte in a response frame
const SAMPLE_HI: usize = 2;

/// Offset of the low sample byte in a response frame
const SAMPLE_LO: usize = 3;

/// SPI clock ceiling for the converter, in hertz
pub const SPI_MAX_HZ: u32 = 3_000_000;

/// SPI word size in bits
pub const SPI_BITS_PER_WORD: u8 = 8;

/// SPI mode (CPOL = 0, CPHA = 0)
pub const SPI_MODE: u8 = 0;

/// Build the transmit frame addressing `channel`.
///
/// Only the first byte carries information; the trailing bytes are zero
/// padding that clocks the conversion result out of the chip.
#[inline]
#[must_use]
pub const fn command_frame(channel: AdcChannel) -> [u8; FRAME_LEN] {
    [channel.number() << ADDRESS_SHIFT, 0, 0, 0]
}

/// Extract the sample value from a response frame.
///
/// The converter leaves the first two response bytes undefined; the
/// sample is the big-endian composition of bytes 2 and 3.
#[inline]
#[must_use]
pub const fn parse_sample(frame: &[u8; FRAME_LEN]) -> u16 {
    ((frame[SAMPLE_HI] as u16) << 8) | (frame[SAMPLE_LO] as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_frame_addresses() {
        for channel in AdcChannel::ALL {
            let frame = command_frame(channel);
            assert_eq!(frame[0], channel.number() << 3);
            assert_eq!(&frame[1..], &[0, 0, 0]);
        }
    }

    #[test]
    fn test_command_frame_channel_7() {
        // Highest address must still fit in the command byte.
        assert_eq!(command_frame(AdcChannel::In7)[0], 0x38);
    }

    #[test]
    fn test_parse_sample_big_endian() {
        assert_eq!(parse_sample(&[0x00, 0x00, 0x0A, 0x3C]), 0x0A3C);
        assert_eq!(parse_sample(&[0x00, 0x00, 0x00, 0x01]), 1);
        assert_eq!(parse_sample(&[0x00, 0x00, 0x01, 0x00]), 256);
    }

    #[test]
    fn test_parse_sample_ignores_leading_bytes() {
        assert_eq!(
            parse_sample(&[0xFF, 0xFF, 0x02, 0x9A]),
            parse_sample(&[0x00, 0x00, 0x02, 0x9A]),
        );
    }

    #[test]
    fn test_sample_max_is_12_bit() {
        assert_eq!(SAMPLE_MAX, 4095);
        assert_eq!(parse_sample(&[0, 0, 0x0F, 0xFF]), SAMPLE_MAX);
    }
}
