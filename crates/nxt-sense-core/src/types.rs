//! Core identifiers for the GumstixNXT sensor board
//!
//! This module provides the fixed board vocabulary used across all tiers:
//! - ADC input channels of the 8-channel converter
//! - Sensor ports and their static channel / SCL pin routing
//! - Level-shifter tags with their GPIO assignments
//! - Sensor kinds and the numeric port-configuration alphabet
//!
//! All pin numbers and labels mirror the board schematic and never change
//! at runtime; they are exposed as `const fn` accessors on the identifier
//! types rather than free-floating magic numbers.

use serde::{Deserialize, Serialize};

// ============================================================================
// ADC Channels
// ============================================================================

/// Input channel of the board ADC.
///
/// The converter multiplexes eight analog inputs. Inputs 0 through 3 are
/// routed to the four sensor ports, input 4 measures the battery voltage
/// divider, and inputs 5 through 7 are addressable but not wired on the
/// current board revision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AdcChannel {
    /// Analog input 0 (sensor port 0)
    In0 = 0,
    /// Analog input 1 (sensor port 1)
    In1 = 1,
    /// Analog input 2 (sensor port 2)
    In2 = 2,
    /// Analog input 3 (sensor port 3)
    In3 = 3,
    /// Analog input 4 (battery voltage divider)
    In4 = 4,
    /// Analog input 5 (not wired)
    In5 = 5,
    /// Analog input 6 (not wired)
    In6 = 6,
    /// Analog input 7 (not wired)
    In7 = 7,
}

impl AdcChannel {
    /// All channels in order
    pub const ALL: [Self; 8] = [
        Self::In0, Self::In1, Self::In2, Self::In3,
        Self::In4, Self::In5, Self::In6, Self::In7,
    ];

    /// Number of addressable channels
    pub const COUNT: usize = 8;

    /// Number of channels actually wired on the board (ports 0-3 + voltage)
    pub const WIRED_COUNT: usize = 5;

    /// Channel measuring the battery voltage divider
    pub const VOLTAGE: Self = Self::In4;

    /// Get the channel number (0-7)
    #[inline]
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Get the array index for this channel
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Get channel from its number (returns None if out of range)
    #[inline]
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            0 => Some(Self::In0),
            1 => Some(Self::In1),
            2 => Some(Self::In2),
            3 => Some(Self::In3),
            4 => Some(Self::In4),
            5 => Some(Self::In5),
            6 => Some(Self::In6),
            7 => Some(Self::In7),
            _ => None,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AdcChannel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "in{}", self.number());
    }
}

// ============================================================================
// Sensor Ports
// ============================================================================

/// One of the four NXT sensor ports on the board.
///
/// Each port carries one analog line routed to the ADC input of the same
/// number, and one digital SCL line used by sensors that take a control
/// signal (the light sensor floodlight, future digital sensors).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Port {
    /// Sensor port 0
    P0 = 0,
    /// Sensor port 1
    P1 = 1,
    /// Sensor port 2
    P2 = 2,
    /// Sensor port 3
    P3 = 3,
}

impl Port {
    /// All ports in order
    pub const ALL: [Self; 4] = [Self::P0, Self::P1, Self::P2, Self::P3];

    /// Number of sensor ports
    pub const COUNT: usize = 4;

    /// Get the array index for this port
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Get port from index (returns None if out of range)
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::P0),
            1 => Some(Self::P1),
            2 => Some(Self::P2),
            3 => Some(Self::P3),
            _ => None,
        }
    }

    /// ADC input carrying this port's analog line.
    ///
    /// The routing is one-to-one: port N feeds converter input N.
    #[inline]
    #[must_use]
    pub const fn adc_channel(self) -> AdcChannel {
        match self {
            Self::P0 => AdcChannel::In0,
            Self::P1 => AdcChannel::In1,
            Self::P2 => AdcChannel::In2,
            Self::P3 => AdcChannel::In3,
        }
    }

    /// GPIO line driving this port's SCL pin.
    ///
    /// The assignment is fixed by the board layout and intentionally not
    /// monotonic in the port number.
    #[inline]
    #[must_use]
    pub const fn scl_line(self) -> u32 {
        match self {
            Self::P0 => 73,
            Self::P1 => 75,
            Self::P2 => 72,
            Self::P3 => 74,
        }
    }

    /// Request label for this port's SCL line
    #[inline]
    #[must_use]
    pub const fn scl_label(self) -> &'static str {
        match self {
            Self::P0 => "SCL0",
            Self::P1 => "SCL1",
            Self::P2 => "SCL2",
            Self::P3 => "SCL3",
        }
    }

    /// Human-readable port name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P0 => "port0",
            Self::P1 => "port1",
            Self::P2 => "port2",
            Self::P3 => "port3",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Port {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name());
    }
}

// ============================================================================
// Level-Shifter Tags
// ============================================================================

/// Tag identifying one half of the U3 level-shifter bank.
///
/// The bank sits between the 1.8 V SoC pins and the 5 V sensor side; each
/// half has its own active-low output-enable net driven by a dedicated
/// GPIO. Several subsystems share a half, so activation is reference
/// counted by the shifter registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShifterId {
    /// First half of the bank (net `U3_1OE`, GPIO 10)
    U31 = 0,
    /// Second half of the bank (net `U3_2OE`, GPIO 71)
    U32 = 1,
}

impl ShifterId {
    /// All shifter tags in order
    pub const ALL: [Self; 2] = [Self::U31, Self::U32];

    /// Number of level-shifter halves
    pub const COUNT: usize = 2;

    /// Get the numeric tag (0 or 1)
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Get the array index for this tag
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Get shifter from its numeric tag (returns None if unknown)
    #[inline]
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::U31),
            1 => Some(Self::U32),
            _ => None,
        }
    }

    /// GPIO line driving this half's output-enable net
    #[inline]
    #[must_use]
    pub const fn gpio_line(self) -> u32 {
        match self {
            Self::U31 => 10,
            Self::U32 => 71,
        }
    }

    /// Request label for the output-enable line
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::U31 => "LS_U3_1OE",
            Self::U32 => "LS_U3_2OE",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ShifterId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.label());
    }
}

// ============================================================================
// Sensor Kinds and Port Status
// ============================================================================

/// Kind of sensor a port can be configured with.
///
/// The numeric codes form the external configuration alphabet: a port
/// configuration is written as four space-separated codes, one per port.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SensorKind {
    /// Nothing attached
    None = 0,
    /// NXT touch sensor (pressed pulls the analog line low)
    Touch = 1,
    /// NXT light sensor (photocell plus floodlight LED on SCL)
    Light = 2,
}

impl SensorKind {
    /// All sensor kinds in order
    pub const ALL: [Self; 3] = [Self::None, Self::Touch, Self::Light];

    /// Number of sensor kinds
    pub const COUNT: usize = 3;

    /// Get the configuration code for this kind
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Get kind from a configuration code (returns None if unknown)
    #[inline]
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Touch),
            2 => Some(Self::Light),
            _ => None,
        }
    }

    /// Human-readable kind name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Touch => "touch",
            Self::Light => "light",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorKind {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name());
    }
}

/// Observable state of a sensor port.
///
/// Extends [`SensorKind`] with the out-of-service state a port enters when
/// wiring a sensor fails. `Failed` is reported as code `-1` and is never
/// accepted as requested input; it clears only through an administrative
/// reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortStatus {
    /// No sensor attached
    Empty,
    /// Touch sensor attached and serviceable
    Touch,
    /// Light sensor attached and serviceable
    Light,
    /// Port is out of service after a failed attach or detach
    Failed,
}

impl PortStatus {
    /// Get the status code (`-1` for a failed port)
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Empty => 0,
            Self::Touch => 1,
            Self::Light => 2,
            Self::Failed => -1,
        }
    }

    /// Status corresponding to a configured sensor kind
    #[inline]
    #[must_use]
    pub const fn from_kind(kind: SensorKind) -> Self {
        match kind {
            SensorKind::None => Self::Empty,
            SensorKind::Touch => Self::Touch,
            SensorKind::Light => Self::Light,
        }
    }

    /// The attached sensor kind, if the port is serviceable
    #[inline]
    #[must_use]
    pub const fn kind(self) -> Option<SensorKind> {
        match self {
            Self::Empty => Some(SensorKind::None),
            Self::Touch => Some(SensorKind::Touch),
            Self::Light => Some(SensorKind::Light),
            Self::Failed => None,
        }
    }

    /// Whether the port is out of service
    #[inline]
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Human-readable status name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "none",
            Self::Touch => "touch",
            Self::Light => "light",
            Self::Failed => "failed",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PortStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name());
    }
}

// ============================================================================
// SCL Commands
// ============================================================================

/// Command for a port's SCL line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SclCommand {
    /// Drive the line low
    Low,
    /// Drive the line high
    High,
    /// Flip the last driven level
    Toggle,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SclCommand {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Low => defmt::write!(f, "low"),
            Self::High => defmt::write!(f, "high"),
            Self::Toggle => defmt::write!(f, "toggle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_numbers_match_indices() {
        for (i, ch) in AdcChannel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
            assert_eq!(AdcChannel::from_number(ch.number()), Some(*ch));
        }
        assert_eq!(AdcChannel::from_number(8), None);
        assert_eq!(AdcChannel::from_number(255), None);
    }

    #[test]
    fn test_voltage_channel_is_input_4() {
        assert_eq!(AdcChannel::VOLTAGE, AdcChannel::In4);
        assert!(AdcChannel::VOLTAGE.index() < AdcChannel::WIRED_COUNT);
    }

    #[test]
    fn test_port_routing_is_one_to_one() {
        for port in Port::ALL {
            assert_eq!(port.adc_channel().index(), port.index());
        }
    }

    #[test]
    fn test_port_scl_lines_are_distinct() {
        let lines = [
            Port::P0.scl_line(),
            Port::P1.scl_line(),
            Port::P2.scl_line(),
            Port::P3.scl_line(),
        ];
        for (i, a) in lines.iter().enumerate() {
            for b in &lines[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_shifter_tags_roundtrip() {
        for shifter in ShifterId::ALL {
            assert_eq!(ShifterId::from_tag(shifter.tag()), Some(shifter));
        }
        assert_eq!(ShifterId::from_tag(2), None);
    }

    #[test]
    fn test_shifter_gpio_assignment() {
        assert_eq!(ShifterId::U31.gpio_line(), 10);
        assert_eq!(ShifterId::U32.gpio_line(), 71);
        assert_eq!(ShifterId::U31.label(), "LS_U3_1OE");
        assert_eq!(ShifterId::U32.label(), "LS_U3_2OE");
    }

    #[test]
    fn test_sensor_codes_roundtrip() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(SensorKind::from_code(3), None);
    }

    #[test]
    fn test_port_status_codes() {
        assert_eq!(PortStatus::Empty.code(), 0);
        assert_eq!(PortStatus::Touch.code(), 1);
        assert_eq!(PortStatus::Light.code(), 2);
        assert_eq!(PortStatus::Failed.code(), -1);
        assert_eq!(PortStatus::Failed.kind(), None);
        assert_eq!(PortStatus::from_kind(SensorKind::Light), PortStatus::Light);
    }
}
