//! Textual 4-port configuration words.
//!
//! The configuration attribute speaks four space-separated sensor-type
//! codes, one per port: `0` for none, `1` for touch, `2` for light. A
//! request is parsed and validated as a whole before the registry applies
//! it, so a malformed word never has a partial effect.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use nxt_sense_core::{Port, PortStatus, SensorKind};

use crate::error::ConfigError;

/// Requested sensor population for all four ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Requested kind per port, indexed by port number.
    pub kinds: [SensorKind; Port::COUNT],
}

impl PortConfig {
    /// Configuration with the given kind on every listed port.
    #[must_use]
    pub const fn new(kinds: [SensorKind; Port::COUNT]) -> Self {
        Self { kinds }
    }

    /// Configuration that leaves every port empty.
    #[must_use]
    pub const fn empty() -> Self {
        Self { kinds: [SensorKind::None; Port::COUNT] }
    }

    /// Requested kind for `port`.
    #[must_use]
    pub fn kind(&self, port: Port) -> SensorKind {
        self.kinds[port.index()]
    }

    /// Replace the requested kind for `port`.
    pub fn set(&mut self, port: Port, kind: SensorKind) {
        self.kinds[port.index()] = kind;
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromStr for PortConfig {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut kinds = [SensorKind::None; Port::COUNT];
        let mut count = 0;

        for token in input.split_whitespace() {
            if count == Port::COUNT {
                return Err(ConfigError::Malformed);
            }
            let code: i32 = token.parse().map_err(|_| ConfigError::Malformed)?;
            kinds[count] = u8::try_from(code)
                .ok()
                .and_then(SensorKind::from_code)
                .ok_or(ConfigError::InvalidCode { code })?;
            count += 1;
        }

        if count != Port::COUNT {
            return Err(ConfigError::Malformed);
        }
        Ok(Self { kinds })
    }
}

impl fmt::Display for PortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, kind) in self.kinds.iter().enumerate() {
            if index > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{}", kind.code())?;
        }
        Ok(())
    }
}

/// Render a port status word, one code per port.
///
/// Same shape [`PortConfig`] parses, except that a failed port shows as
/// `-1`, which no request may carry.
#[must_use]
pub fn status_line(status: &[PortStatus; Port::COUNT]) -> String {
    let mut line = String::new();
    for (index, slot) in status.iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        let _ = write!(line, "{}", slot.code());
    }
    line
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_word() {
        let config: PortConfig = "1 0 2 0".parse().unwrap();
        assert_eq!(
            config.kinds,
            [SensorKind::Touch, SensorKind::None, SensorKind::Light, SensorKind::None]
        );
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let config: PortConfig = "  2 \t 0  1   0\n".parse().unwrap();
        assert_eq!(config.kind(Port::P0), SensorKind::Light);
        assert_eq!(config.kind(Port::P2), SensorKind::Touch);
    }

    #[test]
    fn test_parse_rejects_wrong_count() {
        assert_eq!("1 0 2".parse::<PortConfig>(), Err(ConfigError::Malformed));
        assert_eq!("1 0 2 0 1".parse::<PortConfig>(), Err(ConfigError::Malformed));
        assert_eq!("".parse::<PortConfig>(), Err(ConfigError::Malformed));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!("1 x 2 0".parse::<PortConfig>(), Err(ConfigError::Malformed));
    }

    #[test]
    fn test_parse_rejects_out_of_range_codes() {
        assert_eq!(
            "3 0 0 0".parse::<PortConfig>(),
            Err(ConfigError::InvalidCode { code: 3 })
        );
        assert_eq!(
            "0 0 -1 0".parse::<PortConfig>(),
            Err(ConfigError::InvalidCode { code: -1 })
        );
        assert_eq!(
            "0 300 0 0".parse::<PortConfig>(),
            Err(ConfigError::InvalidCode { code: 300 })
        );
    }

    #[test]
    fn test_display_roundtrip() {
        let config: PortConfig = "2 1 0 1".parse().unwrap();
        assert_eq!(config.to_string(), "2 1 0 1");
    }

    #[test]
    fn test_status_line_shows_failed_as_minus_one() {
        let status = [
            PortStatus::Touch,
            PortStatus::Failed,
            PortStatus::Empty,
            PortStatus::Light,
        ];
        assert_eq!(status_line(&status), "1 -1 0 2");
    }

    #[test]
    fn test_set_and_kind() {
        let mut config = PortConfig::empty();
        config.set(Port::P3, SensorKind::Touch);
        assert_eq!(config.kind(Port::P3), SensorKind::Touch);
        assert_eq!(config.kind(Port::P0), SensorKind::None);
    }
}
