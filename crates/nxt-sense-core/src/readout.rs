//! Fixed-capacity rendering of sensor readouts
//!
//! Sensor nodes hand exactly one line of text per open, so the payloads
//! are tiny and bounded: a 12-bit sample is at most four digits, a touch
//! state is a single flag. Rendering into a [`heapless::String`] keeps
//! this usable from `no_std` consumers and guarantees the same bytes on
//! every tier.

use core::fmt::Write;

/// One rendered readout line, newline included.
///
/// Six bytes hold any `u16` in decimal plus the trailing newline.
pub type ReadoutLine = heapless::String<6>;

/// Render a sample value as a decimal line, e.g. `"1234\n"`.
#[must_use]
pub fn decimal_line(value: u16) -> ReadoutLine {
    let mut line = ReadoutLine::new();
    let _ = writeln!(line, "{value}");
    line
}

/// Render a boolean state as a flag line, `"1\n"` or `"0\n"`.
#[must_use]
pub fn flag_line(active: bool) -> ReadoutLine {
    let mut line = ReadoutLine::new();
    let _ = writeln!(line, "{}", u8::from(active));
    line
}
