//! Observability trait for inspecting component state.
//!
//! Memory subsystems expose their banking state (configuration index, video
//! bank, port and MMU registers) for debugging. Queries never affect
//! emulation state.

use std::fmt;

/// A dynamically-typed value for state queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    String(String),
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::U64(v as u64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a specific property by dotted path, e.g. `port.data` or
    /// `memory.$D000`. Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// List all available query paths.
    fn query_paths(&self) -> &'static [&'static str];
}

/// Parse the address part of a `memory.<address>` query.
///
/// Accepts `$D000`, `0xD000` and plain decimal.
#[must_use]
pub fn parse_address(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_forms() {
        assert_eq!(parse_address("$D000"), Some(0xD000));
        assert_eq!(parse_address("0xff00"), Some(0xFF00));
        assert_eq!(parse_address("53280"), Some(0xD020));
        assert_eq!(parse_address("$F60000"), Some(0xF6_0000));
        assert_eq!(parse_address("zz"), None);
    }

    #[test]
    fn display_is_hex_for_registers() {
        assert_eq!(Value::U8(0x37).to_string(), "0x37");
        assert_eq!(Value::U16(0xA000).to_string(), "0xA000");
        assert_eq!(Value::Array(vec![1u8.into(), 2u8.into()]).to_string(), "[0x01, 0x02]");
    }

    #[test]
    fn usize_keeps_every_bit() {
        assert_eq!(Value::from(5usize), Value::U64(5));
        let wide = (1u64 << 32) | 5;
        if let Ok(v) = usize::try_from(wide) {
            assert_eq!(Value::from(v), Value::U64(wide));
        }
    }
}
