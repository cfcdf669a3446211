//! Stable JSON encoding for files written to disk.
//!
//! Output uses 2-space indentation and a trailing newline so that session
//! files stay readable when inspected by hand.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Serializes `value` to pretty JSON bytes ending in a newline.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}
