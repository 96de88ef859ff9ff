//! RFC-4180 delimited text, shared by the encoder and the decoder.
//!
//! One convention on both sides: comma delimiter, double-quote quoting,
//! doubled quotes inside quoted values, header row first. The encoder
//! emits `\n` line endings; the decoder accepts `\n` and `\r\n`.

pub mod decode;
pub mod encode;

/// A value must be quoted when it contains the delimiter, a quote, or a
/// line break.
pub(crate) fn needs_quoting(value: &str) -> bool {
    value.contains([',', '"', '\n', '\r'])
}
