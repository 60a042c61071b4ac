//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with the wire protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command field does not fit its wire encoding.
    #[error("{what} out of range: maximum {max}, got {actual}")]
    ValueOutOfRange {
        /// Which field was out of range.
        what: &'static str,
        /// Maximum allowed value.
        max: u16,
        /// Actual value supplied.
        actual: u16,
    },

    /// An inbound frame carried an opcode the protocol does not define.
    /// This indicates the stream is desynchronized or the peer is not a
    /// VoodooSpark controller, and is fatal to the session.
    #[error("unknown opcode in response frame: 0x{0:02X}")]
    UnknownOpcode(u8),
}
