//! Client error types.

use sparklink_protocol::ProtocolError;
use thiserror::Error;

/// Errors surfaced by a [`SparkConnection`](crate::SparkConnection).
///
/// Connection-level failures ([`Connect`](ClientError::Connect),
/// [`Write`](ClientError::Write)) are fatal to the session and are not
/// retried here; retry policy belongs to the caller. Per-request failures
/// ([`Timeout`](ClientError::Timeout),
/// [`UnexpectedResponse`](ClientError::UnexpectedResponse)) are returned to
/// the caller that issued the command and leave the session usable.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failed to establish the TCP connection.
    #[error("failed to connect to controller")]
    Connect(#[source] std::io::Error),

    /// A transport write failed.
    #[error("transport write failed")]
    Write(#[source] std::io::Error),

    /// No response frame with the expected opcode arrived within the
    /// configured deadline. The outcome of the command on the controller is
    /// unknown; the session remains usable.
    #[error("timeout waiting for response to command 0x{opcode:02X}")]
    Timeout {
        /// Opcode of the command that timed out.
        opcode: u8,
    },

    /// A response frame arrived whose opcode does not match the outstanding
    /// command. The frame is discarded and not retried; the session remains
    /// usable.
    #[error("unexpected response: got opcode 0x{actual:02X}, was expecting 0x{expected:02X}")]
    UnexpectedResponse {
        /// Opcode the outstanding command expected.
        expected: u8,
        /// Opcode the frame actually carried.
        actual: u8,
    },

    /// The operation was attempted on, or interrupted by, a closed or
    /// closing connection.
    #[error("connection closed")]
    Closed,

    /// Encoding validation or malformed-stream error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
