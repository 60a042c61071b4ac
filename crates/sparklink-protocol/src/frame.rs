//! Response frame decoding utilities.
//!
//! Inbound data is a stream of fixed-size 4-byte frames with no length
//! prefix or delimiter:
//!
//! ```text
//! +--------+-------------+------+------+
//! | opcode | pin_or_port | lsb  | msb  |
//! +--------+-------------+------+------+
//! ```
//!
//! The frame size is a protocol constant, so the decoder simply waits until
//! 4 bytes have accumulated and consumes them from the front of the buffer.

use bytes::BytesMut;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::join_uint14;

/// A single inbound frame from the controller.
///
/// Frames either answer the most recent read command (opcode echoes the
/// command's) or carry unsolicited pin telemetry (reporting opcode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Opcode of the command this frame answers, or [`CMD_REPORTING`].
    pub opcode: u8,
    /// GPIO pin (or port, for port-wide digital reports).
    pub pin_or_port: u8,
    /// Low 7 bits of the value.
    pub lsb: u8,
    /// High 7 bits of the value.
    pub msb: u8,
}

impl ResponseFrame {
    /// Interpret the frame's value as a digital level.
    pub fn digital_value(&self) -> bool {
        self.lsb != 0
    }

    /// Interpret the frame's value as an analog reading.
    pub fn analog_value(&self) -> u16 {
        join_uint14(self.lsb, self.msb)
    }

    /// Whether this frame is unsolicited telemetry. Reporting frames are
    /// never a response to a request, even when one is outstanding.
    pub fn is_reporting(&self) -> bool {
        self.opcode == CMD_REPORTING
    }

    /// Whether the opcode is one the protocol defines for inbound frames.
    /// An unknown opcode means the stream is desynchronized.
    pub fn is_known_opcode(&self) -> bool {
        matches!(
            self.opcode,
            CMD_PIN_MODE
                | CMD_DIGITAL_WRITE
                | CMD_ANALOG_WRITE
                | CMD_DIGITAL_READ
                | CMD_ANALOG_READ
                | CMD_REPORTING
                | CMD_SET_SAMPLE_INTERVAL
                | CMD_INTERNAL_RGB
                | CMD_SERVO_WRITE
        )
    }

    /// Validate the opcode, turning an unknown one into the
    /// session-fatal [`ProtocolError::UnknownOpcode`].
    pub fn check_opcode(&self) -> Result<(), ProtocolError> {
        if self.is_known_opcode() {
            Ok(())
        } else {
            Err(ProtocolError::UnknownOpcode(self.opcode))
        }
    }
}

/// A decoder for the inbound frame stream.
///
/// Feed received chunks with [`push`](FrameCodec::push); each call to
/// [`decode`](FrameCodec::decode) yields one complete frame, retaining any
/// trailing partial bytes for the next chunk.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(RESPONSE_FRAME_SIZE * 16),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete frame from the buffer.
    ///
    /// Returns `Some(frame)` if 4 bytes are available, or `None` if more
    /// data is needed.
    pub fn decode(&mut self) -> Option<ResponseFrame> {
        if self.buffer.len() < RESPONSE_FRAME_SIZE {
            return None;
        }

        let bytes = self.buffer.split_to(RESPONSE_FRAME_SIZE);
        Some(ResponseFrame {
            opcode: bytes[0],
            pin_or_port: bytes[1],
            lsb: bytes[2],
            msb: bytes[3],
        })
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
