//! VoodooSpark Remote GPIO Protocol
//!
//! This crate provides types and utilities for communicating with a remote
//! peripheral controller running the VoodooSpark firmware over a TCP socket.
//! The protocol is a small binary command/response set where each outbound
//! message starts with a one-byte opcode.
//!
//! # Protocol Overview
//!
//! The firmware exposes GPIO, analog, and servo capability. Traffic is:
//!
//! - **Commands** (host → controller): one `CMD_*` opcode byte followed by a
//!   2-3 byte payload whose arity depends on the command.
//! - **Response frames** (controller → host): always exactly 4 bytes,
//!   `[opcode][pin_or_port][lsb][msb]`. There is no length prefix, delimiter,
//!   or request identifier on the wire.
//!
//! Frames with the reporting opcode carry unsolicited pin telemetry; all
//! other inbound frames answer the most recent read command. Multi-byte
//! numeric fields cross the wire as two 7-bit bytes (lsb, msb).
//!
//! # Example
//!
//! ```rust
//! use sparklink_protocol::{Command, FrameCodec};
//!
//! // Build a command
//! let cmd = Command::DigitalWrite { gpio: 5, value: true };
//! let bytes = cmd.encode().unwrap();
//! assert_eq!(bytes, vec![0x01, 0x05, 0x01]);
//!
//! // Parse response frames from an inbound byte stream
//! let mut codec = FrameCodec::new();
//! codec.push(&[0x03, 0x05, 0x01, 0x00]);
//! let frame = codec.decode().unwrap();
//! assert!(frame.digital_value());
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use types::*;
