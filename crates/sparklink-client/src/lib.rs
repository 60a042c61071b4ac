//! Async client session for VoodooSpark remote GPIO controllers.
//!
//! This crate drives a remote peripheral controller over a persistent TCP
//! connection, bridging the firmware's fire-and-forget wire protocol to a
//! "send command, await acknowledgement" programming model.
//!
//! The wire format carries no request identifier, so at most one
//! response-expecting command may be outstanding at a time. The connection
//! enforces this with a single send lock: concurrent callers are serialized
//! in lock-acquisition order, and each correlated send waits (bounded) for
//! the frame echoing its opcode. Frames tagged with the reporting opcode are
//! unsolicited telemetry and flow to event subscribers instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use sparklink_client::SparkConnection;
//! use sparklink_protocol::PinMode;
//!
//! # async fn demo() -> Result<(), sparklink_client::ClientError> {
//! let conn = SparkConnection::connect("192.168.1.50:48879").await?;
//!
//! conn.pin_mode(5, PinMode::DigitalOutput).await?;
//! conn.digital_write(5, true).await?;
//!
//! conn.pin_mode(9, PinMode::AnalogInput).await?;
//! let reading = conn.analog_read(9).await?;
//! println!("pin 9 reads {}", reading);
//!
//! conn.close().await;
//! # Ok(())
//! # }
//! ```

mod connection;
mod correlator;
mod error;
mod events;

pub use connection::*;
pub use error::*;
pub use events::*;
