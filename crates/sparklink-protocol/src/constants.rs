//! Protocol constants
//!
//! These constants define the command opcodes and value limits used by the
//! VoodooSpark firmware protocol. Response frames reuse the command opcode
//! of the request they answer; there is no separate response-code space.

// ============================================================================
// Command Opcodes (host → controller)
// ============================================================================

/// Configure the mode of a pin (input, output, analog, servo, ...).
pub const CMD_PIN_MODE: u8 = 0x00;
/// Set a digital output pin high or low.
pub const CMD_DIGITAL_WRITE: u8 = 0x01;
/// Write an analog/PWM value to a pin.
pub const CMD_ANALOG_WRITE: u8 = 0x02;
/// Read a digital input pin. Expects a response frame.
pub const CMD_DIGITAL_READ: u8 = 0x03;
/// Read an analog input pin. Expects a response frame.
pub const CMD_ANALOG_READ: u8 = 0x04;
/// Enable unsolicited value reporting for a pin. Inbound frames with this
/// opcode are always telemetry, never a response to a request.
pub const CMD_REPORTING: u8 = 0x05;
/// Set the telemetry sampling interval in milliseconds.
pub const CMD_SET_SAMPLE_INTERVAL: u8 = 0x06;
/// Set the controller's onboard RGB LED.
pub const CMD_INTERNAL_RGB: u8 = 0x07;
/// Write a servo angle (0-180 degrees) to a servo-mode pin.
///
/// The opcode space has gaps below this value: the firmware reserves
/// 0x10-0x16 for serial, 0x20-0x25 for SPI, and 0x30-0x33 for I2C transfers,
/// none of which this protocol implementation issues.
pub const CMD_SERVO_WRITE: u8 = 0x41;

// ============================================================================
// Report Kinds (payload of CMD_REPORTING)
// ============================================================================

/// Report digital transitions on the pin.
pub const REPORT_DIGITAL: u8 = 1;
/// Report sampled analog values on the pin.
pub const REPORT_ANALOG: u8 = 2;

// ============================================================================
// Framing and Value Limits
// ============================================================================

/// Every inbound frame is exactly this many bytes:
/// `[opcode][pin_or_port][lsb][msb]`.
pub const RESPONSE_FRAME_SIZE: usize = 4;

/// Maximum analog value (12-bit ADC).
pub const MAX_ANALOG_VALUE: u16 = (1 << 12) - 1;
/// Maximum PWM duty value (8-bit).
pub const MAX_PWM_VALUE: u16 = (1 << 8) - 1;
/// Maximum servo angle in degrees.
pub const MAX_SERVO_ANGLE: u8 = 180;
/// Largest value representable as two 7-bit wire bytes.
pub const MAX_UINT14_VALUE: u16 = (1 << 14) - 1;
