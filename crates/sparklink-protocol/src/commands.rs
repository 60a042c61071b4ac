//! Commands that can be sent to the controller.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::*;

/// Commands that can be sent to the VoodooSpark firmware.
///
/// Each variant encodes to its opcode byte followed by a command-specific
/// payload of 2-3 bytes. Only [`Command::DigitalRead`] and
/// [`Command::AnalogRead`] expect a response frame; everything else is
/// fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Configure the mode of a pin.
    PinMode {
        /// GPIO number.
        gpio: u8,
        /// Mode to apply.
        mode: PinMode,
    },

    /// Set a digital output pin.
    DigitalWrite {
        /// GPIO number.
        gpio: u8,
        /// High (true) or low (false).
        value: bool,
    },

    /// Write an analog/PWM value to a pin.
    AnalogWrite {
        /// GPIO number.
        gpio: u8,
        /// Value, at most [`MAX_ANALOG_VALUE`]; split into two 7-bit bytes
        /// on the wire.
        value: u16,
    },

    /// Read a digital input pin.
    DigitalRead {
        /// GPIO number.
        gpio: u8,
    },

    /// Read an analog input pin.
    AnalogRead {
        /// GPIO number.
        gpio: u8,
    },

    /// Enable unsolicited value reporting for a pin.
    Reporting {
        /// GPIO number.
        gpio: u8,
        /// Digital or analog reporting.
        kind: ReportKind,
    },

    /// Set the telemetry sampling interval.
    SetSampleInterval {
        /// Interval in milliseconds, at most [`MAX_UINT14_VALUE`].
        interval_ms: u16,
    },

    /// Set the controller's onboard RGB LED.
    InternalRgb {
        /// Red component.
        red: u8,
        /// Green component.
        green: u8,
        /// Blue component.
        blue: u8,
    },

    /// Write a servo angle to a servo-mode pin.
    ServoWrite {
        /// GPIO number.
        gpio: u8,
        /// Angle in degrees, 0 to [`MAX_SERVO_ANGLE`].
        angle: u8,
    },
}

impl Command {
    /// The opcode byte for this command. Response frames echo this opcode.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::PinMode { .. } => CMD_PIN_MODE,
            Command::DigitalWrite { .. } => CMD_DIGITAL_WRITE,
            Command::AnalogWrite { .. } => CMD_ANALOG_WRITE,
            Command::DigitalRead { .. } => CMD_DIGITAL_READ,
            Command::AnalogRead { .. } => CMD_ANALOG_READ,
            Command::Reporting { .. } => CMD_REPORTING,
            Command::SetSampleInterval { .. } => CMD_SET_SAMPLE_INTERVAL,
            Command::InternalRgb { .. } => CMD_INTERNAL_RGB,
            Command::ServoWrite { .. } => CMD_SERVO_WRITE,
        }
    }

    /// Whether the firmware answers this command with a response frame.
    pub fn response_expected(&self) -> bool {
        matches!(
            self,
            Command::DigitalRead { .. } | Command::AnalogRead { .. }
        )
    }

    /// Encode the command into its wire bytes.
    ///
    /// Fails with [`ProtocolError::ValueOutOfRange`] if a field does not fit
    /// its wire encoding.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = match *self {
            Command::PinMode { gpio, mode } => {
                vec![CMD_PIN_MODE, gpio, mode.as_byte()]
            }
            Command::DigitalWrite { gpio, value } => {
                vec![CMD_DIGITAL_WRITE, gpio, value as u8]
            }
            Command::AnalogWrite { gpio, value } => {
                if value > MAX_ANALOG_VALUE {
                    return Err(ProtocolError::ValueOutOfRange {
                        what: "analog value",
                        max: MAX_ANALOG_VALUE,
                        actual: value,
                    });
                }
                let (lsb, msb) = split_uint14(value);
                vec![CMD_ANALOG_WRITE, gpio, lsb, msb]
            }
            Command::DigitalRead { gpio } => vec![CMD_DIGITAL_READ, gpio],
            Command::AnalogRead { gpio } => vec![CMD_ANALOG_READ, gpio],
            Command::Reporting { gpio, kind } => {
                vec![CMD_REPORTING, gpio, kind.as_byte()]
            }
            Command::SetSampleInterval { interval_ms } => {
                if interval_ms > MAX_UINT14_VALUE {
                    return Err(ProtocolError::ValueOutOfRange {
                        what: "sample interval",
                        max: MAX_UINT14_VALUE,
                        actual: interval_ms,
                    });
                }
                let (lsb, msb) = split_uint14(interval_ms);
                vec![CMD_SET_SAMPLE_INTERVAL, lsb, msb]
            }
            Command::InternalRgb { red, green, blue } => {
                vec![CMD_INTERNAL_RGB, red, green, blue]
            }
            Command::ServoWrite { gpio, angle } => {
                if angle > MAX_SERVO_ANGLE {
                    return Err(ProtocolError::ValueOutOfRange {
                        what: "servo angle",
                        max: MAX_SERVO_ANGLE as u16,
                        actual: angle as u16,
                    });
                }
                vec![CMD_SERVO_WRITE, gpio, angle]
            }
        };

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mode_encoding() {
        let cmd = Command::PinMode {
            gpio: 5,
            mode: PinMode::DigitalOutput,
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x00, 0x05, 0x01]);
        assert!(!cmd.response_expected());
    }

    #[test]
    fn test_digital_write_encoding() {
        let cmd = Command::DigitalWrite {
            gpio: 5,
            value: true,
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x01, 0x05, 0x01]);

        let cmd = Command::DigitalWrite {
            gpio: 7,
            value: false,
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x01, 0x07, 0x00]);
    }

    #[test]
    fn test_analog_write_splits_seven_bit_bytes() {
        let cmd = Command::AnalogWrite {
            gpio: 9,
            value: 1000,
        };
        // 1000 = 0x3E8 -> lsb 0x68, msb 0x07
        assert_eq!(cmd.encode().unwrap(), vec![0x02, 0x09, 0x68, 0x07]);
    }

    #[test]
    fn test_analog_write_rejects_over_range() {
        let cmd = Command::AnalogWrite {
            gpio: 9,
            value: MAX_ANALOG_VALUE + 1,
        };
        assert_eq!(
            cmd.encode(),
            Err(ProtocolError::ValueOutOfRange {
                what: "analog value",
                max: MAX_ANALOG_VALUE,
                actual: MAX_ANALOG_VALUE + 1,
            })
        );
    }

    #[test]
    fn test_read_commands_expect_responses() {
        let digital = Command::DigitalRead { gpio: 5 };
        assert_eq!(digital.encode().unwrap(), vec![0x03, 0x05]);
        assert!(digital.response_expected());

        let analog = Command::AnalogRead { gpio: 9 };
        assert_eq!(analog.encode().unwrap(), vec![0x04, 0x09]);
        assert!(analog.response_expected());
    }

    #[test]
    fn test_reporting_encoding() {
        let cmd = Command::Reporting {
            gpio: 3,
            kind: ReportKind::Analog,
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x05, 0x03, 0x02]);
        assert!(!cmd.response_expected());
    }

    #[test]
    fn test_sample_interval_encoding() {
        let cmd = Command::SetSampleInterval { interval_ms: 500 };
        // 500 = 0x1F4 -> lsb 0x74, msb 0x03
        assert_eq!(cmd.encode().unwrap(), vec![0x06, 0x74, 0x03]);

        let cmd = Command::SetSampleInterval {
            interval_ms: MAX_UINT14_VALUE + 1,
        };
        assert!(cmd.encode().is_err());
    }

    #[test]
    fn test_servo_write_encoding() {
        let cmd = Command::ServoWrite { gpio: 4, angle: 90 };
        assert_eq!(cmd.encode().unwrap(), vec![0x41, 0x04, 0x5A]);

        let cmd = Command::ServoWrite {
            gpio: 4,
            angle: 181,
        };
        assert!(cmd.encode().is_err());
    }

    #[test]
    fn test_internal_rgb_encoding() {
        let cmd = Command::InternalRgb {
            red: 0xFF,
            green: 0x80,
            blue: 0x00,
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x07, 0xFF, 0x80, 0x00]);
    }
}
