//! Common types used in the protocol.

/// Pin operating modes understood by the firmware.
///
/// The byte values are fixed by the firmware; note the gap at 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Digital input.
    DigitalInput,
    /// Digital output.
    DigitalOutput,
    /// Analog (ADC) input.
    AnalogInput,
    /// Analog output, covers PWM as well as true DAC output.
    AnalogOutput,
    /// Servo control.
    Servo,
    /// I2C bus pin.
    I2c,
}

impl PinMode {
    /// Wire byte for this mode.
    pub fn as_byte(self) -> u8 {
        match self {
            PinMode::DigitalInput => 0,
            PinMode::DigitalOutput => 1,
            PinMode::AnalogInput => 2,
            PinMode::AnalogOutput => 3,
            PinMode::Servo => 4,
            PinMode::I2c => 6,
        }
    }

    /// Parse a wire byte. Returns None for unknown mode values.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PinMode::DigitalInput),
            1 => Some(PinMode::DigitalOutput),
            2 => Some(PinMode::AnalogInput),
            3 => Some(PinMode::AnalogOutput),
            4 => Some(PinMode::Servo),
            6 => Some(PinMode::I2c),
            _ => None,
        }
    }
}

/// Kind of unsolicited reporting to enable for a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Report digital transitions.
    Digital,
    /// Report sampled analog values.
    Analog,
}

impl ReportKind {
    /// Wire byte for this report kind.
    pub fn as_byte(self) -> u8 {
        match self {
            ReportKind::Digital => crate::REPORT_DIGITAL,
            ReportKind::Analog => crate::REPORT_ANALOG,
        }
    }
}

/// Split a value into the two 7-bit bytes used for all multi-byte numeric
/// fields on the wire.
pub fn split_uint14(value: u16) -> (u8, u8) {
    ((value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8)
}

/// Join the two 7-bit wire bytes back into a value.
pub fn join_uint14(lsb: u8, msb: u8) -> u16 {
    (lsb as u16) | ((msb as u16) << 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mode_round_trip() {
        for mode in [
            PinMode::DigitalInput,
            PinMode::DigitalOutput,
            PinMode::AnalogInput,
            PinMode::AnalogOutput,
            PinMode::Servo,
            PinMode::I2c,
        ] {
            assert_eq!(PinMode::from_byte(mode.as_byte()), Some(mode));
        }

        // 5 is a hole in the firmware's mode table
        assert_eq!(PinMode::from_byte(5), None);
        assert_eq!(PinMode::from_byte(7), None);
    }

    #[test]
    fn test_uint14_split_join() {
        assert_eq!(split_uint14(0), (0, 0));
        assert_eq!(split_uint14(0x7F), (0x7F, 0));
        assert_eq!(split_uint14(0x80), (0x00, 0x01));
        assert_eq!(split_uint14(4095), (0x7F, 0x1F));

        for value in [0u16, 1, 127, 128, 1000, 4095, 16383] {
            let (lsb, msb) = split_uint14(value);
            assert!(lsb < 0x80 && msb < 0x80);
            assert_eq!(join_uint14(lsb, msb), value);
        }
    }
}
