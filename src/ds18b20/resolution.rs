use core::time::Duration;

/// Conversion time at 12-bit resolution; each bit less halves it
const CONVERSION_TIME_12_BIT_US: u64 = 750_000;

/// Measurement resolution, stored in bits 6..5 of the configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Resolution {
    /// 0.5 °C steps
    Bits9 = 9,
    /// 0.25 °C steps
    Bits10 = 10,
    /// 0.125 °C steps
    Bits11 = 11,
    /// 0.0625 °C steps, power-on default
    Bits12 = 12,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Bits9,
        Resolution::Bits10,
        Resolution::Bits11,
        Resolution::Bits12,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            9 => Some(Resolution::Bits9),
            10 => Some(Resolution::Bits10),
            11 => Some(Resolution::Bits11),
            12 => Some(Resolution::Bits12),
            _ => None,
        }
    }

    /// Configuration register value. Bit 7 reads as zero, bits 4..0 as ones.
    pub fn config_byte(self) -> u8 {
        ((self.bits() - 9) & 0x03) << 5 | 0x1F
    }

    pub fn from_config_byte(config: u8) -> Self {
        match (config >> 5) & 0x03 {
            0 => Resolution::Bits9,
            1 => Resolution::Bits10,
            2 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    /// Mask clearing the temperature LSB bits left undefined at this resolution
    pub fn lsb_mask(self) -> u8 {
        0xFF << (12 - self.bits())
    }

    /// Nominal maximum conversion time from the datasheet
    pub fn conversion_time(self) -> Duration {
        Duration::from_micros(CONVERSION_TIME_12_BIT_US >> (12 - self.bits()))
    }
}
