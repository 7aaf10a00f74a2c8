use crate::{Error, OneWireBus};
use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::Deref,
    str::FromStr,
};
use embedded_hal::delay::DelayNs;

/// Factory ROM code of a device: family code, 48-bit serial, CRC
///
/// Byte 0 (the family code) is the first byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Address {
    raw: [u8; Self::BYTES],
}

impl From<[u8; Self::BYTES]> for Address {
    fn from(raw: [u8; Self::BYTES]) -> Self {
        Address { raw }
    }
}

impl From<Address> for [u8; Address::BYTES] {
    fn from(addr: Address) -> [u8; Address::BYTES] {
        addr.raw
    }
}

impl From<u64> for Address {
    fn from(rom: u64) -> Self {
        Address {
            raw: rom.to_le_bytes(),
        }
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> u64 {
        u64::from_le_bytes(addr.raw)
    }
}

impl Deref for Address {
    type Target = [u8; Self::BYTES];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl Address {
    /// The length of device address in bytes
    pub const BYTES: usize = 8;

    /// All-zero placeholder used by records on a solo bus
    pub const ZERO: Address = Address {
        raw: [0; Self::BYTES],
    };

    pub fn family_code(&self) -> u8 {
        self.raw[0]
    }

    pub fn is_zero(&self) -> bool {
        self.raw.iter().all(|b| *b == 0)
    }

    /// Whether the last byte is the CRC-8 of the first seven
    pub fn has_valid_crc(&self) -> bool {
        crate::crc8(&self.raw) == 0
    }

    /// Reads the ROM code of the only device on the bus
    pub fn read_single<B: OneWireBus>(
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<Self, Error<B::Error>> {
        let address = bus.read_rom(delay)?;
        if !address.has_valid_crc() {
            let computed = crate::crc8(&address.raw[..Self::BYTES - 1]);
            return Err(Error::CrcMismatch(computed, address.raw[Self::BYTES - 1]));
        }
        Ok(address)
    }
}

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    NotEnough,
    TooMany,
    Invalid,
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut raw = [0u8; Self::BYTES];
        let mut digits = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .map(|c| c.to_digit(16).map(|d| d as u8));

        for byte in raw.iter_mut() {
            match (digits.next(), digits.next()) {
                (Some(Some(h)), Some(Some(l))) => *byte = (h << 4) | l,
                (Some(None), _) | (_, Some(None)) => return Err(AddressError::Invalid),
                _ => return Err(AddressError::NotEnough),
            }
        }

        match digits.next() {
            None => Ok(Address { raw }),
            Some(None) => Err(AddressError::Invalid),
            Some(Some(_)) => Err(AddressError::TooMany),
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        for (i, byte) in self.raw.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
