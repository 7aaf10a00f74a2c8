use crate::{Address, Command, Error, OpCode};
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;

/// Capabilities a OneWire bus master has to provide to device drivers
///
/// Only `reset`, `read_bit` and `write_bit` are required, everything else is
/// built on top of them. Implementations are free to override the byte level
/// operations when the hardware handles whole bytes (e.g. a DS2484 bridge).
///
/// The bus is not locked in any way: the caller owns it for the duration of
/// every exchange and must not interleave transactions of different devices.
pub trait OneWireBus {
    type Error: Sized + Debug;

    /// Sends a reset pulse and returns whether any device answered with a
    /// presence pulse
    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<Self::Error>>;

    fn read_bit(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<Self::Error>>;

    fn write_bit(&mut self, delay: &mut impl DelayNs, bit: bool)
        -> Result<(), Error<Self::Error>>;

    /// Reads one byte, least significant bit first
    fn read_byte(&mut self, delay: &mut impl DelayNs) -> Result<u8, Error<Self::Error>> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit(delay)? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    /// Writes one byte, least significant bit first
    fn write_byte(&mut self, delay: &mut impl DelayNs, byte: u8) -> Result<(), Error<Self::Error>> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(delay, (byte & 0x01) == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    fn read_bytes(
        &mut self,
        delay: &mut impl DelayNs,
        dst: &mut [u8],
    ) -> Result<(), Error<Self::Error>> {
        for d in dst {
            *d = self.read_byte(delay)?;
        }
        Ok(())
    }

    fn write_bytes(&mut self, delay: &mut impl DelayNs, src: &[u8]) -> Result<(), Error<Self::Error>> {
        for b in src {
            self.write_byte(delay, *b)?;
        }
        Ok(())
    }

    fn write_command(
        &mut self,
        delay: &mut impl DelayNs,
        cmd: impl OpCode,
    ) -> Result<(), Error<Self::Error>> {
        self.write_byte(delay, cmd.op_code())
    }

    fn write_rom_code(
        &mut self,
        delay: &mut impl DelayNs,
        address: &Address,
    ) -> Result<(), Error<Self::Error>> {
        self.write_bytes(delay, address.as_ref())
    }

    /// Addresses every device on the bus at once
    fn skip_rom(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<Self::Error>> {
        self.write_command(delay, Command::SkipRom)
    }

    /// Addresses the single device owning `address`
    fn match_rom(
        &mut self,
        delay: &mut impl DelayNs,
        address: &Address,
    ) -> Result<(), Error<Self::Error>> {
        self.write_command(delay, Command::MatchRom)?;
        self.write_rom_code(delay, address)
    }

    /// Reads the ROM code of the only device on the bus. The result is
    /// garbage when several devices answer.
    fn read_rom(&mut self, delay: &mut impl DelayNs) -> Result<Address, Error<Self::Error>> {
        if !self.reset(delay)? {
            return Err(Error::NoPresence);
        }
        self.write_command(delay, Command::ReadRom)?;
        let mut raw = [0u8; Address::BYTES];
        self.read_bytes(delay, &mut raw)?;
        Ok(Address::from(raw))
    }

    fn crc8(&self, data: &[u8]) -> u8 {
        crate::crc8(data)
    }

    /// Whether devices are powered from the data line. Such devices cannot
    /// signal the end of a conversion.
    fn is_parasite_powered(&self) -> bool {
        false
    }
}
