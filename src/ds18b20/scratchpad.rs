use super::{Command, Ds18b20, Resolution};
use crate::{Error, OneWireBus};
use byteorder::{ByteOrder, LittleEndian};
use embedded_hal::delay::DelayNs;
use log::{debug, error};

/// Image of the device's volatile register block, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scratchpad {
    /// LSB, MSB
    pub temperature: [u8; 2],
    pub trigger_high: u8,
    pub trigger_low: u8,
    pub configuration: u8,
    pub reserved: [u8; 3],
    pub crc: u8,
}

impl Scratchpad {
    pub const BYTES: usize = 9;

    /// Bytes up to and including the configuration register
    pub const CONFIG_PREFIX: usize = 5;

    pub fn from_bytes(raw: &[u8; Self::BYTES]) -> Self {
        Scratchpad {
            temperature: [raw[0], raw[1]],
            trigger_high: raw[2],
            trigger_low: raw[3],
            configuration: raw[4],
            reserved: [raw[5], raw[6], raw[7]],
            crc: raw[8],
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        [
            self.temperature[0],
            self.temperature[1],
            self.trigger_high,
            self.trigger_low,
            self.configuration,
            self.reserved[0],
            self.reserved[1],
            self.reserved[2],
            self.crc,
        ]
    }

    /// The only bytes a Write Scratchpad transfers, always all three
    pub fn writable(&self) -> [u8; 3] {
        [self.trigger_high, self.trigger_low, self.configuration]
    }

    /// Temperature register in 1/16 °C, undefined low bits included
    pub fn raw_temperature(&self) -> i16 {
        LittleEndian::read_i16(&self.temperature)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from_config_byte(self.configuration)
    }
}

impl Ds18b20 {
    /// Reads the first `count` bytes of the scratchpad, the rest of the
    /// returned image is zero.
    ///
    /// With CRC enabled the full scratchpad is always read and checked.
    /// Without, the read stops after `count` bytes and the transaction is cut
    /// short with a bus reset.
    pub fn read_scratchpad<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        count: usize,
    ) -> Result<Scratchpad, Error<B::Error>> {
        if count == 0 {
            return Err(Error::NullArgument);
        }
        self.ensure_init::<B::Error>()?;

        let count = if self.use_crc {
            Scratchpad::BYTES
        } else {
            count.min(Scratchpad::BYTES)
        };
        debug!("scratchpad read: CRC {}, count {}", self.use_crc, count);

        self.address_device(bus, delay)?;
        bus.write_command(delay, Command::ReadScratchpad)?;
        let mut raw = [0u8; Scratchpad::BYTES];
        bus.read_bytes(delay, &mut raw[..count])?;
        debug!("scratchpad {:02x?}", &raw[..count]);

        if self.use_crc {
            if bus.crc8(&raw) != 0 {
                let computed = bus.crc8(&raw[..Scratchpad::BYTES - 1]);
                error!(
                    "scratchpad CRC failed: computed 0x{:02x}, received 0x{:02x}",
                    computed,
                    raw[Scratchpad::BYTES - 1]
                );
                return Err(Error::CrcMismatch(computed, raw[Scratchpad::BYTES - 1]));
            }
            debug!("CRC ok");
        } else {
            // the device stops sending on reset
            bus.reset(delay)?;
        }
        Ok(Scratchpad::from_bytes(&raw))
    }

    /// Copies the first `dst.len()` scratchpad bytes (at most nine) into
    /// `dst` and returns how many were copied
    pub fn read_scratchpad_into<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        dst: &mut [u8],
    ) -> Result<usize, Error<B::Error>> {
        if dst.is_empty() {
            error!("no destination for the scratchpad");
            return Err(Error::NullArgument);
        }
        let count = dst.len().min(Scratchpad::BYTES);
        let raw = self.read_scratchpad(bus, delay, count)?.to_bytes();
        dst[..count].copy_from_slice(&raw[..count]);
        Ok(count)
    }

    /// Writes trigger high, trigger low and configuration. The three bytes
    /// go out in one uninterrupted transaction, a reset in between leaves
    /// the device registers corrupted.
    ///
    /// With `verify` the bytes are read back and compared.
    pub fn write_scratchpad<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        scratchpad: &Scratchpad,
        verify: bool,
    ) -> Result<(), Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        let written = scratchpad.writable();

        self.address_device(bus, delay)?;
        debug!("scratchpad write {:02x?}", written);
        bus.write_command(delay, Command::WriteScratchpad)?;
        bus.write_bytes(delay, &written)?;

        if verify {
            let read = self
                .read_scratchpad(bus, delay, Scratchpad::CONFIG_PREFIX)?
                .writable();
            if read != written {
                error!(
                    "scratchpad verify failed: wrote {:02x?}, read {:02x?}",
                    written, read
                );
                return Err(Error::VerifyMismatch { written, read });
            }
        }
        Ok(())
    }
}
