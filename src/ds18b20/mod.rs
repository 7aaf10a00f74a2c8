//! DS18B20 programmable resolution digital thermometer
//!
//! A [`Ds18b20`] record holds everything the driver knows about one sensor:
//! its ROM code, the cached resolution, the CRC policy and whether it is the
//! only device on its bus. The bus itself is never stored, every operation
//! borrows it for the duration of one exchange, so records sharing a bus can
//! not interleave their wire traffic.
//!
//! The cached resolution mirrors the configuration register of the device.
//! It only changes through [`Ds18b20::init`], [`Ds18b20::set_resolution`] and
//! [`Ds18b20::refresh_resolution`]. A failed `set_resolution` re-reads the
//! register, so the cache never holds a value the device rejected. Anything
//! reconfiguring the device behind the driver's back must be followed by
//! `refresh_resolution`.

mod conversion;
mod resolution;
mod scratchpad;
mod temperature;
mod timing;

pub use resolution::Resolution;
pub use scratchpad::Scratchpad;
pub use temperature::{decode, decode_raw, decode_temperature, split_temp};
pub use timing::Timing;

use crate::{Address, Error, NotInitialized, OneWireBus, OpCode};
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use log::{debug, error, warn};

#[cfg(feature = "alloc")]
use alloc::boxed::Box;

/// Function commands, sent after the device has been addressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Convert = 0x44,
    WriteScratchpad = 0x4E,
    ReadScratchpad = 0xBE,
    CopyScratchpad = 0x48,
    RecallE2 = 0xB8,
    ReadPowerSupply = 0xB4,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerSupply {
    /// Powered through the VDD pin
    External,
    /// Powered from the data line
    Parasite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ds18b20 {
    address: Address,
    resolution: Option<Resolution>,
    use_crc: bool,
    solo: bool,
    initialized: bool,
    timing: Timing,
}

impl Default for Ds18b20 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds18b20 {
    pub const FAMILY_CODE: u8 = 0x28;

    /// An uninitialised record. Every operation fails with
    /// [`Error::NotInitialized`] until [`init`](Self::init) or
    /// [`init_solo`](Self::init_solo) has been called.
    ///
    /// Being `const`, the record can live in caller-provided storage such as a
    /// `static` cell.
    pub const fn new() -> Self {
        Ds18b20 {
            address: Address::ZERO,
            resolution: None,
            use_crc: false,
            solo: false,
            initialized: false,
            timing: Timing::new(),
        }
    }

    /// An uninitialised record on the heap, released when the box is dropped
    #[cfg(feature = "alloc")]
    pub fn new_boxed() -> Box<Self> {
        let record = Box::new(Self::new());
        debug!("allocated record at {:p}", &*record);
        record
    }

    /// Binds the record to the device owning `address` on a shared bus and
    /// seeds the cached resolution from the device.
    ///
    /// The record is initialised even when the device does not answer, in
    /// which case the returned (and cached) resolution is `None`.
    pub fn init<B: OneWireBus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        address: Address,
    ) -> Option<Resolution> {
        if address.family_code() != Self::FAMILY_CODE {
            warn!(
                "{} has family code 0x{:02x}, expected 0x{:02x}",
                address,
                address.family_code(),
                Self::FAMILY_CODE
            );
        }
        self.prepare(address, false);
        self.resolution = self.read_resolution(bus, delay);
        self.resolution
    }

    /// Like [`init`](Self::init) for the only device on the bus. Commands are
    /// sent after a Skip ROM, which would address every device at once if
    /// there were several.
    pub fn init_solo<B: OneWireBus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Option<Resolution> {
        self.prepare(Address::ZERO, true);
        self.resolution = self.read_resolution(bus, delay);
        self.resolution
    }

    fn prepare(&mut self, address: Address, solo: bool) {
        self.address = address;
        self.resolution = None;
        self.use_crc = false;
        self.solo = solo;
        self.initialized = true;
    }

    /// Enables or disables CRC checked scratchpad reads. With CRC enabled
    /// every read transfers the full scratchpad.
    ///
    /// Next to bus operations, `.map_err(NotInitialized::into_error)?` lifts
    /// the error into [`Error`].
    pub fn set_use_crc(&mut self, use_crc: bool) -> Result<(), NotInitialized> {
        if !self.initialized {
            error!("device record not initialised");
            return Err(NotInitialized);
        }
        self.use_crc = use_crc;
        debug!("use_crc {}", use_crc);
        Ok(())
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// ROM code, all zero for a solo record
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Cached resolution, `None` when unknown
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub fn use_crc(&self) -> bool {
        self.use_crc
    }

    pub fn is_solo(&self) -> bool {
        self.solo
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_init<E: Debug>(&self) -> Result<(), Error<E>> {
        if self.initialized {
            Ok(())
        } else {
            error!("device record not initialised");
            Err(Error::NotInitialized)
        }
    }

    /// Resets the bus and selects this device
    fn address_device<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        if !bus.reset(delay)? {
            warn!("ds18b20 {} not responding", self.address);
            return Err(Error::NoPresence);
        }
        if self.solo {
            bus.skip_rom(delay)
        } else {
            bus.match_rom(delay, &self.address)
        }
    }

    /// Reads the resolution from the configuration register without touching
    /// the cache. `None` means it could not be read.
    pub fn read_resolution<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Option<Resolution> {
        match self.read_scratchpad(bus, delay, Scratchpad::CONFIG_PREFIX) {
            Ok(scratchpad) => {
                let resolution = scratchpad.resolution();
                debug!("resolution read as {} bits", resolution.bits());
                Some(resolution)
            }
            Err(e) => {
                error!("failed to read resolution: {}", e);
                None
            }
        }
    }

    /// Replaces the cached resolution with the one configured on the device
    pub fn refresh_resolution<B: OneWireBus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Option<Resolution> {
        if self.ensure_init::<B::Error>().is_err() {
            return None;
        }
        self.resolution = self.read_resolution(bus, delay);
        self.resolution
    }

    /// Reconfigures the measurement resolution, keeping the alarm triggers.
    ///
    /// The write is verified by reading it back. On any failure the cached
    /// resolution is refreshed from the device before the error is returned.
    /// Refuses to run while the cached resolution is unknown.
    pub fn set_resolution<B: OneWireBus>(
        &mut self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        resolution: Resolution,
    ) -> Result<(), Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        if self.resolution.is_none() {
            error!("current resolution unknown, refresh it before reconfiguring");
            return Err(Error::UnsupportedResolution);
        }

        let outcome = match self.read_scratchpad(bus, delay, Scratchpad::CONFIG_PREFIX) {
            Ok(mut scratchpad) => {
                scratchpad.configuration = resolution.config_byte();
                debug!("configuration value 0x{:02x}", scratchpad.configuration);
                self.write_scratchpad(bus, delay, &scratchpad, true)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                self.resolution = Some(resolution);
                debug!("resolution set to {} bits", resolution.bits());
                Ok(())
            }
            Err(e) => {
                self.resolution = self.read_resolution(bus, delay);
                warn!(
                    "resolution consistency lost, refreshed from device: {:?}",
                    self.resolution.map(Resolution::bits)
                );
                Err(e)
            }
        }
    }

    /// Asks the device how it is powered
    pub fn read_power_supply<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<PowerSupply, Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        self.address_device(bus, delay)?;
        bus.write_command(delay, Command::ReadPowerSupply)?;
        let supply = if bus.read_bit(delay)? {
            PowerSupply::External
        } else {
            PowerSupply::Parasite
        };
        debug!("{} power supply {:?}", self.address, supply);
        Ok(supply)
    }

    /// Reads and decodes the last converted temperature in °C. Fails with
    /// `UnsupportedResolution` without bus traffic while the cached
    /// resolution is unknown.
    pub fn read_temperature<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<f32, Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        let Some(resolution) = self.resolution else {
            error!("resolution unknown, cannot decode temperature");
            return Err(Error::UnsupportedResolution);
        };
        let scratchpad = self.read_scratchpad(bus, delay, 2)?;
        let [lsb, msb] = scratchpad.temperature;
        let temperature = decode(lsb, msb, resolution);
        debug!(
            "temp_lsb 0x{:02x}, temp_msb 0x{:02x}, temp {}",
            lsb, msb, temperature
        );
        Ok(temperature)
    }

    /// [`read_temperature`](Self::read_temperature) storing the value into
    /// `value` when one is given. With an unknown resolution `value` is set
    /// to 0.0 and `UnsupportedResolution` returned.
    pub fn read_temperature_into<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        value: Option<&mut f32>,
    ) -> Result<(), Error<B::Error>> {
        let result = self.read_temperature(bus, delay);
        if let Some(value) = value {
            match &result {
                Ok(temperature) => *value = *temperature,
                Err(Error::UnsupportedResolution) => *value = 0.0,
                Err(_) => {}
            }
        }
        result.map(|_| ())
    }

    /// Starts a conversion, waits for it and reads the result
    pub fn convert_and_read_temperature<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<f32, Error<B::Error>> {
        let mut value = 0.0;
        self.convert_and_read_temperature_into(bus, delay, Some(&mut value))?;
        Ok(value)
    }

    /// [`convert_and_read_temperature`](Self::convert_and_read_temperature)
    /// into a caller provided slot. Fails with `NullArgument` before touching
    /// the bus when no slot is given. The slot holds 0.0 if reading fails
    /// after the conversion.
    pub fn convert_and_read_temperature_into<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
        value: Option<&mut f32>,
    ) -> Result<(), Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        let Some(value) = value else {
            error!("no destination for the temperature");
            return Err(Error::NullArgument);
        };
        self.convert(bus, delay)?;
        self.wait_for_conversion(bus, delay)?;
        *value = 0.0;
        *value = self.read_temperature(bus, delay)?;
        Ok(())
    }
}
