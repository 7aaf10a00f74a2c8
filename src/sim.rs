//! Simulated network of DS18B20 devices behind a byte level bus, for
//! protocol tests. Every bus operation is recorded as an [`Event`].

use crate::{crc8, Address, Error, OneWireBus};
use embedded_hal::delay::DelayNs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Reset pulse and whether presence was seen
    Reset(bool),
    Write(u8),
    Read(u8),
    ReadBit(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFault {
    Write,
    Read,
}

const POWER_ON_SCRATCHPAD: [u8; 9] = [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00];

#[derive(Debug, Clone)]
pub struct SimDevice {
    pub address: Address,
    pub scratchpad: [u8; 9],
    parasite: bool,
    config_override: Option<u8>,
}

impl SimDevice {
    pub fn new(address: Address) -> Self {
        let mut device = SimDevice {
            address,
            scratchpad: POWER_ON_SCRATCHPAD,
            parasite: false,
            config_override: None,
        };
        device.update_crc();
        device
    }

    pub fn with_temperature(mut self, lsb: u8, msb: u8) -> Self {
        self.scratchpad[0] = lsb;
        self.scratchpad[1] = msb;
        self.update_crc();
        self
    }

    pub fn with_triggers(mut self, high: u8, low: u8) -> Self {
        self.scratchpad[2] = high;
        self.scratchpad[3] = low;
        self.update_crc();
        self
    }

    pub fn with_configuration(mut self, config: u8) -> Self {
        self.scratchpad[4] = config;
        self.update_crc();
        self
    }

    /// The device latches `config` whatever configuration is written
    pub fn with_config_override(mut self, config: u8) -> Self {
        self.config_override = Some(config);
        self
    }

    pub fn with_parasite_power(mut self) -> Self {
        self.parasite = true;
        self
    }

    pub fn update_crc(&mut self) {
        self.scratchpad[8] = crc8(&self.scratchpad[..8]);
    }

    fn latch(&mut self, offset: usize, byte: u8) {
        let byte = if offset == 2 {
            self.config_override.unwrap_or((byte & 0x60) | 0x1F)
        } else {
            byte
        };
        self.scratchpad[2 + offset] = byte;
        self.update_crc();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Rom,
    MatchRom(usize),
    ReadRom(usize),
    Function,
    ReadScratchpad(usize),
    WriteScratchpad(usize),
    PowerSupply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Idle,
    Busy(u32),
    Endless,
}

pub struct SimBus {
    pub devices: Vec<SimDevice>,
    pub events: Vec<Event>,
    /// Zero-bit polls a conversion answers before it is done, `None` for a
    /// conversion that never ends
    pub conversion_polls: Option<u32>,
    /// Inverts the CRC byte on scratchpad reads
    pub corrupt_crc: bool,
    /// Fails the n-th byte of the next Write Scratchpad payload
    pub fail_scratchpad_write_at: Option<usize>,
    /// Fails the n-th scratchpad byte read from now on, counted across
    /// transactions
    pub fail_scratchpad_read_at: Option<usize>,
    parasite: bool,
    selected: Vec<usize>,
    rom: [u8; 8],
    state: State,
    conversion: Conversion,
}

impl SimBus {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        SimBus {
            devices,
            events: Vec::new(),
            conversion_polls: Some(0),
            corrupt_crc: false,
            fail_scratchpad_write_at: None,
            fail_scratchpad_read_at: None,
            parasite: false,
            selected: Vec::new(),
            rom: [0; 8],
            state: State::Idle,
            conversion: Conversion::Idle,
        }
    }

    pub fn set_parasite(&mut self, parasite: bool) {
        self.parasite = parasite;
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Events between resets, one entry per reset
    pub fn transactions(&self) -> Vec<Vec<Event>> {
        let mut transactions = Vec::new();
        for event in &self.events {
            match event {
                Event::Reset(_) => transactions.push(Vec::new()),
                other => {
                    if let Some(current) = transactions.last_mut() {
                        current.push(*other);
                    }
                }
            }
        }
        transactions
    }

    /// Wired-AND of the selected devices, an undriven line reads ones
    fn drive(&self, byte: impl Fn(&SimDevice) -> u8) -> u8 {
        self.selected
            .iter()
            .fold(0xFF, |acc, i| acc & byte(&self.devices[*i]))
    }

    fn function(&mut self, byte: u8) -> State {
        if self.selected.is_empty() {
            return State::Idle;
        }
        match byte {
            0x44 => {
                self.conversion = match self.conversion_polls {
                    Some(polls) => Conversion::Busy(polls),
                    None => Conversion::Endless,
                };
                State::Idle
            }
            0xBE => State::ReadScratchpad(0),
            0x4E => State::WriteScratchpad(0),
            0xB4 => State::PowerSupply,
            _ => State::Idle,
        }
    }
}

impl OneWireBus for SimBus {
    type Error = SimFault;

    fn reset(&mut self, _delay: &mut impl DelayNs) -> Result<bool, Error<SimFault>> {
        let presence = !self.devices.is_empty();
        self.events.push(Event::Reset(presence));
        self.selected.clear();
        self.state = State::Rom;
        Ok(presence)
    }

    fn read_bit(&mut self, _delay: &mut impl DelayNs) -> Result<bool, Error<SimFault>> {
        let bit = match self.state {
            State::PowerSupply => !self
                .selected
                .iter()
                .any(|i| self.devices[*i].parasite),
            _ => match self.conversion {
                Conversion::Idle => true,
                Conversion::Busy(0) => {
                    self.conversion = Conversion::Idle;
                    true
                }
                Conversion::Busy(n) => {
                    self.conversion = Conversion::Busy(n - 1);
                    false
                }
                Conversion::Endless => false,
            },
        };
        self.events.push(Event::ReadBit(bit));
        Ok(bit)
    }

    fn write_bit(&mut self, _delay: &mut impl DelayNs, _bit: bool) -> Result<(), Error<SimFault>> {
        Ok(())
    }

    fn read_byte(&mut self, _delay: &mut impl DelayNs) -> Result<u8, Error<SimFault>> {
        let byte = match self.state {
            State::ReadScratchpad(n) if n < 9 => {
                match self.fail_scratchpad_read_at {
                    Some(0) => {
                        self.fail_scratchpad_read_at = None;
                        self.state = State::Idle;
                        return Err(Error::PortError(SimFault::Read));
                    }
                    Some(left) => self.fail_scratchpad_read_at = Some(left - 1),
                    None => {}
                }
                self.state = State::ReadScratchpad(n + 1);
                let byte = self.drive(|d| d.scratchpad[n]);
                if n == 8 && self.corrupt_crc {
                    !byte
                } else {
                    byte
                }
            }
            State::ReadRom(n) if n < 8 => {
                self.state = State::ReadRom(n + 1);
                self.drive(|d| d.address[n])
            }
            _ => 0xFF,
        };
        self.events.push(Event::Read(byte));
        Ok(byte)
    }

    fn write_byte(&mut self, _delay: &mut impl DelayNs, byte: u8) -> Result<(), Error<SimFault>> {
        self.events.push(Event::Write(byte));
        self.state = match self.state {
            State::Rom => match byte {
                0xCC => {
                    self.selected = (0..self.devices.len()).collect();
                    State::Function
                }
                0x55 => State::MatchRom(0),
                0x33 => {
                    self.selected = (0..self.devices.len()).collect();
                    State::ReadRom(0)
                }
                _ => State::Idle,
            },
            State::MatchRom(n) => {
                self.rom[n] = byte;
                if n + 1 < 8 {
                    State::MatchRom(n + 1)
                } else {
                    let rom = Address::from(self.rom);
                    self.selected = (0..self.devices.len())
                        .filter(|i| self.devices[*i].address == rom)
                        .collect();
                    State::Function
                }
            }
            State::Function => self.function(byte),
            State::WriteScratchpad(n) => {
                if self.fail_scratchpad_write_at == Some(n) {
                    self.fail_scratchpad_write_at = None;
                    self.state = State::Idle;
                    return Err(Error::PortError(SimFault::Write));
                }
                for i in self.selected.clone() {
                    self.devices[i].latch(n, byte);
                }
                if n + 1 < 3 {
                    State::WriteScratchpad(n + 1)
                } else {
                    State::Idle
                }
            }
            _ => State::Idle,
        };
        Ok(())
    }

    fn is_parasite_powered(&self) -> bool {
        self.parasite
    }
}

#[cfg(test)]
mod tests {
    use super::{SimBus, SimDevice};
    use crate::{Address, Error, OneWireBus};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn read_rom_of_single_device() {
        let rom = Address::from([0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00, 0xA2]);
        let mut bus = SimBus::new(vec![SimDevice::new(rom)]);

        assert_eq!(Address::read_single(&mut bus, &mut NoopDelay::new()), Ok(rom));
    }

    #[test]
    fn read_rom_of_colliding_devices() {
        let mut bus = SimBus::new(vec![
            SimDevice::new(Address::from([0x28, 0x01, 0, 0, 0, 0, 0, 0])),
            SimDevice::new(Address::from([0x28, 0x02, 0, 0, 0, 0, 0, 0])),
        ]);

        // wired-AND of both codes, caught by the ROM CRC
        assert!(matches!(
            Address::read_single(&mut bus, &mut NoopDelay::new()),
            Err(Error::CrcMismatch(..))
        ));
    }

    #[test]
    fn read_rom_on_empty_bus() {
        let mut bus = SimBus::new(vec![]);
        assert_eq!(bus.read_rom(&mut NoopDelay::new()), Err(Error::NoPresence));
    }
}
