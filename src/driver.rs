use crate::{Error, IoWire, OneWireBus};
use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use log::warn;

/// Bit-banged bus master at standard speed
pub struct Driver<W: IoWire> {
    io_wire: W,
    parasite_mode: bool,
}

impl<E: Debug, W: IoWire<Error = E>> Driver<W> {
    pub fn new(io_wire: W, parasite_mode: bool) -> Self {
        Driver {
            io_wire,
            parasite_mode,
        }
    }

    pub fn parasite_mode(&self) -> bool {
        self.parasite_mode
    }

    /// Gives back the data line
    pub fn release(self) -> W {
        self.io_wire
    }

    fn ensure_wire_high(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        for _ in 0..125 {
            if self.io_wire.is_high()? {
                return Ok(());
            }
            delay.delay_us(2);
        }
        warn!("bus line stuck low");
        Err(Error::WireFault)
    }
}

impl<E: Debug, W: IoWire<Error = E>> OneWireBus for Driver<W> {
    type Error = E;

    /// Returns Err(WireFault) if the wire seems to be shorted,
    /// Ok(true) if a presence pulse has been received and Ok(false)
    /// if no device answered but the wire seems to be ok
    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<E>> {
        self.io_wire.set_high()?;
        self.ensure_wire_high(delay)?;

        self.io_wire.set_low()?;
        delay.delay_us(480);
        self.io_wire.set_high()?;

        let mut presence = false;
        for _ in 0..7 {
            delay.delay_us(10);
            presence |= self.io_wire.is_low()?;
        }
        delay.delay_us(410);
        Ok(presence)
    }

    fn read_bit(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<E>> {
        self.io_wire.set_low()?;
        delay.delay_us(3);
        self.io_wire.set_high()?;
        delay.delay_us(2);
        let val = self.io_wire.is_high()?;
        delay.delay_us(61);
        Ok(val)
    }

    fn write_bit(&mut self, delay: &mut impl DelayNs, high: bool) -> Result<(), Error<E>> {
        self.io_wire.set_low()?;
        delay.delay_us(if high { 10 } else { 65 });
        self.io_wire.set_high()?;
        delay.delay_us(if high { 55 } else { 5 });
        Ok(())
    }

    fn is_parasite_powered(&self) -> bool {
        self.parasite_mode
    }
}
