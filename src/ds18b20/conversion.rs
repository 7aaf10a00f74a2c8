use super::{Command, Ds18b20};
use crate::{Error, OneWireBus};
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use log::{debug, warn};

impl Ds18b20 {
    /// Starts a temperature conversion on this device
    pub fn convert<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        self.address_device(bus, delay)?;
        bus.write_command(delay, Command::Convert)
    }

    /// Starts a conversion on every device on the bus at once.
    ///
    /// Nobody answers a broadcast individually, so this succeeds even on an
    /// empty bus; only transport faults are reported.
    pub fn convert_all<B: OneWireBus>(
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<B::Error>> {
        bus.reset(delay)?;
        bus.skip_rom(delay)?;
        bus.write_command(delay, Command::Convert)
    }

    /// Blocks until the running conversion ends or its time bound passes and
    /// returns the time spent.
    ///
    /// An externally powered device holds the line low while converting, so
    /// the line is sampled once per poll interval. On a parasite powered bus
    /// the device cannot signal, the wait is a fixed delay instead. A timeout
    /// is only logged: the caller goes on to read whatever the device holds.
    /// With an unknown resolution there is no bound and nothing is waited.
    pub fn wait_for_conversion<B: OneWireBus>(
        &self,
        bus: &mut B,
        delay: &mut impl DelayNs,
    ) -> Result<Duration, Error<B::Error>> {
        self.ensure_init::<B::Error>()?;
        let Some(resolution) = self.resolution else {
            return Ok(Duration::ZERO);
        };

        let bound = self.timing.max_conversion_time(resolution);
        if bus.is_parasite_powered() {
            let wait = self.timing.parasite_delay().unwrap_or(bound);
            debug!("parasite power, waiting {} us", wait.as_micros());
            delay_for(delay, wait);
            return Ok(wait);
        }

        let interval = self.timing.poll_interval();
        let max_ticks = self.timing.deadline_ticks(bound);
        debug!(
            "wait for conversion: max {} us, {} ticks",
            bound.as_micros(),
            max_ticks
        );

        let mut ticks = 0_u64;
        let mut done = false;
        while !done && ticks < max_ticks {
            delay_for(delay, interval);
            ticks += 1;
            done = bus.read_bit(delay)?;
        }

        let elapsed = self.timing.ticks_to_duration(ticks);
        if done {
            debug!("conversion took at most {} us", elapsed.as_micros());
        } else {
            warn!("conversion timed out after {} us", elapsed.as_micros());
        }
        Ok(elapsed)
    }
}

fn delay_for(delay: &mut impl DelayNs, duration: Duration) {
    let mut micros = duration.as_micros();
    while micros > 0 {
        let chunk = micros.min(u32::MAX as u128) as u32;
        delay.delay_us(chunk);
        micros -= chunk as u128;
    }
    let nanos = duration.subsec_nanos() % 1_000;
    if nanos > 0 {
        delay.delay_ns(nanos);
    }
}
