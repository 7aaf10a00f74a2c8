use super::Resolution;
use core::time::Duration;

/// How long to wait for a conversion and how to poll for its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    poll_interval: Duration,
    overtime_percent: u32,
    parasite_delay: Option<Duration>,
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

impl Timing {
    /// 1 ms polling, 10% allowance on top of the datasheet conversion time
    pub const fn new() -> Self {
        Timing {
            poll_interval: Duration::from_millis(1),
            overtime_percent: 10,
            parasite_delay: None,
        }
    }

    /// Pause between two samples of the bus line while waiting. Clamped to at
    /// least one microsecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_micros(1));
        self
    }

    /// Allowance for slow device clocks, added to the datasheet time
    pub fn with_overtime_percent(mut self, percent: u32) -> Self {
        self.overtime_percent = percent;
        self
    }

    /// Fixed wait used on parasite powered buses instead of the computed
    /// bound. Too short a delay reads the previous temperature.
    pub fn with_parasite_delay(mut self, delay: Duration) -> Self {
        self.parasite_delay = Some(delay);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn overtime_percent(&self) -> u32 {
        self.overtime_percent
    }

    pub fn parasite_delay(&self) -> Option<Duration> {
        self.parasite_delay
    }

    /// Upper bound of the conversion time at `resolution`, overtime included
    pub fn max_conversion_time(&self, resolution: Resolution) -> Duration {
        let nominal = resolution.conversion_time().as_micros() as u64;
        Duration::from_micros(nominal * (100 + self.overtime_percent as u64) / 100)
    }

    /// Number of poll intervals covering `bound`
    pub fn deadline_ticks(&self, bound: Duration) -> u64 {
        let ticks = bound.as_nanos().div_ceil(self.poll_interval.as_nanos());
        ticks.min(u64::MAX as u128) as u64
    }

    /// Time covered by `ticks` poll intervals
    pub fn ticks_to_duration(&self, ticks: u64) -> Duration {
        let nanos = self.poll_interval.as_nanos() * ticks as u128;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }
}
