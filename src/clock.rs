//! Monotonic microsecond time source used to time pulses.

use embedded_hal::delay::DelayNs;

/// A free-running microsecond counter.
///
/// The counter may wrap; callers only ever look at the difference of two
/// readings taken a few milliseconds apart.
pub trait MicrosClock {
    fn now_micros(&mut self) -> u32;
}

impl<C: MicrosClock + ?Sized> MicrosClock for &mut C {
    fn now_micros(&mut self) -> u32 {
        (**self).now_micros()
    }
}

/// Clock built from a delay provider for targets without a usable timer.
///
/// Every reading sleeps one microsecond and advances the count by one, so
/// the time spent sampling the pin between readings is not accounted for and
/// pulses read slightly short.
pub struct DelayClock<D> {
    delay: D,
    ticks: u32,
}

impl<D: DelayNs> DelayClock<D> {
    pub fn new(delay: D) -> Self {
        DelayClock { delay, ticks: 0 }
    }
}

impl<D: DelayNs> MicrosClock for DelayClock<D> {
    fn now_micros(&mut self) -> u32 {
        self.delay.delay_us(1);
        self.ticks = self.ticks.wrapping_add(1);
        self.ticks
    }
}
