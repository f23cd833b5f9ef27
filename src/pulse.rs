//! Bounded pulse measurement.

use crate::clock::MicrosClock;
use crate::line::{Level, SensorLine};

/// Outcome of timing one pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pulse {
    /// The line left the level after this many microseconds. Always below
    /// the timeout the pulse was measured with.
    Measured(u32),
    /// The level was still held when the timeout ran out.
    TimedOut,
}

impl Pulse {
    pub const fn duration_us(self) -> Option<u32> {
        match self {
            Pulse::Measured(us) => Some(us),
            Pulse::TimedOut => None,
        }
    }
}

/// Busy-poll `line` until it leaves `level` or `timeout_us` elapses.
///
/// Only samples the line. A pulse that lasts the full timeout is reported as
/// [`Pulse::TimedOut`], never as a duration.
pub fn measure_pulse<L, C>(
    line: &mut L,
    clock: &mut C,
    level: Level,
    timeout_us: u32,
) -> Result<Pulse, L::Error>
where
    L: SensorLine,
    C: MicrosClock,
{
    let start = clock.now_micros();
    loop {
        let current = line.level()?;
        let elapsed = clock.now_micros().wrapping_sub(start);
        if elapsed >= timeout_us {
            return Ok(Pulse::TimedOut);
        }
        if current != level {
            return Ok(Pulse::Measured(elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Sim;
    use crate::PULSE_TIMEOUT_US;

    fn released(sim: &Sim) {
        let mut line = sim.line();
        line.drive_low().unwrap();
        line.release().unwrap();
    }

    #[test]
    fn measures_consecutive_pulses() {
        let sim = Sim::new(vec![(Level::Low, 10), (Level::High, 40), (Level::Low, 70)]);
        released(&sim);
        let (mut line, mut clock) = (sim.line(), sim.clock());

        // The first pulse is caught on its very first microsecond, so it
        // reads one tick long; the following pulses are exact.
        let first = measure_pulse(&mut line, &mut clock, Level::Low, PULSE_TIMEOUT_US).unwrap();
        assert_eq!(first, Pulse::Measured(11));
        let high = measure_pulse(&mut line, &mut clock, Level::High, PULSE_TIMEOUT_US).unwrap();
        assert_eq!(high, Pulse::Measured(40));
        let low = measure_pulse(&mut line, &mut clock, Level::Low, PULSE_TIMEOUT_US).unwrap();
        assert_eq!(low, Pulse::Measured(70));
    }

    #[test]
    fn returns_immediately_when_level_is_not_held() {
        let sim = Sim::new(vec![(Level::High, 500)]);
        released(&sim);
        let pulse =
            measure_pulse(&mut sim.line(), &mut sim.clock(), Level::Low, PULSE_TIMEOUT_US).unwrap();
        assert_eq!(pulse, Pulse::Measured(1));
    }

    #[test]
    fn stuck_line_times_out() {
        let sim = Sim::new(vec![(Level::Low, 5_000)]);
        released(&sim);
        let pulse =
            measure_pulse(&mut sim.line(), &mut sim.clock(), Level::Low, PULSE_TIMEOUT_US).unwrap();
        assert_eq!(pulse, Pulse::TimedOut);
        assert_eq!(pulse.duration_us(), None);
        assert!(sim.now_us() <= u64::from(PULSE_TIMEOUT_US) + 1);
    }

    #[test]
    fn pulse_reaching_timeout_is_not_a_duration() {
        let sim = Sim::new(vec![(Level::High, 1), (Level::Low, 100), (Level::High, 1)]);
        released(&sim);
        let (mut line, mut clock) = (sim.line(), sim.clock());
        measure_pulse(&mut line, &mut clock, Level::High, 1_000).unwrap();
        assert_eq!(
            measure_pulse(&mut line, &mut clock, Level::Low, 100).unwrap(),
            Pulse::TimedOut
        );

        let sim = Sim::new(vec![(Level::High, 1), (Level::Low, 99), (Level::High, 1)]);
        released(&sim);
        let (mut line, mut clock) = (sim.line(), sim.clock());
        measure_pulse(&mut line, &mut clock, Level::High, 1_000).unwrap();
        assert_eq!(
            measure_pulse(&mut line, &mut clock, Level::Low, 100).unwrap(),
            Pulse::Measured(99)
        );
    }

    #[test]
    fn survives_clock_wrap() {
        let sim = Sim::new(vec![(Level::High, 1), (Level::Low, 30)])
            .starting_at_us(u64::from(u32::MAX) - 10);
        released(&sim);
        let (mut line, mut clock) = (sim.line(), sim.clock());
        measure_pulse(&mut line, &mut clock, Level::High, PULSE_TIMEOUT_US).unwrap();
        let low = measure_pulse(&mut line, &mut clock, Level::Low, PULSE_TIMEOUT_US).unwrap();
        assert_eq!(low, Pulse::Measured(30));
    }
}
