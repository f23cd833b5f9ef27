//! Simulated sensor bench for host tests.
//!
//! One [`Sim`] holds a timeline shared by a line, a clock and a delay. Each
//! sample of the line costs one microsecond of simulated time, which stands
//! in for the polling overhead of real hardware.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::clock::MicrosClock;
use crate::line::{Level, SensorLine};

const POLL_COST_NS: u64 = 1_000;

pub const ACK_US: u32 = 80;
pub const BIT_LOW_US: u32 = 50;
pub const ZERO_HIGH_US: u32 = 26;
pub const ONE_HIGH_US: u32 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    DriveLow,
    DriveHigh,
    Release,
}

pub struct Sim {
    now_ns: Cell<u64>,
    driven: Cell<Option<Level>>,
    released_at_ns: Cell<u64>,
    waveform: RefCell<Vec<(Level, u32)>>,
    events: RefCell<Vec<(u64, Event)>>,
}

impl Sim {
    /// A sensor that answers every start condition with `waveform`.
    pub fn new(waveform: Vec<(Level, u32)>) -> Self {
        Sim {
            now_ns: Cell::new(0),
            driven: Cell::new(None),
            released_at_ns: Cell::new(0),
            waveform: RefCell::new(waveform),
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn starting_at_us(self, us: u64) -> Self {
        self.now_ns.set(us * 1_000);
        self
    }

    pub fn set_waveform(&self, waveform: Vec<(Level, u32)>) {
        *self.waveform.borrow_mut() = waveform;
    }

    pub fn line(&self) -> SimLine<'_> {
        SimLine(self)
    }

    pub fn clock(&self) -> SimClock<'_> {
        SimClock(self)
    }

    pub fn delay(&self) -> SimDelay<'_> {
        SimDelay(self)
    }

    /// Recorded line writes as (microseconds, event).
    pub fn events(&self) -> Vec<(u64, Event)> {
        self.events.borrow().clone()
    }

    pub fn now_us(&self) -> u64 {
        self.now_ns.get() / 1_000
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push((self.now_us(), event));
    }

    fn advance(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }

    fn level_now(&self) -> Level {
        if let Some(level) = self.driven.get() {
            return level;
        }
        let mut elapsed_us = (self.now_ns.get() - self.released_at_ns.get()) / 1_000;
        for &(level, duration_us) in self.waveform.borrow().iter() {
            let duration_us = u64::from(duration_us);
            if elapsed_us < duration_us {
                return level;
            }
            elapsed_us -= duration_us;
        }
        // pull-up holds the idle line
        Level::High
    }
}

pub struct SimLine<'a>(&'a Sim);

impl SensorLine for SimLine<'_> {
    type Error = Infallible;

    fn drive_low(&mut self) -> Result<(), Infallible> {
        self.0.driven.set(Some(Level::Low));
        self.0.record(Event::DriveLow);
        Ok(())
    }

    fn drive_high(&mut self) -> Result<(), Infallible> {
        self.0.driven.set(Some(Level::High));
        self.0.record(Event::DriveHigh);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        if self.0.driven.take().is_some() {
            self.0.released_at_ns.set(self.0.now_ns.get());
        }
        self.0.record(Event::Release);
        Ok(())
    }

    fn level(&mut self) -> Result<Level, Infallible> {
        let level = self.0.level_now();
        self.0.advance(POLL_COST_NS);
        Ok(level)
    }
}

pub struct SimClock<'a>(&'a Sim);

impl MicrosClock for SimClock<'_> {
    fn now_micros(&mut self) -> u32 {
        self.0.now_us() as u32
    }
}

pub struct SimDelay<'a>(&'a Sim);

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(u64::from(ns));
    }
}

/// The sensor's acknowledge: 80 µs low, 80 µs high.
pub fn ack() -> Vec<(Level, u32)> {
    vec![(Level::Low, ACK_US), (Level::High, ACK_US)]
}

/// Acknowledge, one bit slot per entry of `high_us`, then the closing low.
pub fn bits(high_us: &[u32]) -> Vec<(Level, u32)> {
    let mut waveform = ack();
    for &high in high_us {
        waveform.push((Level::Low, BIT_LOW_US));
        waveform.push((Level::High, high));
    }
    waveform.push((Level::Low, BIT_LOW_US));
    waveform
}

/// Full transmission of `bytes`, MSB first.
pub fn frame(bytes: [u8; 5]) -> Vec<(Level, u32)> {
    let mut high_us = Vec::with_capacity(40);
    for byte in bytes {
        for shift in (0..8).rev() {
            high_us.push(if (byte >> shift) & 1 == 1 {
                ONE_HIGH_US
            } else {
                ZERO_HIGH_US
            });
        }
    }
    bits(&high_us)
}
