//! The sensor data line.

use embedded_hal::digital::{InputPin, OutputPin};

/// Logic level of the data line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// A single data line shared by host and sensor.
///
/// The host drives the line while it sends the start condition, then
/// releases it so the sensor can answer on the same wire. Implementations
/// own the pin exclusively; [`crate::DhtSensor`] is the only caller.
pub trait SensorLine {
    type Error;

    /// Switch to output and drive the line low.
    fn drive_low(&mut self) -> Result<(), Self::Error>;

    /// Drive the line high. Only called while the line is an output.
    fn drive_high(&mut self) -> Result<(), Self::Error>;

    /// Give the line back to the sensor (input mode).
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Sample the current level. Must not change the pin direction.
    fn level(&mut self) -> Result<Level, Self::Error>;
}

/// Adapter for an open-drain `embedded-hal` pin with an external pull-up.
///
/// Releasing an open-drain output is the same as writing it high: the
/// pull-up holds the line and the sensor is free to pull it down.
pub struct OpenDrain<P> {
    pin: P,
}

impl<P> OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    pub fn new(pin: P) -> Self {
        OpenDrain { pin }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> SensorLine for OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    type Error = P::Error;

    fn drive_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn drive_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn level(&mut self) -> Result<Level, Self::Error> {
        self.pin.is_high().map(Level::from_high)
    }
}
