#![cfg_attr(not(test), no_std)]

//! Bit-banged driver for DHT22 (AM2302) humidity and temperature sensors.
//!
//! The sensor answers a host start condition on a single shared data line
//! with 40 bits encoded in the length of the high pulses. [`DhtSensor`]
//! handles the start condition, the pulse timing, the bit assembly and the
//! checksum. It is generic over the data line ([`SensorLine`]), a
//! microsecond clock ([`MicrosClock`]) and an `embedded-hal` delay.
//!
//! ```ignore
//! let mut dht = DhtSensor::new(OpenDrain::new(pin), clock, delay);
//! match dht.read() {
//!     Ok(reading) => info!("{} °C, {} %", reading.temperature(), reading.humidity()),
//!     Err(e) => info!("DHT22 read failed: {}", e),
//! }
//! ```
//!
//! [`comfort`] turns a reading into the alert shown on the ThermoGuard LEDs
//! and buzzer.

#[macro_use]
mod fmt;

pub mod clock;
pub mod comfort;
mod dht;
pub mod frame;
pub mod line;
pub mod pulse;

#[cfg(test)]
mod sim;

use core::fmt::{Display, Formatter};

pub use clock::{DelayClock, MicrosClock};
pub use dht::{DhtConfig, DhtSensor, Transaction};
pub use frame::{RawFrame, ValidFrame};
pub use line::{Level, OpenDrain, SensorLine};
pub use pulse::{measure_pulse, Pulse};

/// High pulses longer than this are a 1 bit.
pub const BIT_THRESHOLD_US: u32 = 50;
/// Longest any single pulse may last before the read is abandoned.
pub const PULSE_TIMEOUT_US: u32 = 1000;
/// Start condition: host holds the line low this long.
pub const START_LOW_MS: u32 = 18;
/// Start condition: host drives the line high this long before releasing it.
pub const START_RELEASE_US: u32 = 30;
/// Pause between two readings. The sensor needs at least 2 s.
pub const READ_INTERVAL_MS: u64 = 3000;

const MAX_HUMIDITY_DECIPERCENT: u16 = 1000;

/// Why a transaction produced no reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The sensor did not acknowledge the start condition.
    NoResponse,
    /// A bit's leading low pulse never ended.
    LowPulseTimeout,
    /// A bit's data pulse never ended.
    HighPulseTimeout,
    /// The frame checksum did not match its payload.
    ChecksumInvalid,
    /// Checksum matched but the humidity is above 100 %.
    OutOfRange,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DecodeError::NoResponse => "no response from sensor",
            DecodeError::LowPulseTimeout => "low pulse too long",
            DecodeError::HighPulseTimeout => "high pulse too long",
            DecodeError::ChecksumInvalid => "invalid checksum",
            DecodeError::OutOfRange => "humidity out of range (0-100 %)",
        })
    }
}

/// Driver error, generic over the data line's error type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The sensor's answer could not be decoded.
    Decode(DecodeError),
    /// The pin driver failed.
    Line(E),
}

impl<E> Error<E> {
    pub fn decode_error(&self) -> Option<DecodeError> {
        match self {
            Error::Decode(kind) => Some(*kind),
            Error::Line(_) => None,
        }
    }
}

impl<E> From<DecodeError> for Error<E> {
    fn from(kind: DecodeError) -> Self {
        Error::Decode(kind)
    }
}

impl<E: core::fmt::Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Decode(kind) => Display::fmt(kind, f),
            Error::Line(e) => write!(f, "data line error: {e:?}"),
        }
    }
}

/// One validated measurement in the sensor's native fixed-point units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DhtReading {
    pub(crate) humidity: u16,
    pub(crate) temperature: i16,
}

impl DhtReading {
    /// Relative humidity in tenths of a percent, within 0..=1000.
    pub const fn humidity_decipercent(&self) -> u16 {
        self.humidity
    }

    /// Temperature in tenths of a degree Celsius.
    pub const fn temperature_decidegrees(&self) -> i16 {
        self.temperature
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f32 {
        f32::from(self.humidity) / 10.0
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> f32 {
        f32::from(self.temperature) / 10.0
    }
}

fn humidity(data: &[u8; 2]) -> u16 {
    u16::from_be_bytes(*data)
}

fn temperature(data: &[u8; 2]) -> i16 {
    let magnitude = u16::from_be_bytes([data[0] & 0x7F, data[1]]) as i16;
    if data[0] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}
