//! The 40-bit DHT22 data frame.
//!
//! | byte | content                                          |
//! |------|--------------------------------------------------|
//! | 0..2 | relative humidity, big-endian, 0.1 %             |
//! | 2..4 | temperature, big-endian, 0.1 °C, bit 15 = sign   |
//! | 4    | low byte of the sum of bytes 0..4                |

use crate::{humidity, temperature, DecodeError, DhtReading, MAX_HUMIDITY_DECIPERCENT};

pub const FRAME_BITS: usize = 40;
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// Frame under assembly. Carries no meaning until [`RawFrame::validate`]
/// turns it into a [`ValidFrame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame {
    bytes: [u8; FRAME_BYTES],
}

impl RawFrame {
    pub const fn new() -> Self {
        RawFrame {
            bytes: [0; FRAME_BYTES],
        }
    }

    pub const fn from_bytes(bytes: [u8; FRAME_BYTES]) -> Self {
        RawFrame { bytes }
    }

    /// Set bit `index` of the transmission, MSB first within each byte.
    ///
    /// # Panics
    ///
    /// If `index >= FRAME_BITS`.
    pub fn set_bit(&mut self, index: usize) {
        self.bytes[index / 8] |= 1 << (7 - index % 8);
    }

    /// Checksum the payload bytes should carry.
    pub fn expected_checksum(&self) -> u8 {
        self.bytes[..4]
            .iter()
            .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
    }

    pub fn validate(self) -> Result<ValidFrame, DecodeError> {
        if self.expected_checksum() == self.bytes[4] {
            Ok(ValidFrame { bytes: self.bytes })
        } else {
            Err(DecodeError::ChecksumInvalid)
        }
    }
}

/// A frame whose checksum matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidFrame {
    bytes: [u8; FRAME_BYTES],
}

impl ValidFrame {
    pub const fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.bytes
    }

    /// Convert to a reading, rejecting humidity outside 0..=100 %.
    pub fn reading(&self) -> Result<DhtReading, DecodeError> {
        let humidity = humidity(&[self.bytes[0], self.bytes[1]]);
        if humidity > MAX_HUMIDITY_DECIPERCENT {
            return Err(DecodeError::OutOfRange);
        }
        let temperature = temperature(&[self.bytes[2], self.bytes[3]]);
        Ok(DhtReading {
            humidity,
            temperature,
        })
    }
}
