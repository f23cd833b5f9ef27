// src/dht.rs

use critical_section::with;
use embedded_hal::delay::DelayNs;

use crate::frame::{RawFrame, FRAME_BITS};
use crate::{
    measure_pulse, DecodeError, DhtReading, Error, Level, MicrosClock, Pulse, SensorLine,
    BIT_THRESHOLD_US, PULSE_TIMEOUT_US, START_LOW_MS, START_RELEASE_US,
};

/// Protocol timing. The defaults match the DHT22 datasheet and the polling
/// overhead of an ESP32-C3 at full clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DhtConfig {
    /// High pulses strictly longer than this decode as 1.
    pub bit_threshold_us: u32,
    /// Budget for every single pulse.
    pub timeout_us: u32,
    pub start_low_ms: u32,
    pub start_release_us: u32,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DhtConfig {
    pub const fn new() -> Self {
        Self {
            bit_threshold_us: BIT_THRESHOLD_US,
            timeout_us: PULSE_TIMEOUT_US,
            start_low_ms: START_LOW_MS,
            start_release_us: START_RELEASE_US,
        }
    }

    pub const fn with_bit_threshold_us(mut self, us: u32) -> Self {
        self.bit_threshold_us = us;
        self
    }

    pub const fn with_timeout_us(mut self, us: u32) -> Self {
        self.timeout_us = us;
        self
    }

    pub const fn with_start_low_ms(mut self, ms: u32) -> Self {
        self.start_low_ms = ms;
        self
    }

    pub const fn with_start_release_us(mut self, us: u32) -> Self {
        self.start_release_us = us;
        self
    }

    const fn bit_value(&self, high_us: u32) -> bool {
        high_us > self.bit_threshold_us
    }
}

pub struct DhtSensor<L, C, D>
where
    L: SensorLine,
{
    line: L,
    clock: C,
    delay: D,
    config: DhtConfig,
}

impl<L, C, D> DhtSensor<L, C, D>
where
    L: SensorLine,
    C: MicrosClock,
    D: DelayNs,
{
    pub fn new(line: L, clock: C, delay: D) -> Self {
        Self::with_config(line, clock, delay, DhtConfig::default())
    }

    pub fn with_config(line: L, clock: C, delay: D, config: DhtConfig) -> Self {
        DhtSensor {
            line,
            clock,
            delay,
            config,
        }
    }

    pub fn config(&self) -> &DhtConfig {
        &self.config
    }

    /// Give back the line, clock and delay.
    pub fn free(self) -> (L, C, D) {
        (self.line, self.clock, self.delay)
    }

    /// Run one full transaction: start condition, then decode.
    pub fn read(&mut self) -> Result<DhtReading, Error<L::Error>> {
        self.begin_reading()?.decode()
    }

    /// Send the start condition and hand the released line to a
    /// [`Transaction`].
    ///
    /// A sensor that does not answer is only noticed by
    /// [`Transaction::decode`].
    pub fn begin_reading(&mut self) -> Result<Transaction<'_, L, C, D>, Error<L::Error>> {
        self.send_start().map_err(Error::Line)?;
        Ok(Transaction { sensor: self })
    }

    fn send_start(&mut self) -> Result<(), L::Error> {
        self.line.drive_low()?;
        self.delay.delay_ms(self.config.start_low_ms);
        self.line.drive_high()?;
        self.delay.delay_us(self.config.start_release_us);
        self.line.release()
    }
}

/// Exclusive use of the sensor between the start condition and the end of
/// the frame. Dropping it leaves the line released.
pub struct Transaction<'a, L, C, D>
where
    L: SensorLine,
{
    sensor: &'a mut DhtSensor<L, C, D>,
}

impl<L, C, D> Transaction<'_, L, C, D>
where
    L: SensorLine,
    C: MicrosClock,
    D: DelayNs,
{
    /// Receive and validate the sensor's answer.
    pub fn decode(mut self) -> Result<DhtReading, Error<L::Error>> {
        let result = with(|_cs| self.capture()).and_then(|frame| {
            let frame = frame.validate()?;
            trace!("DHT22 frame {:?}", frame.bytes());
            frame.reading().map_err(Error::from)
        });
        if let Err(Error::Decode(kind)) = &result {
            debug!("DHT22 read failed: {}", kind);
        }
        result
    }

    fn capture(&mut self) -> Result<RawFrame, Error<L::Error>> {
        if self.pulse(Level::Low)?.duration_us().is_none()
            || self.pulse(Level::High)?.duration_us().is_none()
        {
            return Err(DecodeError::NoResponse.into());
        }

        let mut frame = RawFrame::new();
        for index in 0..FRAME_BITS {
            if let Pulse::TimedOut = self.pulse(Level::Low)? {
                return Err(DecodeError::LowPulseTimeout.into());
            }
            let high_us = self
                .pulse(Level::High)?
                .duration_us()
                .ok_or(DecodeError::HighPulseTimeout)?;
            if self.sensor.config.bit_value(high_us) {
                frame.set_bit(index);
            }
        }
        Ok(frame)
    }

    fn pulse(&mut self, level: Level) -> Result<Pulse, Error<L::Error>> {
        let sensor = &mut *self.sensor;
        measure_pulse(
            &mut sensor.line,
            &mut sensor.clock,
            level,
            sensor.config.timeout_us,
        )
        .map_err(Error::Line)
    }
}

impl<L, C, D> Drop for Transaction<'_, L, C, D>
where
    L: SensorLine,
{
    fn drop(&mut self) {
        let _ = self.sensor.line.release();
    }
}
