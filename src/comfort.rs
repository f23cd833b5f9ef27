//! Comfort classification for a reading and the alert that goes with it.
//!
//! Rules are checked in order and the first match wins, so a humidity
//! problem always outranks a temperature one.

use crate::DhtReading;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Condition {
    /// Humidity below 40 % or at/above 64 %.
    HumidityOutOfBand,
    /// Humidity between 61 % and 63 %.
    HumidityElevated,
    /// Temperature between 24 °C and 25 °C.
    TemperatureElevated,
    /// Temperature above 25 °C or below 15 °C.
    TemperatureCritical,
    Ideal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    Red,
    Green,
    Blue,
}

/// Square wave on the buzzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

impl Tone {
    pub const fn half_period_us(&self) -> u32 {
        1_000_000 / (self.frequency_hz * 2)
    }

    pub const fn cycles(&self) -> u32 {
        self.duration_ms * 1000 / (self.half_period_us() * 2)
    }
}

/// `count` on/off cycles of `period_ms` each half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Blink {
    pub count: u8,
    pub period_ms: u32,
}

impl Blink {
    pub const FAST: Blink = Blink {
        count: 5,
        period_ms: 200,
    };
    pub const SLOW: Blink = Blink {
        count: 5,
        period_ms: 1000,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alert {
    /// The one LED that is lit; all others are off.
    pub led: Led,
    pub tone: Option<Tone>,
    /// Blinks `led` after the tone. `None` keeps it lit.
    pub blink: Option<Blink>,
}

pub fn classify(reading: &DhtReading) -> Condition {
    let humidity = reading.humidity_decipercent();
    let temperature = reading.temperature_decidegrees();

    if !(400..640).contains(&humidity) {
        Condition::HumidityOutOfBand
    } else if (610..=630).contains(&humidity) {
        Condition::HumidityElevated
    } else if (240..=250).contains(&temperature) {
        Condition::TemperatureElevated
    } else if !(150..=250).contains(&temperature) {
        Condition::TemperatureCritical
    } else {
        Condition::Ideal
    }
}

impl Condition {
    pub const fn alert(self) -> Alert {
        match self {
            Condition::HumidityOutOfBand => Alert {
                led: Led::Blue,
                tone: Some(Tone {
                    frequency_hz: 1500,
                    duration_ms: 3000,
                }),
                blink: Some(Blink::FAST),
            },
            Condition::HumidityElevated => Alert {
                led: Led::Blue,
                tone: Some(Tone {
                    frequency_hz: 300,
                    duration_ms: 1500,
                }),
                blink: Some(Blink::SLOW),
            },
            Condition::TemperatureElevated => Alert {
                led: Led::Red,
                tone: Some(Tone {
                    frequency_hz: 800,
                    duration_ms: 1500,
                }),
                blink: Some(Blink::SLOW),
            },
            Condition::TemperatureCritical => Alert {
                led: Led::Red,
                tone: Some(Tone {
                    frequency_hz: 1200,
                    duration_ms: 3000,
                }),
                blink: Some(Blink::FAST),
            },
            Condition::Ideal => Alert {
                led: Led::Green,
                tone: None,
                blink: None,
            },
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Condition::HumidityOutOfBand => {
                "Humidity outside the recommended range (40-60 %), adjust immediately"
            }
            Condition::HumidityElevated => "Humidity elevated",
            Condition::TemperatureElevated => "Temperature between 24 and 25 C, adjustment needed",
            Condition::TemperatureCritical => {
                "Temperature out of range (15-25 C), adjust immediately"
            }
            Condition::Ideal => "Temperature and humidity ideal",
        }
    }
}
