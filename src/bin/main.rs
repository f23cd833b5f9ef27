#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use core::convert::Infallible;

use defmt::info;
use embassy_executor::Spawner;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embassy_time::{Duration, Timer};
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{DriveMode, Flex, Level, Output, OutputConfig, Pull},
    time::Instant,
    timer::systimer::SystemTimer,
};
use thermoguard::comfort::{self, Blink, Led, Tone};
use thermoguard::{
    DhtReading, DhtSensor, Error, Level as LineLevel, MicrosClock, SensorLine, READ_INTERVAL_MS,
};
use {esp_backtrace as _, esp_println as _};

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

type SensorChannel = Channel<NoopRawMutex, DhtReading, 1>;

/// DHT22 data line on a flex pin: open-drain output while the host sends the
/// start condition, input while the sensor answers.
struct FlexLine(Flex<'static>);

impl FlexLine {
    fn new(mut pin: Flex<'static>) -> Self {
        pin.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        pin.set_input_enable(true);
        pin.set_output_enable(false);
        FlexLine(pin)
    }
}

impl SensorLine for FlexLine {
    type Error = Infallible;

    fn drive_low(&mut self) -> Result<(), Infallible> {
        self.0.set_low();
        self.0.set_output_enable(true);
        Ok(())
    }

    fn drive_high(&mut self) -> Result<(), Infallible> {
        self.0.set_high();
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        self.0.set_output_enable(false);
        Ok(())
    }

    fn level(&mut self) -> Result<LineLevel, Infallible> {
        Ok(LineLevel::from_high(self.0.is_high()))
    }
}

struct SystemClock;

impl MicrosClock for SystemClock {
    fn now_micros(&mut self) -> u32 {
        Instant::now().duration_since_epoch().as_micros() as u32
    }
}

struct Indicators {
    red: Output<'static>,
    green: Output<'static>,
    blue: Output<'static>,
    buzzer: Output<'static>,
}

impl Indicators {
    fn led(&mut self, led: Led) -> &mut Output<'static> {
        match led {
            Led::Red => &mut self.red,
            Led::Green => &mut self.green,
            Led::Blue => &mut self.blue,
        }
    }

    fn show(&mut self, led: Led) {
        self.red.set_low();
        self.green.set_low();
        self.blue.set_low();
        self.led(led).set_high();
    }

    async fn play(&mut self, tone: Tone) {
        let half_period = Duration::from_micros(tone.half_period_us().into());
        for _ in 0..tone.cycles() {
            self.buzzer.set_high();
            Timer::after(half_period).await;
            self.buzzer.set_low();
            Timer::after(half_period).await;
        }
    }

    async fn blink(&mut self, led: Led, blink: Blink) {
        let period = Duration::from_millis(blink.period_ms.into());
        for _ in 0..blink.count {
            self.led(led).set_high();
            Timer::after(period).await;
            self.led(led).set_low();
            Timer::after(period).await;
        }
    }
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    info!("Embassy initialized!");

    let indicators = Indicators {
        red: Output::new(peripherals.GPIO3, Level::Low, OutputConfig::default()),
        green: Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default()),
        blue: Output::new(peripherals.GPIO5, Level::Low, OutputConfig::default()),
        buzzer: Output::new(peripherals.GPIO6, Level::Low, OutputConfig::default()),
    };
    let line = FlexLine::new(Flex::new(peripherals.GPIO10));

    let sensor_channel = &*mk_static!(SensorChannel, Channel::new());

    spawner.spawn(dht_task(line, sensor_channel)).ok();
    spawner.spawn(alert_task(indicators, sensor_channel)).ok();
}

#[embassy_executor::task]
async fn dht_task(line: FlexLine, sensor_channel: &'static SensorChannel) {
    let mut dht = DhtSensor::new(line, SystemClock, Delay::new());
    loop {
        info!("Starting DHT22 reading...");
        // Blocks the executor for the ~23 ms of the transaction.
        match dht.read() {
            Ok(reading) => {
                info!(
                    "Temperature: {} C, Humidity: {} %",
                    reading.temperature(),
                    reading.humidity()
                );
                sensor_channel.try_send(reading).ok();
            }
            Err(Error::Decode(kind)) => info!("DHT22 read error: {}", kind),
            Err(Error::Line(never)) => match never {},
        }
        Timer::after(Duration::from_millis(READ_INTERVAL_MS)).await;
    }
}

#[embassy_executor::task]
async fn alert_task(mut indicators: Indicators, sensor_channel: &'static SensorChannel) {
    loop {
        let reading = sensor_channel.receive().await;
        let condition = comfort::classify(&reading);
        let alert = condition.alert();
        info!("{}", condition.message());

        indicators.show(alert.led);
        if let Some(tone) = alert.tone {
            indicators.play(tone).await;
        }
        if let Some(blink) = alert.blink {
            indicators.blink(alert.led, blink).await;
        }
    }
}
