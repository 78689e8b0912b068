use crate::dht11::{Dht11, Sample};
use crate::fan::{FanState, Fans, Thresholds, DEFAULT_THRESHOLDS};
use crate::gpio::IoPin;
use core::fmt;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// The minimum time between two DHT11 reads.
///
/// Note that this can vary a bit by device, so check your device's datasheet to be sure. Try
/// doubling this value if you are encountering problems.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, PartialEq)]
pub enum Error<TIoError> {
    /// Wrapped error from a fan pin.
    Wrapped(TIoError),
    /// Invalid argument was provided.
    InvalidArgument,
}

impl<TIoError> From<TIoError> for Error<TIoError> {
    fn from(error: TIoError) -> Error<TIoError> {
        Error::Wrapped(error)
    }
}

impl<TIoError> fmt::Display for Error<TIoError>
where
    TIoError: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Wrapped(err) => write!(f, "IO error: {:?}", err),
            Error::InvalidArgument => write!(f, "Invalid argument"),
        }
    }
}

/// Options to modify the behavior of the control loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    /// How long to sleep after every cycle, whether or not the read succeeded. Cannot be below
    /// [`MIN_SAMPLE_INTERVAL`].
    pub sample_interval: Duration,
    /// Where the fans switch on.
    pub thresholds: Thresholds,
}

pub const DEFAULT_OPTIONS: Options = Options {
    sample_interval: Duration::from_millis(2000),
    thresholds: DEFAULT_THRESHOLDS,
};

impl Default for Options {
    fn default() -> Options {
        DEFAULT_OPTIONS
    }
}

/// What one pass of the loop did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cycle {
    /// A sample was accepted and the fans were driven to `state`.
    Actuated { sample: Sample, state: FanState },
    /// The read failed, so the fans kept whatever they were last driven to.
    Skipped,
}

/// Reads the sensor, drives the fans, sleeps, forever.
#[derive(Debug)]
pub struct Controller<TSensorPin, TFan1, TFan2, TDelay> {
    sensor: Dht11<TSensorPin>,
    fans: Fans<TFan1, TFan2>,
    delay: TDelay,
    options: Options,
}

impl<TSensorPin, TFan1, TFan2, TError, TDelay> Controller<TSensorPin, TFan1, TFan2, TDelay>
where
    TSensorPin: IoPin,
    TFan1: OutputPin<Error = TError>,
    TFan2: OutputPin<Error = TError>,
    TDelay: DelayNs,
{
    /// Builds the loop from an already configured sensor and fan pair.
    ///
    /// If options is `None`, then [`DEFAULT_OPTIONS`] is used.
    pub fn new(
        sensor: Dht11<TSensorPin>,
        fans: Fans<TFan1, TFan2>,
        delay: TDelay,
        options: Option<Options>,
    ) -> Result<Controller<TSensorPin, TFan1, TFan2, TDelay>, Error<TError>> {
        let options = match options {
            None => DEFAULT_OPTIONS,
            Some(options) if options.sample_interval < MIN_SAMPLE_INTERVAL => {
                return Err(Error::InvalidArgument)
            }
            Some(options) => options,
        };
        Ok(Controller {
            sensor,
            fans,
            delay,
            options,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Reads once and, if the read succeeded, drives the fans. Does not sleep.
    ///
    /// Sensor failures of any kind are reported as [`Cycle::Skipped`]. Only errors from the fan
    /// pins are returned.
    pub fn step(&mut self) -> Result<Cycle, Error<TError>> {
        let sample = match self.sensor.read_sample(&mut self.delay) {
            Ok(sample) => sample,
            Err(err) => {
                log::debug!("dht11 read failed: {}", err);
                return Ok(Cycle::Skipped);
            }
        };
        let state = self
            .fans
            .drive(sample.temperature, &self.options.thresholds)?;
        log::trace!("{}C -> fans {}", sample.temperature, state);
        Ok(Cycle::Actuated { sample, state })
    }

    /// One full pass: [`Controller::step`], then the sample interval sleep.
    ///
    /// The sleep happens even if the step failed.
    pub fn cycle(&mut self) -> Result<Cycle, Error<TError>> {
        let result = self.step();
        self.sleep();
        result
    }

    /// Runs the loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            if let Err(Error::Wrapped(_)) = self.cycle() {
                log::debug!("failed to drive fans");
            }
        }
    }

    /// Hands back the sensor, fans and delay.
    pub fn release(self) -> (Dht11<TSensorPin>, Fans<TFan1, TFan2>, TDelay) {
        (self.sensor, self.fans, self.delay)
    }

    fn sleep(&mut self) {
        // Split into whole milliseconds and the remainder so long intervals can't overflow u32 us.
        let interval = self.options.sample_interval;
        let millis = interval.as_millis().min(u32::MAX as u128) as u32;
        self.delay.delay_ms(millis);
        let rest_us = interval.subsec_micros() % 1000;
        if rest_us > 0 {
            self.delay.delay_us(rest_us);
        }
    }
}
