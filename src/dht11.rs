use crate::gpio::{Direction, IoPin};
use core::fmt;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

/// How long the host holds the line low to wake the sensor. The datasheet minimum is 18ms.
pub const START_LOW_MS: u32 = 20;
/// How long the host drives the line high before releasing it to the sensor.
pub const START_HIGH_US: u32 = 40;
/// Polls allowed for each half of the sensor's acknowledgement, one per microsecond.
pub const ACK_POLLS: u32 = 80;
/// Polls allowed for each edge of a data bit, one per microsecond.
pub const BIT_POLLS: u32 = 100;
/// Pulses strictly longer than this many microseconds are read as a one.
pub const ONE_THRESHOLD_US: u32 = 30;
/// Bits in a full frame: four data bytes and a checksum.
pub const FRAME_BITS: usize = 40;

const POLL_INTERVAL_US: u32 = 1;

#[derive(Debug, PartialEq)]
pub enum Error<TIoError> {
    /// Wrapped error from the HAL.
    Wrapped(TIoError),
    /// The sensor never acknowledged the start signal.
    NoResponse,
    /// The line stopped toggling part way through the frame.
    Timeout {
        /// Index of the bit that was being received, in 0..40.
        bit: u8,
    },
    /// All 40 bits arrived but the checksum byte did not match.
    ChecksumError,
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
            Error::NoResponse => write!(f, "no response from sensor"),
            Error::Timeout { bit } => write!(f, "timed out receiving bit {}", bit),
            Error::ChecksumError => write!(f, "checksum mismatch"),
        }
    }
}

/// One accepted reading, in whole units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Degrees Celsius.
    pub temperature: u8,
    /// Relative humidity, percent.
    pub humidity: u8,
}

/// The five raw bytes of a transmission, in the order the sensor sends them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame([u8; 5]);

impl Frame {
    pub fn new(bytes: [u8; 5]) -> Frame {
        Frame(bytes)
    }

    pub fn bytes(&self) -> &[u8; 5] {
        &self.0
    }

    pub fn humidity(&self) -> u8 {
        self.0[0]
    }

    pub fn humidity_decimal(&self) -> u8 {
        self.0[1]
    }

    pub fn temperature(&self) -> u8 {
        self.0[2]
    }

    pub fn temperature_decimal(&self) -> u8 {
        self.0[3]
    }

    pub fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// Sets bit `index` of the frame, counting from the most-significant bit of the first byte.
    pub fn set_bit(&mut self, index: usize) {
        debug_assert!(index < FRAME_BITS);
        self.0[index / 8] |= 1 << (7 - (index % 8));
    }

    /// The low eight bits of the sum of the four data bytes.
    pub fn expected_checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
    }

    pub fn checksum_ok(&self) -> bool {
        self.checksum() == self.expected_checksum()
    }

    /// Converts the frame to a sample, rejecting it whole if the checksum doesn't match.
    pub fn into_sample<TIoError>(self) -> Result<Sample, Error<TIoError>> {
        if !self.checksum_ok() {
            return Err(Error::ChecksumError);
        }
        Ok(Sample {
            temperature: self.temperature(),
            humidity: self.humidity(),
        })
    }
}

/// Classifies a measured pulse width.
#[inline]
pub fn is_one(width_us: u32) -> bool {
    width_us > ONE_THRESHOLD_US
}

/// A DHT11 on a single bidirectional pin.
#[derive(Debug)]
pub struct Dht11<TPin> {
    pin: TPin,
}

impl<TPin, TError> Dht11<TPin>
where
    TPin: IoPin<Error = TError>,
{
    /// Takes ownership of the sensor line and releases it (input mode).
    pub fn new(mut pin: TPin) -> Result<Dht11<TPin>, Error<TError>> {
        pin.set_direction(Direction::Input)?;
        Ok(Dht11 { pin })
    }

    /// Hands the pin back.
    pub fn release(self) -> TPin {
        self.pin
    }

    /// Reads one sample from the sensor.
    ///
    /// This blocks for the whole exchange: the 20ms start signal plus roughly 4ms of polling. Every
    /// wait is bounded by a fixed number of 1us polls, so a missing sensor costs at most a few
    /// milliseconds more. The caller should leave at least a second between reads.
    ///
    /// Any failure discards the frame. No retries are attempted here.
    pub fn read_sample<TDelay>(&mut self, delay: &mut TDelay) -> Result<Sample, Error<TError>>
    where
        TDelay: DelayNs,
    {
        self.send_start(delay)?;
        let frame = self.receive_frame(delay)?;
        let sample = frame.into_sample::<TError>()?;
        log::trace!(
            "dht11 sample: {}C {}% ({:?})",
            sample.temperature,
            sample.humidity,
            frame.bytes()
        );
        Ok(sample)
    }

    /// Sends the wake pulse, then hands the line to the sensor.
    ///
    /// The pin always ends up as an input, even if driving it failed part way.
    fn send_start<TDelay: DelayNs>(&mut self, delay: &mut TDelay) -> Result<(), Error<TError>> {
        let driven = self.drive_start(delay);
        let released = self.pin.set_direction(Direction::Input);
        driven?;
        released?;
        Ok(())
    }

    fn drive_start<TDelay: DelayNs>(&mut self, delay: &mut TDelay) -> Result<(), TError> {
        self.pin.set_direction(Direction::Output)?;
        self.pin.set_low()?;
        delay.delay_ms(START_LOW_MS);
        self.pin.set_high()?;
        delay.delay_us(START_HIGH_US);
        Ok(())
    }

    fn receive_frame<TDelay: DelayNs>(
        &mut self,
        delay: &mut TDelay,
    ) -> Result<Frame, Error<TError>> {
        // Acknowledgement: the sensor pulls low, then releases high.
        if self.wait_for(PinState::Low, ACK_POLLS, delay)?.is_none() {
            return Err(Error::NoResponse);
        }
        if self.wait_for(PinState::High, ACK_POLLS, delay)?.is_none() {
            return Err(Error::NoResponse);
        }

        let mut frame = Frame::default();
        for index in 0..FRAME_BITS {
            let timeout = Error::Timeout { bit: index as u8 };
            if self.wait_for(PinState::Low, BIT_POLLS, delay)?.is_none() {
                return Err(timeout);
            }
            let width = match self.wait_for(PinState::High, BIT_POLLS, delay)? {
                Some(width) => width,
                None => return Err(timeout),
            };
            if is_one(width) {
                frame.set_bit(index);
            }
        }
        Ok(frame)
    }

    /// Polls until the line reaches `state`, sleeping 1us after each miss.
    ///
    /// Returns the number of misses before the level was seen, or `None` once `max_polls` polls
    /// have all missed.
    #[inline]
    fn wait_for<TDelay: DelayNs>(
        &mut self,
        state: PinState,
        max_polls: u32,
        delay: &mut TDelay,
    ) -> Result<Option<u32>, Error<TError>> {
        for polls in 0..max_polls {
            let reached = match state {
                PinState::High => self.pin.is_high()?,
                PinState::Low => self.pin.is_low()?,
            };
            if reached {
                return Ok(Some(polls));
            }
            delay.delay_us(POLL_INTERVAL_US);
        }
        Ok(None)
    }
}
