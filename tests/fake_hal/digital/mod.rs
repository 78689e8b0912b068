use super::concurrent;
use dht_fan_control::gpio::{Direction, IoPin};
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin, PinState};

#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned by writes after [`Pin::fail_set_high`].
    WriteFailed,
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Something the driver did to the pin, other than reading it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Direction(Direction),
    Set(PinState),
}

/// A scripted single-wire line.
///
/// Every `is_high`/`is_low` call consumes one sample from the data, so one sample stands for one
/// microsecond of the line when the driver polls at 1us. Once the data runs out the pin reads the
/// default level. Polls are counted under the pin's name.
#[derive(Debug)]
pub struct Pin {
    data_to_read: Option<Vec<u8>>,
    name: &'static str,
    default_data: bool,
    set_high_fails: bool,
    pub events: Vec<Event>,
}

impl Pin {
    pub fn new(name: &'static str) -> Pin {
        concurrent::set_named_value(name, 0);
        Pin {
            data_to_read: None,
            name: name,
            default_data: true,
            set_high_fails: false,
            events: Vec::new(),
        }
    }

    pub fn set_default_data(&mut self, default: bool) {
        self.default_data = default;
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data_to_read = Some(data);
        concurrent::set_named_value(self.name, 0);
    }

    /// Makes every later `set_high` fail without touching the line.
    pub fn fail_set_high(&mut self) {
        self.set_high_fails = true;
    }

    pub fn polls(&self) -> usize {
        concurrent::get_named_value(self.name)
    }

    fn next_level(&mut self) -> bool {
        let data_index = concurrent::get_and_increment_named_value(self.name);
        match &self.data_to_read {
            Some(data) if data_index < data.len() => data[data_index] > 0,
            _ => self.default_data,
        }
    }
}

impl ErrorType for Pin {
    type Error = Error;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.next_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.next_level())
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Set(PinState::Low));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.set_high_fails {
            return Err(Error::WriteFailed);
        }
        self.events.push(Event::Set(PinState::High));
        Ok(())
    }
}

impl IoPin for Pin {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.events.push(Event::Direction(direction));
        Ok(())
    }
}

const ZERO_WIDTH_US: usize = 24;
const ONE_WIDTH_US: usize = 70;

/// The sensor's acknowledgement as the driver sees it: still high, pulled low, released high.
pub const ACK: [u8; 5] = [1, 1, 0, 0, 1];

/// Appends one bit whose low pulse lasts `width` polls after the start-of-bit poll.
pub fn push_bit_with_width(data: &mut Vec<u8>, width: usize) {
    data.extend(std::iter::repeat(0).take(width + 1));
    data.extend_from_slice(&[1, 1]);
}

/// Encodes `bytes` MSB-first after the acknowledgement.
pub fn create_data_vec(bytes: [u8; 5]) -> Vec<u8> {
    let mut data = ACK.to_vec();
    for byte in bytes.iter() {
        for shift in (0..8).rev() {
            let width = if (byte >> shift) & 1 == 1 {
                ONE_WIDTH_US
            } else {
                ZERO_WIDTH_US
            };
            push_bit_with_width(&mut data, width);
        }
    }
    data
}
