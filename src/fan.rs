use core::fmt;
use embedded_hal::digital::{OutputPin, PinState};

/// Temperature at which the first fan switches on, in degrees Celsius.
pub const DEFAULT_FAN1_ON: u8 = 25;
/// Temperature at which both fans run, in degrees Celsius.
pub const DEFAULT_BOTH_ON: u8 = 30;

/// What the two fans should be doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanState {
    BothOff,
    Fan1Only,
    BothOn,
}

impl FanState {
    pub fn fan1_on(self) -> bool {
        self != FanState::BothOff
    }

    pub fn fan2_on(self) -> bool {
        self == FanState::BothOn
    }
}

impl fmt::Display for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanState::BothOff => write!(f, "both off"),
            FanState::Fan1Only => write!(f, "fan 1 only"),
            FanState::BothOn => write!(f, "both on"),
        }
    }
}

/// Lower bounds, inclusive, of the two fan stages.
///
/// There is no hysteresis: a temperature sitting on a boundary flips the fans every time it
/// crosses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    fan1_on: u8,
    both_on: u8,
}

pub const DEFAULT_THRESHOLDS: Thresholds = Thresholds {
    fan1_on: DEFAULT_FAN1_ON,
    both_on: DEFAULT_BOTH_ON,
};

impl Thresholds {
    /// Returns `None` if `fan1_on` is above `both_on`.
    pub const fn new(fan1_on: u8, both_on: u8) -> Option<Thresholds> {
        if fan1_on > both_on {
            return None;
        }
        Some(Thresholds { fan1_on, both_on })
    }

    pub fn fan1_on(&self) -> u8 {
        self.fan1_on
    }

    pub fn both_on(&self) -> u8 {
        self.both_on
    }

    pub fn decide(&self, temperature: u8) -> FanState {
        if temperature >= self.both_on {
            FanState::BothOn
        } else if temperature >= self.fan1_on {
            FanState::Fan1Only
        } else {
            FanState::BothOff
        }
    }
}

impl Default for Thresholds {
    fn default() -> Thresholds {
        DEFAULT_THRESHOLDS
    }
}

/// Picks the fan state for `temperature` using the default 25C and 30C thresholds.
pub fn decide(temperature: u8) -> FanState {
    DEFAULT_THRESHOLDS.decide(temperature)
}

/// The two fan outputs.
#[derive(Debug)]
pub struct Fans<TFan1, TFan2> {
    fan1: TFan1,
    fan2: TFan2,
}

impl<TFan1, TFan2, TError> Fans<TFan1, TFan2>
where
    TFan1: OutputPin<Error = TError>,
    TFan2: OutputPin<Error = TError>,
{
    /// Takes both outputs and switches them off.
    pub fn new(fan1: TFan1, fan2: TFan2) -> Result<Fans<TFan1, TFan2>, TError> {
        let mut fans = Fans { fan1, fan2 };
        fans.apply(FanState::BothOff)?;
        Ok(fans)
    }

    /// Drives both pins to match `state`. Both pins are written on every call.
    pub fn apply(&mut self, state: FanState) -> Result<(), TError> {
        self.fan1.set_state(PinState::from(state.fan1_on()))?;
        self.fan2.set_state(PinState::from(state.fan2_on()))?;
        Ok(())
    }

    /// Decides the state for `temperature` and applies it.
    pub fn drive(&mut self, temperature: u8, thresholds: &Thresholds) -> Result<FanState, TError> {
        let state = thresholds.decide(temperature);
        self.apply(state)?;
        Ok(state)
    }

    pub fn release(self) -> (TFan1, TFan2) {
        (self.fan1, self.fan2)
    }
}
