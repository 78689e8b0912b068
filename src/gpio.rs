use core::cell::Cell;
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// The number of pins on a single port.
pub const PORT_WIDTH: u8 = 8;

/// Which way a bidirectional pin is currently configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A pin that can be switched between input and output while keeping its identity.
///
/// Single-wire sensors drive and sample the same line, so the driver needs to flip direction in
/// place rather than converting between pin types.
pub trait IoPin: InputPin + OutputPin {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

/// Register access for one 8-bit I/O port.
///
/// Implementations typically wrap volatile reads and writes of the data direction, output and
/// input registers. Methods take `&self` since several pins share one port.
pub trait Port {
    /// Reads the data direction register. A set bit means output.
    fn direction(&self) -> u8;
    fn set_direction(&self, value: u8);
    /// Reads the output latch.
    fn output(&self) -> u8;
    fn set_output(&self, value: u8);
    /// Samples the input register.
    fn input(&self) -> u8;
}

/// A single pin, identified by its port and bit position.
#[derive(Debug)]
pub struct PortPin<'a, P: Port> {
    port: &'a P,
    bit: u8,
}

impl<'a, P: Port> PortPin<'a, P> {
    /// Binds `bit` of `port` and configures it as an input.
    ///
    /// Returns `None` if `bit` is not on the port. The port's registers are left untouched then.
    pub fn input(port: &'a P, bit: u8) -> Option<PortPin<'a, P>> {
        let mut pin = PortPin::new(port, bit)?;
        pin.configure(Direction::Input);
        Some(pin)
    }

    /// Binds `bit` of `port` and configures it as an output.
    ///
    /// Returns `None` if `bit` is not on the port. The port's registers are left untouched then.
    pub fn output(port: &'a P, bit: u8) -> Option<PortPin<'a, P>> {
        let mut pin = PortPin::new(port, bit)?;
        pin.configure(Direction::Output);
        Some(pin)
    }

    fn new(port: &'a P, bit: u8) -> Option<PortPin<'a, P>> {
        if bit >= PORT_WIDTH {
            return None;
        }
        Some(PortPin { port, bit })
    }

    pub fn bit(&self) -> u8 {
        self.bit
    }

    pub fn direction(&self) -> Direction {
        if self.port.direction() & self.mask() != 0 {
            Direction::Output
        } else {
            Direction::Input
        }
    }

    #[inline]
    fn mask(&self) -> u8 {
        1 << self.bit
    }

    fn configure(&mut self, direction: Direction) {
        let ddr = self.port.direction();
        match direction {
            Direction::Output => self.port.set_direction(ddr | self.mask()),
            Direction::Input => self.port.set_direction(ddr & !self.mask()),
        }
    }

    fn latch(&mut self, high: bool) {
        // On an input pin this only changes the pull-up latch, which is what the hardware does.
        let out = self.port.output();
        if high {
            self.port.set_output(out | self.mask());
        } else {
            self.port.set_output(out & !self.mask());
        }
    }
}

impl<'a, P: Port> ErrorType for PortPin<'a, P> {
    type Error = Infallible;
}

impl<'a, P: Port> InputPin for PortPin<'a, P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.port.input() & self.mask() != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.port.input() & self.mask() == 0)
    }
}

impl<'a, P: Port> OutputPin for PortPin<'a, P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.latch(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.latch(true);
        Ok(())
    }
}

impl<'a, P: Port> IoPin for PortPin<'a, P> {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.configure(direction);
        Ok(())
    }
}

/// A port backed by plain memory instead of hardware registers.
///
/// Useful on the host, and for wiring pins to something other than a real MCU port. The input
/// register follows the output latch for pins configured as outputs; input pins read whatever was
/// last passed to [`RamPort::drive_input`].
#[derive(Debug, Default)]
pub struct RamPort {
    ddr: Cell<u8>,
    out: Cell<u8>,
    external: Cell<u8>,
}

impl RamPort {
    pub const fn new() -> RamPort {
        RamPort {
            ddr: Cell::new(0),
            out: Cell::new(0),
            external: Cell::new(0),
        }
    }

    /// Sets the levels seen on pins configured as inputs.
    pub fn drive_input(&self, levels: u8) {
        self.external.set(levels);
    }
}

impl Port for RamPort {
    fn direction(&self) -> u8 {
        self.ddr.get()
    }

    fn set_direction(&self, value: u8) {
        self.ddr.set(value);
    }

    fn output(&self) -> u8 {
        self.out.get()
    }

    fn set_output(&self, value: u8) {
        self.out.set(value);
    }

    fn input(&self) -> u8 {
        let ddr = self.ddr.get();
        (self.out.get() & ddr) | (self.external.get() & !ddr)
    }
}
