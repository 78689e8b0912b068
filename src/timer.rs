use embedded_hal::delay::DelayNs;

/// The clock the default calibration assumes: an 8MHz internal oscillator.
pub const CPU_HZ: u32 = 8_000_000;

/// Cycles one iteration of the spin loop costs on the default target (loop counter decrement,
/// compare and branch).
pub const CYCLES_PER_ITERATION: u32 = 4;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Delays by spinning the CPU.
///
/// Accuracy depends entirely on `cpu_hz` and `cycles_per_iteration` matching the real hardware.
/// Porting to a different clock only needs a different `BusyWait`, not changes to callers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BusyWait {
    cpu_hz: u32,
    cycles_per_iteration: u32,
}

impl BusyWait {
    pub const fn new(cpu_hz: u32, cycles_per_iteration: u32) -> BusyWait {
        BusyWait {
            cpu_hz,
            // A zero here would divide by zero below.
            cycles_per_iteration: if cycles_per_iteration == 0 {
                1
            } else {
                cycles_per_iteration
            },
        }
    }

    pub fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    /// How many spin iterations cover `ns` nanoseconds, rounded up so delays are never short.
    pub fn iterations_for_ns(&self, ns: u32) -> u64 {
        let cycles = (ns as u64 * self.cpu_hz as u64 + NANOS_PER_SECOND - 1) / NANOS_PER_SECOND;
        let per_iteration = self.cycles_per_iteration as u64;
        (cycles + per_iteration - 1) / per_iteration
    }
}

impl Default for BusyWait {
    fn default() -> BusyWait {
        BusyWait::new(CPU_HZ, CYCLES_PER_ITERATION)
    }
}

impl DelayNs for BusyWait {
    fn delay_ns(&mut self, ns: u32) {
        for _ in 0..self.iterations_for_ns(ns) {
            core::hint::spin_loop();
        }
    }
}
