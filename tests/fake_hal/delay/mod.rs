use embedded_hal::delay::DelayNs;

/// Records delays instead of waiting.
#[derive(Debug, Default)]
pub struct Delay {
    pub total_ns: u64,
    pub ms_calls: Vec<u32>,
    pub us_calls: Vec<u32>,
}

impl Delay {
    pub fn new() -> Delay {
        Delay::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_us(&mut self, us: u32) {
        self.us_calls.push(us);
        self.total_ns += us as u64 * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}
