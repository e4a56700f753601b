use std::time::Duration;

/// Millisecond countdown driven by host frame time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    initial_ms: u32,
    remaining_ms: f64,
}

impl Countdown {
    pub fn new(initial_ms: u32) -> Self {
        Self {
            initial_ms,
            remaining_ms: f64::from(initial_ms),
        }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.remaining_ms -= elapsed.as_secs_f64() * 1000.0;
    }

    /// Milliseconds left, or `None` once the countdown has run out.
    pub fn remaining(&self) -> Option<f64> {
        (self.remaining_ms > 0.0).then_some(self.remaining_ms)
    }

    pub fn finished(&self) -> bool {
        self.remaining_ms <= 0.0
    }

    pub fn initial_ms(&self) -> u32 {
        self.initial_ms
    }

    /// Share of the initial time still left, `None` once run out.
    pub fn fraction_remaining(&self) -> Option<f32> {
        self.remaining()
            .map(|left| (left / f64::from(self.initial_ms)) as f32)
    }
}
