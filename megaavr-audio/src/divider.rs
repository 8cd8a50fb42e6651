//! Tick-to-frame rate divider.
//!
//! The timer overflows at `tick_rate`; audio frames are due at
//! `tick_rate / factor`. [`RateDivider::tick`] runs once per overflow and
//! reports whether this tick is a frame boundary. The non-boundary path is
//! one increment and one compare.

/// Integer ratio between the hardware tick rate and the audio rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Decimation {
    X1 = 1,
    X2 = 2,
    X4 = 4,
}

impl Decimation {
    pub const fn factor(self) -> u8 {
        self as u8
    }

    /// Nominal tick rate needed to deliver `audio_rate_hz`, saturating at `u32::MAX`.
    pub const fn tick_rate(self, audio_rate_hz: u32) -> u32 {
        audio_rate_hz.saturating_mul(self as u32)
    }

    /// The decimation relating two rates, if it is one of the supported ones.
    pub const fn between(tick_rate_hz: u32, audio_rate_hz: u32) -> Option<Self> {
        if audio_rate_hz == 0 || tick_rate_hz % audio_rate_hz != 0 {
            return None;
        }
        match tick_rate_hz / audio_rate_hz {
            1 => Some(Decimation::X1),
            2 => Some(Decimation::X2),
            4 => Some(Decimation::X4),
            _ => None,
        }
    }
}

/// Counts timer ticks and flags every `factor`-th one.
///
/// Owned by the interrupt handler; nothing else reads or writes the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDivider {
    factor: u8,
    count: u8,
}

impl RateDivider {
    pub const fn new(decimation: Decimation) -> Self {
        RateDivider {
            factor: decimation.factor(),
            count: 0,
        }
    }

    /// Register one tick. Returns `true` on a frame boundary.
    #[inline(always)]
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count < self.factor {
            return false;
        }
        self.count = 0;
        true
    }

    /// Restart counting so the next boundary is `factor` ticks away.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub const fn factor(&self) -> u8 {
        self.factor
    }

    /// Ticks seen since the last boundary.
    pub const fn phase(&self) -> u8 {
        self.count
    }
}
