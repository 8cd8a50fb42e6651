//! Output frames: one signed sample per channel, centred at zero.

/// One frame of output audio.
pub trait Frame: Copy {
    /// Number of channels carried by the frame.
    const CHANNELS: usize;

    /// The all-zero frame.
    const SILENCE: Self;

    /// Sample of `channel` (`0..CHANNELS`).
    fn sample(&self, channel: usize) -> i16;
}

/// Single-channel frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mono(pub i16);

impl Frame for Mono {
    const CHANNELS: usize = 1;
    const SILENCE: Self = Mono(0);

    #[inline(always)]
    fn sample(&self, _channel: usize) -> i16 {
        self.0
    }
}

impl From<i16> for Mono {
    fn from(sample: i16) -> Self {
        Mono(sample)
    }
}

impl From<i8> for Mono {
    fn from(sample: i8) -> Self {
        Mono(sample as i16)
    }
}

/// Two-channel frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stereo {
    pub left: i16,
    pub right: i16,
}

impl Stereo {
    pub const fn new(left: i16, right: i16) -> Self {
        Stereo { left, right }
    }

    /// Same sample on both channels.
    pub const fn mono(sample: i16) -> Self {
        Stereo {
            left: sample,
            right: sample,
        }
    }
}

impl Frame for Stereo {
    const CHANNELS: usize = 2;
    const SILENCE: Self = Stereo::new(0, 0);

    #[inline(always)]
    fn sample(&self, channel: usize) -> i16 {
        if channel == 0 {
            self.left
        } else {
            self.right
        }
    }
}
