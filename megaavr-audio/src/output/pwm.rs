//! Writes scaled samples to the timer's compare registers.

use core::marker::PhantomData;

use crate::config::{ConfigError, OutputSettings};
use crate::frame::Frame;
use crate::scale::SampleScaler;
use crate::timer::PwmTimer;

use super::OutputStage;

/// Biases, rescales and writes every channel of a frame to its compare buffer.
///
/// Output pins beyond the frame's channel count keep the idle level loaded
/// at start.
pub struct PwmStage<F> {
    scaler: SampleScaler,
    _frame: PhantomData<F>,
}

impl<F: Frame> PwmStage<F> {
    /// Fails if the frame carries more channels than there are output pins.
    pub fn new(settings: &OutputSettings) -> Result<Self, ConfigError> {
        let configured = settings.channel_count();
        if F::CHANNELS > configured {
            warn!(
                "frame has {} channels, {} output pins",
                F::CHANNELS,
                configured
            );
            return Err(ConfigError::ChannelMismatch {
                frame: F::CHANNELS,
                configured,
            });
        }
        Ok(PwmStage {
            scaler: settings.scaler(),
            _frame: PhantomData,
        })
    }

    pub fn scaler(&self) -> &SampleScaler {
        &self.scaler
    }
}

impl<F: Frame, T: PwmTimer> OutputStage<F, T> for PwmStage<F> {
    #[inline(always)]
    fn emit(&mut self, timer: &mut T, frame: F) {
        for channel in 0..F::CHANNELS {
            timer.set_compare(channel, self.scaler.scale(frame.sample(channel)));
        }
    }
}
