//! Output through `embedded-hal` PWM channels.

use core::marker::PhantomData;

use embedded_hal::pwm::SetDutyCycle;

use crate::config::{ConfigError, OutputSettings};
use crate::frame::Frame;
use crate::scale::{SampleScaler, ScaleRatio};
use crate::timer::PwmTimer;

use super::OutputStage;

/// Drives `C` HAL PWM channels with frames of type `F`, one channel per
/// frame channel.
///
/// Samples are scaled onto the channels' own duty range
/// `[0, max_duty_cycle]`, independent of the TCA0 period, so full scale is
/// full duty. All channels must report the same `max_duty_cycle`.
pub struct HalPwmStage<F, P, const C: usize> {
    channels: [P; C],
    scaler: SampleScaler,
    _frame: PhantomData<F>,
}

impl<F: Frame, P: SetDutyCycle, const C: usize> HalPwmStage<F, P, C> {
    /// Fails if the frame has more channels than `C`, if the channels
    /// disagree on their duty range, or if no scale ratio fits that range.
    pub fn new(channels: [P; C], settings: &OutputSettings) -> Result<Self, ConfigError> {
        if F::CHANNELS > C {
            warn!("frame has {} channels, {} PWM channels", F::CHANNELS, C);
            return Err(ConfigError::ChannelMismatch {
                frame: F::CHANNELS,
                configured: C,
            });
        }

        let max_duty = match channels.first() {
            Some(channel) => channel.max_duty_cycle(),
            None => {
                return Err(ConfigError::ChannelMismatch {
                    frame: F::CHANNELS,
                    configured: 0,
                })
            }
        };
        for (index, channel) in channels.iter().enumerate() {
            let other = channel.max_duty_cycle();
            if other != max_duty {
                warn!(
                    "PWM channel {} duty range {} differs from {}",
                    index, other, max_duty
                );
                return Err(ConfigError::DutyRangeMismatch {
                    first: max_duty,
                    other,
                });
            }
        }

        let bits = settings.scaler().bits();
        let scaler = ScaleRatio::derive(bits, max_duty)
            .and_then(|ratio| SampleScaler::new(bits, max_duty, ratio))
            .inspect_err(|_e| warn!("no scale ratio for {} bits onto {}", bits, max_duty))?;

        Ok(HalPwmStage {
            channels,
            scaler,
            _frame: PhantomData,
        })
    }

    pub fn scaler(&self) -> &SampleScaler {
        &self.scaler
    }

    pub fn release(self) -> [P; C] {
        self.channels
    }
}

impl<F: Frame, T: PwmTimer, P: SetDutyCycle, const C: usize> OutputStage<F, T>
    for HalPwmStage<F, P, C>
{
    fn emit(&mut self, _timer: &mut T, frame: F) {
        for (index, channel) in self.channels.iter_mut().take(F::CHANNELS).enumerate() {
            // no recovery path inside the interrupt
            let _ = channel.set_duty_cycle(self.scaler.scale(frame.sample(index)));
        }
    }
}
