//! Output stages: where a frame goes once the divider asks for one.
//!
//! | Stage | Sink |
//! |-------|------|
//! | [`PwmStage`] | TCA0 buffered compare registers through [`PwmTimer`] |
//! | [`HalPwmStage`] | any `embedded_hal::pwm::SetDutyCycle` channel (feature `hal-pwm`) |
//! | [`ExternalStage`] | a user hook, e.g. an SPI/I²C DAC; [`noop`] discards frames |
//!
//! Stages run inside the timer interrupt. `emit` must not block or allocate.

mod external;
mod pwm;

#[cfg(feature = "hal-pwm")]
mod hal_pwm;

pub use external::{noop, ExternalStage};
pub use pwm::PwmStage;

#[cfg(feature = "hal-pwm")]
pub use hal_pwm::HalPwmStage;

use crate::frame::Frame;
use crate::timer::PwmTimer;

/// Delivers one frame per frame boundary.
pub trait OutputStage<F: Frame, T: PwmTimer> {
    /// Commit `frame`; called once per boundary from the interrupt.
    fn emit(&mut self, timer: &mut T, frame: F);
}
