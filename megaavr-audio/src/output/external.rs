//! Hands frames to user code instead of the PWM pins.

use crate::frame::Frame;
use crate::timer::PwmTimer;

use super::OutputStage;

/// Calls a hook with every frame, unscaled.
///
/// The timer still runs and paces the frames; its compare registers are left
/// alone. Use it to feed an external DAC or to capture output in tests.
pub struct ExternalStage<H> {
    hook: H,
}

impl<H> ExternalStage<H> {
    pub const fn new(hook: H) -> Self {
        ExternalStage { hook }
    }

    pub fn into_inner(self) -> H {
        self.hook
    }
}

/// Stage that drops every frame.
pub fn noop<F: Frame>() -> ExternalStage<fn(F)> {
    ExternalStage::new(discard::<F> as fn(F))
}

fn discard<F>(_frame: F) {}

impl<F: Frame, T: PwmTimer, H: FnMut(F)> OutputStage<F, T> for ExternalStage<H> {
    #[inline(always)]
    fn emit(&mut self, _timer: &mut T, frame: F) {
        (self.hook)(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rate16384;
    use crate::frame::Mono;
    use crate::timer::mock::MockBus;
    use crate::timer::Tca0;

    #[test]
    fn hook_sees_raw_frames() {
        let mut timer = Tca0::new::<Rate16384>(MockBus::new());
        let mut seen = [0i16; 3];
        let mut n = 0;
        {
            let mut stage = ExternalStage::new(|f: Mono| {
                seen[n] = f.0;
                n += 1;
            });
            for s in [-5, 0, 300] {
                stage.emit(&mut timer, Mono(s));
            }
        }
        assert_eq!(seen, [-5, 0, 300]);
        assert_eq!(timer.release().total_writes, 0);
    }

    #[test]
    fn noop_touches_nothing() {
        let mut timer = Tca0::new::<Rate16384>(MockBus::new());
        let mut stage = noop::<Mono>();
        stage.emit(&mut timer, Mono(42));
        assert_eq!(timer.release().total_writes, 0);
    }
}
