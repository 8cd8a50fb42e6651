//! Interrupt-driven audio output driver.
//!
//! [`AudioOutput`] owns the timer, the output stage, the frame source and the
//! rate divider. The application hands it to the TCA0 overflow interrupt and
//! calls [`on_overflow`](AudioOutput::on_overflow) from there; everything
//! else happens in the main loop.
//!
//! ## Architecture
//!
//! ```text
//! main loop                        TCA0_OVF interrupt
//! ┌───────────┐   FrameBuffer    ┌────────────────────────────────────┐
//! │ synthesis ├──push──►[ring]──►│ ack → divider → pull → scale → CMPnBUF │
//! └───────────┘                  └────────────────────────────────────┘
//!                                   every tick     every factor-th tick
//! ```
//!
//! ## Usage with avr-device
//!
//! ```ignore
//! use core::cell::RefCell;
//! use avr_device::interrupt::{self, Mutex};
//! use megaavr_audio::prelude::*;
//!
//! type Output = AudioOutput<Tca0<VolatileBus>, PwmStage<Mono>, BufferReader<'static, Mono, 256>, Mono>;
//!
//! static FRAMES: FrameBuffer<Mono, 256> = FrameBuffer::new();
//! static OUTPUT: Mutex<RefCell<Option<Output>>> = Mutex::new(RefCell::new(None));
//!
//! #[avr_device::interrupt(atmega4809)]
//! fn TCA0_OVF() {
//!     interrupt::free(|cs| {
//!         if let Some(out) = OUTPUT.borrow(cs).borrow_mut().as_mut() {
//!             out.on_overflow();
//!         }
//!     });
//! }
//!
//! // in main
//! let timer = Tca0::new::<DefaultConfig>(unsafe { VolatileBus::new() });
//! let mut out = AudioOutput::pwm(timer, FRAMES.reader()).unwrap();
//! out.start();
//! interrupt::free(|cs| OUTPUT.borrow(cs).replace(Some(out)));
//! unsafe { interrupt::enable() };
//!
//! loop {
//!     FRAMES.fill_with(|| synth.next());
//! }
//! ```

use core::marker::PhantomData;

use crate::config::{ConfigError, OutputSettings};
use crate::divider::RateDivider;
use crate::frame::Frame;
use crate::output::{OutputStage, PwmStage};
use crate::source::FrameSource;
use crate::timer::PwmTimer;

/// Fixed-rate audio output paced by timer overflows.
///
/// Generic over the timer `T`, output stage `O`, frame source `S` and frame
/// type `F`; all dispatch is static.
pub struct AudioOutput<T, O, S, F> {
    timer: T,
    stage: O,
    source: S,
    divider: RateDivider,
    /// Frames delivered since the last start.
    ticks: u32,
    running: bool,
    _frame: PhantomData<F>,
}

impl<T, S, F> AudioOutput<T, PwmStage<F>, S, F>
where
    T: PwmTimer,
    S: FrameSource<F>,
    F: Frame,
{
    /// Output on the timer's own compare channels.
    pub fn pwm(timer: T, source: S) -> Result<Self, ConfigError> {
        let stage = PwmStage::new(timer.settings())?;
        Ok(Self::new(timer, stage, source))
    }
}

impl<T, O, S, F> AudioOutput<T, O, S, F>
where
    T: PwmTimer,
    O: OutputStage<F, T>,
    S: FrameSource<F>,
    F: Frame,
{
    /// Assemble a stopped driver. The decimation comes from the timer's settings.
    pub fn new(timer: T, stage: O, source: S) -> Self {
        let divider = RateDivider::new(timer.settings().decimation());
        AudioOutput {
            timer,
            stage,
            source,
            divider,
            ticks: 0,
            running: false,
            _frame: PhantomData,
        }
    }

    /// Timer overflow handler body.
    ///
    /// Clears the overflow flag, then advances the divider. On a frame
    /// boundary it pulls exactly one frame from the source and commits it
    /// through the output stage. Returns `true` on a boundary.
    ///
    /// Never allocates, blocks or re-enters itself; call it only from the
    /// overflow interrupt (or with that interrupt masked).
    #[inline]
    pub fn on_overflow(&mut self) -> bool {
        self.timer.acknowledge_overflow();
        if !self.divider.tick() {
            return false;
        }
        let frame = self.source.next_frame();
        self.stage.emit(&mut self.timer, frame);
        self.ticks = self.ticks.wrapping_add(1);
        true
    }

    /// Frames delivered since the last start (wraps at `u32::MAX`).
    pub fn audio_ticks(&self) -> u32 {
        self.ticks
    }

    pub fn settings(&self) -> &OutputSettings {
        self.timer.settings()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn stage_mut(&mut self) -> &mut O {
        &mut self.stage
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Take the parts back. The timer is left as it is; stop it first.
    pub fn release(self) -> (T, O, S) {
        (self.timer, self.stage, self.source)
    }

    pub(crate) fn restart_counters(&mut self) {
        self.divider.reset();
        self.ticks = 0;
    }

    pub(crate) fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub(crate) fn running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioConfig, Rate16384};
    use crate::frame::Mono;
    use crate::output::ExternalStage;
    use crate::source::from_fn;
    use crate::timer::mock::MockBus;
    use crate::timer::registers as reg;
    use crate::timer::Tca0;

    #[test]
    fn new_driver_is_idle() {
        let timer = Tca0::new::<Rate16384>(MockBus::new());
        let out = AudioOutput::pwm(timer, from_fn(|| Mono(0))).unwrap();
        assert_eq!(out.audio_ticks(), 0);
        assert_eq!(out.settings(), &Rate16384::SETTINGS);
        assert_eq!(out.release().0.release().total_writes, 0);
    }

    #[test]
    fn overflow_acknowledged_before_anything_else() {
        let timer = Tca0::new::<Rate16384>(MockBus::new());
        let mut out = AudioOutput::pwm(timer, from_fn(|| Mono(0))).unwrap();

        assert!(!out.on_overflow());
        assert!(out.on_overflow());
        let bus = out.release().0.release();
        assert_eq!(bus.write_at(0), (reg::TCA0_INTFLAGS, reg::INT_OVF));
        assert_eq!(bus.write_at(1), (reg::TCA0_INTFLAGS, reg::INT_OVF));
        assert_eq!(bus.write_at(2).0, reg::TCA0_CMP0BUF);
        assert_eq!(bus.log_count, 4);
    }

    #[test]
    fn source_pulled_once_per_boundary() {
        let timer = Tca0::new::<Rate16384>(MockBus::new());
        let mut pulls = 0u32;
        let mut out = AudioOutput::new(
            timer,
            ExternalStage::new(|_: Mono| {}),
            from_fn(|| {
                pulls += 1;
                Mono(0)
            }),
        );
        for _ in 0..10 {
            out.on_overflow();
        }
        assert_eq!(out.audio_ticks(), 5);
        drop(out);
        assert_eq!(pulls, 5);
    }
}
