use crate::audio::AudioOutput;
use crate::frame::Frame;
use crate::output::OutputStage;
use crate::source::FrameSource;
use crate::timer::PwmTimer;

/// Run-time lifecycle of an audio output.
pub trait AudioControl {
    /// Program the hardware from scratch and begin delivering frames.
    ///
    /// Safe to call while running: the register program is rewritten and the
    /// divider and tick counter restart.
    fn start(&mut self);

    /// Stop the interrupt and leave the outputs at a defined low level.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

impl<T, O, S, F> AudioControl for AudioOutput<T, O, S, F>
where
    T: PwmTimer,
    O: OutputStage<F, T>,
    S: FrameSource<F>,
    F: Frame,
{
    fn start(&mut self) {
        self.restart_counters();
        self.timer_mut().start();
        self.set_running(true);

        let s = self.settings();
        info!(
            "audio start: {} Hz x{} (PER {}, {} ppm), {} channel(s)",
            s.audio_rate_hz(),
            s.decimation().factor(),
            s.period(),
            s.rate_error_ppm(),
            s.channel_count()
        );
    }

    fn stop(&mut self) {
        self.timer_mut().stop();
        self.set_running(false);
        info!("audio stop after {} frames", self.audio_ticks());
    }

    fn is_running(&self) -> bool {
        self.running()
    }
}
