//! Integration tests running the whole output path in software.
//!
//! ```text
//! FrameBuffer → BufferReader → AudioOutput::on_overflow()
//!     → RateDivider → PwmStage → Tca0 → [mock register file]
//! ```
//!
//! Each `on_overflow` call stands in for one TCA0 overflow interrupt.

use crate::audio::AudioOutput;
use crate::buffer::FrameBuffer;
use crate::config::{AudioConfig, OutputConfig, Rate16384, Rate32768, Rate8192Hifi, Stereo16384};
use crate::control::AudioControl;
use crate::divider::Decimation;
use crate::frame::{Mono, Stereo};
use crate::output::ExternalStage;
use crate::source::from_fn;
use crate::timer::mock::MockBus;
use crate::timer::registers as reg;
use crate::timer::Tca0;

/// 8 192 Hz on the dual-slope 32 768 Hz tick: one frame every 4th overflow.
struct Dual8192;

impl AudioConfig for Dual8192 {
    const CONFIG: OutputConfig = OutputConfig::new(8_192, Decimation::X4).with_period(244);
}

fn cmp0buf(bus: &MockBus) -> u16 {
    bus.read16(reg::TCA0_CMP0BUF)
}

// ---------------------------------------------------------------
// Rate division
// ---------------------------------------------------------------

#[test]
fn decimation_4_writes_once_per_four_overflows() {
    let timer = Tca0::new::<Dual8192>(MockBus::new());
    let mut n = 0i16;
    let mut out = AudioOutput::pwm(
        timer,
        from_fn(|| {
            n = (n + 1) & 0x7F;
            Mono(n)
        }),
    )
    .unwrap();
    out.start();
    // count only what the interrupt writes
    let (timer, stage, source) = out.release();
    let mut bus = timer.release();
    bus.clear_log();
    let mut out = AudioOutput::new(Tca0::new::<Dual8192>(bus), stage, source);

    let mut boundaries = 0;
    for _ in 0..4000 {
        if out.on_overflow() {
            boundaries += 1;
        }
    }

    assert_eq!(boundaries, 1000);
    assert_eq!(out.audio_ticks(), 1000);
    let bus = out.release().0.release();
    // one 16-bit write per boundary, one flag clear per overflow
    assert_eq!(bus.writes_to(reg::TCA0_CMP0BUF), 1000);
    assert_eq!(bus.writes_to(reg::TCA0_CMP0BUF + 1), 1000);
    assert_eq!(bus.writes_to(reg::TCA0_INTFLAGS), 4000);
    assert_eq!(bus.total_writes, 4000 + 2 * 1000);
}

#[test]
fn boundaries_are_evenly_spaced() {
    let timer = Tca0::new::<Rate8192Hifi>(MockBus::new());
    let mut out = AudioOutput::new(timer, ExternalStage::new(|_: Mono| {}), from_fn(|| Mono(0)));
    out.start();

    let mut last = None;
    for tick in 1..=64u32 {
        if out.on_overflow() {
            if let Some(prev) = last {
                assert_eq!(tick - prev, 4);
            }
            last = Some(tick);
        }
    }
    assert_eq!(last, Some(64));
    assert_eq!(out.audio_ticks(), 16);
}

// ---------------------------------------------------------------
// Scaling end to end
// ---------------------------------------------------------------

#[test]
fn extreme_samples_at_decimation_1() {
    let samples = [-128i16, 127];
    let mut i = 0;
    let timer = Tca0::new::<Rate32768>(MockBus::new());
    let mut out = AudioOutput::pwm(
        timer,
        from_fn(|| {
            let s = samples[i % 2];
            i += 1;
            Mono(s)
        }),
    )
    .unwrap();
    out.start();

    assert!(out.on_overflow());
    assert_eq!(cmp0buf(out.timer().bus()), 0);

    assert!(out.on_overflow());
    let top_value = cmp0buf(out.timer().bus());
    assert_eq!(top_value, 243);
    assert!(top_value <= Rate32768::SETTINGS.period());
}

#[test]
fn ramp_is_monotonic_and_within_period() {
    let frames: FrameBuffer<Mono, 256> = FrameBuffer::new();
    let mut s = -128i16;
    frames.fill_with(|| {
        let f = Mono(s);
        s += 1;
        f
    });
    // -128..=126 queued; 255 usable slots
    assert_eq!(frames.len(), 255);

    let timer = Tca0::new::<Rate32768>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, frames.reader()).unwrap();
    out.start();

    let mut prev = 0u16;
    for _ in 0..255 {
        out.on_overflow();
        let value = cmp0buf(out.timer().bus());
        assert!(value >= prev, "{value} after {prev}");
        assert!(value <= 244);
        prev = value;
    }
    assert_eq!(prev, Rate32768::SETTINGS.scaler().scale(126));
}

// ---------------------------------------------------------------
// Buffer hand-off
// ---------------------------------------------------------------

#[test]
fn buffer_feeds_interrupt_in_order() {
    let frames: FrameBuffer<Mono, 8> = FrameBuffer::new();
    for s in [-128, -64, 0, 64] {
        frames.push(Mono(s)).unwrap();
    }

    let timer = Tca0::new::<Rate16384>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, frames.reader()).unwrap();
    out.start();

    let scaler = Rate16384::SETTINGS.scaler();
    for s in [-128, -64, 0, 64] {
        assert!(!out.on_overflow());
        assert!(out.on_overflow());
        assert_eq!(cmp0buf(out.timer().bus()), scaler.scale(s));
    }
    assert!(frames.is_empty());
}

#[test]
fn underrun_holds_last_frame() {
    let frames: FrameBuffer<Mono, 4> = FrameBuffer::new();
    frames.push(Mono(100)).unwrap();

    let timer = Tca0::new::<Rate32768>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, frames.reader()).unwrap();
    out.start();

    out.on_overflow();
    let held = cmp0buf(out.timer().bus());
    assert_eq!(held, Rate32768::SETTINGS.scaler().scale(100));

    for _ in 0..10 {
        out.on_overflow();
        assert_eq!(cmp0buf(out.timer().bus()), held);
    }
    // the driver still counts every boundary
    assert_eq!(out.audio_ticks(), 11);

    frames.push(Mono(-100)).unwrap();
    out.on_overflow();
    assert_eq!(
        cmp0buf(out.timer().bus()),
        Rate32768::SETTINGS.scaler().scale(-100)
    );
}

#[test]
fn silence_before_first_frame_is_idle_level() {
    let frames: FrameBuffer<Mono, 4> = FrameBuffer::new();
    let timer = Tca0::new::<Rate16384>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, frames.reader()).unwrap();
    out.start();

    out.on_overflow();
    out.on_overflow();
    assert_eq!(cmp0buf(out.timer().bus()), Rate16384::SETTINGS.scaler().idle_level());
}

// ---------------------------------------------------------------
// Stereo
// ---------------------------------------------------------------

#[test]
fn stereo_pipeline() {
    let frames: FrameBuffer<Stereo, 4> = FrameBuffer::new();
    frames.push(Stereo::new(127, -128)).unwrap();

    let timer = Tca0::new::<Stereo16384>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, frames.reader()).unwrap();
    out.start();
    out.on_overflow();
    out.on_overflow();

    let bus = out.release().0.release();
    assert_eq!(bus.read16(reg::tca0_cmpbuf(0)), 243);
    assert_eq!(bus.read16(reg::tca0_cmpbuf(1)), 0);
}

// ---------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------

#[test]
fn stop_then_start_matches_power_on_start() {
    let fresh = {
        let timer = Tca0::new::<Rate16384>(MockBus::new());
        let mut out = AudioOutput::pwm(timer, from_fn(|| Mono(0))).unwrap();
        out.start();
        out.release().0.release().snapshot()
    };

    let timer = Tca0::new::<Rate16384>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, from_fn(|| Mono(90))).unwrap();
    out.start();
    for _ in 0..7 {
        out.on_overflow();
    }
    out.stop();
    out.start();

    assert_eq!(out.audio_ticks(), 0);
    assert_eq!(out.release().0.release().snapshot(), fresh);
}

#[test]
fn stop_leaves_outputs_low_and_quiet() {
    let timer = Tca0::new::<Stereo16384>(MockBus::new());
    let mut out = AudioOutput::pwm(timer, from_fn(|| Stereo::mono(50))).unwrap();
    out.start();
    out.on_overflow();
    out.on_overflow();
    out.stop();

    let bus = out.release().0.release();
    assert_eq!(bus.read8(reg::TCA0_INTCTRL), 0);
    assert_eq!(bus.read8(reg::TCA0_CTRLA), 0);
    assert_eq!(bus.read8(reg::TCA0_CTRLB), 0);
    assert_eq!(bus.read8(reg::PORTB_OUTCLR), 0b11);
}
