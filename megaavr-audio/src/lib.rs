//! # megaavr-audio
//!
//! A `no_std`, zero-allocation fixed-rate audio output for the
//! ATmega4809 (Arduino Nano Every) written in pure Rust. Frames produced by
//! the application are turned into a PWM duty cycle on TCA0, paced by the
//! timer's overflow interrupt, with integer arithmetic only.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Config | [`config`] | Compile-time derivation and validation of the timer program |
//! | Timing | [`divider`] | Tick-to-frame rate divider (×1, ×2, ×4) |
//! | Scaling | [`scale`] | Bias + multiply/shift into the comparator range |
//! | Data | [`frame`] / [`source`] / [`buffer`] | Frames, frame sources, lock-free frame buffer |
//! | Hardware | [`timer`] | TCA0 register program over a register bus |
//! | Output | [`output`] | PWM, `embedded-hal` and user-hook output stages |
//! | Driver | [`audio`] / [`control`] | Interrupt body and start/stop lifecycle |
//!
//! ## Quick start
//!
//! ```ignore
//! use megaavr_audio::prelude::*;
//!
//! static FRAMES: OutputBuffer<Mono> = FrameBuffer::new();
//!
//! let timer = Tca0::new::<DefaultConfig>(unsafe { VolatileBus::new() });
//! let mut out = AudioOutput::pwm(timer, FRAMES.reader()).unwrap();
//! out.start();
//!
//! // TCA0_OVF interrupt:
//! out.on_overflow();
//!
//! // main loop:
//! FRAMES.fill_with(|| Mono(next_sample()));
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `hal-pwm` | yes | [`output::HalPwmStage`] over `embedded-hal` 1.0 PWM channels |
//! | `defmt` | no | Log output through `defmt` |
//! | `rate-32768` | no | [`config::DefaultConfig`] runs at 32 768 Hz instead of 16 384 Hz |
//!
//! ## Audio parameters
//!
//! - **Sample format:** signed, centred at zero, 8 bits by default ([`constants::AUDIO_BITS`])
//! - **Default rate:** 16 384 Hz audio on a 32 768 Hz tick ([`config::Rate16384`])
//! - **Default pin:** D9 / PB0 / WO0 ([`constants::AUDIO_CHANNEL_1_PIN`])
//! - **Clock:** 16 MHz ([`constants::F_CPU_HZ`])

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

pub mod constants;
pub mod config;
pub mod divider;
pub mod scale;
pub mod frame;
pub mod source;
pub mod buffer;
pub mod timer;
pub mod output;
pub mod audio;
pub mod control;

#[cfg(test)]
mod integration_tests;

/// Everything needed to wire up an output.
pub mod prelude {
    pub use crate::audio::AudioOutput;
    pub use crate::buffer::{BufferReader, FrameBuffer, OutputBuffer};
    pub use crate::config::{AudioConfig, DefaultConfig, OutputConfig};
    pub use crate::control::AudioControl;
    pub use crate::divider::Decimation;
    pub use crate::frame::{Frame, Mono, Stereo};
    pub use crate::output::{OutputStage, PwmStage};
    pub use crate::source::{from_fn, FrameSource};
    pub use crate::timer::{PwmTimer, Tca0, VolatileBus};
}
