//! Build-time output configuration.
//!
//! An [`OutputConfig`] names the clock, prescaler, waveform mode, audio rate,
//! decimation, sample depth and output pins. [`OutputConfig::resolve`] turns
//! it into the register program and scaling constants ([`OutputSettings`])
//! with integer arithmetic only, and rejects every combination that cannot
//! deliver the audio rate exactly.
//!
//! Resolution is a `const fn`. Implementing [`AudioConfig`] for a marker type
//! forces it to run during compilation: an invalid configuration stops the
//! build with the error message instead of reaching the hardware.
//!
//! ```ignore
//! use megaavr_audio::config::{AudioConfig, OutputConfig};
//! use megaavr_audio::divider::Decimation;
//!
//! struct MySynth;
//!
//! impl AudioConfig for MySynth {
//!     // 16 MHz, dual slope, PER = 244 → 32 787 Hz tick, every 2nd tick is a frame
//!     const CONFIG: OutputConfig = OutputConfig::new(16_384, Decimation::X2).with_period(244);
//! }
//! ```

use core::fmt;

use crate::constants::{
    AUDIO_BITS, AUDIO_CHANNEL_1_PIN, AUDIO_CHANNEL_2_PIN, DEFAULT_ISR_BUDGET_CYCLES,
    DEFAULT_MAX_RATE_ERROR_PPM, F_CPU_HZ, MAX_CHANNELS,
};
use crate::scale::{SampleScaler, ScaleRatio, MAX_BITS, MIN_BITS};
use crate::timer::registers as reg;

pub use crate::divider::Decimation;

/// Smallest usable period (TOP) value.
pub const MIN_PERIOD: u16 = 2;

// ── Public enums ───────────────────────────────────────────────────────────

/// TCA0 clock prescaler (CTRLA.CLKSEL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div2 => 2,
            Prescaler::Div4 => 4,
            Prescaler::Div8 => 8,
            Prescaler::Div16 => 16,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    pub const fn clksel(self) -> u8 {
        match self {
            Prescaler::Div1 => reg::CLKSEL_DIV1,
            Prescaler::Div2 => reg::CLKSEL_DIV2,
            Prescaler::Div4 => reg::CLKSEL_DIV4,
            Prescaler::Div8 => reg::CLKSEL_DIV8,
            Prescaler::Div16 => reg::CLKSEL_DIV16,
            Prescaler::Div64 => reg::CLKSEL_DIV64,
            Prescaler::Div256 => reg::CLKSEL_DIV256,
            Prescaler::Div1024 => reg::CLKSEL_DIV1024,
        }
    }
}

/// PWM waveform generation mode (CTRLB.WGMODE).
///
/// The mode decides how many timer counts separate two overflow interrupts:
///
/// | Mode | OVF at | Counts per tick |
/// |------|--------|-----------------|
/// | `SingleSlope` | TOP | `PER + 1` |
/// | `DualSlopeTop` | TOP | `2 × PER` |
/// | `DualSlopeBottom` | BOTTOM | `2 × PER` |
/// | `DualSlopeBoth` | TOP and BOTTOM | `PER` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaveformMode {
    SingleSlope,
    DualSlopeTop,
    DualSlopeBoth,
    DualSlopeBottom,
}

impl WaveformMode {
    pub const fn wgmode(self) -> u8 {
        match self {
            WaveformMode::SingleSlope => reg::WGMODE_SINGLESLOPE,
            WaveformMode::DualSlopeTop => reg::WGMODE_DSTOP,
            WaveformMode::DualSlopeBoth => reg::WGMODE_DSBOTH,
            WaveformMode::DualSlopeBottom => reg::WGMODE_DSBOTTOM,
        }
    }

    /// `(slope, offset)` such that counts per tick = `slope × PER + offset`.
    const fn geometry(self) -> (u64, u64) {
        match self {
            WaveformMode::SingleSlope => (1, 1),
            WaveformMode::DualSlopeTop | WaveformMode::DualSlopeBottom => (2, 0),
            WaveformMode::DualSlopeBoth => (1, 0),
        }
    }

    /// Timer counts between two overflow interrupts for a given period.
    pub const fn counts_per_tick(self, period: u16) -> u32 {
        let (slope, offset) = self.geometry();
        (slope * period as u64 + offset) as u32
    }

    /// Period (TOP) closest to `clock / (prescaler × tick_rate)` counts per tick.
    pub const fn period_for(
        self,
        clock_hz: u32,
        prescaler: Prescaler,
        tick_rate_hz: u32,
    ) -> Result<u16, ConfigError> {
        let (slope, offset) = self.geometry();
        let unit = prescaler.divisor() as u64 * tick_rate_hz as u64;
        let clock = clock_hz as u64;
        if unit == 0 || clock < offset * unit {
            return Err(ConfigError::PeriodOutOfRange { period: 0 });
        }
        let numerator = clock - offset * unit;
        let denominator = slope * unit;
        // round to nearest
        let period = (2 * numerator + denominator) / (2 * denominator);
        if period < MIN_PERIOD as u64 || period > u16::MAX as u64 {
            let clipped = if period > u32::MAX as u64 {
                u32::MAX
            } else {
                period as u32
            };
            return Err(ConfigError::PeriodOutOfRange { period: clipped });
        }
        Ok(period as u16)
    }

    /// Deviation of the achieved tick rate from `tick_rate_hz`, in ppm.
    pub const fn rate_error_ppm(
        self,
        clock_hz: u32,
        prescaler: Prescaler,
        period: u16,
        tick_rate_hz: u32,
    ) -> u32 {
        let cycles_per_tick = prescaler.divisor() as u64 * self.counts_per_tick(period) as u64;
        let ideal = tick_rate_hz as u64 * cycles_per_tick;
        let clock = clock_hz as u64;
        let diff = if clock > ideal {
            clock - ideal
        } else {
            ideal - clock
        };
        let ppm = diff * 1_000_000 / ideal;
        if ppm > u32::MAX as u64 {
            u32::MAX
        } else {
            ppm as u32
        }
    }
}

/// A TCA0 waveform output routed to PORTB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmPin {
    /// Arduino (Nano Every) pin number.
    pub arduino_pin: u8,
    /// Waveform output / compare channel index (WO0..WO2).
    pub wo: u8,
    /// Bit of the pin in PORTB.
    pub port_mask: u8,
}

impl PwmPin {
    /// Map a Nano Every pin number to its TCA0 output, if it has one.
    ///
    /// With TCA0 routed to PORTB: D9 = PB0 = WO0, D10 = PB1 = WO1,
    /// D5 = PB2 = WO2.
    pub const fn from_arduino(pin: u8) -> Option<Self> {
        let (wo, bit) = match pin {
            9 => (0, 0),
            10 => (1, 1),
            5 => (2, 2),
            _ => return None,
        };
        Some(PwmPin {
            arduino_pin: pin,
            wo,
            port_mask: 1 << bit,
        })
    }

    /// Buffered compare register feeding this pin.
    pub const fn compare_buffer(&self) -> u16 {
        reg::tca0_cmpbuf(self.wo)
    }

    /// Unbuffered compare register feeding this pin.
    pub const fn compare(&self) -> u16 {
        reg::tca0_cmp(self.wo)
    }
}

/// How the multiply-then-shift ratio is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaleSelection {
    /// Derive the cheapest valid ratio for the (bits, period) pair.
    Auto,
    /// Use this ratio after validating it over the full input domain.
    Explicit(ScaleRatio),
}

// ── Errors ─────────────────────────────────────────────────────────────────

/// Reasons a configuration cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    UnsupportedBitDepth(u8),
    UnsupportedPin(u8),
    DuplicatePin(u8),
    ZeroRate,
    TickRateOverflow { audio_rate_hz: u32, factor: u8 },
    PeriodOutOfRange { period: u32 },
    PeriodMismatch { documented: u16, derived: u16 },
    RateErrorTooLarge { ppm: u32, limit: u32 },
    IsrBudgetExceeded { cycles_per_tick: u32, budget: u32 },
    InvalidShift(u8),
    ZeroMultiplier,
    ScaleExceedsTop { input: u16, output: u32, top: u16 },
    ScaleInaccurate { input: u16, output: u32, exact: u32 },
    NoScaleRatio { bits: u8, top: u16 },
    ChannelMismatch { frame: usize, configured: usize },
    DutyRangeMismatch { first: u16, other: u16 },
}

impl ConfigError {
    /// Short description, usable in `const` panics.
    pub const fn message(&self) -> &'static str {
        match self {
            ConfigError::UnsupportedBitDepth(_) => "sample bit depth must be between 2 and 15",
            ConfigError::UnsupportedPin(_) => "pin has no TCA0 waveform output (use 9, 10 or 5)",
            ConfigError::DuplicatePin(_) => "both channels are mapped to the same pin",
            ConfigError::ZeroRate => "clock and audio rate must be non-zero",
            ConfigError::TickRateOverflow { .. } => "audio rate x decimation overflows 32 bits",
            ConfigError::PeriodOutOfRange { .. } => {
                "derived timer period does not fit the 16-bit PER register"
            }
            ConfigError::PeriodMismatch { .. } => {
                "derived timer period differs from the documented period"
            }
            ConfigError::RateErrorTooLarge { .. } => {
                "achieved tick rate deviates too far from audio rate x decimation"
            }
            ConfigError::IsrBudgetExceeded { .. } => {
                "too few CPU cycles per tick for the interrupt handler"
            }
            ConfigError::InvalidShift(_) => "scale shift exceeds 15 bits",
            ConfigError::ZeroMultiplier => "scale multiplier must be non-zero",
            ConfigError::ScaleExceedsTop { .. } => "scale ratio writes values above the timer period",
            ConfigError::ScaleInaccurate { .. } => "scale ratio is off by more than one step",
            ConfigError::NoScaleRatio { .. } => "no multiply/shift pair within one step exists",
            ConfigError::ChannelMismatch { .. } => {
                "frame has more channels than configured output pins"
            }
            ConfigError::DutyRangeMismatch { .. } => {
                "PWM channels report different duty ranges"
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())?;
        match *self {
            ConfigError::UnsupportedBitDepth(bits) => write!(f, " (got {bits})"),
            ConfigError::UnsupportedPin(pin) | ConfigError::DuplicatePin(pin) => {
                write!(f, " (pin {pin})")
            }
            ConfigError::TickRateOverflow {
                audio_rate_hz,
                factor,
            } => write!(f, " ({audio_rate_hz} Hz x{factor})"),
            ConfigError::PeriodOutOfRange { period } => write!(f, " (period {period})"),
            ConfigError::PeriodMismatch {
                documented,
                derived,
            } => write!(f, " (documented {documented}, derived {derived})"),
            ConfigError::RateErrorTooLarge { ppm, limit } => {
                write!(f, " ({ppm} ppm, limit {limit} ppm)")
            }
            ConfigError::IsrBudgetExceeded {
                cycles_per_tick,
                budget,
            } => write!(f, " ({cycles_per_tick} cycles, need {budget})"),
            ConfigError::InvalidShift(shift) => write!(f, " (shift {shift})"),
            ConfigError::ScaleExceedsTop { input, output, top } => {
                write!(f, " ({input} -> {output}, top {top})")
            }
            ConfigError::ScaleInaccurate {
                input,
                output,
                exact,
            } => write!(f, " ({input} -> {output}, exact {exact})"),
            ConfigError::NoScaleRatio { bits, top } => write!(f, " ({bits} bits onto {top})"),
            ConfigError::ChannelMismatch { frame, configured } => {
                write!(f, " (frame {frame}, pins {configured})")
            }
            ConfigError::DutyRangeMismatch { first, other } => {
                write!(f, " (first {first}, other {other})")
            }
            ConfigError::ZeroRate | ConfigError::ZeroMultiplier => Ok(()),
        }
    }
}

// ── Configuration ──────────────────────────────────────────────────────────

/// Build-time description of the audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub clock_hz: u32,
    pub prescaler: Prescaler,
    pub waveform: WaveformMode,
    pub audio_rate_hz: u32,
    pub decimation: Decimation,
    /// Depth of the signed samples handed to the output.
    pub bits: u8,
    pub left_pin: u8,
    pub right_pin: Option<u8>,
    /// Period the configuration is documented to produce, if any.
    pub period: Option<u16>,
    pub scale: ScaleSelection,
    /// CPU cycles the interrupt handler needs per tick, worst case.
    pub isr_budget_cycles: u32,
    pub max_rate_error_ppm: u32,
}

impl OutputConfig {
    /// Mono output on pin 9 at the default clock, prescaler 1, dual slope.
    pub const fn new(audio_rate_hz: u32, decimation: Decimation) -> Self {
        OutputConfig {
            clock_hz: F_CPU_HZ,
            prescaler: Prescaler::Div1,
            waveform: WaveformMode::DualSlopeTop,
            audio_rate_hz,
            decimation,
            bits: AUDIO_BITS,
            left_pin: AUDIO_CHANNEL_1_PIN,
            right_pin: None,
            period: None,
            scale: ScaleSelection::Auto,
            isr_budget_cycles: DEFAULT_ISR_BUDGET_CYCLES,
            max_rate_error_ppm: DEFAULT_MAX_RATE_ERROR_PPM,
        }
    }

    pub const fn with_clock(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    pub const fn with_prescaler(mut self, prescaler: Prescaler) -> Self {
        self.prescaler = prescaler;
        self
    }

    pub const fn with_waveform(mut self, waveform: WaveformMode) -> Self {
        self.waveform = waveform;
        self
    }

    pub const fn with_bits(mut self, bits: u8) -> Self {
        self.bits = bits;
        self
    }

    pub const fn with_pins(mut self, left: u8, right: Option<u8>) -> Self {
        self.left_pin = left;
        self.right_pin = right;
        self
    }

    /// Require the derived period to equal `period`.
    pub const fn with_period(mut self, period: u16) -> Self {
        self.period = Some(period);
        self
    }

    pub const fn with_scale(mut self, ratio: ScaleRatio) -> Self {
        self.scale = ScaleSelection::Explicit(ratio);
        self
    }

    pub const fn with_isr_budget(mut self, cycles: u32) -> Self {
        self.isr_budget_cycles = cycles;
        self
    }

    pub const fn with_max_rate_error(mut self, ppm: u32) -> Self {
        self.max_rate_error_ppm = ppm;
        self
    }

    /// Nominal timer overflow rate: `audio_rate × decimation`, saturating at
    /// `u32::MAX`. [`resolve`](Self::resolve) rejects rates that saturate.
    pub const fn tick_rate_hz(&self) -> u32 {
        self.decimation.tick_rate(self.audio_rate_hz)
    }

    /// Derive and validate the register program and scaling constants.
    pub const fn resolve(&self) -> Result<OutputSettings, ConfigError> {
        if self.bits < MIN_BITS || self.bits > MAX_BITS {
            return Err(ConfigError::UnsupportedBitDepth(self.bits));
        }
        if self.clock_hz == 0 || self.audio_rate_hz == 0 {
            return Err(ConfigError::ZeroRate);
        }
        let tick_rate_hz = match self.audio_rate_hz.checked_mul(self.decimation.factor() as u32) {
            Some(rate) => rate,
            None => {
                return Err(ConfigError::TickRateOverflow {
                    audio_rate_hz: self.audio_rate_hz,
                    factor: self.decimation.factor(),
                })
            }
        };

        let pins = match self.resolve_pins() {
            Ok(pins) => pins,
            Err(e) => return Err(e),
        };

        let period = match self
            .waveform
            .period_for(self.clock_hz, self.prescaler, tick_rate_hz)
        {
            Ok(period) => period,
            Err(e) => return Err(e),
        };
        if let Some(documented) = self.period {
            if documented != period {
                return Err(ConfigError::PeriodMismatch {
                    documented,
                    derived: period,
                });
            }
        }

        let rate_error_ppm =
            self.waveform
                .rate_error_ppm(self.clock_hz, self.prescaler, period, tick_rate_hz);
        if rate_error_ppm > self.max_rate_error_ppm {
            return Err(ConfigError::RateErrorTooLarge {
                ppm: rate_error_ppm,
                limit: self.max_rate_error_ppm,
            });
        }

        let cycles_per_tick = self.clock_hz / tick_rate_hz;
        if cycles_per_tick < self.isr_budget_cycles {
            return Err(ConfigError::IsrBudgetExceeded {
                cycles_per_tick,
                budget: self.isr_budget_cycles,
            });
        }

        let ratio = match self.scale {
            ScaleSelection::Auto => match ScaleRatio::derive(self.bits, period) {
                Ok(ratio) => ratio,
                Err(e) => return Err(e),
            },
            // validated by SampleScaler::new below
            ScaleSelection::Explicit(ratio) => ratio,
        };

        let scaler = match SampleScaler::new(self.bits, period, ratio) {
            Ok(scaler) => scaler,
            Err(e) => return Err(e),
        };

        Ok(OutputSettings {
            clock_hz: self.clock_hz,
            audio_rate_hz: self.audio_rate_hz,
            tick_rate_hz,
            rate_error_ppm,
            decimation: self.decimation,
            prescaler: self.prescaler,
            waveform: self.waveform,
            period,
            pins,
            scaler,
        })
    }

    /// [`resolve`](Self::resolve), panicking with the error message.
    ///
    /// Evaluated in a `const` context this is a compile error.
    pub const fn build(&self) -> OutputSettings {
        match self.resolve() {
            Ok(settings) => settings,
            Err(e) => panic!("{}", e.message()),
        }
    }

    const fn resolve_pins(&self) -> Result<[Option<PwmPin>; MAX_CHANNELS], ConfigError> {
        let left = match PwmPin::from_arduino(self.left_pin) {
            Some(pin) => pin,
            None => return Err(ConfigError::UnsupportedPin(self.left_pin)),
        };
        let right = match self.right_pin {
            None => None,
            Some(pin) if pin == self.left_pin => return Err(ConfigError::DuplicatePin(pin)),
            Some(pin) => match PwmPin::from_arduino(pin) {
                Some(resolved) => Some(resolved),
                None => return Err(ConfigError::UnsupportedPin(pin)),
            },
        };
        Ok([Some(left), right])
    }
}

/// Resolved register program and scaling constants.
///
/// Only obtainable through [`OutputConfig::resolve`] / [`OutputConfig::build`],
/// so every value in it has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputSettings {
    clock_hz: u32,
    audio_rate_hz: u32,
    tick_rate_hz: u32,
    rate_error_ppm: u32,
    decimation: Decimation,
    prescaler: Prescaler,
    waveform: WaveformMode,
    period: u16,
    pins: [Option<PwmPin>; MAX_CHANNELS],
    scaler: SampleScaler,
}

impl OutputSettings {
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    pub const fn audio_rate_hz(&self) -> u32 {
        self.audio_rate_hz
    }

    /// Nominal tick rate, `audio_rate_hz × decimation`.
    pub const fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    /// Deviation of the achieved tick rate from nominal.
    pub const fn rate_error_ppm(&self) -> u32 {
        self.rate_error_ppm
    }

    pub const fn decimation(&self) -> Decimation {
        self.decimation
    }

    pub const fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    pub const fn waveform(&self) -> WaveformMode {
        self.waveform
    }

    /// Value of TCA0.PER; also the largest comparator value ever written.
    pub const fn period(&self) -> u16 {
        self.period
    }

    pub const fn pins(&self) -> [Option<PwmPin>; MAX_CHANNELS] {
        self.pins
    }

    pub const fn scaler(&self) -> SampleScaler {
        self.scaler
    }

    /// CTRLA value that runs the timer.
    pub const fn ctrla(&self) -> u8 {
        self.prescaler.clksel() | reg::CTRLA_ENABLE
    }

    /// CTRLB value: waveform mode plus a compare enable per output pin.
    pub const fn ctrlb(&self) -> u8 {
        let mut value = self.waveform.wgmode();
        let mut i = 0;
        while i < MAX_CHANNELS {
            if let Some(pin) = self.pins[i] {
                value |= reg::ctrlb_cmpen(pin.wo);
            }
            i += 1;
        }
        value
    }

    /// PORTB bits driven by the output.
    pub const fn port_mask(&self) -> u8 {
        let mut mask = 0;
        let mut i = 0;
        while i < MAX_CHANNELS {
            if let Some(pin) = self.pins[i] {
                mask |= pin.port_mask;
            }
            i += 1;
        }
        mask
    }

    pub const fn channel_count(&self) -> usize {
        let mut count = 0;
        let mut i = 0;
        while i < MAX_CHANNELS {
            if self.pins[i].is_some() {
                count += 1;
            }
            i += 1;
        }
        count
    }
}

// ── Presets ────────────────────────────────────────────────────────────────

/// Resolved configuration selected at build time.
///
/// `SETTINGS` is evaluated during compilation wherever it is used, so an
/// invalid `CONFIG` fails the build:
///
/// ```compile_fail
/// use megaavr_audio::config::{AudioConfig, OutputConfig, OutputSettings};
/// use megaavr_audio::divider::Decimation;
///
/// // pin 3 has no TCA0 waveform output
/// struct OnPin3;
///
/// impl AudioConfig for OnPin3 {
///     const CONFIG: OutputConfig = OutputConfig::new(16_384, Decimation::X2).with_pins(3, None);
/// }
///
/// const SETTINGS: OutputSettings = OnPin3::SETTINGS;
/// ```
pub trait AudioConfig {
    const CONFIG: OutputConfig;
    const SETTINGS: OutputSettings = Self::CONFIG.build();
}

/// 16 384 Hz audio, mono on pin 9: 32 768 Hz tick (PER = 244, dual slope), every 2nd tick.
pub struct Rate16384;

impl AudioConfig for Rate16384 {
    const CONFIG: OutputConfig = OutputConfig::new(16_384, Decimation::X2).with_period(244);
}

/// 32 768 Hz audio, mono on pin 9: one frame per tick (PER = 244, dual slope).
pub struct Rate32768;

impl AudioConfig for Rate32768 {
    const CONFIG: OutputConfig = OutputConfig::new(32_768, Decimation::X1).with_period(244);
}

/// 16 384 Hz stereo audio on pins 9 (left) and 10 (right).
pub struct Stereo16384;

impl AudioConfig for Stereo16384 {
    const CONFIG: OutputConfig = OutputConfig::new(16_384, Decimation::X2)
        .with_pins(AUDIO_CHANNEL_1_PIN, Some(AUDIO_CHANNEL_2_PIN))
        .with_period(244);
}

/// 8 192 Hz audio with 9-bit samples: single slope PER = 487 (488 steps), every 4th tick.
pub struct Rate8192Hifi;

impl AudioConfig for Rate8192Hifi {
    const CONFIG: OutputConfig = OutputConfig::new(8_192, Decimation::X4)
        .with_waveform(WaveformMode::SingleSlope)
        .with_bits(9)
        .with_period(487);
}

#[cfg(not(feature = "rate-32768"))]
pub type DefaultConfig = Rate16384;

#[cfg(feature = "rate-32768")]
pub type DefaultConfig = Rate32768;
