/// Core clock of the Nano Every / ATmega4809 as shipped (Hz).
pub const F_CPU_HZ: u32 = 16_000_000;

/// Default output sample depth in bits.
pub const AUDIO_BITS: u8 = 8;

/// Offset that moves a signed `AUDIO_BITS` sample into the unsigned range.
pub const AUDIO_BIAS: u16 = 1 << (AUDIO_BITS - 1);

/// Arduino pin carrying the first (mono / left) channel.
pub const AUDIO_CHANNEL_1_PIN: u8 = 9;

/// Arduino pin carrying the second (right) channel in stereo builds.
pub const AUDIO_CHANNEL_2_PIN: u8 = 10;

/// Maximum number of output channels one TCA0 instance drives.
pub const MAX_CHANNELS: usize = 2;

/// Slots in the default output frame buffer (one slot stays free).
pub const OUTPUT_BUFFER_SIZE: usize = 256;

/// CPU cycles that must be available between two timer ticks.
pub const DEFAULT_ISR_BUDGET_CYCLES: u32 = 200;

/// Largest accepted deviation of the achieved tick rate from nominal.
pub const DEFAULT_MAX_RATE_ERROR_PPM: u32 = 1_000;
