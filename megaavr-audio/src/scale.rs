//! Integer sample scaling into the timer's comparator range.
//!
//! A signed sample of `bits` depth is clamped, biased into
//! `[0, 2^bits - 1]` and remapped onto `[0, top]` with a multiply-then-shift.
//! The ratio is fixed per (bit depth, top) pair and checked against every
//! input value before it is ever used, so the interrupt path needs neither a
//! divide nor a range check on the output.

use crate::config::ConfigError;

/// Largest shift considered when deriving or validating a ratio.
///
/// Keeps `top << shift` and `biased * multiplier` inside `u32`.
pub const MAX_SHIFT: u8 = 15;

/// Multiply-then-shift approximation of `top / (2^bits - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleRatio {
    pub multiplier: u16,
    pub shift: u8,
}

impl ScaleRatio {
    /// Pass-through ratio for a comparator that already spans the sample range.
    pub const IDENTITY: Self = Self::new(1, 0);

    pub const fn new(multiplier: u16, shift: u8) -> Self {
        ScaleRatio { multiplier, shift }
    }

    pub const fn is_identity(&self) -> bool {
        self.multiplier == 1 && self.shift == 0
    }

    /// Apply the ratio to an already-biased sample.
    #[inline(always)]
    pub const fn apply(&self, biased: u16) -> u16 {
        ((biased as u32 * self.multiplier as u32) >> self.shift) as u16
    }

    /// Find the cheapest ratio mapping a `bits`-deep sample onto `[0, top]`.
    ///
    /// Tries shifts from 0 upward; for each the multiplier is
    /// `floor(top * 2^shift / (2^bits - 1))`, which can never overshoot `top`.
    /// The first candidate that passes [`validate`](Self::validate) wins.
    pub const fn derive(bits: u8, top: u16) -> Result<Self, ConfigError> {
        if bits < MIN_BITS || bits > MAX_BITS {
            return Err(ConfigError::UnsupportedBitDepth(bits));
        }
        let max_in = (1u32 << bits) - 1;
        if max_in == top as u32 {
            return Ok(Self::IDENTITY);
        }

        let mut shift = 0;
        while shift <= MAX_SHIFT {
            let multiplier = ((top as u32) << shift) / max_in;
            if multiplier > 0 && multiplier <= u16::MAX as u32 {
                let candidate = Self::new(multiplier as u16, shift);
                if candidate.validate(bits, top).is_ok() {
                    return Ok(candidate);
                }
            }
            shift += 1;
        }
        Err(ConfigError::NoScaleRatio { bits, top })
    }

    /// Check the ratio against every biased input of a `bits`-deep sample.
    ///
    /// Each output must stay within `[0, top]` and within one step of the
    /// exact `biased * top / (2^bits - 1)`.
    pub const fn validate(&self, bits: u8, top: u16) -> Result<(), ConfigError> {
        if bits < MIN_BITS || bits > MAX_BITS {
            return Err(ConfigError::UnsupportedBitDepth(bits));
        }
        if self.shift > MAX_SHIFT {
            return Err(ConfigError::InvalidShift(self.shift));
        }
        if self.multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier);
        }

        let max_in = (1u32 << bits) - 1;
        let mut biased = 0u32;
        while biased <= max_in {
            let scaled = (biased * self.multiplier as u32) >> self.shift;
            if scaled > top as u32 {
                return Err(ConfigError::ScaleExceedsTop {
                    input: biased as u16,
                    output: scaled,
                    top,
                });
            }
            let exact = biased * top as u32 / max_in;
            let error = if exact > scaled {
                exact - scaled
            } else {
                scaled - exact
            };
            if error > 1 {
                return Err(ConfigError::ScaleInaccurate {
                    input: biased as u16,
                    output: scaled,
                    exact,
                });
            }
            biased += 1;
        }
        Ok(())
    }
}

/// Smallest supported sample depth.
pub const MIN_BITS: u8 = 2;

/// Largest supported sample depth (the bias must fit an `i16`).
pub const MAX_BITS: u8 = 15;

/// Bias + rescale stage for one resolution pair.
///
/// Built once from a validated configuration; [`scale`](Self::scale) is the
/// only piece that runs per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleScaler {
    bits: u8,
    top: u16,
    ratio: ScaleRatio,
}

impl SampleScaler {
    /// Pair a sample depth with a comparator top and a ratio.
    ///
    /// The ratio is checked against every input of the depth, so a scaler
    /// can never produce a value above `top`.
    pub const fn new(bits: u8, top: u16, ratio: ScaleRatio) -> Result<Self, ConfigError> {
        match ratio.validate(bits, top) {
            Ok(()) => Ok(SampleScaler { bits, top, ratio }),
            Err(e) => Err(e),
        }
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub const fn top(&self) -> u16 {
        self.top
    }

    pub const fn ratio(&self) -> ScaleRatio {
        self.ratio
    }

    /// Half the sample range: `2^(bits - 1)`.
    pub const fn bias(&self) -> u16 {
        1 << (self.bits - 1)
    }

    /// Clamp to `[-bias, bias - 1]` and add the bias.
    #[inline(always)]
    pub const fn bias_sample(&self, sample: i16) -> u16 {
        let half = 1i16 << (self.bits - 1);
        let clamped = if sample < -half {
            -half
        } else if sample > half - 1 {
            half - 1
        } else {
            sample
        };
        (clamped + half) as u16
    }

    /// Signed sample to comparator value in `[0, top]`.
    #[inline(always)]
    pub const fn scale(&self, sample: i16) -> u16 {
        self.ratio.apply(self.bias_sample(sample))
    }

    /// Comparator value for silence.
    pub const fn idle_level(&self) -> u16 {
        self.scale(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler_8bit_244() -> SampleScaler {
        SampleScaler::new(8, 244, ScaleRatio::derive(8, 244).unwrap()).unwrap()
    }

    #[test]
    fn derive_8bit_onto_244() {
        // 244 * 64 / 255 = 61.2 -> 61; shift 5 (30/32) misses by 5 at full scale.
        assert_eq!(ScaleRatio::derive(8, 244), Ok(ScaleRatio::new(61, 6)));
    }

    #[test]
    fn derive_9bit_onto_487() {
        // Needs the full 9-bit shift: 487 * 512 / 511 = 487.9 -> 487.
        let ratio = ScaleRatio::derive(9, 487).unwrap();
        assert_eq!(ratio, ScaleRatio::new(487, 9));
        // 511 * 487 = 248_857 does not fit 16 bits
        assert_eq!(ratio.apply(511), 486);
    }

    #[test]
    fn derive_8bit_onto_122() {
        assert_eq!(ScaleRatio::derive(8, 122), Ok(ScaleRatio::new(61, 7)));
    }

    #[test]
    fn derive_identity_when_ranges_match() {
        assert_eq!(ScaleRatio::derive(8, 255), Ok(ScaleRatio::IDENTITY));
        assert!(ScaleRatio::IDENTITY.is_identity());
        assert_eq!(ScaleRatio::IDENTITY.apply(200), 200);
    }

    #[test]
    fn derive_rejects_bad_depth() {
        assert_eq!(
            ScaleRatio::derive(16, 244),
            Err(ConfigError::UnsupportedBitDepth(16))
        );
        assert_eq!(
            ScaleRatio::derive(1, 244),
            Err(ConfigError::UnsupportedBitDepth(1))
        );
    }

    #[test]
    fn legacy_134_over_128_overshoots_244() {
        let ratio = ScaleRatio::new(134, 7);
        // 255 * 134 = 34_170; >> 7 = 266
        assert_eq!(ratio.apply(255), 266);
        assert!(matches!(
            ratio.validate(8, 244),
            Err(ConfigError::ScaleExceedsTop { top: 244, .. })
        ));
    }

    #[test]
    fn coarse_ratio_is_inaccurate() {
        // 30 / 32 undershoots full scale by 5 steps
        assert!(matches!(
            ScaleRatio::new(30, 5).validate(8, 244),
            Err(ConfigError::ScaleInaccurate { .. })
        ));
    }

    #[test]
    fn validate_rejects_degenerate_ratios() {
        assert_eq!(
            ScaleRatio::new(0, 3).validate(8, 244),
            Err(ConfigError::ZeroMultiplier)
        );
        assert_eq!(
            ScaleRatio::new(1, 16).validate(8, 244),
            Err(ConfigError::InvalidShift(16))
        );
    }

    #[test]
    fn minimum_sample_maps_to_zero() {
        let s = scaler_8bit_244();
        assert_eq!(s.bias(), crate::constants::AUDIO_BIAS);
        assert_eq!(s.bias_sample(-128), 0);
        assert_eq!(s.scale(-128), 0);
        // Same scenario with the legacy constants: (0 * 134) >> 7
        assert_eq!(ScaleRatio::new(134, 7).apply(0), 0);
    }

    #[test]
    fn maximum_sample_stays_below_top() {
        let s = scaler_8bit_244();
        assert_eq!(s.bias_sample(127), 255);
        // 255 * 61 = 15_555; >> 6 = 243
        assert_eq!(s.scale(127), 243);
        assert!(s.scale(127) <= s.top());
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let s = scaler_8bit_244();
        assert_eq!(s.scale(i16::MIN), s.scale(-128));
        assert_eq!(s.scale(i16::MAX), s.scale(127));
        assert_eq!(s.scale(300), 243);
    }

    #[test]
    fn scaler_rejects_unvalidated_ratio() {
        assert!(matches!(
            SampleScaler::new(8, 244, ScaleRatio::new(134, 7)),
            Err(ConfigError::ScaleExceedsTop { top: 244, .. })
        ));
        assert_eq!(
            SampleScaler::new(0, 244, ScaleRatio::IDENTITY),
            Err(ConfigError::UnsupportedBitDepth(0))
        );
        assert_eq!(
            SampleScaler::new(16, 244, ScaleRatio::IDENTITY),
            Err(ConfigError::UnsupportedBitDepth(16))
        );
    }

    #[test]
    fn idle_level_is_mid_scale() {
        let s = scaler_8bit_244();
        // 128 * 61 >> 6 = 122
        assert_eq!(s.idle_level(), 122);
    }

    #[test]
    fn full_domain_within_one_step() {
        for &(bits, top) in &[(8u8, 244u16), (9, 487), (8, 122), (10, 244)] {
            let ratio = ScaleRatio::derive(bits, top).unwrap();
            let s = SampleScaler::new(bits, top, ratio).unwrap();
            let half = 1i32 << (bits - 1);
            for sample in -half..half {
                let out = s.scale(sample as i16) as i32;
                let exact = (sample + half) * top as i32 / (2 * half - 1);
                assert!(out <= top as i32, "bits={bits} top={top} sample={sample}");
                assert!(
                    (out - exact).abs() <= 1,
                    "bits={bits} top={top} sample={sample}: {out} vs {exact}"
                );
            }
        }
    }

    #[test]
    fn scale_is_monotonic() {
        let s = scaler_8bit_244();
        let mut prev = 0;
        for sample in -128i16..=127 {
            let out = s.scale(sample);
            assert!(out >= prev);
            prev = out;
        }
    }
}
