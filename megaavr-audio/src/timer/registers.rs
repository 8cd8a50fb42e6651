//! ATmega4809 register addresses and bitfields used by the audio output.
//!
//! Taken from the megaAVR 0-series datasheet (TCA single mode, PORTMUX and
//! PORT chapters). Addresses are data-space addresses; 16-bit timer
//! registers are accessed through the shared TEMP latch, low byte first.

// Some registers are listed for completeness (CMP registers of unused
// channels, CNT) but only a subset is programmed by the driver.
#![allow(dead_code)]

// ── PORTB ──────────────────────────────────────────────────────────────────

/// PORTB base address.
pub const PORTB: u16 = 0x0420;

/// Data direction set strobe: writing 1 makes the pin an output.
pub const PORTB_DIRSET: u16 = PORTB + 0x01;

/// Data direction clear strobe.
pub const PORTB_DIRCLR: u16 = PORTB + 0x02;

/// Output value clear strobe: writing 1 drives the pin low.
pub const PORTB_OUTCLR: u16 = PORTB + 0x06;

// ── PORTMUX ────────────────────────────────────────────────────────────────

/// PORTMUX base address.
pub const PORTMUX: u16 = 0x05E0;

/// TCA0 waveform output routing.
/// - Bits 2:0 — TCA0 (0=PORTA, 1=PORTB, 2=PORTC, 3=PORTD, 4=PORTE, 5=PORTF)
pub const PORTMUX_TCAROUTEA: u16 = PORTMUX + 0x04;

/// Route TCA0 WO0..WO5 to PB0..PB5.
pub const PORTMUX_TCA0_PORTB: u8 = 0x01;

// ── TCA0 (single mode) ─────────────────────────────────────────────────────

/// TCA0 base address.
pub const TCA0: u16 = 0x0A00;

/// Control A.
/// - Bits 3:1 — CLKSEL (prescaler, see [`CLKSEL_DIV1`] ..)
/// - Bit    0 — ENABLE
pub const TCA0_CTRLA: u16 = TCA0 + 0x00;

/// Control B.
/// - Bit    6 — CMP2EN
/// - Bit    5 — CMP1EN
/// - Bit    4 — CMP0EN
/// - Bit    3 — ALUPD (auto lock update)
/// - Bits 2:0 — WGMODE (waveform generation mode)
pub const TCA0_CTRLB: u16 = TCA0 + 0x01;

/// Control C (waveform output override values, unused).
pub const TCA0_CTRLC: u16 = TCA0 + 0x02;

/// Control D.
/// - Bit 0 — SPLITM (0 = single 16-bit mode)
pub const TCA0_CTRLD: u16 = TCA0 + 0x03;

/// Interrupt control.
/// - Bit 6 — CMP2
/// - Bit 5 — CMP1
/// - Bit 4 — CMP0
/// - Bit 0 — OVF
pub const TCA0_INTCTRL: u16 = TCA0 + 0x0A;

/// Interrupt flags; write 1 to clear.
/// - Bit 0 — OVF
pub const TCA0_INTFLAGS: u16 = TCA0 + 0x0B;

/// 16-bit counter.
pub const TCA0_CNT: u16 = TCA0 + 0x20;

/// 16-bit period (TOP).
pub const TCA0_PER: u16 = TCA0 + 0x26;

/// 16-bit compare value, channel 0 (unbuffered).
pub const TCA0_CMP0: u16 = TCA0 + 0x28;

/// 16-bit buffered period.
pub const TCA0_PERBUF: u16 = TCA0 + 0x36;

/// 16-bit buffered compare, channel 0. Copied to CMP0 on the UPDATE condition.
pub const TCA0_CMP0BUF: u16 = TCA0 + 0x38;

/// Unbuffered compare register of waveform output `wo` (0..=2).
pub const fn tca0_cmp(wo: u8) -> u16 {
    TCA0_CMP0 + 2 * wo as u16
}

/// Buffered compare register of waveform output `wo` (0..=2).
pub const fn tca0_cmpbuf(wo: u8) -> u16 {
    TCA0_CMP0BUF + 2 * wo as u16
}

// ── Bitfields ──────────────────────────────────────────────────────────────

pub const CTRLA_ENABLE: u8 = 1 << 0;

pub const CLKSEL_DIV1: u8 = 0x0 << 1;
pub const CLKSEL_DIV2: u8 = 0x1 << 1;
pub const CLKSEL_DIV4: u8 = 0x2 << 1;
pub const CLKSEL_DIV8: u8 = 0x3 << 1;
pub const CLKSEL_DIV16: u8 = 0x4 << 1;
pub const CLKSEL_DIV64: u8 = 0x5 << 1;
pub const CLKSEL_DIV256: u8 = 0x6 << 1;
pub const CLKSEL_DIV1024: u8 = 0x7 << 1;

/// Compare output enable of waveform output `wo` (0..=2).
pub const fn ctrlb_cmpen(wo: u8) -> u8 {
    1 << (4 + wo)
}

pub const WGMODE_NORMAL: u8 = 0x0;
pub const WGMODE_FRQ: u8 = 0x1;
pub const WGMODE_SINGLESLOPE: u8 = 0x3;
pub const WGMODE_DSTOP: u8 = 0x5;
pub const WGMODE_DSBOTH: u8 = 0x6;
pub const WGMODE_DSBOTTOM: u8 = 0x7;

pub const INT_OVF: u8 = 1 << 0;
