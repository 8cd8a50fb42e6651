//! In-memory register file standing in for the ATmega4809 data space.

use super::RegisterBus;

/// Covers every address up to the end of TCA0.
const SPACE: usize = 0x0A40;

const LOG_LEN: usize = 64;

/// Register file that records writes.
///
/// The first `LOG_LEN` writes are kept in order; every write bumps a
/// per-address counter.
#[derive(Clone)]
pub(crate) struct MockBus {
    mem: [u8; SPACE],
    counts: [u32; SPACE],
    log: [(u16, u8); LOG_LEN],
    pub log_count: usize,
    pub total_writes: u32,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            mem: [0; SPACE],
            counts: [0; SPACE],
            log: [(0, 0); LOG_LEN],
            log_count: 0,
            total_writes: 0,
        }
    }

    pub fn read8(&self, address: u16) -> u8 {
        self.mem[address as usize]
    }

    pub fn read16(&self, address: u16) -> u16 {
        self.mem[address as usize] as u16 | (self.mem[address as usize + 1] as u16) << 8
    }

    /// Number of writes to `address` so far.
    pub fn writes_to(&self, address: u16) -> u32 {
        self.counts[address as usize]
    }

    /// The nth logged write.
    pub fn write_at(&self, idx: usize) -> (u16, u8) {
        assert!(idx < self.log_count, "write {idx} not logged");
        self.log[idx]
    }

    /// Forget the write history, keep register contents.
    pub fn clear_log(&mut self) {
        self.counts = [0; SPACE];
        self.log_count = 0;
        self.total_writes = 0;
    }

    /// Register contents only, for comparing two register files.
    pub fn snapshot(&self) -> [u8; SPACE] {
        self.mem
    }
}

impl RegisterBus for MockBus {
    fn write8(&mut self, address: u16, value: u8) {
        self.mem[address as usize] = value;
        self.counts[address as usize] += 1;
        if self.log_count < LOG_LEN {
            self.log[self.log_count] = (address, value);
            self.log_count += 1;
        }
        self.total_writes += 1;
    }
}
