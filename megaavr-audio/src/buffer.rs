//! Lock-free output frame buffer between the main loop and the timer interrupt.
//!
//! The main loop (producer) synthesizes frames ahead of time with
//! [`FrameBuffer::push`] or [`FrameBuffer::fill_with`]; the interrupt
//! (consumer) takes one per boundary through a [`BufferReader`]. When the
//! buffer runs dry the reader repeats the last frame it delivered.
//!
//! # Safety Contract
//!
//! - Only ONE context may push (the producer).
//! - Only ONE context may pop (the consumer).
//!
//! Indices are `AtomicU8` and only ever loaded and stored, never
//! compare-exchanged, so the buffer works on targets with load/store-only
//! 8-bit atomics such as AVR. Index wrap uses a compare, not `%`.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::constants::OUTPUT_BUFFER_SIZE;
use crate::frame::Frame;
use crate::source::FrameSource;

/// Frame buffer of the default size.
pub type OutputBuffer<F> = FrameBuffer<F, OUTPUT_BUFFER_SIZE>;

/// Single-producer single-consumer ring of frames.
///
/// Usable capacity is `N - 1`; `N` must be between 2 and 256.
pub struct FrameBuffer<F, const N: usize> {
    slots: [UnsafeCell<F>; N],
    /// Next slot to write (only modified by the producer).
    head: AtomicU8,
    /// Next slot to read (only modified by the consumer).
    tail: AtomicU8,
}

// SAFETY: F: Send because frames cross from the main loop to the interrupt.
// head is only advanced by the producer and tail only by the consumer, and the
// Release/Acquire pairs order each slot write before the index that exposes it.
unsafe impl<F: Send, const N: usize> Sync for FrameBuffer<F, N> {}

impl<F: Frame, const N: usize> FrameBuffer<F, N> {
    /// Create an empty buffer, every slot holding silence.
    pub const fn new() -> Self {
        assert!(N >= 2, "frame buffer needs at least 2 slots (1 usable)");
        assert!(N <= 256, "frame buffer indices are 8-bit");

        FrameBuffer {
            slots: [const { UnsafeCell::new(F::SILENCE) }; N],
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
        }
    }

    #[inline(always)]
    fn next(index: u8) -> u8 {
        let next = index as usize + 1;
        if next == N {
            0
        } else {
            next as u8
        }
    }

    /// Queue a frame (producer side). Returns `Err(frame)` when full.
    pub fn push(&self, frame: F) -> Result<(), F> {
        let head = self.head.load(Ordering::Relaxed);
        let next_head = Self::next(head);

        if next_head == self.tail.load(Ordering::Acquire) {
            return Err(frame);
        }

        // SAFETY: sole producer; `next_head != tail` means the consumer is not
        // reading this slot.
        unsafe {
            *self.slots[head as usize].get() = frame;
        }

        self.head.store(next_head, Ordering::Release);
        Ok(())
    }

    /// Take the oldest frame (consumer side), if any.
    #[inline]
    pub fn pop(&self) -> Option<F> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: sole consumer; `tail != head` means the producer has finished
        // writing this slot and will not touch it until tail moves on.
        let frame = unsafe { *self.slots[tail as usize].get() };

        self.tail.store(Self::next(tail), Ordering::Release);
        Some(frame)
    }

    /// Push frames from `generate` until the buffer is full (producer side).
    ///
    /// This is the main-loop audio hook: call it as often as possible.
    /// Returns the number of frames queued.
    pub fn fill_with(&self, mut generate: impl FnMut() -> F) -> usize {
        let mut queued = 0;
        while !self.is_full() {
            if self.push(generate()).is_err() {
                break;
            }
            queued += 1;
        }
        queued
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        Self::next(head) == self.tail.load(Ordering::Acquire)
    }

    /// Number of frames currently queued.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire) as usize;
        let tail = self.tail.load(Ordering::Acquire) as usize;
        if head >= tail {
            head - tail
        } else {
            head + N - tail
        }
    }

    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Consumer handle for the interrupt side.
    pub const fn reader(&self) -> BufferReader<'_, F, N> {
        BufferReader {
            buffer: self,
            last: F::SILENCE,
        }
    }
}

/// Consumer end of a [`FrameBuffer`], holding the last delivered frame.
pub struct BufferReader<'a, F, const N: usize> {
    buffer: &'a FrameBuffer<F, N>,
    last: F,
}

impl<F: Frame, const N: usize> BufferReader<'_, F, N> {
    /// Frame most recently handed out (silence before the first one).
    pub fn last(&self) -> F {
        self.last
    }
}

impl<F: Frame, const N: usize> FrameSource<F> for BufferReader<'_, F, N> {
    #[inline]
    fn next_frame(&mut self) -> F {
        if let Some(frame) = self.buffer.pop() {
            self.last = frame;
        }
        self.last
    }
}
