//! Pull-side interface to the synthesis pipeline.

use crate::frame::Frame;

/// Supplies the next output frame on every frame boundary.
///
/// Called from the timer interrupt: implementations must return promptly and
/// must not block, allocate or wait on anything.
pub trait FrameSource<F: Frame> {
    fn next_frame(&mut self) -> F;
}

/// [`FrameSource`] backed by a closure.
pub struct FnSource<G> {
    generate: G,
}

/// Wrap a closure as a [`FrameSource`].
///
/// ```ignore
/// let mut phase = 0u8;
/// let saw = from_fn(move || {
///     phase = phase.wrapping_add(4);
///     Mono(phase as i8 as i16)
/// });
/// ```
pub fn from_fn<F: Frame, G: FnMut() -> F>(generate: G) -> FnSource<G> {
    FnSource { generate }
}

impl<F: Frame, G: FnMut() -> F> FrameSource<F> for FnSource<G> {
    #[inline(always)]
    fn next_frame(&mut self) -> F {
        (self.generate)()
    }
}
