//! Intro loader module.
//!
//! Types out a code snippet while the host page loads, holds until the page
//! is ready and the snippet has been visible long enough, then plays a
//! one-shot exit transition.

pub mod model;
pub mod readiness;
pub mod sequencer;
pub mod snippet;
pub mod storage;
pub mod typing;

#[cfg(feature = "runtime")]
pub mod driver;
#[cfg(feature = "runtime")]
pub mod race;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use model::{
    Environment, LoaderEvent, LoaderSnapshot, LoaderState, SequencerConfig, TimingProfile,
    TypingProgress, DEFAULT_STORAGE_KEY,
};
pub use readiness::ReadinessSignal;
pub use sequencer::LoaderSequencer;
pub use snippet::TEMPLATE_SNIPPET;
pub use storage::{FileStorage, IntroStorage, MemoryStorage, FLAG_VALUE};
pub use typing::TypingAnimator;

#[cfg(feature = "runtime")]
pub use driver::{LoaderCommand, LoaderDriver, LoaderHandle, LoaderOutcome, FRAME_INTERVAL};
#[cfg(feature = "runtime")]
pub use race::{first_of, Raced};

#[cfg(feature = "wasm")]
pub use wasm::JsLoader;
