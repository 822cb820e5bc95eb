//! scpc-intro - Intro loader and site tooling for the SCPC hackathon site.
//!
//! The core is a deterministic, clock-driven state machine for the intro
//! loader:
//!
//! - **Typing**: a C++ template is typed out with ease-in pacing
//! - **Holding**: the snippet stays up until the page is ready and has been
//!   visible long enough
//! - **Exit**: a one-shot transition, with a fallback so the page is never
//!   stuck behind the loader
//!
//! Hosts feed the sequencer time and events. The `runtime` feature adds a
//! tokio driver, `wasm` adds browser bindings and `images` adds the image
//! hosting service.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use scpc_intro::{
//!     Environment, IntroStorage, LoaderSequencer, LoaderState, MemoryStorage,
//!     ReadinessSignal, SequencerConfig, DEFAULT_STORAGE_KEY, TEMPLATE_SNIPPET,
//! };
//!
//! let config = SequencerConfig::new(15_000, 4_000).unwrap();
//! let mut loader = LoaderSequencer::mount(
//!     TEMPLATE_SNIPPET,
//!     config,
//!     Environment::default(),
//!     ReadinessSignal::pending(),
//!     MemoryStorage::new(),
//!     || println!("intro finished"),
//! )
//! .unwrap();
//!
//! // The page finished loading half a second in.
//! loader.notify_ready(Duration::from_millis(500));
//!
//! // Drive the loader on a 16ms frame clock. Nothing reports the end of the
//! // exit transition here, so the fallback finishes it.
//! let mut now = Duration::ZERO;
//! while loader.state() != LoaderState::Done {
//!     now += Duration::from_millis(16);
//!     loader.advance(now);
//! }
//! assert!(now < Duration::from_secs(6));
//! assert!(loader.storage().read_flag(DEFAULT_STORAGE_KEY).unwrap());
//! ```

pub mod error;
pub mod highlight;

// Loader module
pub mod loader;

pub mod traversal;

// Image service (only compiled when images feature enabled)
#[cfg(feature = "images")]
pub mod media;

// Re-exports for convenience
pub use error::{IntroError, IntroResult};
pub use highlight::{highlight, Token, TokenKind};
pub use loader::{
    Environment, FileStorage, IntroStorage, LoaderEvent, LoaderSequencer, LoaderSnapshot,
    LoaderState, MemoryStorage, ReadinessSignal, SequencerConfig, TimingProfile, TypingProgress,
    DEFAULT_STORAGE_KEY, TEMPLATE_SNIPPET,
};
pub use traversal::{TraversalMode, TraversalReplay};

#[cfg(feature = "runtime")]
pub use loader::{LoaderDriver, LoaderHandle, LoaderOutcome};

#[cfg(feature = "wasm")]
pub use loader::JsLoader;
