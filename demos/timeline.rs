//! Prints the loader timeline for a first visit and a returning visit.
//!
//! Run with: cargo run --example timeline

use std::time::Duration;

use scpc_intro::{
    Environment, LoaderEvent, LoaderSequencer, LoaderState, MemoryStorage, ReadinessSignal,
    SequencerConfig, DEFAULT_STORAGE_KEY, TEMPLATE_SNIPPET,
};

const FRAME: Duration = Duration::from_millis(16);

fn play(label: &str, storage: MemoryStorage, ready_at: Duration) -> MemoryStorage {
    let mut loader = LoaderSequencer::mount(
        TEMPLATE_SNIPPET,
        SequencerConfig::default(),
        Environment::default(),
        ReadinessSignal::pending(),
        storage,
        || {},
    )
    .expect("default config is valid");

    println!("{label} (seen before: {})", loader.seen_before());

    let mut now = Duration::ZERO;
    while loader.state() != LoaderState::Done {
        now += FRAME;
        if now >= ready_at && !loader.is_ready() {
            loader.notify_ready(now);
        }
        loader.advance(now);
        for event in loader.take_events() {
            match event {
                LoaderEvent::StateChanged { from, to, at_ms } => {
                    println!("  {at_ms:>5} ms  {from} -> {to}");
                }
                LoaderEvent::ExitAnimationStarted => {
                    println!("  {:>5} ms  exit transition starts", now.as_millis());
                }
                LoaderEvent::Finished => println!("  {:>5} ms  finished", now.as_millis()),
            }
        }
    }
    println!();

    loader.storage().clone()
}

fn main() {
    let ready_at = Duration::from_millis(500);
    let storage = play("First visit", MemoryStorage::new(), ready_at);
    assert_eq!(storage.get(DEFAULT_STORAGE_KEY), Some("true"));
    play("Returning visit", storage, ready_at);
}
