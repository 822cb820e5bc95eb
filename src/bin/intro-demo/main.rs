//! Terminal demo of the SCPC intro loader
//!
//! Plays the typing intro in the terminal against a simulated page load,
//! persisting the "seen before" flag to a JSON file between runs.
//!
//! Usage:
//!   intro-demo [--ready-after 500] [--reduced-motion] [--reset]

mod render;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tracing_subscriber::EnvFilter;

use scpc_intro::{
    Environment, FileStorage, LoaderDriver, LoaderEvent, LoaderOutcome, LoaderSequencer,
    ReadinessSignal, SequencerConfig, TEMPLATE_SNIPPET,
};

/// Stand-in for the CSS exit transition.
const EXIT_TRANSITION: Duration = Duration::from_millis(450);

#[derive(Parser)]
#[command(
    name = "intro-demo",
    about = "Play the SCPC intro loader in the terminal",
    version
)]
struct Args {
    /// Global timeout in ms (overrides --config)
    #[arg(long)]
    timeout: Option<u64>,

    /// First-visit minimum visible duration in ms (overrides --config)
    #[arg(long)]
    min_visible: Option<u64>,

    /// Simulated page load time in ms
    #[arg(long, default_value_t = 500)]
    ready_after: u64,

    /// Make the simulated page load fail
    #[arg(long)]
    fail_readiness: bool,

    /// Never report the page as loaded (exercise the global timeout)
    #[arg(long)]
    hang_readiness: bool,

    /// Behave as if the user prefers reduced motion
    #[arg(long)]
    reduced_motion: bool,

    /// Skip the exit transition entirely
    #[arg(long)]
    no_animations: bool,

    /// Skip the intro after this many ms
    #[arg(long)]
    skip_after: Option<u64>,

    /// JSON file holding the "seen before" flag
    #[arg(long, default_value = ".scpc-intro-state.json")]
    state_file: PathBuf,

    /// Sequencer config as JSON (camelCase keys)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Forget the "seen before" flag first
    #[arg(long)]
    reset: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn load_config(args: &Args) -> anyhow::Result<SequencerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SequencerConfig::default(),
    };
    if let Some(timeout) = args.timeout {
        config.timeout_ms = timeout;
    }
    if let Some(min_visible) = args.min_visible {
        config.min_visible_ms = min_visible;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "scpc_intro=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let storage = FileStorage::new(&args.state_file);
    if args.reset {
        storage.clear().context("clearing intro state")?;
    }

    let environment = Environment {
        reduced_motion: args.reduced_motion,
        animations_supported: !args.no_animations,
    };

    let readiness = if args.hang_readiness {
        ReadinessSignal::race(std::future::pending::<()>(), config.timeout())
    } else {
        let ready_after = Duration::from_millis(args.ready_after);
        let fail = args.fail_readiness;
        ReadinessSignal::race(
            async move {
                sleep(ready_after).await;
                if fail {
                    Err(anyhow::anyhow!("simulated page load failure"))
                } else {
                    Ok(())
                }
            },
            config.timeout(),
        )
    };

    let sequencer = LoaderSequencer::mount(
        TEMPLATE_SNIPPET,
        config,
        environment,
        readiness,
        storage,
        || tracing::info!("onFinish fired"),
    )?;
    let (driver, mut handle) = LoaderDriver::new(sequencer);
    let mut snapshots = handle.subscribe();

    let presenter = async {
        let start = Instant::now();
        let mut skip_at = args.skip_after.map(|ms| start + Duration::from_millis(ms));
        let mut exit_ends_at: Option<Instant> = None;
        let mut stdout = std::io::stdout();

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = *snapshots.borrow_and_update();
                    let _ = stdout.write_all(render::frame(&snapshot, TEMPLATE_SNIPPET).as_bytes());
                    let _ = stdout.flush();
                }
                event = handle.next_event() => match event {
                    Some(LoaderEvent::ExitAnimationStarted) => {
                        exit_ends_at = Some(Instant::now() + EXIT_TRANSITION);
                    }
                    Some(LoaderEvent::StateChanged { .. }) => {}
                    Some(LoaderEvent::Finished) | None => break,
                },
                _ = sleep_until(exit_ends_at.unwrap_or(start)), if exit_ends_at.is_some() => {
                    exit_ends_at = None;
                    handle.transition_end();
                }
                _ = sleep_until(skip_at.unwrap_or(start)), if skip_at.is_some() => {
                    skip_at = None;
                    handle.trigger_exit();
                }
            }
        }
    };

    let (outcome, ()) = tokio::join!(driver.run(), presenter);

    match outcome {
        LoaderOutcome::Finished { elapsed } => {
            println!(
                "\n{} intro finished after {} ms",
                "✓".green().bold(),
                elapsed.as_millis()
            );
            println!("  state saved to {}", args.state_file.display());
        }
        LoaderOutcome::Unmounted { state } => {
            println!("\n{} intro unmounted while {}", "✗".red().bold(), state);
        }
    }

    Ok(())
}
