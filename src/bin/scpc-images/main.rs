//! Image hosting service for the SCPC site
//!
//! Serves the image upload/list API and pushes locally referenced site
//! assets to Cloudinary.
//!
//! Usage:
//!   scpc-images serve [--backend local --public-dir public]
//!   scpc-images sync-constants --constants src/lib/constants.ts

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scpc_intro::media::constants::find_local_constants;
use scpc_intro::media::{
    router, sync_constants, CloudinaryCredentials, CloudinaryHost, LocalHost, RouterOptions,
    SharedHost, SyncStatus, UPLOAD_FOLDER,
};

#[derive(Parser)]
#[command(
    name = "scpc-images",
    about = "Image hosting service for the SCPC site",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Upload assets referenced from a constants file and rewrite it
    SyncConstants(SyncArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Cloudinary,
    Local,
}

#[derive(Args)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Storage backend
    #[arg(short = 'b', long, value_enum, default_value_t = Backend::Cloudinary)]
    backend: Backend,

    /// Public directory for the local backend
    #[arg(long, default_value = "public")]
    public_dir: PathBuf,

    /// Cloudinary folder for uploads and listing
    #[arg(long, default_value = UPLOAD_FOLDER)]
    folder: String,

    /// Allowed CORS origins, comma separated (or set ALLOWED_ORIGINS). Empty allows any.
    #[arg(long = "allowed-origin", env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Request body limit in MiB
    #[arg(long, default_value_t = 10)]
    max_upload_mb: usize,
}

#[derive(Args)]
struct SyncArgs {
    /// Constants source file to scan and rewrite
    #[arg(long, default_value = "src/lib/constants.ts")]
    constants: PathBuf,

    /// Directory the local paths are relative to
    #[arg(long, default_value = "public")]
    public_dir: PathBuf,
}

fn cloudinary() -> anyhow::Result<CloudinaryHost> {
    let credentials = CloudinaryCredentials::from_env()
        .context("Cloudinary needs CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET")?;
    Ok(CloudinaryHost::new(credentials)?)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let host: SharedHost = match args.backend {
        Backend::Cloudinary => Arc::new(cloudinary()?.with_folder(&args.folder)),
        Backend::Local => Arc::new(LocalHost::new(&args.public_dir)),
    };

    let options = RouterOptions {
        allowed_origins: args
            .allowed_origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
    };
    let app = router(host.clone(), &options);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, backend = host.name(), "image service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

async fn sync(args: SyncArgs) -> anyhow::Result<()> {
    let host = cloudinary()?;

    let source = std::fs::read_to_string(&args.constants)
        .with_context(|| format!("reading {}", args.constants.display()))?;
    let total = find_local_constants(&source).len();
    if total == 0 {
        println!("No local images found to upload or update.");
        return Ok(());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = sync_constants(&host, &args.constants, &args.public_dir, |entry| {
        pb.set_message(entry.constant.name.clone());
        match &entry.status {
            SyncStatus::Uploaded { url } => pb.println(format!("OK:   {} -> {}", entry.constant.path, url)),
            SyncStatus::Missing => pb.println(format!("SKIP: {} (file not found)", entry.constant.path)),
            SyncStatus::Failed(e) => pb.println(format!("FAIL: {} - {}", entry.constant.path, e)),
        }
        pb.inc(1);
    })
    .await?;
    pb.finish_with_message("Done");

    if report.changed {
        println!(
            "Updated {} with {} hosted URL(s)",
            args.constants.display(),
            report.uploaded()
        );
    } else {
        println!("No local images found to upload or update.");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scpc_intro=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::SyncConstants(args) => sync(args).await,
    }
}
