//! Background removal session CLI
//!
//! Terminal frontend for the single-screen session: pick an image, watch the
//! removal spinner, toggle between original and processed, save to the
//! gallery. Runs one-shot when an input path is given and interactive
//! otherwise.

use crate::config::{SessionConfig, DEFAULT_FILENAME_PREFIX};
use crate::error::BgRemoverError;
use crate::gallery::{GalleryWriter, PicturesWriter};
use crate::picker::{MediaPicker, PathPicker, PromptPicker};
use crate::remover::{BackgroundRemover, ChromaKeyRemover};
use crate::services::create_cli_progress_reporter;
use crate::session::{RemovalOutcome, ScreenSession};
use crate::tracing_config::init_cli_tracing;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Background removal session tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremover")]
pub struct Cli {
    /// Input image file (omit to run an interactive session)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Gallery directory override [default: the platform pictures directory]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Filename prefix for saved assets
    #[arg(long, default_value = DEFAULT_FILENAME_PREFIX)]
    pub prefix: String,

    /// Background key colour as a hex triplet (e.g. "#00ff00")
    #[arg(long, default_value = "#00ff00")]
    pub key: String,

    /// Chroma tolerance (0.0-1.0)
    #[arg(long, default_value_t = 0.25)]
    pub tolerance: f32,

    /// Load session settings from a JSON config file (overrides the flags above)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Process without saving to the gallery
    #[arg(long)]
    pub no_save: bool,

    /// Start with the display toggle on the original image
    #[arg(long)]
    pub show_original: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;

    let config = build_session_config(&cli).context("Invalid session configuration")?;
    let gallery = match &config.pictures_dir {
        Some(dir) => PicturesWriter::with_directory(dir.clone()),
        None => PicturesWriter::new().context("Failed to resolve pictures directory")?,
    };
    let remover = ChromaKeyRemover::new(config.key_color, config.tolerance)?;

    tracing::info!(
        remover = remover.name(),
        gallery = %gallery.directory().display(),
        "starting background removal session"
    );

    match cli.input.clone() {
        Some(path) => run_one_shot(&cli, config, remover, gallery, path).await,
        None => run_interactive(&cli, config, remover, gallery).await,
    }
}

/// Build the session configuration from flags or a config file
fn build_session_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::builder()
            .filename_prefix(cli.prefix.clone())
            .key_color(parse_key_color(&cli.key)?)
            .tolerance(cli.tolerance)
            .build()?,
    };
    if let Some(dir) = &cli.output_dir {
        config.pictures_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Parse a "#rrggbb" or "rrggbb" hex triplet
fn parse_key_color(value: &str) -> Result<[u8; 3], BgRemoverError> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BgRemoverError::invalid_config(format!(
            "key colour must be a hex triplet like #00ff00, got '{}'",
            value
        )));
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(|| BgRemoverError::invalid_config("malformed hex triplet"))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

/// Pick from the given path, process, and save unless told otherwise
async fn run_one_shot(
    cli: &Cli,
    config: SessionConfig,
    remover: ChromaKeyRemover,
    gallery: PicturesWriter,
    path: PathBuf,
) -> Result<()> {
    let reporter = create_cli_progress_reporter();
    let mut session = ScreenSession::new(remover, PathPicker::new(path), gallery, config)
        .with_reporter(reporter);

    let outcome = session
        .pick()
        .await?
        .ok_or_else(|| anyhow::anyhow!("picker returned no selection"))?;
    match outcome {
        RemovalOutcome::Completed { frames } => {
            tracing::info!(frames, "removal completed");
        },
        RemovalOutcome::Empty => anyhow::bail!("background removal produced no output"),
        RemovalOutcome::Failed => anyhow::bail!("background removal failed"),
        RemovalOutcome::Superseded => unreachable!("one-shot flow has a single invocation"),
    }

    if cli.show_original {
        session.toggle();
    }
    if let Some(image) = session.displayed() {
        tracing::info!(
            width = image.width(),
            height = image.height(),
            original = session.state().shows_original(),
            "displaying result"
        );
    }

    if cli.no_save {
        tracing::info!("skipping gallery save (--no-save)");
    } else {
        session.save()?;
    }
    Ok(())
}

/// Interactive session loop mirroring the single screen
async fn run_interactive<R, G>(
    cli: &Cli,
    config: SessionConfig,
    remover: R,
    gallery: G,
) -> Result<()>
where
    R: BackgroundRemover,
    G: GalleryWriter,
{
    let reporter = create_cli_progress_reporter();
    let mut session =
        ScreenSession::new(remover, PromptPicker::new(), gallery, config).with_reporter(reporter);
    if cli.show_original {
        session.toggle();
    }

    println!("Commands: pick, toggle, save, quit");
    loop {
        print_status(&session);
        let Some(line) = read_command("> ").await? else {
            break;
        };
        match line.trim() {
            "" => {},
            "pick" | "p" => match session.pick().await {
                Ok(None) => println!("Pick cancelled."),
                Ok(Some(RemovalOutcome::Completed { frames })) => {
                    println!("Background removed ({} passes).", frames);
                },
                Ok(Some(RemovalOutcome::Empty)) => {
                    println!("Removal finished without producing an image.");
                },
                Ok(Some(RemovalOutcome::Failed)) => println!("Removal failed."),
                Ok(Some(RemovalOutcome::Superseded)) => {},
                Err(e) => println!("Could not load the selection: {}", e),
            },
            "toggle" | "t" => {
                let original = session.toggle();
                println!(
                    "Showing {} image.",
                    if original { "original" } else { "processed" }
                );
            },
            "save" | "s" => match session.save() {
                Ok(receipt) => println!("Saved as {}.", receipt.filename),
                Err(e) => println!("Save failed: {}", e),
            },
            "quit" | "q" | "exit" => break,
            other => println!("Unknown command '{}'.", other),
        }
    }
    Ok(())
}

fn print_status<R, P, G>(session: &ScreenSession<R, P, G>)
where
    R: BackgroundRemover,
    P: MediaPicker,
    G: GalleryWriter,
{
    let state = session.state();
    let input = state
        .input()
        .map_or_else(|| "none".to_string(), |picked| {
            let (w, h) = picked.dimensions();
            format!("{}x{}", w, h)
        });
    println!(
        "[input: {} | output: {} | showing: {}]",
        input,
        if state.can_save() { "ready" } else { "none" },
        if state.shows_original() {
            "original"
        } else {
            "processed"
        }
    );
}

/// Prompt on stdout and read one line from stdin; `None` on EOF
async fn read_command(prompt: &str) -> Result<Option<String>> {
    let prompt = prompt.to_string();
    let line = tokio::task::spawn_blocking(move || {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "{}", prompt);
        let _ = stdout.flush();

        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line)),
            Err(e) => Err(e),
        }
    })
    .await
    .context("stdin task failed")??;
    Ok(line)
}
