//! CLI binary for stegweb.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, loads the selected files and prints the outcome.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use stegweb::{
    load_payload, CarrierType, ClientConfig, DecodeFields, DirectorySink, EncodeFields, Mode,
    Notifier, Presentation, SecretKind, StegClient, ViewState,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal notifier ────────────────────────────────────────────────────────

/// Prints notifications to stderr: failures in red, success notices in green.
///
/// Holds the spinner so a notification never interleaves with its redraw.
struct TerminalNotifier {
    spinner: Option<ProgressBar>,
    quiet: bool,
}

impl TerminalNotifier {
    fn clear_spinner(&self) {
        if let Some(ref bar) = self.spinner {
            bar.finish_and_clear();
        }
    }
}

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        self.clear_spinner();
        eprintln!("{} {}", red("✘"), red(message));
    }

    fn inform(&self, message: &str) {
        self.clear_spinner();
        if !self.quiet {
            eprintln!("{} {}", green("✔"), message);
        }
    }
}

/// Spinner shown while a request is in flight.
fn pending_spinner(mode: Mode) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix(match mode {
        Mode::Encode => "Encoding",
        Mode::Decode => "Decoding",
    });
    bar.set_message("waiting for the server…");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Hide a message in an image (writes ./hidden_img.png)
  stegweb encode img.png --text "hello"

  # Hide a file in an audio carrier
  stegweb encode song.wav --carrier-type audio --secret-file notes.txt

  # Extract whatever is hidden in a carrier
  stegweb decode hidden_img.png

  # Talk to a remote server, save downloads elsewhere
  stegweb --server https://stego.example.com --download-dir out decode hidden_img.png

  # Machine-readable outcome
  stegweb --json decode hidden_img.png

OUTCOMES:
  Text secrets are printed to stdout.
  Files (encoded carriers, extracted files) are saved into --download-dir:
    encode → hidden_<carrier name>
    decode → extracted_file (or the name the server supplies)
  Existing files are never overwritten; a " (n)" suffix is added instead.

ENVIRONMENT VARIABLES:
  STEGWEB_SERVER        Server base URL
  STEGWEB_DOWNLOAD_DIR  Download directory
  STEGWEB_TIMEOUT       Request timeout in seconds
  RUST_LOG              Override the log filter (e.g. stegweb=debug)
"#;

/// Hide and extract secrets through a steganography web service.
#[derive(Parser, Debug)]
#[command(
    name = "stegweb",
    version,
    about = "Hide and extract secrets through a steganography web service",
    long_about = "Hide text or files inside image, audio and video carriers, and extract them \
again, by talking to a steganography server's /encode and /decode endpoints.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Server base URL.
    #[arg(long, global = true, env = "STEGWEB_SERVER", default_value = stegweb::config::DEFAULT_BASE_URL)]
    server: String,

    /// Directory downloaded files are saved into.
    #[arg(short, long, global = true, env = "STEGWEB_DOWNLOAD_DIR", default_value = ".")]
    download_dir: PathBuf,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "STEGWEB_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Wait for the server forever (overrides --timeout).
    #[arg(long, global = true)]
    no_timeout: bool,

    /// Print the outcome as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable the pending spinner.
    #[arg(long, global = true)]
    no_spinner: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "STEGWEB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "STEGWEB_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide text or a file inside a carrier.
    #[command(visible_alias = "e")]
    Encode {
        /// Carrier file to hide the secret in.
        carrier: PathBuf,

        /// Kind of carrier.
        #[arg(long, value_enum, default_value = "image")]
        carrier_type: CarrierArg,

        /// Text to hide.
        #[arg(long, conflicts_with = "secret_file", required_unless_present = "secret_file")]
        text: Option<String>,

        /// File to hide.
        #[arg(long)]
        secret_file: Option<PathBuf>,
    },

    /// Extract the secret hidden in a carrier.
    #[command(visible_alias = "d")]
    Decode {
        /// Carrier file holding a hidden secret.
        carrier: PathBuf,
    },
}

/// Loaded form fields for the selected subcommand.
enum Job {
    Encode(EncodeFields),
    Decode(DecodeFields),
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum CarrierArg {
    Image,
    Audio,
    Video,
}

impl From<CarrierArg> for CarrierType {
    fn from(v: CarrierArg) -> Self {
        match v {
            CarrierArg::Image => CarrierType::Image,
            CarrierArg::Audio => CarrierType::Audio,
            CarrierArg::Video => CarrierType::Video,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and the notifier already tell the user what happens;
    // library INFO logs only appear with --verbose.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "off"
    } else {
        "error"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Workflow failures were already reported by the notifier; only
    // setup failures (bad flags, unreadable files) are printed here.
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            std::process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when the workflow ran but failed.
async fn run(cli: Cli) -> Result<bool> {
    let config = build_config(&cli)?;
    let mode = match cli.command {
        Command::Encode { .. } => Mode::Encode,
        Command::Decode { .. } => Mode::Decode,
    };

    // Load everything first so a missing file never leaves a spinner behind.
    let job = match cli.command {
        Command::Encode {
            ref carrier,
            ref carrier_type,
            ref text,
            ref secret_file,
        } => Job::Encode(EncodeFields {
            carrier_type: carrier_type.clone().into(),
            carrier_file: Some(load(carrier).await?),
            secret_kind: if secret_file.is_some() {
                SecretKind::File
            } else {
                SecretKind::Text
            },
            secret_text: text.clone(),
            secret_file: match secret_file {
                Some(path) => Some(load(path).await?),
                None => None,
            },
        }),
        Command::Decode { ref carrier } => Job::Decode(DecodeFields {
            carrier_file: Some(load(carrier).await?),
        }),
    };

    let spinner = (!cli.quiet && !cli.no_spinner && !cli.json).then(|| pending_spinner(mode));
    let notifier = Arc::new(TerminalNotifier {
        spinner: spinner.clone(),
        quiet: cli.quiet,
    });
    let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
    let client = StegClient::with_parts(config, notifier, sink).context("Invalid configuration")?;
    let mut view = ViewState::new(mode);

    let outcome = match job {
        Job::Encode(fields) => client.encode(fields, &mut view).await,
        Job::Decode(fields) => client.decode(fields, &mut view).await,
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let presentation = match outcome {
        Ok(p) => p,
        Err(e) => {
            if cli.json {
                println!("{}", serde_json::json!({ "kind": "error", "message": e.to_string() }));
            }
            return Ok(false);
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&presentation).context("Failed to serialise outcome")?
        );
        return Ok(true);
    }

    match presentation {
        Presentation::Text { data } => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(data.as_bytes())
                .context("Failed to write to stdout")?;
            if !data.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        Presentation::File {
            file_name,
            size,
            saved_to,
            ..
        } => {
            if !cli.quiet {
                let shown = saved_to
                    .map(|p| p.display().to_string())
                    .unwrap_or(file_name);
                eprintln!(
                    "{}  {}  {}",
                    green("✔"),
                    bold(&shown),
                    dim(&format!("{size} bytes")),
                );
            }
        }
    }

    Ok(true)
}

/// Load a payload, attaching the path to any error.
async fn load(path: &Path) -> Result<stegweb::FilePayload> {
    load_payload(path)
        .await
        .with_context(|| format!("Failed to load {:?}", path))
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    ClientConfig::builder()
        .base_url(cli.server.clone())
        .download_dir(cli.download_dir.clone())
        .request_timeout_secs((!cli.no_timeout).then_some(cli.timeout))
        .build()
        .context("Invalid configuration")
}
