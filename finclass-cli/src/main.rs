//! `finclass`: classify consumer-finance complaints from the command line.
//!
//! ```bash
//! finclass classify "I was charged a late fee twice on my credit card"
//! echo "the debt collector keeps calling me at work" | finclass classify --json
//! finclass normalize "My acct XXXX-XXXX was charged!!"
//! finclass profile --model models/demo
//! ```
//!
//! Exit codes: 0 on success, 2 when the input cannot be classified (empty or
//! nothing recognizable left), 1 when the model bundle is unusable or any
//! other error occurs.

mod config;
mod render;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use finclass_core::{
    ClassifyError, ModelBundle, ModelStore, NormalizationProfile, Pipeline, Preprocessor,
    ProfilePin,
};
use tracing::debug;

use config::{Config, OutputFormat, MODEL_DIR_ENV};

#[derive(Parser)]
#[command(
    name = "finclass",
    about = "Classify consumer-finance complaint narratives",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ./finclass.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the category of a complaint.
    Classify {
        /// Complaint text; read from stdin when absent or "-".
        text: Option<String>,

        /// Model bundle directory.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Print JSON instead of a chart.
        #[arg(long)]
        json: bool,

        /// Also print the normalized and canonical text.
        #[arg(long)]
        show_canonical: bool,

        /// Require this profile, NAME or NAME@VERSION.
        #[arg(long)]
        expect_profile: Option<String>,
    },

    /// Print the canonical text the model would see.
    Normalize {
        /// Complaint text; read from stdin when absent or "-".
        text: Option<String>,

        /// Use the profile of this bundle instead of the built-in one.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Print the normalized text as well.
        #[arg(long)]
        all: bool,
    },

    /// Show a bundle's normalization profile and fingerprint.
    Profile {
        /// Model bundle directory.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Show the built-in default profile instead of a bundle's.
        #[arg(long, conflicts_with = "model")]
        builtin: bool,

        /// Print the exact text the fingerprint is computed over.
        #[arg(long)]
        render: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Classify {
            text,
            model,
            json,
            show_canonical,
            expect_profile,
        } => {
            let dir = config.model_dir(model, std::env::var_os(MODEL_DIR_ENV));
            let pin = expect_profile.or_else(|| config.expected_profile.clone());
            let bundle = load_bundle(dir, pin.as_deref())?;
            let pipeline = Pipeline::new(bundle);
            let loaded = pipeline.bundle();
            debug!(
                profile = %loaded.profile().id(),
                fingerprint = loaded.fingerprint(),
                "pipeline ready"
            );
            let text = read_text(text)?;

            match pipeline.run(&text) {
                Ok(result) => {
                    match config.output(json) {
                        OutputFormat::Json => {
                            let report = render::Report::new(&result, show_canonical);
                            println!("{}", serde_json::to_string_pretty(&report)?);
                        }
                        OutputFormat::Text => print!("{}", render::text(&result, show_canonical)),
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) if err.is_recoverable() => {
                    eprintln!("error: {err}");
                    eprintln!("hint: {}", hint(&err));
                    Ok(ExitCode::from(2))
                }
                Err(err) => Err(err.into()),
            }
        }

        Commands::Normalize { text, model, all } => {
            let profile = match model {
                Some(dir) => open_store(dir, None)?.manifest()?.profile,
                None => NormalizationProfile::default(),
            };
            let preprocessor = Preprocessor::from_profile(&profile);
            let prepared = preprocessor.prepare(&read_text(text)?);
            if all {
                println!("normalized: {}", prepared.normalized);
                println!("canonical:  {}", prepared.canonical);
            } else {
                println!("{}", prepared.canonical);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Profile {
            model,
            builtin,
            render,
        } => {
            let (profile, recorded) = if builtin {
                (NormalizationProfile::default(), None)
            } else {
                let dir = config.model_dir(model, std::env::var_os(MODEL_DIR_ENV));
                let manifest = open_store(dir, None)?.manifest()?;
                (manifest.profile, Some(manifest.fingerprint))
            };

            if render {
                print!("{}", profile.render());
                return Ok(ExitCode::SUCCESS);
            }

            let fingerprint = profile.fingerprint();
            println!("profile:     {}", profile.id());
            println!("fingerprint: {fingerprint}");
            if let Some(recorded) = recorded {
                let verdict = if recorded.trim().eq_ignore_ascii_case(&fingerprint) {
                    "matches"
                } else {
                    "MISMATCH"
                };
                println!("recorded:    {recorded} ({verdict})");
            }
            println!();
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(dir: PathBuf, pin: Option<&str>) -> anyhow::Result<ModelStore> {
    let mut store = ModelStore::open(&dir)
        .with_context(|| format!("cannot open model bundle {}", dir.display()))?;
    if let Some(pin) = pin {
        let pin: ProfilePin = pin.parse()?;
        store = store.with_pin(pin);
    }
    Ok(store)
}

fn load_bundle(dir: PathBuf, pin: Option<&str>) -> anyhow::Result<ModelBundle> {
    let store = open_store(dir, pin)?;
    let bundle = store
        .load()
        .map_err(ClassifyError::from)
        .with_context(|| format!("cannot load model bundle {}", store.dir().display()))?;
    Ok(bundle)
}

fn read_text(arg: Option<String>) -> anyhow::Result<String> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read complaint text from stdin")?;
            Ok(buf)
        }
    }
}

fn hint(err: &ClassifyError) -> &'static str {
    match err {
        ClassifyError::EmptyInput => "pass the complaint as an argument or pipe it on stdin",
        ClassifyError::InsufficientSignal { .. } => {
            "describe what happened in a few more words, e.g. the product and the problem"
        }
        ClassifyError::ModelUnavailable(_) => "check the model bundle directory",
    }
}
