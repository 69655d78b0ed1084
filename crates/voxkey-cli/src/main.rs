use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use voxkey_core::models::format_bytes;
use voxkey_core::{
    Config, Model, ModelManager, ModelState, SpeechEngine, TranscriptionRequest,
};

#[derive(Parser)]
#[command(author, version, about = "On-device speech transcription with Whisper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model id to use (overrides config)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Show verbose output including native whisper logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe a recorded audio file
    Transcribe {
        /// Path to the recording (m4a/mp4/wav)
        file: PathBuf,

        /// Language hint (e.g. "de"); omit for auto-detect
        #[arg(short, long)]
        language: Option<String>,

        /// Translate the transcription to English
        #[arg(long)]
        translate: bool,
    },

    /// Manage Whisper models
    Models {
        /// List all models available for download
        #[arg(long)]
        available: bool,

        /// Download a model
        #[arg(long, value_name = "ID")]
        download: Option<String>,

        /// Delete a downloaded model
        #[arg(long, value_name = "ID")]
        delete: Option<String>,

        /// Import a model file from disk instead of downloading
        #[arg(long, value_name = "ID")]
        import: Option<String>,

        /// Source path for --import
        #[arg(long, value_name = "PATH", requires = "import")]
        from: Option<PathBuf>,

        /// Set the active model
        #[arg(long, value_name = "ID")]
        r#use: Option<String>,
    },

    /// Show disk space used by downloaded models
    Storage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::from_default_env()
        })
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default();
    let manager = ModelManager::new(Config::models_dir());

    // Pick up models left behind by pre-0.1 layouts before anything else
    // looks at the models dir.
    let migrated = manager.migrate_from(&Config::legacy_models_dir())?;
    if migrated > 0 {
        eprintln!("Migrated {migrated} model(s) to {}", manager.models_dir().display());
    }

    match cli.command {
        Commands::Transcribe {
            file,
            language,
            translate,
        } => {
            let model = resolve_model(&cli.model, &config)?;
            run_transcribe(&manager, model, &config, file, language, translate, cli.verbose)
        }
        Commands::Models {
            available,
            download,
            delete,
            import,
            from,
            r#use,
        } => {
            if let Some(id) = download {
                return download_model(&manager, Model::from_id(&id)?).await;
            }
            if let Some(id) = delete {
                let model = Model::from_id(&id)?;
                manager.delete(model)?;
                println!("Deleted {}", model.id());
                return Ok(());
            }
            if let Some(id) = import {
                let model = Model::from_id(&id)?;
                let source = from.context("--import requires --from <PATH>")?;
                let path = manager.import_from_file(model, &source)?;
                println!("Imported {} to {}", model.id(), path.display());
                return Ok(());
            }
            if let Some(id) = r#use {
                let model = Model::from_id(&id)?;
                let mut config = config;
                config.model.active = model.id().to_string();
                config.save()?;
                println!("Active model set to {}", model.id());
                return Ok(());
            }
            list_models(&manager, &config, available);
            Ok(())
        }
        Commands::Storage => {
            println!(
                "{} used in {}",
                format_bytes(manager.total_storage_used()),
                manager.models_dir().display()
            );
            Ok(())
        }
    }
}

fn resolve_model(flag: &Option<String>, config: &Config) -> Result<Model> {
    match flag {
        Some(id) => Ok(Model::from_id(id)?),
        None => Ok(config.active_model()?),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_transcribe(
    manager: &ModelManager,
    model: Model,
    config: &Config,
    file: PathBuf,
    language: Option<String>,
    translate: bool,
    verbose: bool,
) -> Result<()> {
    if !SpeechEngine::available() {
        bail!("this build was compiled without local inference support");
    }
    if !manager.is_downloaded(model) {
        bail!(
            "model '{}' is not downloaded — run: voxkey models --download {}",
            model.id(),
            model.id()
        );
    }

    let mut engine = SpeechEngine::new().with_verbose(verbose);
    engine.load_model(&manager.model_path(model))?;

    let mut request = TranscriptionRequest::new(file);
    request.language = language.unwrap_or_else(|| config.transcription.language.clone());
    request.translate = translate || config.transcription.translate;

    let started = std::time::Instant::now();
    let text = voxkey_core::transcribe_recording(&mut engine, &request)?;
    let elapsed = started.elapsed();

    engine.unload();

    eprintln!(
        "{}",
        style(format!("transcribed in {:.1}s with {}", elapsed.as_secs_f64(), model.id())).dim()
    );
    println!("{text}");
    Ok(())
}

async fn download_model(manager: &ModelManager, model: Model) -> Result<()> {
    if manager.is_downloaded(model) {
        println!("{} is already downloaded", model.id());
        return Ok(());
    }

    println!(
        "Downloading {} ({})...",
        style(model.display_name()).bold(),
        format_bytes(model.size_bytes())
    );

    let bar = ProgressBar::new(model.size_bytes());
    bar.set_style(
        ProgressStyle::with_template(
            "{bar:40.cyan/blue} {bytes}/{total_bytes} ({binary_bytes_per_sec}, {eta})",
        )
        .unwrap(),
    );
    let bar_handle = bar.clone();

    let path = manager
        .download(
            model,
            Some(Box::new(move |p| {
                bar_handle.set_length(p.bytes_total);
                bar_handle.set_position(p.bytes_done);
            })),
        )
        .await?;

    bar.finish_and_clear();
    println!("Saved to {}", path.display());
    Ok(())
}

fn list_models(manager: &ModelManager, config: &Config, include_available: bool) {
    let active = config.active_model().ok();

    for &model in Model::ALL {
        let state = manager.state(model);
        if !include_available && state == ModelState::NotPresent {
            continue;
        }

        let marker = if Some(model) == active { "*" } else { " " };
        let status = match &state {
            ModelState::Present => style("downloaded").green().to_string(),
            ModelState::NotPresent => style("available").dim().to_string(),
            ModelState::Downloading(p) => {
                style(format!("downloading {:.0}%", p.fraction * 100.0)).cyan().to_string()
            }
            ModelState::Corrupt(reason) => style(format!("corrupt: {reason}")).red().to_string(),
        };

        println!(
            "{marker} {:<10} {:<22} {:>9}  {status}",
            model.id(),
            model.display_name(),
            format_bytes(model.size_bytes()),
        );
    }

    if !include_available {
        println!("\nUse --available to list models you can download.");
    }
}
