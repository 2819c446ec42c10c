use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fenrir_ai::{GenerationConfig, LLMProviderFactory, TutorPipeline};
use fenrir_core::{AnalysisRequest, AnalysisStage, ConceptStore, ConfigManager, FenrirConfig};
use fenrir_server::{logging::init_logging, serve, AppState};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "fenrir",
    version,
    author,
    about = "Fenrir AI - concept-grounded feedback on math solutions",
    long_about = "Fenrir finds the textbook concepts a math problem involves, then reviews a student's \
                  solution against them with a fixed five-section critique."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP tutor service")]
    Serve {
        #[arg(long, help = "Host to bind (overrides config)")]
        host: Option<String>,

        #[arg(short, long, help = "Port to bind (overrides config)")]
        port: Option<u16>,
    },

    #[command(
        about = "Analyze one solution from the command line",
        long_about = "Run both pipeline stages once and print the feedback.\n\
                      Each argument is either literal text or @path to read it from a file."
    )]
    Analyze {
        #[arg(long, help = "Problem statement, or @file")]
        problem: String,

        #[arg(long, help = "Student's solution, or @file")]
        solution: String,
    },

    #[command(about = "List the merged concept vocabulary")]
    Concepts {
        #[arg(long, help = "Print the entry for one keyword")]
        show: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_mgr = match &cli.config {
        Some(path) => ConfigManager::load_from(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    let config = config_mgr.config().clone();

    init_logging(&config.logging, cli.verbose);
    if let Some(path) = config_mgr.config_path() {
        info!("Using configuration from {}", path.display());
    }

    match cli.command {
        Commands::Serve { host, port } => handle_serve(config, host, port).await,
        Commands::Analyze { problem, solution } => handle_analyze(config, &problem, &solution).await,
        Commands::Concepts { show } => handle_concepts(&config, show.as_deref()),
    }
}

async fn handle_serve(mut config: FenrirConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr = config.server.bind_address();

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{} {}", "✗ Startup failed:".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!("{} http://{}", "🐺 Fenrir tutor starting on".green().bold(), addr);
    serve(state, &addr).await
}

async fn handle_analyze(config: FenrirConfig, problem: &str, solution: &str) -> Result<()> {
    let request = AnalysisRequest::new(read_arg(problem)?, read_arg(solution)?)?;

    let store = ConceptStore::load(&config.concepts.primary, &config.concepts.secondary)?;
    let provider = LLMProviderFactory::create_from_config(&config.llm)?;
    let pipeline = TutorPipeline::new(provider, Arc::new(store))
        .with_generation_config(GenerationConfig::from_llm_config(&config.llm));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .map(|style| style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "))
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let progress = spinner.clone();
    let outcome = pipeline
        .analyze_with_observer(&request, move |stage| match stage {
            AnalysisStage::Stage1Running | AnalysisStage::Stage2Running => {
                progress.set_message(stage.to_string());
            }
            AnalysisStage::KeywordsExtracted | AnalysisStage::KeywordsEmpty => {
                progress.println(format!("{} {}", "✓".green(), stage));
            }
            AnalysisStage::ResultReady => progress.finish_and_clear(),
            AnalysisStage::Stage2Failed => {
                progress.abandon_with_message(format!("{} {}", "✗".red(), stage));
            }
            AnalysisStage::Idle => {}
        })
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", "✗ Analysis failed:".red().bold(), e);
            std::process::exit(1);
        }
    };

    for warning in outcome.warnings() {
        println!("{} {}", "⚠".yellow(), warning.yellow());
    }
    if !outcome.result.keywords.is_empty() {
        println!(
            "{} {}",
            "Concepts:".cyan().bold(),
            outcome.result.keywords.join(", ")
        );
    }
    println!();
    println!("{}", outcome.result.text);
    Ok(())
}

fn handle_concepts(config: &FenrirConfig, show: Option<&str>) -> Result<()> {
    let store = ConceptStore::load(&config.concepts.primary, &config.concepts.secondary)?;

    match show {
        Some(keyword) => match store.get(keyword) {
            Some(entry) => {
                println!("{}", keyword.green().bold());
                println!("{}", serde_json::to_string_pretty(entry)?);
            }
            None => {
                eprintln!("{} {}", "Unknown concept:".red(), keyword);
                std::process::exit(1);
            }
        },
        None => {
            println!(
                "{} ({} entries)",
                "📚 Concept vocabulary".green().bold(),
                store.len()
            );
            for keyword in store.keywords() {
                println!("  • {}", keyword);
            }
        }
    }
    Ok(())
}

/// Literal text, or the contents of a file when prefixed with `@`.
fn read_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read {}", path)),
        None => Ok(value.to_string()),
    }
}
