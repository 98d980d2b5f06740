use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siteforge::cli::commands;
use siteforge::cli::commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "siteforge")]
#[command(
    version,
    about = "Regenerate scraped websites with an LLM, chunk by chunk"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate a scraped site directory
    Generate {
        #[arg(help = "Directory containing the scraped index.html")]
        site_dir: PathBuf,
        #[arg(long, short, help = "Output directory (default: generated_website)")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (anthropic, openai, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use for every content kind")]
        model: Option<String>,
        #[arg(long, help = "Regenerate by semantic section with a structure summary")]
        structural: bool,
        #[arg(long = "chunk-assets", help = "Regenerate stylesheets and scripts too")]
        chunk_assets: bool,
        #[arg(long, help = "Concurrent model requests")]
        concurrency: Option<usize>,
    },

    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count, size and age range
    Stats,
    /// Remove every cached response
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n{}", console::style("━━━ PANIC ━━━").red().bold());
        eprintln!(
            "{}",
            console::style("siteforge encountered an unexpected error:").red()
        );
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "{}",
                console::style(format!(
                    "Location: {}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                ))
                .dim()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", console::style("Error:").red(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            site_dir,
            output,
            provider,
            model,
            structural,
            chunk_assets,
            concurrency,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(GenerateOptions {
                site_dir,
                output,
                provider,
                model,
                structural,
                chunk_assets,
                concurrency,
                quiet: cli.quiet,
            }))?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::stats()?,
            CacheAction::Clear => commands::cache::clear()?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
