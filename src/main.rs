// src/main.rs

//! Exam archive crawler CLI.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use exam_crawler::{
    error::Result,
    models::Config,
    pipeline,
    services::ExamCrawler,
    storage::{self, OutputFormat},
};

/// University exam archive crawler
#[derive(Parser, Debug)]
#[command(
    name = "exam-crawler",
    version,
    about = "Crawls a university library's public exam archive"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Override the target domain from the configuration
    #[arg(long)]
    domain: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl megamot, courses, lecturers, and exams into a dataset
    Crawl {
        /// Restrict descent to these megama ids (repeatable)
        #[arg(long = "megama", value_name = "ID")]
        megamot: Vec<i64>,

        /// Output file (default: {output.dir}/records.{format})
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List megama ids and names without crawling any further
    Megamot,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn default_output_path(config: &Config, format: OutputFormat) -> PathBuf {
    PathBuf::from(&config.output.dir).join(format!("records.{}", format.extension()))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(domain) = cli.domain {
        config.site.domain = domain;
    }
    config.validate()?;

    match cli.command {
        Command::Crawl {
            megamot,
            output,
            format,
        } => {
            let format = format.unwrap_or(config.output.format);
            let path = output.unwrap_or_else(|| default_output_path(&config, format));
            let megama_filter = if megamot.is_empty() {
                None
            } else {
                Some(megamot.into_iter().collect::<HashSet<_>>())
            };

            let sink = storage::open_sink(format, &path).await?;
            log::info!("writing records to {}", path.display());
            pipeline::run_crawl(&config, megama_filter, sink).await?;
        }

        Command::Megamot => {
            let crawler = ExamCrawler::new(&config, None)?;
            for megama in crawler.list_megamot().await? {
                println!("{}\t{}", megama.id, megama.name);
            }
        }

        Command::Validate => {
            log::info!("configuration OK");
        }
    }

    Ok(())
}
