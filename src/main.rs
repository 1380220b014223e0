use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use peerbench::{config, logging};

mod commands;

use commands::render::{OutputFormat, RenderOptions};
use commands::serve::ServeOptions;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Benchmark sustainability report length against peer companies", long_about = None)]
struct Cli {
    /// Report data file (overrides config and PEERBENCH_DATA)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Config file (default: ./peerbench.toml, then ~/.peerbench/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (PEERBENCH_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the benchmark view once
    Render {
        /// Focal company name (exact match)
        #[arg(long)]
        focal: String,

        /// Benchmark rule (all, country, sector, market-cap, employees, rating)
        #[arg(long, default_value = "all")]
        rule: String,

        /// Hand-picked peer company, repeatable (max 3); overrides --rule
        #[arg(long = "peer")]
        peers: Vec<String>,

        /// Chart type (histogram, strip, violin, bar)
        #[arg(long, default_value = "histogram")]
        chart: String,

        /// Table sort by page count (asc, desc)
        #[arg(long, default_value = "asc")]
        sort: String,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for strip plot jitter
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List companies and available benchmark rules
    Companies {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Serve the interactive dashboard
    Serve {
        /// Host to bind to (default from config: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config: 8501)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data.path = data;
    }

    match cli.command {
        Commands::Render {
            focal,
            rule,
            peers,
            chart,
            sort,
            format,
            output,
            seed,
        } => {
            commands::render::execute(
                &config,
                RenderOptions {
                    focal,
                    rule,
                    peers,
                    chart,
                    sort,
                    format,
                    output,
                    seed,
                },
            )?;
        }
        Commands::Companies { json } => {
            commands::companies::execute(&config, json)?;
        }
        Commands::Serve { host, port } => {
            commands::serve::execute(config, ServeOptions { host, port })?;
        }
    }

    Ok(())
}
