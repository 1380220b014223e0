//! One-shot render of the benchmark view
//!
//! Runs the same pass the dashboard runs per interaction and prints the
//! result as JSON, a standalone HTML page, or the raw SVG charts.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use peerbench::chart::{svg, ChartKind};
use peerbench::config::Config;
use peerbench::peer::{self, GroupRule, Selection};
use peerbench::view::{self, html, SortOrder, ViewOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Html,
    Svg,
}

pub struct RenderOptions {
    pub focal: String,
    pub rule: String,
    pub peers: Vec<String>,
    pub chart: String,
    pub sort: String,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
}

pub fn execute(config: &Config, options: RenderOptions) -> Result<()> {
    let rendered = render_to_string(config, &options)?;

    match &options.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote benchmark view");
            println!("✓ Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn render_to_string(config: &Config, options: &RenderOptions) -> Result<String> {
    let dataset = super::load_dataset(config)?;
    let benchmark = GroupRule::parse(&options.rule)?;
    let chart = ChartKind::parse(&options.chart)?;
    let sort = SortOrder::parse(&options.sort)?;
    let selection = Selection::new(options.focal.as_str(), benchmark.clone(), options.peers.clone())?;

    let mut chart_options = config.chart_options();
    if options.seed.is_some() {
        chart_options.jitter_seed = options.seed;
    }
    let view_options = ViewOptions {
        chart: chart_options,
        sort,
    };
    let view = view::render(&dataset, &selection, chart, &view_options)?;

    let rendered = match options.format {
        OutputFormat::Json => serde_json::to_string_pretty(&view)?,
        OutputFormat::Svg => view
            .panels
            .iter()
            .map(svg::render)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Html => {
            let sidebar = html::Sidebar {
                companies: dataset.company_names(),
                rules: peer::available_rules(&dataset),
                focal: &options.focal,
                benchmark: &benchmark,
                peers: &options.peers,
                chart,
                sort,
            };
            html::page(&sidebar, Ok(&view))
        }
    };
    Ok(rendered)
}
