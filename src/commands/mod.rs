pub mod companies;
pub mod render;
pub mod serve;

use anyhow::{Context, Result};

use peerbench::config::Config;
use peerbench::dataset::Dataset;

/// Load the configured report file (fresh on every call).
pub(crate) fn load_dataset(config: &Config) -> Result<Dataset> {
    let options = config.load_options()?;
    Dataset::load_with(&config.data.path, options).context("Failed to load report data")
}
