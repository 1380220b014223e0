//! Dashboard server for peerbench
//!
//! Provides HTTP endpoints for:
//! - The interactive dashboard page (`GET /`)
//! - The same render as JSON (`GET /api/view`)
//! - Focal company choices (`GET /api/companies`)
//!
//! Design: Blocking HTTP microserver (no async/tokio), thread per
//! connection. The report file is reloaded on every request, so each
//! interaction is a complete re-render with no state carried over.

mod internal;
pub(crate) mod microserver;

use anyhow::Result;

use peerbench::config::Config;

/// Options for the serve command; unset fields fall back to `[serve]` config
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Start the dashboard server
pub fn execute(config: Config, options: ServeOptions) -> Result<()> {
    internal::run_server(config, options)
}
