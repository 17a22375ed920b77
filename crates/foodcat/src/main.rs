#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod browse;
mod catalog;
mod config;
mod error;
mod mcp;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Browse the Open Food Facts product catalog from the terminal"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Catalog API root (defaults to https://world.openfoodfacts.org)
    #[clap(long, env = "FOODCAT_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[clap(long, env = "FOODCAT_TIMEOUT", global = true)]
    timeout: Option<u64>,

    /// Whether to display additional information.
    #[clap(long, env = "FOODCAT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Search products by name and category
    Search(crate::catalog::search::SearchOptions),

    /// Show the detail view of a single product
    Product(crate::catalog::product::ProductOptions),

    /// List product categories
    Categories(crate::catalog::categories::CategoriesOptions),

    /// Interactive browsing session
    Browse(crate::browse::App),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Search(options) => crate::catalog::search::run(options, app.global).await,
        SubCommands::Product(options) => crate::catalog::product::run(options, app.global).await,
        SubCommands::Categories(options) => {
            crate::catalog::categories::run(options, app.global).await
        }
        SubCommands::Browse(sub_app) => crate::browse::run(sub_app, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
