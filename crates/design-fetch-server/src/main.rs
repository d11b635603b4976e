use anyhow::Result;
use clap::{Parser, Subcommand};
use design_fetch_server::cli::{self, BrowserArgs};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "design-fetch", version)]
#[command(about = "Extract a site's light and dark mode colors and logo")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /fetch-design and GET /health
    Serve {
        /// Address to listen on
        #[arg(long, default_value = cli::serve::DEFAULT_BIND)]
        bind: SocketAddr,

        #[command(flatten)]
        browser: BrowserArgs,
    },

    /// Extract one URL and print the result as JSON
    Fetch {
        url: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        browser: BrowserArgs,
    },
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("design_fetch=info".parse()?)
        .add_directive("design_fetch_server=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_json)?;

    match args.command {
        Commands::Serve { bind, browser } => cli::serve::run(bind, &browser).await,
        Commands::Fetch {
            url,
            pretty,
            browser,
        } => cli::fetch::run(&url, pretty, &browser).await,
    }
}
