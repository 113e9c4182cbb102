use clap::Parser;
use miette::{miette, IntoDiagnostic};
use tracing_subscriber::EnvFilter;

use lumen::{
    config::{Config, DEFAULT_CONFIG_FILE},
    inspect, mail,
    serve::{self, SiteState},
    store,
};

#[derive(Parser)]
#[command(author, version, about)]
pub enum Command {
    /// Serve the site on the configured address
    Serve,
    /// List published posts
    Posts,
    /// Show the approved comment thread of a post
    Thread {
        /// The post whose comments to show
        post_id: String,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let command = Command::parse();
    let config = Config::load(DEFAULT_CONFIG_FILE).into_diagnostic()?;
    let store = store::open(&config.store).await?;

    match command {
        Command::Serve => {
            let server = config.server.ok_or(miette!("no server config found"))?;
            let mailer = mail::from_config(&config.mail);
            serve::serve(SiteState::new(store, mailer, server, config.mail)).await?
        }
        Command::Posts => inspect::posts(&*store).await?,
        Command::Thread { post_id } => inspect::thread(&*store, &post_id).await?,
    }

    Ok(())
}
