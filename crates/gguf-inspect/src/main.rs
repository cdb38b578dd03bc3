mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    //  Logging (stderr, so stdout stays clean for --json)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gguf_inspect=info"));
    if args.global.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match args.command {
        cli::Commands::Header(h) => cli::header::execute(h).await,
        cli::Commands::Dump(d) => cli::dump::execute(args.global, d).await,
        cli::Commands::Config(c) => cli::config_cmd::execute(c).await,
    }
}
