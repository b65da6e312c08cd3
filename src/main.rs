use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod core;
mod matching;
mod parsing;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flags
    let filter = if cli.verbose {
        EnvFilter::new("motif_count=debug,info")
    } else if cli.silent {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("motif_count=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Count(args) => {
            cli::count::run(args, cli.format)?;
        }
    }

    Ok(())
}
