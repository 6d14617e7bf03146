mod api;
mod cli;
mod config;
mod error;
mod logging;
mod model;
mod nav;
mod orchestrator;
mod session;
mod status;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();

    match cli::run(args).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", cli::describe_error(&e));
            std::process::exit(1);
        }
    }
}
