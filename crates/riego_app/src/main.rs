use clap::Parser;

use riego_app::app::{run, AppConfig};
use riego_app::cli::Cli;

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = AppConfig::from_env().unwrap_or_default();
    if let Err(err) = run(config, cli) {
        eprintln!("riego failed: {err:#}");
        std::process::exit(1);
    }
}
