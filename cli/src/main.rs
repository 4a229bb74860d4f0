use clap::Parser;
use tlog_cli::{run, Cli, LoggerConfig, UnifiedLogger};

fn main() {
    let cli = Cli::parse();

    let logger_config = if cli.verbose { LoggerConfig::verbose() } else { LoggerConfig::default() };
    if let Err(e) = UnifiedLogger::init(logger_config) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if cli.debug {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    if let Err(err) = run(&cli) {
        tracing::error!("{err}");
        if cli.debug {
            eprintln!("{err:?}");
        }
        std::process::exit(1);
    }
}
