use std::path::PathBuf;

use clap::Parser;

/// Reconstructs semantic browsing-session events from a raw `tlogger` log.
#[derive(Debug, Parser)]
#[command(name = "tlogc", version, about)]
pub struct Cli {
    /// Path to the raw log to compile, or `-` to read from standard input.
    pub input: PathBuf,

    /// Where to write the compiled log. Defaults to standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Keep running under a panic hook that prints a full backtrace instead
    /// of the default one-line panic message.
    #[arg(short, long)]
    pub debug: bool,

    /// Raise the tracing filter to `debug`.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_input_path() {
        let cli = Cli::parse_from(["tlogc", "log.txt"]);
        assert_eq!(cli.input, PathBuf::from("log.txt"));
        assert!(cli.output.is_none());
        assert!(!cli.debug);
        assert!(!cli.verbose);
    }

    #[test]
    fn parses_output_debug_and_verbose() {
        let cli = Cli::parse_from(["tlogc", "-o", "out.txt", "-d", "-v", "log.txt"]);
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
        assert!(cli.debug);
        assert!(cli.verbose);
    }

    #[test]
    fn accepts_dash_as_the_stdin_marker() {
        let cli = Cli::parse_from(["tlogc", "-"]);
        assert_eq!(cli.input, PathBuf::from("-"));
    }
}
