//! Command-line parsing.
//!
//! Flags are parsed with clap, then turned into an immutable [`Config`].
//! Clap's own help flag is disabled: `--help` is an ordinary flag here so
//! the binary can print usage to stdout and still exit non-zero.

use crate::config::{Config, DEFAULT_TIMEOUT_MS};
use crate::errors::{CaseflowError, Result};
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Positional argument that selects standard input.
pub const STDIN_ARG: &str = "-";

/// Command-line flags.
#[derive(Debug, Parser)]
#[command(name = "caseflow")]
#[command(about = "Uppercase a byte stream, with optional gzip on either side", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Print this help
    #[arg(long)]
    pub help: bool,

    /// Read input from stdin (same as `-`)
    #[arg(long = "in")]
    pub stdin: bool,

    /// Read input from FILENAME, relative to BASE_PATH
    #[arg(long, value_name = "FILENAME")]
    pub file: Option<PathBuf>,

    /// Write output to FILENAME, relative to BASE_PATH [default: out.txt]
    #[arg(long, value_name = "FILENAME")]
    pub outfile: Option<String>,

    /// Uncompress the input with gzip
    #[arg(long)]
    pub uncompress: bool,

    /// Compress the output with gzip (appends .gz to the output file)
    #[arg(long)]
    pub compress: bool,

    /// Print the output to stdout instead of writing a file
    #[arg(long)]
    pub out: bool,

    /// Abort the run if it takes longer than MS milliseconds
    #[arg(long = "timeout-ms", value_name = "MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Pass `-` to read from stdin
    #[arg(value_name = "-")]
    pub rest: Vec<String>,
}

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print help and exit non-zero.
    Help,
    /// Run the pipeline.
    Run(Config),
}

impl Cli {
    /// Returns true if stdin was selected by flag or by `-`.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.stdin || self.rest.iter().any(|arg| arg == STDIN_ARG)
    }

    /// Turns parsed flags into an invocation.
    ///
    /// `--help` wins over everything; stdin wins over `--file`.
    ///
    /// # Errors
    ///
    /// Returns a usage error if no input was selected.
    pub fn into_invocation(self, base_path: &Path) -> Result<Invocation> {
        if self.help {
            return Ok(Invocation::Help);
        }

        let mut builder = Config::builder(base_path)
            .uncompress(self.uncompress)
            .compress(self.compress)
            .to_stdout(self.out)
            .timeout(Duration::from_millis(self.timeout_ms));
        if let Some(outfile) = &self.outfile {
            builder = builder.outfile(outfile.clone());
        }

        builder = if self.reads_stdin() {
            builder.stdin()
        } else if let Some(file) = &self.file {
            builder.file(file)
        } else {
            return Err(CaseflowError::usage("Usage incorrect."));
        };

        builder.build().map(Invocation::Run)
    }
}

/// Parses a full argument vector (program name first).
///
/// No arguments at all means help.
///
/// # Errors
///
/// Returns a usage error for unknown flags, bad values or a missing input.
pub fn parse<I, T>(args: I, base_path: &Path) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        return Ok(Invocation::Help);
    }
    let cli = Cli::try_parse_from(args).map_err(|e| {
        let rendered = e.to_string();
        CaseflowError::usage(rendered.trim_end().to_string())
    })?;
    cli.into_invocation(base_path)
}

/// Renders the usage text.
#[must_use]
pub fn help_text() -> String {
    Cli::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputSource, OutputTarget};
    use pretty_assertions::assert_eq;

    fn run(args: &[&str]) -> Result<Invocation> {
        let mut full = vec!["caseflow"];
        full.extend_from_slice(args);
        parse(full, Path::new("/base"))
    }

    fn config(args: &[&str]) -> Config {
        match run(args).unwrap() {
            Invocation::Run(config) => config,
            Invocation::Help => panic!("expected a run for {args:?}"),
        }
    }

    #[test]
    fn test_no_arguments_is_help() {
        assert_eq!(run(&[]).unwrap(), Invocation::Help);
    }

    #[test]
    fn test_help_flag_wins() {
        assert_eq!(run(&["--help", "--file=in.txt"]).unwrap(), Invocation::Help);
    }

    #[test]
    fn test_file_to_stdout() {
        let config = config(&["--file=in.txt", "--out"]);
        assert_eq!(config.input(), &InputSource::File(PathBuf::from("/base/in.txt")));
        assert_eq!(config.output(), &OutputTarget::Stdout);
    }

    #[test]
    fn test_dash_reads_stdin() {
        let config = config(&["-"]);
        assert_eq!(config.input(), &InputSource::Stdin);
        assert_eq!(config.output(), &OutputTarget::File(PathBuf::from("/base/out.txt")));
    }

    #[test]
    fn test_in_flag_beats_file() {
        let config = config(&["--in", "--file=in.txt"]);
        assert_eq!(config.input(), &InputSource::Stdin);
    }

    #[test]
    fn test_compress_with_outfile() {
        let config = config(&["--file", "in.txt", "--outfile=shout.txt", "--compress"]);
        assert_eq!(
            config.output(),
            &OutputTarget::File(PathBuf::from("/base/shout.txt.gz"))
        );
        assert!(config.compress());
    }

    #[test]
    fn test_timeout_flag() {
        let config = config(&["--in", "--timeout-ms=2500"]);
        assert_eq!(config.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_flags_without_input_are_usage_error() {
        let err = run(&["--compress"]).unwrap_err();
        assert!(err.shows_help());
        assert_eq!(err.to_string(), "Usage incorrect.");
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = run(&["--shout"]).unwrap_err();
        assert!(err.shows_help());
    }

    #[test]
    fn test_help_text_lists_flags() {
        let help = help_text();
        for flag in ["--help", "--in", "--file", "--outfile", "--uncompress", "--compress", "--out"] {
            assert!(help.contains(flag), "help is missing {flag}");
        }
    }
}
