//! Run configuration.
//!
//! A [`Config`] is computed once at startup and never mutated afterwards.
//! The output path, including the `.gz` suffix when compression writes to a
//! file, is resolved here, before any sink is opened.

use crate::errors::{CaseflowError, Result};
use crate::stages::StageKind;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default output file name.
pub const DEFAULT_OUT_FILENAME: &str = "out.txt";

/// Suffix appended to the output file name when compressing.
pub const GZIP_EXTENSION: &str = "gz";

/// Default pipeline deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Default read size for sources.
///
/// Every stage holds at most one chunk's worth of input. With `--uncompress`
/// the decoded output of one chunk can reach
/// [`MAX_INFLATE_RATIO`](crate::stages::MAX_INFLATE_RATIO) times this size
/// (about 64 MiB at the default); lower the chunk size to tighten that.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Environment variable naming the base directory for relative paths.
pub const BASE_PATH_ENV: &str = "BASE_PATH";

/// Where the pipeline reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input.
    Stdin,
    /// A file, already resolved against the base path.
    File(PathBuf),
}

/// Where the pipeline writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    Stdout,
    /// A file, already resolved against the base path and suffixed.
    File(PathBuf),
}

/// Immutable snapshot of the parsed flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    input: InputSource,
    output: OutputTarget,
    uncompress: bool,
    compress: bool,
    timeout: Duration,
    chunk_size: usize,
}

impl Config {
    /// Starts building a configuration rooted at `base_path`.
    #[must_use]
    pub fn builder(base_path: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new(base_path)
    }

    /// Returns the input source.
    #[must_use]
    pub const fn input(&self) -> &InputSource {
        &self.input
    }

    /// Returns the output target.
    #[must_use]
    pub const fn output(&self) -> &OutputTarget {
        &self.output
    }

    /// Returns true if the input is gzip-decompressed first.
    #[must_use]
    pub const fn uncompress(&self) -> bool {
        self.uncompress
    }

    /// Returns true if the output is gzip-compressed.
    #[must_use]
    pub const fn compress(&self) -> bool {
        self.compress
    }

    /// Returns the deadline for the whole run.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the source read size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the stage kinds this configuration selects, in execution order.
    #[must_use]
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        let mut kinds = Vec::with_capacity(3);
        if self.uncompress {
            kinds.push(StageKind::Decompress);
        }
        kinds.push(StageKind::Uppercase);
        if self.compress {
            kinds.push(StageKind::Compress);
        }
        kinds
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    base_path: PathBuf,
    input: Option<InputSource>,
    outfile: Option<String>,
    to_stdout: bool,
    uncompress: bool,
    compress: bool,
    timeout: Duration,
    chunk_size: usize,
}

impl ConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            input: None,
            outfile: None,
            to_stdout: false,
            uncompress: false,
            compress: false,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Reads from standard input.
    #[must_use]
    pub fn stdin(mut self) -> Self {
        self.input = Some(InputSource::Stdin);
        self
    }

    /// Reads from a file relative to the base path.
    #[must_use]
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Some(InputSource::File(self.base_path.join(path)));
        self
    }

    /// Overrides the output file name.
    #[must_use]
    pub fn outfile(mut self, name: impl Into<String>) -> Self {
        self.outfile = Some(name.into());
        self
    }

    /// Writes to standard output instead of a file.
    #[must_use]
    pub fn to_stdout(mut self, enabled: bool) -> Self {
        self.to_stdout = enabled;
        self
    }

    /// Inserts the decompress stage.
    #[must_use]
    pub fn uncompress(mut self, enabled: bool) -> Self {
        self.uncompress = enabled;
        self
    }

    /// Inserts the compress stage.
    #[must_use]
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Sets the deadline for the whole run.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the source read size.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Freezes the configuration.
    ///
    /// # Errors
    ///
    /// Returns a usage error if no input was selected or the chunk size is zero.
    pub fn build(self) -> Result<Config> {
        let input = self
            .input
            .ok_or_else(|| CaseflowError::usage("Usage incorrect."))?;
        if self.chunk_size == 0 {
            return Err(CaseflowError::usage("chunk size must be greater than zero"));
        }

        let output = if self.to_stdout {
            OutputTarget::Stdout
        } else {
            let mut name = self
                .outfile
                .unwrap_or_else(|| DEFAULT_OUT_FILENAME.to_string());
            if self.compress {
                name.push('.');
                name.push_str(GZIP_EXTENSION);
            }
            OutputTarget::File(self.base_path.join(name))
        };

        Ok(Config {
            input,
            output,
            uncompress: self.uncompress,
            compress: self.compress,
            timeout: self.timeout,
            chunk_size: self.chunk_size,
        })
    }
}

/// Resolves the base directory from `BASE_PATH`, falling back to the
/// directory holding the executable.
pub fn resolve_base_path() -> Result<PathBuf> {
    resolve_base_path_from(std::env::var_os(BASE_PATH_ENV))
}

/// Resolves the base directory from an explicit `BASE_PATH` value.
///
/// Relative values are resolved against the current directory.
pub fn resolve_base_path_from(value: Option<OsString>) -> Result<PathBuf> {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                Ok(path)
            } else {
                let cwd = std::env::current_dir()
                    .map_err(|e| CaseflowError::io("cannot read current directory", e))?;
                Ok(cwd.join(path))
            }
        }
        None => {
            let exe = std::env::current_exe()
                .map_err(|e| CaseflowError::io("cannot locate executable", e))?;
            Ok(exe
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::builder("/data").file("in.txt").build().unwrap();

        assert_eq!(config.input(), &InputSource::File(PathBuf::from("/data/in.txt")));
        assert_eq!(config.output(), &OutputTarget::File(PathBuf::from("/data/out.txt")));
        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.stage_kinds(), vec![StageKind::Uppercase]);
    }

    #[test]
    fn test_compress_suffixes_default_name() {
        let config = Config::builder("/data")
            .file("in.txt")
            .compress(true)
            .build()
            .unwrap();
        assert_eq!(config.output(), &OutputTarget::File(PathBuf::from("/data/out.txt.gz")));
    }

    #[test]
    fn test_compress_suffixes_custom_name() {
        let config = Config::builder("/data")
            .stdin()
            .outfile("result.txt")
            .compress(true)
            .build()
            .unwrap();
        assert_eq!(
            config.output(),
            &OutputTarget::File(PathBuf::from("/data/result.txt.gz"))
        );
    }

    #[test]
    fn test_stdout_ignores_outfile_and_suffix() {
        let config = Config::builder("/data")
            .stdin()
            .outfile("ignored.txt")
            .compress(true)
            .to_stdout(true)
            .build()
            .unwrap();
        assert_eq!(config.output(), &OutputTarget::Stdout);
    }

    #[test]
    fn test_stage_order_is_fixed() {
        let config = Config::builder("/data")
            .stdin()
            .compress(true)
            .uncompress(true)
            .build()
            .unwrap();
        assert_eq!(
            config.stage_kinds(),
            vec![StageKind::Decompress, StageKind::Uppercase, StageKind::Compress]
        );
    }

    #[test]
    fn test_missing_input_is_usage_error() {
        let err = Config::builder("/data").build().unwrap_err();
        assert!(err.shows_help());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = Config::builder("/data").stdin().chunk_size(0).build().unwrap_err();
        assert!(err.shows_help());
    }

    #[test]
    fn test_base_path_absolute() {
        let path = resolve_base_path_from(Some(OsString::from("/srv/files"))).unwrap();
        assert_eq!(path, PathBuf::from("/srv/files"));
    }

    #[test]
    fn test_base_path_relative_resolves_against_cwd() {
        let path = resolve_base_path_from(Some(OsString::from("files"))).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("files"));
    }

    #[test]
    fn test_base_path_defaults_to_executable_dir() {
        let path = resolve_base_path_from(None).unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(Some(path.as_path()), exe.parent());
    }
}
