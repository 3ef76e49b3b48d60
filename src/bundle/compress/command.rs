//! External compressor commands.
//!
//! A command template is a shell command line with optional placeholders:
//!
//! - `:infile` is replaced by a temp file holding the input; otherwise the
//!   input is piped through stdin.
//! - `:outfile` is replaced by a temp file the command writes; otherwise
//!   stdout is captured as the output.
//!
//! Temp files live in the cache directory and are removed when the
//! invocation ends, whether it succeeded or not.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::TempPath;

use crate::utils::exec::Cmd;

use super::CompressContext;
use crate::bundle::BundleError;

/// Placeholder for the input file path.
const INFILE: &str = ":infile";
/// Placeholder for the output file path.
const OUTFILE: &str = ":outfile";

/// A compressor command line with `:infile` / `:outfile` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    template: String,
}

impl CommandTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// First word of the command line, used for PATH checks.
    pub fn program(&self) -> Option<&str> {
        self.template.split_whitespace().next()
    }

    pub fn uses_infile(&self) -> bool {
        self.template.contains(INFILE)
    }

    pub fn uses_outfile(&self) -> bool {
        self.template.contains(OUTFILE)
    }

    /// Run the command over `input` and return the compressed bytes.
    pub fn run(&self, input: &[u8], ctx: &CompressContext<'_>) -> Result<Vec<u8>, BundleError> {
        let mut command = self.template.clone();

        // Held until the end of this scope; dropping deletes the files
        let infile = if self.uses_infile() {
            let path = temp_path(ctx, "infile.", Some(input))?;
            command = command.replace(INFILE, &quote_path(&path)?);
            Some(path)
        } else {
            None
        };
        let outfile = if self.uses_outfile() {
            let path = temp_path(ctx, "outfile.", None)?;
            command = command.replace(OUTFILE, &quote_path(&path)?);
            Some(path)
        } else {
            None
        };

        let mut cmd = Cmd::shell(&command);
        if infile.is_none() {
            cmd = cmd.stdin(input);
        }

        let output = cmd.run().map_err(|e| BundleError::Compression {
            bundle: ctx.bundle.to_string(),
            message: format!("{e:#}"),
        })?;

        match &outfile {
            Some(path) => fs::read(path).map_err(|e| BundleError::io(path.to_path_buf(), e)),
            None => Ok(output.stdout),
        }
    }
}

/// Create a temp file in the cache dir, optionally filled with `contents`.
fn temp_path(
    ctx: &CompressContext<'_>,
    prefix: &str,
    contents: Option<&[u8]>,
) -> Result<TempPath, BundleError> {
    let suffix = format!(".{}", ctx.kind);
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(&suffix)
        .tempfile_in(ctx.temp_dir)
        .map_err(|e| BundleError::io(ctx.temp_dir, e))?;

    if let Some(contents) = contents {
        file.write_all(contents)
            .and_then(|()| file.flush())
            .map_err(|e| BundleError::io(file.path(), e))?;
    }
    Ok(file.into_temp_path())
}

/// Quote a path for substitution into a shell command line.
///
/// Paths are double quoted with platform separators. Characters that stay
/// special inside double quotes are rejected instead of escaped.
fn quote_path(path: &Path) -> Result<String, BundleError> {
    let unsafe_path = || BundleError::UnsafePath(path.to_path_buf());
    let raw = path.to_str().ok_or_else(unsafe_path)?;

    #[cfg(unix)]
    const FORBIDDEN: &[char] = &['"', '`', '$', '\\', '\n', '\r', '\0'];
    #[cfg(not(unix))]
    const FORBIDDEN: &[char] = &['"', '`', '$', '\n', '\r', '\0'];

    if raw.contains(FORBIDDEN) {
        return Err(unsafe_path());
    }

    #[cfg(windows)]
    let raw = raw.replace('/', "\\");

    Ok(format!("\"{raw}\""))
}
