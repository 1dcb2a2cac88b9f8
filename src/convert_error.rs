//! Error handling for the conversion pipeline

use std::io;
use std::path::{Path, PathBuf};

/// Which side of the conversion an extension was resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
        }
    }
}

/// Unified error reporting the single cause that aborted a conversion.
#[derive(Debug)]
pub enum ConvertError {
    UsageError(String),
    UnsupportedFormat { extension: String, direction: Direction },
    FileNotFound(PathBuf),
    DirectoryNotFound(PathBuf),
    ParseError { path: PathBuf, message: String },
    WriteError { path: PathBuf, message: String },
    IoError(io::Error),
}

impl ConvertError {
    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        ConvertError::ParseError { path: path.to_path_buf(), message: message.into() }
    }

    pub fn write(path: &Path, message: impl Into<String>) -> Self {
        ConvertError::WriteError { path: path.to_path_buf(), message: message.into() }
    }

    /// Usage errors are reported like command line parsing failures.
    pub fn is_usage(&self) -> bool {
        matches!(self, ConvertError::UsageError(_))
    }
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ConvertError::UsageError(ref msg) =>
                write!(f, "Usage Error: {}", msg),
            ConvertError::UnsupportedFormat { ref extension, direction } =>
                write!(f, "Unsupported Format: cannot {} format '{}'", direction, extension),
            ConvertError::FileNotFound(ref path) =>
                write!(f, "File Not Found: could not find input file {}", path.display()),
            ConvertError::DirectoryNotFound(ref path) =>
                write!(f, "Directory Not Found: output directory does not exist: {}", path.display()),
            ConvertError::ParseError { ref path, ref message } =>
                write!(f, "Parse Error: {}: {}", path.display(), message),
            ConvertError::WriteError { ref path, ref message } =>
                write!(f, "Write Error: failed to write {}: {}", path.display(), message),
            ConvertError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(err: io::Error) -> Self {
        ConvertError::IoError(err)
    }
}
