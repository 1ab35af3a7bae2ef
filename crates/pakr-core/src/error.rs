//! The single error type returned by every packager.

use std::path::PathBuf;

use pakr_schema::{InfoError, VersionError};
use thiserror::Error;

/// Build failures, grouped the way callers react to them.
///
/// Validation variants (`FieldEmpty`, `InvalidName`, `NoPackager`) are raised
/// before any byte reaches the output stream. `Source` aborts a build whose
/// inputs cannot be read. The remaining variants propagate encoder failures
/// unchanged.
#[derive(Error, Debug)]
pub enum PackageError {
    /// A required descriptor field is empty.
    #[error("package {0} must be provided")]
    FieldEmpty(&'static str),

    /// The name does not match the format's identifier grammar.
    #[error("{format}: invalid package name '{name}'")]
    InvalidName {
        /// Format whose grammar rejected the name.
        format: &'static str,
        /// The rejected name.
        name: String,
    },

    /// No packager is registered under the requested format name.
    #[error("no packager registered for the format {0}")]
    NoPackager(String),

    /// The format cannot target the requested platform.
    #[error("{format} packages can only target linux, not '{platform}'")]
    UnsupportedPlatform {
        /// Format that rejected the platform.
        format: &'static str,
        /// The rejected platform.
        platform: String,
    },

    /// The requested compression codec is not available for the format.
    #[error("{format}: unsupported compression '{codec}'")]
    UnsupportedCompression {
        /// Format that rejected the codec.
        format: &'static str,
        /// The rejected codec name.
        codec: String,
    },

    /// A version component cannot be rendered.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A source pattern is malformed or matched nothing.
    #[error("glob error for '{pattern}': {reason}")]
    Glob {
        /// The offending pattern.
        pattern: String,
        /// Why it failed.
        reason: String,
    },

    /// A content source or script could not be read.
    #[error("failed to read {path}: {source}")]
    Source {
        /// The unreadable path.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// Writing the artifact failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The RPM header codec rejected the package.
    #[error("RPM error: {0}")]
    Rpm(#[from] rpm::Error),
}

impl PackageError {
    /// Wrap an I/O failure on a source path.
    pub fn unreadable(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Source {
            path: path.into(),
            source: err,
        }
    }
}

impl From<InfoError> for PackageError {
    fn from(err: InfoError) -> Self {
        match err {
            InfoError::FieldEmpty(field) => Self::FieldEmpty(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            PackageError::from(InfoError::FieldEmpty("name")).to_string(),
            "package name must be provided"
        );
        assert_eq!(
            PackageError::NoPackager("msi".into()).to_string(),
            "no packager registered for the format msi"
        );
        let err = PackageError::InvalidName {
            format: "archlinux",
            name: "#".into(),
        };
        assert_eq!(err.to_string(), "archlinux: invalid package name '#'");
    }
}
